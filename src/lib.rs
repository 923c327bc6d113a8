//! Prosody mod_rest OAuth Client
//!
//! OAuth 2.0 client for Prosody's `mod_http_oauth2` and the `mod_rest` HTTP
//! API it protects.
//!
//! # Features
//!
//! - Authorization Server Metadata discovery (RFC 8414)
//! - Dynamic Client Registration (RFC 7591)
//! - Authorization Code Flow (RFC 6749 Section 4.1) with PKCE (RFC 7636)
//! - Token Refresh (RFC 6749 Section 6)
//! - Token Revocation (RFC 7009)
//! - OpenID Connect userinfo
//! - Bearer-authenticated `mod_rest` requests
//!
//! # Example
//!
//! ```rust,no_run
//! use prosody_rest_oauth::{session_config, ProsodyRestSession, TokenRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = session_config()
//!         .base_url("https://xmpp.example.com:5281")
//!         .scope("xmpp")
//!         .build()?;
//!
//!     // Discovers the endpoints and registers a client
//!     let session = ProsodyRestSession::connect(config).await?;
//!
//!     let auth = session.authorization_url(Default::default())?;
//!     println!("Open this URL to authorize: {}", auth.url);
//!
//!     let mut code = String::new();
//!     std::io::stdin().read_line(&mut code)?;
//!     session.fetch_token(TokenRequest::from_input(&code)).await?;
//!
//!     let reply = session
//!         .xmpp(&serde_json::json!({"disco": true, "to": "jabber.org"}))
//!         .await?;
//!     println!("{:#}", reply);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `types`: request, response and configuration data structures
//! - `error`: error hierarchy and mapping of OAuth and Prosody error bodies
//! - `core`: HTTP transport, discovery, state and PKCE
//! - `flows`: registration, authorization code, refresh, revocation, userinfo
//! - `rest`: the `mod_rest` client
//! - `builders`: fluent configuration builder
//! - `session`: [`ProsodyRestSession`], combining all of the above

pub mod builders;
pub mod core;
pub mod error;
pub mod flows;
pub mod rest;
pub mod session;
pub mod types;

// Re-export main session
pub use session::ProsodyRestSession;

// Re-export builders
pub use builders::{session_config, SessionConfigBuilder, DEFAULT_CLIENT_NAME, DEFAULT_CLIENT_URI};

// Re-export errors
pub use error::{
    create_error_from_response, create_rest_error, map_authorization_error, map_provider_error,
    parse_error_response, AuthorizationError, ConfigurationError, NetworkError, OAuth2Error,
    OAuth2ErrorResponse, OAuth2Result, ProtocolError, ProviderError, RestError, TokenError,
};

// Re-export types
pub use types::{
    // Config
    ClientAuthMethod, GrantType, RegistrationExtras, SessionConfig, OOB_REDIRECT_URI, REST_PATH,
    // Metadata
    AuthorizationServerMetadata, ProviderEndpoints,
    // Registration
    ApplicationType, ClientCredentials, ClientRegistrationRequest, ClientRegistrationResponse,
    // Auth
    AuthorizationParams, AuthorizationUrl, CodeExchangeRequest, PkceMethod, PkceParams, Prompt,
    TokenRequest,
    // Callback
    CallbackParams,
    // Token
    StoredToken, TokenResponse,
    // UserInfo
    UserInfo,
};

// Re-export core components
pub use core::{
    // Transport
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, MockHttpTransport,
    ReqwestHttpTransport,
    // State
    generate_state, PendingAuthorization,
    // PKCE
    DefaultPkceGenerator, FixedPkceGenerator, PkceGenerator,
    // Discovery
    DefaultDiscoveryClient, DiscoveryClient,
};

// Re-export flows
pub use flows::{
    AuthorizationCodeFlow, AuthorizationCodeFlowImpl, ClientRegistrar, DefaultClientRegistrar,
    DefaultTokenRevoker, DefaultUserInfoClient, RefreshFlow, RefreshFlowImpl, TokenRevoker,
    TokenTypeHint, UserInfoClient,
};

// Re-export the mod_rest client
pub use rest::RestClient;
