//! Prosody REST Session
//!
//! A registered OAuth client bound to one Prosody server, holding the
//! pending authorization and current token in memory.
//!
//! ```no_run
//! use prosody_rest_oauth::{session_config, ProsodyRestSession, TokenRequest};
//!
//! # async fn example() -> Result<(), prosody_rest_oauth::OAuth2Error> {
//! let config = session_config()
//!     .base_url("https://xmpp.example.com:5281")
//!     .build()?;
//! let session = ProsodyRestSession::connect(config).await?;
//!
//! let auth = session.authorization_url(Default::default())?;
//! println!("Open {}", auth.url);
//!
//! session.fetch_token(TokenRequest::Code("code-from-the-server".into())).await?;
//! let reply = session
//!     .xmpp(&serde_json::json!({"disco": true, "to": "jabber.org"}))
//!     .await?;
//! println!("{}", reply);
//! # Ok(())
//! # }
//! ```

use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::core::{
    generate_state, validate_metadata, DefaultDiscoveryClient, DefaultPkceGenerator,
    DiscoveryClient, HttpTransport, PendingAuthorization, PkceGenerator, ReqwestHttpTransport,
    DEFAULT_MAX_RESPONSE_SIZE,
};
use crate::error::{AuthorizationError, ConfigurationError, OAuth2Error, TokenError};
use crate::flows::{
    build_registration_request, AuthorizationCodeFlow, AuthorizationCodeFlowImpl,
    ClientRegistrar, DefaultClientRegistrar, DefaultTokenRevoker, DefaultUserInfoClient,
    RefreshFlow, RefreshFlowImpl, TokenRevoker, TokenTypeHint, UserInfoClient,
};
use crate::rest::RestClient;
use crate::types::{
    AuthorizationParams, AuthorizationServerMetadata, AuthorizationUrl, CallbackParams,
    ClientCredentials, CodeExchangeRequest, PkceMethod, ProviderEndpoints, SessionConfig,
    StoredToken, TokenRequest, UserInfo,
};

fn lock<V>(mutex: &Mutex<V>) -> MutexGuard<'_, V> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn missing_endpoint(name: &str) -> OAuth2Error {
    OAuth2Error::Configuration(ConfigurationError::MissingEndpoint {
        name: name.to_string(),
    })
}

/// OAuth session against a Prosody server's `mod_rest`.
pub struct ProsodyRestSession<T: HttpTransport = ReqwestHttpTransport> {
    config: SessionConfig,
    metadata: AuthorizationServerMetadata,
    endpoints: ProviderEndpoints,
    credentials: ClientCredentials,
    transport: Arc<T>,
    pkce_generator: Box<dyn PkceGenerator>,
    rest: RestClient<T>,
    pending: Mutex<Option<PendingAuthorization>>,
    token: Mutex<Option<StoredToken>>,
}

impl ProsodyRestSession<ReqwestHttpTransport> {
    /// Discover the server's endpoints and register a client, using the
    /// default HTTP transport.
    pub async fn connect(config: SessionConfig) -> Result<Self, OAuth2Error> {
        let transport = ReqwestHttpTransport::with_options(config.timeout, DEFAULT_MAX_RESPONSE_SIZE)?;
        Self::connect_with_transport(config, Arc::new(transport)).await
    }
}

impl<T: HttpTransport> ProsodyRestSession<T> {
    /// Discover the server's endpoints and register a client.
    #[tracing::instrument(skip_all, fields(base_url = %config.base_url_str()))]
    pub async fn connect_with_transport(
        config: SessionConfig,
        transport: Arc<T>,
    ) -> Result<Self, OAuth2Error> {
        let metadata = DefaultDiscoveryClient::new(transport.clone())
            .discover(config.base_url_str())
            .await?;
        let endpoints = validate_metadata(&metadata)?;

        let request = build_registration_request(&config);
        let credentials = DefaultClientRegistrar::new(transport.clone(), config.timeout)
            .register(&endpoints.registration_endpoint, &request)
            .await?;

        Self::resume(config, metadata, credentials, transport)
    }

    /// Build a session from metadata and credentials obtained earlier,
    /// skipping discovery and registration.
    pub fn resume(
        config: SessionConfig,
        metadata: AuthorizationServerMetadata,
        credentials: ClientCredentials,
        transport: Arc<T>,
    ) -> Result<Self, OAuth2Error> {
        let endpoints = validate_metadata(&metadata)?;
        let rest = RestClient::new(&config, transport.clone());

        if credentials.is_secret_expired() {
            tracing::warn!(
                client_id = %credentials.client_id,
                expires_at = ?credentials.expires_at,
                "Client secret has expired, register the client again"
            );
        }

        Ok(Self {
            config,
            metadata,
            endpoints,
            credentials,
            transport,
            pkce_generator: Box::new(DefaultPkceGenerator::new()),
            rest,
            pending: Mutex::new(None),
            token: Mutex::new(None),
        })
    }

    /// Replace the PKCE generator.
    pub fn with_pkce_generator(mut self, generator: impl PkceGenerator + 'static) -> Self {
        self.pkce_generator = Box::new(generator);
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn metadata(&self) -> &AuthorizationServerMetadata {
        &self.metadata
    }

    pub fn credentials(&self) -> &ClientCredentials {
        &self.credentials
    }

    pub fn client_id(&self) -> &str {
        &self.credentials.client_id
    }

    fn authorization_code_flow(&self) -> AuthorizationCodeFlowImpl<T> {
        AuthorizationCodeFlowImpl::new(
            self.endpoints.authorization_endpoint.clone(),
            self.endpoints.token_endpoint.clone(),
            self.config.redirect_uri.clone(),
            self.credentials.clone(),
            self.transport.clone(),
            self.config.timeout,
        )
    }

    /// Build the URL the user opens to authorize this client.
    ///
    /// Starts a new pending authorization, replacing any earlier one.
    pub fn authorization_url(
        &self,
        params: AuthorizationParams,
    ) -> Result<AuthorizationUrl, OAuth2Error> {
        let scopes = params
            .scopes
            .clone()
            .unwrap_or_else(|| self.config.scopes.clone());
        let state = params.state.clone().unwrap_or_else(generate_state);

        let pkce = if !self.config.use_pkce {
            None
        } else if !self.metadata.supports_s256() {
            tracing::warn!(
                methods = ?self.metadata.code_challenge_methods_supported,
                "Server does not support S256 PKCE, continuing without"
            );
            None
        } else {
            Some(self.pkce_generator.generate(PkceMethod::S256))
        };

        let auth_url = self.authorization_code_flow().build_authorization_url(
            &params,
            &scopes,
            &state,
            pkce.as_ref(),
        )?;

        *lock(&self.pending) = Some(PendingAuthorization::new(
            state,
            self.config.redirect_uri.clone(),
            scopes,
            pkce,
        ));

        tracing::debug!(url = %auth_url.url, "Built authorization URL");
        Ok(auth_url)
    }

    /// Exchange the code from the authorization step for a token.
    ///
    /// A callback URL has its error and `state` checked first. The pending
    /// authorization is kept until the exchange succeeds so that a mistyped
    /// code can be retried.
    #[tracing::instrument(skip_all)]
    pub async fn fetch_token(&self, request: TokenRequest) -> Result<StoredToken, OAuth2Error> {
        let pending = lock(&self.pending).clone().ok_or_else(|| {
            OAuth2Error::Authorization(AuthorizationError::InvalidRequest {
                message: "No pending authorization, build an authorization URL first".to_string(),
                error_uri: None,
            })
        })?;

        let code = match request {
            TokenRequest::Code(code) => {
                let code = code.trim().to_string();
                if code.is_empty() {
                    return Err(OAuth2Error::Authorization(AuthorizationError::InvalidRequest {
                        message: "Empty authorization code".to_string(),
                        error_uri: None,
                    }));
                }
                pending.check_age(self.config.state_max_age)?;
                code
            }
            TokenRequest::Callback(url) => {
                let (code, state) = CallbackParams::from_url_str(&url)?.into_code()?;
                pending.verify(state.as_deref(), self.config.state_max_age)?;
                code
            }
        };

        let response = self
            .authorization_code_flow()
            .exchange_code(CodeExchangeRequest {
                code,
                redirect_uri: pending.redirect_uri.clone(),
                code_verifier: pending.code_verifier(),
            })
            .await?;

        let mut token = StoredToken::from_response(&response);
        if token.scopes.is_empty() {
            token.scopes = pending.scopes.clone();
        }
        *lock(&self.token) = Some(token.clone());
        *lock(&self.pending) = None;

        tracing::info!(
            scopes = ?token.scopes,
            expires_at = ?token.expires_at,
            "Obtained access token"
        );
        Ok(token)
    }

    /// Use a token obtained elsewhere.
    pub fn set_token(&self, token: StoredToken) {
        *lock(&self.token) = Some(token);
    }

    /// Current token, if any.
    pub fn token(&self) -> Option<StoredToken> {
        lock(&self.token).clone()
    }

    /// Refresh the current token.
    #[tracing::instrument(skip_all)]
    pub async fn refresh_token(&self) -> Result<StoredToken, OAuth2Error> {
        let current = self
            .token()
            .ok_or(OAuth2Error::Token(TokenError::NotAcquired))?;
        let refresh_token = current
            .refresh_token()
            .ok_or(OAuth2Error::Token(TokenError::NoRefreshToken))?;

        let response = RefreshFlowImpl::new(
            self.endpoints.token_endpoint.clone(),
            self.credentials.clone(),
            self.transport.clone(),
            self.config.timeout,
        )
        .refresh(refresh_token, None)
        .await?;

        let token = current.refreshed(&response);
        *lock(&self.token) = Some(token.clone());
        tracing::info!(expires_at = ?token.expires_at, "Refreshed access token");
        Ok(token)
    }

    /// Revoke the current token at the server and forget it.
    ///
    /// The refresh token is revoked when there is one, which also ends the
    /// grant its access tokens belong to.
    #[tracing::instrument(skip_all)]
    pub async fn revoke_token(&self) -> Result<(), OAuth2Error> {
        let endpoint = self
            .metadata
            .revocation_endpoint
            .clone()
            .ok_or_else(|| missing_endpoint("revocation_endpoint"))?;
        let token = self
            .token()
            .ok_or(OAuth2Error::Token(TokenError::NotAcquired))?;

        let (value, hint) = match token.refresh_token() {
            Some(refresh) => (refresh, TokenTypeHint::RefreshToken),
            None => (token.access_token(), TokenTypeHint::AccessToken),
        };

        DefaultTokenRevoker::new(
            endpoint,
            self.credentials.clone(),
            self.transport.clone(),
            self.config.timeout,
        )
        .revoke(value, Some(hint))
        .await?;

        *lock(&self.token) = None;
        tracing::info!("Token revoked");
        Ok(())
    }

    /// Claims about the account that authorized the token. Prosody only
    /// serves these for tokens carrying the `openid` scope.
    pub async fn userinfo(&self) -> Result<UserInfo, OAuth2Error> {
        let endpoint = self
            .metadata
            .userinfo_endpoint
            .clone()
            .ok_or_else(|| missing_endpoint("userinfo_endpoint"))?;
        let token = self.valid_token().await?;

        DefaultUserInfoClient::new(endpoint, self.transport.clone(), self.config.timeout)
            .userinfo(&token)
            .await
    }

    /// Send a stanza to `<base_url>/rest` and return the reply.
    pub async fn xmpp<P: Serialize + ?Sized + Sync>(
        &self,
        payload: &P,
    ) -> Result<serde_json::Value, OAuth2Error> {
        self.rest("", payload).await
    }

    /// Send a payload to a path below `<base_url>/rest`, e.g.
    /// `ping/example.com`.
    pub async fn rest<P: Serialize + ?Sized + Sync>(
        &self,
        path: &str,
        payload: &P,
    ) -> Result<serde_json::Value, OAuth2Error> {
        let token = self.valid_token().await?;
        self.rest.post_json(path, &token, payload).await
    }

    /// Current token, refreshed first when it is about to expire.
    async fn valid_token(&self) -> Result<StoredToken, OAuth2Error> {
        let token = self
            .token()
            .ok_or(OAuth2Error::Token(TokenError::NotAcquired))?;

        if self.config.auto_refresh
            && token.has_refresh_token()
            && token.is_expiring_soon(self.config.refresh_threshold_secs)
        {
            tracing::debug!(
                remaining = ?token.remaining_lifetime(),
                "Access token expiring, refreshing"
            );
            return self.refresh_token().await;
        }

        if token.is_expired() {
            return Err(OAuth2Error::Token(TokenError::Expired));
        }

        Ok(token)
    }
}

impl<T: HttpTransport> std::fmt::Debug for ProsodyRestSession<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProsodyRestSession")
            .field("base_url", &self.config.base_url_str())
            .field("client_id", &self.credentials.client_id)
            .field("has_token", &lock(&self.token).is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::session_config;
    use crate::core::discovery::mock_metadata;
    use crate::core::{FixedPkceGenerator, MockHttpTransport};
    use crate::error::RestError;
    use chrono::{Duration as ChronoDuration, Utc};
    use serde_json::json;
    use std::collections::HashMap;
    use url::Url;

    const BASE: &str = "https://xmpp.example.com:5281";
    const VERIFIER: &str = "dBjftJeZ4CVP-mJ92K27uhbUJU1p1r_wW1gFWFOEjXk";

    fn config() -> SessionConfig {
        session_config()
            .base_url(BASE)
            .scope("xmpp")
            .build()
            .unwrap()
    }

    fn session(transport: Arc<MockHttpTransport>) -> ProsodyRestSession<MockHttpTransport> {
        session_with(config(), transport)
    }

    fn session_with(
        config: SessionConfig,
        transport: Arc<MockHttpTransport>,
    ) -> ProsodyRestSession<MockHttpTransport> {
        ProsodyRestSession::resume(
            config,
            mock_metadata(BASE),
            ClientCredentials::new("client-1", "secret-1"),
            transport,
        )
        .unwrap()
        .with_pkce_generator(FixedPkceGenerator::new(VERIFIER))
    }

    fn token_json(access: &str, refresh: Option<&str>) -> serde_json::Value {
        let mut body = json!({
            "access_token": access,
            "token_type": "bearer",
            "expires_in": 3600,
            "scope": "xmpp"
        });
        if let Some(refresh) = refresh {
            body["refresh_token"] = json!(refresh);
        }
        body
    }

    fn query(url: &str) -> HashMap<String, String> {
        Url::parse(url).unwrap().query_pairs().into_owned().collect()
    }

    #[tokio::test]
    async fn test_connect_discovers_and_registers() {
        let transport = Arc::new(MockHttpTransport::new());
        transport
            .queue_json_response(200, &mock_metadata(BASE))
            .queue_json_response(201, &json!({"client_id": "cid", "client_secret": "csecret"}));

        let session = ProsodyRestSession::connect_with_transport(config(), transport.clone())
            .await
            .unwrap();
        assert_eq!(session.client_id(), "cid");

        let requests = transport.get_requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(
            requests[0].url,
            format!("{}/.well-known/oauth-authorization-server", BASE)
        );
        assert_eq!(requests[1].url, format!("{}/oauth2/register", BASE));
    }

    #[tokio::test]
    async fn test_connect_fails_without_registration_endpoint() {
        let mut metadata = mock_metadata(BASE);
        metadata.registration_endpoint = None;
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_json_response(200, &metadata);

        let result = ProsodyRestSession::connect_with_transport(config(), transport.clone()).await;
        assert!(matches!(
            result,
            Err(OAuth2Error::Configuration(ConfigurationError::DiscoveryFailed { .. }))
        ));
        assert_eq!(transport.get_requests().len(), 1);
    }

    #[test]
    fn test_authorization_url_with_pkce() {
        let session = session(Arc::new(MockHttpTransport::new()));
        let auth = session.authorization_url(AuthorizationParams::default()).unwrap();

        let query = query(&auth.url);
        assert_eq!(query["client_id"], "client-1");
        assert_eq!(query["scope"], "xmpp");
        assert_eq!(query["state"], auth.state);
        assert_eq!(
            query["code_challenge"],
            "E9Melhoa2OwvFrEMTJguCHaoeK1t9URWbuGLRwbIuA8"
        );
    }

    #[test]
    fn test_authorization_url_without_s256_support() {
        let mut metadata = mock_metadata(BASE);
        metadata.code_challenge_methods_supported = vec!["plain".to_string()];
        let session = ProsodyRestSession::resume(
            config(),
            metadata,
            ClientCredentials::new("client-1", "secret-1"),
            Arc::new(MockHttpTransport::new()),
        )
        .unwrap();

        let auth = session.authorization_url(AuthorizationParams::default()).unwrap();
        assert!(!query(&auth.url).contains_key("code_challenge"));
    }

    #[tokio::test]
    async fn test_fetch_token_with_code() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_json_response(200, &token_json("access-1", Some("refresh-1")));
        let session = session(transport.clone());

        session.authorization_url(AuthorizationParams::default()).unwrap();
        let token = session
            .fetch_token(TokenRequest::Code("code-1\n".to_string()))
            .await
            .unwrap();
        assert_eq!(token.access_token(), "access-1");
        assert_eq!(session.token().unwrap().refresh_token(), Some("refresh-1"));

        let form = transport.get_last_request().unwrap().form_params();
        assert_eq!(form["code"], "code-1");
        assert_eq!(form["code_verifier"], VERIFIER);
        assert_eq!(form["redirect_uri"], "urn:ietf:wg:oauth:2.0:oob");

        // The pending authorization is consumed.
        assert!(session
            .fetch_token(TokenRequest::Code("code-1".to_string()))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_fetch_token_requires_pending_authorization() {
        let transport = Arc::new(MockHttpTransport::new());
        let session = session(transport.clone());

        let result = session.fetch_token(TokenRequest::Code("code".to_string())).await;
        assert!(matches!(
            result,
            Err(OAuth2Error::Authorization(AuthorizationError::InvalidRequest { .. }))
        ));
        assert!(transport.get_requests().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_token_callback_state_mismatch() {
        let transport = Arc::new(MockHttpTransport::new());
        let session = session(transport.clone());
        session.authorization_url(AuthorizationParams::default()).unwrap();

        let result = session
            .fetch_token(TokenRequest::Callback(
                "https://app.example.com/cb?code=c&state=forged".to_string(),
            ))
            .await;
        assert!(matches!(
            result,
            Err(OAuth2Error::Authorization(AuthorizationError::StateMismatch { .. }))
        ));
        assert!(transport.get_requests().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_token_callback_without_state() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_json_response(200, &token_json("access-1", None));
        let session = session(transport.clone());
        session.authorization_url(AuthorizationParams::default()).unwrap();

        let result = session
            .fetch_token(TokenRequest::Callback(
                "https://app.example.com/cb?code=injected".to_string(),
            ))
            .await;
        assert!(matches!(
            result,
            Err(OAuth2Error::Authorization(AuthorizationError::StateMismatch { .. }))
        ));
        assert!(transport.get_requests().is_empty());
        assert!(session.token().is_none());
    }

    #[tokio::test]
    async fn test_fetch_token_after_state_expired() {
        let transport = Arc::new(MockHttpTransport::new());
        let config = session_config()
            .base_url(BASE)
            .state_max_age(std::time::Duration::from_millis(1))
            .build()
            .unwrap();
        let session = session_with(config, transport.clone());
        let auth = session.authorization_url(AuthorizationParams::default()).unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        assert!(matches!(
            session.fetch_token(TokenRequest::Code("code".to_string())).await,
            Err(OAuth2Error::Authorization(AuthorizationError::StateExpired { .. }))
        ));
        let callback = format!("https://app.example.com/cb?code=c&state={}", auth.state);
        assert!(matches!(
            session.fetch_token(TokenRequest::Callback(callback)).await,
            Err(OAuth2Error::Authorization(AuthorizationError::StateExpired { .. }))
        ));
        assert!(transport.get_requests().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_token_keeps_requested_scopes_when_none_granted() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_json_response(
            200,
            &json!({"access_token": "access-1", "token_type": "bearer"}),
        );
        let session = session(transport);
        session
            .authorization_url(AuthorizationParams {
                scopes: Some(vec!["xmpp".to_string(), "openid".to_string()]),
                ..Default::default()
            })
            .unwrap();

        let token = session
            .fetch_token(TokenRequest::Code("code".to_string()))
            .await
            .unwrap();
        assert_eq!(token.scopes, vec!["xmpp", "openid"]);
    }

    #[tokio::test]
    async fn test_fetch_token_callback_error() {
        let session = session(Arc::new(MockHttpTransport::new()));
        session.authorization_url(AuthorizationParams::default()).unwrap();

        let result = session
            .fetch_token(TokenRequest::Callback(
                "https://app.example.com/cb?error=access_denied&error_description=No".to_string(),
            ))
            .await;
        assert!(matches!(
            result,
            Err(OAuth2Error::Authorization(AuthorizationError::AccessDenied { .. }))
        ));
    }

    #[tokio::test]
    async fn test_fetch_token_callback_with_matching_state() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_json_response(200, &token_json("access-1", None));
        let session = session(transport);

        let auth = session
            .authorization_url(AuthorizationParams {
                state: Some("known-state".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(auth.state, "known-state");

        session
            .fetch_token(TokenRequest::Callback(
                "https://app.example.com/cb?code=c&state=known-state".to_string(),
            ))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_xmpp_without_token() {
        let session = session(Arc::new(MockHttpTransport::new()));
        assert!(matches!(
            session.xmpp(&json!({"disco": true})).await,
            Err(OAuth2Error::Token(TokenError::NotAcquired))
        ));
    }

    #[tokio::test]
    async fn test_xmpp_posts_with_bearer() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_json_response(200, &json!({"type": "result", "disco": {}}));
        let session = session(transport.clone());
        session.set_token(StoredToken::new("access-1", None, None));

        let reply = session
            .xmpp(&json!({"disco": true, "to": "jabber.org"}))
            .await
            .unwrap();
        assert_eq!(reply["type"], "result");

        let request = transport.get_last_request().unwrap();
        assert_eq!(request.url, format!("{}/rest", BASE));
        assert_eq!(request.header_value("authorization"), Some("Bearer access-1"));
    }

    #[tokio::test]
    async fn test_xmpp_refreshes_expiring_token() {
        let transport = Arc::new(MockHttpTransport::new());
        transport
            .queue_json_response(200, &token_json("access-2", None))
            .queue_json_response(200, &json!({"type": "result"}));
        let session = session(transport.clone());
        session.set_token(StoredToken::new(
            "access-1",
            Some("refresh-1".to_string()),
            Some(Utc::now() + ChronoDuration::seconds(10)),
        ));

        session.xmpp(&json!({"ping": true})).await.unwrap();

        let requests = transport.get_requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].form_params()["grant_type"], "refresh_token");
        assert_eq!(
            requests[1].header_value("authorization"),
            Some("Bearer access-2")
        );
        // The server did not rotate the refresh token.
        assert_eq!(session.token().unwrap().refresh_token(), Some("refresh-1"));
    }

    #[tokio::test]
    async fn test_xmpp_with_unrepresentable_lifetime() {
        let transport = Arc::new(MockHttpTransport::new());
        let mut body = token_json("access-1", Some("refresh-1"));
        body["expires_in"] = json!(u64::MAX);
        transport
            .queue_json_response(200, &body)
            .queue_json_response(200, &json!({"type": "result"}));
        let session = session(transport.clone());

        session.authorization_url(AuthorizationParams::default()).unwrap();
        let token = session
            .fetch_token(TokenRequest::Code("code".to_string()))
            .await
            .unwrap();
        assert_eq!(token.expires_at, None);

        session.xmpp(&json!({"ping": true})).await.unwrap();
        assert_eq!(transport.get_requests().len(), 2);
    }

    #[tokio::test]
    async fn test_xmpp_expired_token_without_refresh() {
        let transport = Arc::new(MockHttpTransport::new());
        let session = session(transport.clone());
        session.set_token(StoredToken::new(
            "access-1",
            None,
            Some(Utc::now() - ChronoDuration::seconds(1)),
        ));

        assert!(matches!(
            session.xmpp(&json!({})).await,
            Err(OAuth2Error::Token(TokenError::Expired))
        ));
        assert!(transport.get_requests().is_empty());
    }

    #[tokio::test]
    async fn test_xmpp_unauthorized() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_raw_response(401, "");
        let session = session(transport);
        session.set_token(StoredToken::new("revoked", None, None));

        let err = session.xmpp(&json!({})).await.unwrap_err();
        assert!(matches!(err, OAuth2Error::Rest(RestError::Unauthorized { .. })));
        assert!(err.needs_reauth());
    }

    #[tokio::test]
    async fn test_refresh_without_refresh_token() {
        let session = session(Arc::new(MockHttpTransport::new()));
        session.set_token(StoredToken::new("access-1", None, None));
        assert!(matches!(
            session.refresh_token().await,
            Err(OAuth2Error::Token(TokenError::NoRefreshToken))
        ));
    }

    #[tokio::test]
    async fn test_revoke_token() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_raw_response(200, "");
        let session = session(transport.clone());
        session.set_token(StoredToken::new("access-1", Some("refresh-1".to_string()), None));

        session.revoke_token().await.unwrap();
        assert!(session.token().is_none());

        let request = transport.get_last_request().unwrap();
        assert_eq!(request.url, format!("{}/oauth2/revoke", BASE));
        let form = request.form_params();
        assert_eq!(form["token"], "refresh-1");
        assert_eq!(form["token_type_hint"], "refresh_token");
    }

    #[tokio::test]
    async fn test_revoke_without_endpoint() {
        let mut metadata = mock_metadata(BASE);
        metadata.revocation_endpoint = None;
        let session = ProsodyRestSession::resume(
            config(),
            metadata,
            ClientCredentials::new("client-1", "secret-1"),
            Arc::new(MockHttpTransport::new()),
        )
        .unwrap();
        session.set_token(StoredToken::new("access-1", None, None));

        match session.revoke_token().await {
            Err(OAuth2Error::Configuration(ConfigurationError::MissingEndpoint { name })) => {
                assert_eq!(name, "revocation_endpoint")
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_userinfo() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_json_response(200, &json!({"sub": "xmpp:alice@example.com"}));
        let session = session(transport);
        session.set_token(StoredToken::new("access-1", None, None));

        let info = session.userinfo().await.unwrap();
        assert_eq!(info.jid(), Some("alice@example.com"));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let session = session(Arc::new(MockHttpTransport::new()));
        session.set_token(StoredToken::new("access-1", None, None));
        let debug = format!("{:?}", session);
        assert!(debug.contains("client-1"));
        assert!(!debug.contains("secret-1"));
        assert!(!debug.contains("access-1"));
    }
}
