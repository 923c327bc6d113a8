//! Integration tests using WireMock
//!
//! These tests run the session against a mock Prosody server over real HTTP:
//! metadata discovery, client registration, the authorization-code grant and
//! `mod_rest` requests.

pub mod errors;
pub mod session_flow;

use prosody_rest_oauth::{session_config, ProsodyRestSession, SessionConfig};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const CLIENT_ID: &str = "test-client";
pub const CLIENT_SECRET: &str = "test-secret";

/// `Basic base64("test-client:test-secret")`
pub const BASIC_AUTH: &str = "Basic dGVzdC1jbGllbnQ6dGVzdC1zZWNyZXQ=";

/// Helper to create a mock server
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Metadata document as served by mod_http_oauth2.
pub fn metadata(base: &str) -> Value {
    json!({
        "issuer": base,
        "authorization_endpoint": format!("{}/oauth2/authorize", base),
        "token_endpoint": format!("{}/oauth2/token", base),
        "registration_endpoint": format!("{}/oauth2/register", base),
        "userinfo_endpoint": format!("{}/oauth2/userinfo", base),
        "revocation_endpoint": format!("{}/oauth2/revoke", base),
        "scopes_supported": ["openid", "xmpp"],
        "response_types_supported": ["code"],
        "grant_types_supported": ["authorization_code", "refresh_token"],
        "token_endpoint_auth_methods_supported": ["client_secret_basic", "client_secret_post"],
        "code_challenge_methods_supported": ["S256"]
    })
}

/// Mount the metadata document.
pub async fn mount_metadata(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/.well-known/oauth-authorization-server"))
        .respond_with(success_response(metadata(&server.uri())))
        .mount(server)
        .await;
}

/// Mount metadata and a registration endpoint issuing the test credentials.
pub async fn mount_provider(server: &MockServer) {
    mount_metadata(server).await;

    Mock::given(method("POST"))
        .and(path("/oauth2/register"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "client_id": CLIENT_ID,
            "client_secret": CLIENT_SECRET,
            "client_secret_expires_at": 0,
            "client_id_issued_at": 1700000000
        })))
        .mount(server)
        .await;
}

pub fn config(server: &MockServer) -> SessionConfig {
    session_config()
        .base_url(server.uri())
        .client_name("Integration")
        .scope("xmpp")
        .build()
        .expect("valid config")
}

/// Connect a session to a server with the provider mocks mounted.
pub async fn connect(server: &MockServer) -> ProsodyRestSession {
    ProsodyRestSession::connect(config(server))
        .await
        .expect("connect")
}

pub fn token_body(access: &str, refresh: Option<&str>) -> Value {
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

/// Helper to create error response templates
pub fn error_response(status: u16, error_body: Value) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(error_body)
}

/// Helper to create success response templates
pub fn success_response(body: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}
