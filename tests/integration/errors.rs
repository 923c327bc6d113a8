//! Integration tests for error handling

use super::*;
use prosody_rest_oauth::{
    AuthorizationParams, ConfigurationError, OAuth2Error, ProtocolError, ProviderError, RestError,
    StoredToken, TokenRequest,
};
use wiremock::matchers::{method, path};

#[tokio::test]
async fn test_discovery_not_found() {
    let server = setup_mock_server().await;

    let result = ProsodyRestSession::connect(config(&server)).await;
    assert!(matches!(
        result,
        Err(OAuth2Error::Configuration(ConfigurationError::DiscoveryFailed { .. }))
    ));
}

#[tokio::test]
async fn test_discovery_redirect_is_not_followed() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/.well-known/oauth-authorization-server"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", "https://elsewhere.example/"),
        )
        .mount(&server)
        .await;

    match ProsodyRestSession::connect(config(&server)).await {
        Err(OAuth2Error::Protocol(ProtocolError::UnexpectedRedirect { location })) => {
            assert_eq!(location, "https://elsewhere.example/");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_metadata_without_token_endpoint() {
    let server = setup_mock_server().await;
    let mut document = metadata(&server.uri());
    document
        .as_object_mut()
        .expect("object")
        .remove("token_endpoint");

    Mock::given(method("GET"))
        .and(path("/.well-known/oauth-authorization-server"))
        .respond_with(success_response(document))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth2/register"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    match ProsodyRestSession::connect(config(&server)).await {
        Err(OAuth2Error::Configuration(ConfigurationError::DiscoveryFailed { message })) => {
            assert!(message.contains("token_endpoint"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_registration_rejected_with_prosody_error() {
    let server = setup_mock_server().await;
    mount_metadata(&server).await;

    Mock::given(method("POST"))
        .and(path("/oauth2/register"))
        .respond_with(error_response(
            400,
            json!({
                "type": "error",
                "code": 400,
                "error": {
                    "type": "modify",
                    "condition": "bad-request",
                    "text": "Invalid redirect URI",
                    "extra": {"error": "invalid_redirect_uri"}
                }
            }),
        ))
        .mount(&server)
        .await;

    let result = ProsodyRestSession::connect(config(&server)).await;
    assert!(matches!(
        result,
        Err(OAuth2Error::Provider(ProviderError::InvalidRedirectUri { .. }))
    ));
}

#[tokio::test]
async fn test_registration_without_secret() {
    let server = setup_mock_server().await;
    mount_metadata(&server).await;

    Mock::given(method("POST"))
        .and(path("/oauth2/register"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"client_id": "public"})))
        .mount(&server)
        .await;

    assert!(matches!(
        ProsodyRestSession::connect(config(&server)).await,
        Err(OAuth2Error::Protocol(ProtocolError::MissingField { .. }))
    ));
}

#[tokio::test]
async fn test_token_exchange_invalid_grant() {
    let server = setup_mock_server().await;
    mount_provider(&server).await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(error_response(
            400,
            json!({"error": "invalid_grant", "error_description": "Invalid authorization code"}),
        ))
        .mount(&server)
        .await;

    let session = connect(&server).await;
    session
        .authorization_url(AuthorizationParams::default())
        .expect("authorization URL");

    let err = session
        .fetch_token(TokenRequest::Code("wrong".to_string()))
        .await
        .expect_err("invalid grant");
    assert!(matches!(err, OAuth2Error::Provider(ProviderError::InvalidGrant { .. })));
    assert!(session.token().is_none());
}

#[tokio::test]
async fn test_rest_unauthorized_and_forbidden() {
    let server = setup_mock_server().await;
    mount_provider(&server).await;

    Mock::given(method("POST"))
        .and(path("/rest"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest"))
        .respond_with(error_response(
            403,
            json!({
                "type": "error",
                "code": 403,
                "error": {"type": "auth", "condition": "forbidden", "text": "Insufficient scope"}
            }),
        ))
        .mount(&server)
        .await;

    let session = connect(&server).await;
    session.set_token(StoredToken::new("stale", None, None));

    let err = session.xmpp(&json!({"ping": true})).await.expect_err("401");
    assert!(matches!(err, OAuth2Error::Rest(RestError::Unauthorized { .. })));

    match session.xmpp(&json!({"ping": true})).await {
        Err(OAuth2Error::Rest(RestError::Failed {
            status,
            condition,
            text,
        })) => {
            assert_eq!(status, 403);
            assert_eq!(condition.as_deref(), Some("forbidden"));
            assert_eq!(text.as_deref(), Some("Insufficient scope"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}
