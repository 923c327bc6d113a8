//! Integration tests for the full authorization flow

use super::*;
use pretty_assertions::assert_eq;
use prosody_rest_oauth::{AuthorizationParams, TokenRequest};
use std::collections::HashMap;
use url::Url;
use wiremock::matchers::{body_json, body_partial_json, body_string_contains, header, method, path};

fn query(url: &str) -> HashMap<String, String> {
    Url::parse(url)
        .expect("authorization URL")
        .query_pairs()
        .into_owned()
        .collect()
}

#[tokio::test]
async fn test_discover_register_authorize_exchange_and_post() {
    let server = setup_mock_server().await;
    mount_metadata(&server).await;

    Mock::given(method("POST"))
        .and(path("/oauth2/register"))
        .and(body_partial_json(json!({
            "client_name": "Integration",
            "client_uri": "https://modules.prosody.im/mod_rest",
            "redirect_uris": ["urn:ietf:wg:oauth:2.0:oob"],
            "application_type": "native"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "client_id": CLIENT_ID,
            "client_secret": CLIENT_SECRET
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = connect(&server).await;
    assert_eq!(session.client_id(), CLIENT_ID);

    let auth = session
        .authorization_url(AuthorizationParams::default())
        .expect("authorization URL");
    assert!(auth.url.starts_with(&format!("{}/oauth2/authorize?", server.uri())));

    let params = query(&auth.url);
    assert_eq!(params["response_type"], "code");
    assert_eq!(params["client_id"], CLIENT_ID);
    assert_eq!(params["redirect_uri"], "urn:ietf:wg:oauth:2.0:oob");
    assert_eq!(params["scope"], "xmpp");
    assert_eq!(params["state"], auth.state);
    assert_eq!(params["code_challenge_method"], "S256");

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(header("Authorization", BASIC_AUTH))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=the-code"))
        .and(body_string_contains("code_verifier="))
        .respond_with(success_response(token_body(
            "secret-token:access",
            Some("secret-token:refresh"),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let token = session
        .fetch_token(TokenRequest::from_input("the-code\n"))
        .await
        .expect("token");
    assert_eq!(token.access_token(), "secret-token:access");
    assert_eq!(token.scopes, vec!["xmpp".to_string()]);

    let payload = json!({"disco": true, "to": "jabber.org"});
    Mock::given(method("POST"))
        .and(path("/rest"))
        .and(header("Authorization", "Bearer secret-token:access"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(&payload))
        .respond_with(success_response(json!({
            "type": "result",
            "from": "jabber.org",
            "disco": {"identities": [{"category": "server", "type": "im"}]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reply = session.xmpp(&payload).await.expect("mod_rest reply");
    assert_eq!(reply["type"], "result");
    assert_eq!(reply["disco"]["identities"][0]["category"], "server");
}

#[tokio::test]
async fn test_web_redirect_with_callback_url() {
    let server = setup_mock_server().await;
    mount_metadata(&server).await;

    Mock::given(method("POST"))
        .and(path("/oauth2/register"))
        .and(body_partial_json(json!({"application_type": "web"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "client_id": CLIENT_ID,
            "client_secret": CLIENT_SECRET
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains("code=callback-code"))
        .and(body_string_contains(
            "redirect_uri=https%3A%2F%2Fapp.example.com%2Fcallback",
        ))
        .respond_with(success_response(token_body("web-access", None)))
        .expect(1)
        .mount(&server)
        .await;

    let config = session_config()
        .base_url(server.uri())
        .redirect_uri("https://app.example.com/callback")
        .build()
        .expect("valid config");
    let session = ProsodyRestSession::connect(config).await.expect("connect");

    let auth = session
        .authorization_url(AuthorizationParams::default())
        .expect("authorization URL");
    let callback = format!(
        "https://app.example.com/callback?code=callback-code&state={}",
        auth.state
    );

    let token = session
        .fetch_token(TokenRequest::from_input(&callback))
        .await
        .expect("token");
    assert_eq!(token.access_token(), "web-access");
}

#[tokio::test]
async fn test_refresh_revoke_and_userinfo() {
    let server = setup_mock_server().await;
    mount_provider(&server).await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .respond_with(success_response(token_body("access-1", Some("refresh-1"))))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh-1"))
        .respond_with(success_response(token_body("access-2", None)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/oauth2/userinfo"))
        .and(header("Authorization", "Bearer access-2"))
        .respond_with(success_response(json!({
            "iss": server.uri(),
            "sub": "xmpp:alice@example.com"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth2/revoke"))
        .and(header("Authorization", BASIC_AUTH))
        .and(body_string_contains("token=refresh-1"))
        .and(body_string_contains("token_type_hint=refresh_token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let session = connect(&server).await;
    session
        .authorization_url(AuthorizationParams::default())
        .expect("authorization URL");
    session
        .fetch_token(TokenRequest::Code("code".to_string()))
        .await
        .expect("token");

    let refreshed = session.refresh_token().await.expect("refresh");
    assert_eq!(refreshed.access_token(), "access-2");
    assert_eq!(refreshed.refresh_token(), Some("refresh-1"));

    let info = session.userinfo().await.expect("userinfo");
    assert_eq!(info.jid(), Some("alice@example.com"));

    session.revoke_token().await.expect("revoke");
    assert!(session.token().is_none());
}

#[tokio::test]
async fn test_one_way_stanza_returns_null() {
    let server = setup_mock_server().await;
    mount_provider(&server).await;

    Mock::given(method("POST"))
        .and(path("/rest/message/chat/bob@example.com"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let session = connect(&server).await;
    session.set_token(prosody_rest_oauth::StoredToken::new("access", None, None));

    let reply = session
        .rest("message/chat/bob@example.com", &json!({"body": "Hello"}))
        .await
        .expect("accepted");
    assert!(reply.is_null());
}
