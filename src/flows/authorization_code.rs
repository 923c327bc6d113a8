//! Authorization Code Flow
//!
//! RFC 6749 Section 4.1 - Authorization Code Grant, with optional PKCE.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::core::HttpTransport;
use crate::error::{ConfigurationError, OAuth2Error};
use crate::flows::{client_authenticated_request, parse_token_response};
use crate::types::{
    AuthorizationParams, AuthorizationUrl, ClientCredentials, CodeExchangeRequest, GrantType,
    PkceParams, TokenResponse,
};

/// Authorization Code Flow interface.
#[async_trait]
pub trait AuthorizationCodeFlow: Send + Sync {
    /// Build the URL the user opens to authorize the client.
    fn build_authorization_url(
        &self,
        params: &AuthorizationParams,
        scopes: &[String],
        state: &str,
        pkce: Option<&PkceParams>,
    ) -> Result<AuthorizationUrl, OAuth2Error>;

    /// Exchange authorization code for tokens.
    async fn exchange_code(&self, request: CodeExchangeRequest) -> Result<TokenResponse, OAuth2Error>;
}

/// Authorization Code Flow implementation.
pub struct AuthorizationCodeFlowImpl<T: HttpTransport> {
    authorization_endpoint: String,
    token_endpoint: String,
    redirect_uri: String,
    credentials: ClientCredentials,
    transport: Arc<T>,
    timeout: Duration,
}

impl<T: HttpTransport> AuthorizationCodeFlowImpl<T> {
    pub fn new(
        authorization_endpoint: impl Into<String>,
        token_endpoint: impl Into<String>,
        redirect_uri: impl Into<String>,
        credentials: ClientCredentials,
        transport: Arc<T>,
        timeout: Duration,
    ) -> Self {
        Self {
            authorization_endpoint: authorization_endpoint.into(),
            token_endpoint: token_endpoint.into(),
            redirect_uri: redirect_uri.into(),
            credentials,
            transport,
            timeout,
        }
    }
}

#[async_trait]
impl<T: HttpTransport> AuthorizationCodeFlow for AuthorizationCodeFlowImpl<T> {
    fn build_authorization_url(
        &self,
        params: &AuthorizationParams,
        scopes: &[String],
        state: &str,
        pkce: Option<&PkceParams>,
    ) -> Result<AuthorizationUrl, OAuth2Error> {
        let mut url = Url::parse(&self.authorization_endpoint).map_err(|_| {
            OAuth2Error::Configuration(ConfigurationError::InvalidEndpoint {
                url: self.authorization_endpoint.clone(),
            })
        })?;

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("response_type", "code")
                .append_pair("client_id", &self.credentials.client_id)
                .append_pair("redirect_uri", &self.redirect_uri);

            if !scopes.is_empty() {
                query.append_pair("scope", &scopes.join(" "));
            }

            query.append_pair("state", state);

            if let Some(pkce) = pkce {
                query
                    .append_pair("code_challenge", &pkce.code_challenge)
                    .append_pair("code_challenge_method", pkce.code_challenge_method.as_str());
            }
            if let Some(prompt) = &params.prompt {
                query.append_pair("prompt", prompt.as_str());
            }
            if let Some(login_hint) = &params.login_hint {
                query.append_pair("login_hint", login_hint);
            }

            let mut extra: Vec<_> = params.extra_params.iter().collect();
            extra.sort();
            for (key, value) in extra {
                query.append_pair(key, value);
            }
        }

        Ok(AuthorizationUrl {
            url: url.into(),
            state: state.to_string(),
        })
    }

    #[tracing::instrument(skip(self, request))]
    async fn exchange_code(&self, request: CodeExchangeRequest) -> Result<TokenResponse, OAuth2Error> {
        let mut params = vec![
            ("grant_type", GrantType::AuthorizationCode.as_str().to_string()),
            ("code", request.code),
            ("redirect_uri", request.redirect_uri),
        ];
        if let Some(verifier) = request.code_verifier {
            params.push(("code_verifier", verifier));
        }

        let http_request = client_authenticated_request(
            &self.token_endpoint,
            &self.credentials,
            params,
            self.timeout,
        );

        let response = self.transport.send(http_request).await?;
        let token = parse_token_response(&response)?;

        tracing::debug!(
            expires_in = ?token.expires_in,
            scope = ?token.scope,
            has_refresh_token = token.refresh_token.is_some(),
            "Exchanged authorization code"
        );

        Ok(token)
    }
}
