//! Token Refresh
//!
//! RFC 6749 Section 6 - Refreshing an Access Token.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::core::HttpTransport;
use crate::error::OAuth2Error;
use crate::flows::{client_authenticated_request, parse_token_response};
use crate::types::{ClientCredentials, GrantType, TokenResponse};

/// Refresh flow interface.
#[async_trait]
pub trait RefreshFlow: Send + Sync {
    /// Exchange a refresh token for a new access token.
    async fn refresh(
        &self,
        refresh_token: &str,
        scopes: Option<&[String]>,
    ) -> Result<TokenResponse, OAuth2Error>;
}

/// Refresh flow implementation.
pub struct RefreshFlowImpl<T: HttpTransport> {
    token_endpoint: String,
    credentials: ClientCredentials,
    transport: Arc<T>,
    timeout: Duration,
}

impl<T: HttpTransport> RefreshFlowImpl<T> {
    pub fn new(
        token_endpoint: impl Into<String>,
        credentials: ClientCredentials,
        transport: Arc<T>,
        timeout: Duration,
    ) -> Self {
        Self {
            token_endpoint: token_endpoint.into(),
            credentials,
            transport,
            timeout,
        }
    }
}

#[async_trait]
impl<T: HttpTransport> RefreshFlow for RefreshFlowImpl<T> {
    #[tracing::instrument(skip(self, refresh_token))]
    async fn refresh(
        &self,
        refresh_token: &str,
        scopes: Option<&[String]>,
    ) -> Result<TokenResponse, OAuth2Error> {
        let mut params = vec![
            ("grant_type", GrantType::RefreshToken.as_str().to_string()),
            ("refresh_token", refresh_token.to_string()),
        ];
        if let Some(scopes) = scopes.filter(|s| !s.is_empty()) {
            params.push(("scope", scopes.join(" ")));
        }

        let request = client_authenticated_request(
            &self.token_endpoint,
            &self.credentials,
            params,
            self.timeout,
        );

        let response = self.transport.send(request).await?;
        let token = parse_token_response(&response)?;

        tracing::debug!(expires_in = ?token.expires_in, "Refreshed access token");
        Ok(token)
    }
}
