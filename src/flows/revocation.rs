//! Token Revocation
//!
//! RFC 7009 - OAuth 2.0 Token Revocation.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::core::HttpTransport;
use crate::error::{create_error_from_response, OAuth2Error};
use crate::flows::client_authenticated_request;
use crate::types::ClientCredentials;

/// Hint about the type of the token being revoked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenTypeHint {
    AccessToken,
    RefreshToken,
}

impl TokenTypeHint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccessToken => "access_token",
            Self::RefreshToken => "refresh_token",
        }
    }
}

/// Token revoker interface.
#[async_trait]
pub trait TokenRevoker: Send + Sync {
    /// Revoke a token.
    async fn revoke(&self, token: &str, hint: Option<TokenTypeHint>) -> Result<(), OAuth2Error>;
}

/// Default token revoker implementation.
pub struct DefaultTokenRevoker<T: HttpTransport> {
    revocation_endpoint: String,
    credentials: ClientCredentials,
    transport: Arc<T>,
    timeout: Duration,
}

impl<T: HttpTransport> DefaultTokenRevoker<T> {
    pub fn new(
        revocation_endpoint: impl Into<String>,
        credentials: ClientCredentials,
        transport: Arc<T>,
        timeout: Duration,
    ) -> Self {
        Self {
            revocation_endpoint: revocation_endpoint.into(),
            credentials,
            transport,
            timeout,
        }
    }
}

#[async_trait]
impl<T: HttpTransport> TokenRevoker for DefaultTokenRevoker<T> {
    #[tracing::instrument(skip(self, token))]
    async fn revoke(&self, token: &str, hint: Option<TokenTypeHint>) -> Result<(), OAuth2Error> {
        let mut params = vec![("token", token.to_string())];
        if let Some(hint) = hint {
            params.push(("token_type_hint", hint.as_str().to_string()));
        }

        let request = client_authenticated_request(
            &self.revocation_endpoint,
            &self.credentials,
            params,
            self.timeout,
        );

        let response = self.transport.send(request).await?;

        // Unknown or already invalid tokens are also answered with 200.
        if !response.is_success() {
            return Err(create_error_from_response(response.status, &response.body));
        }

        tracing::debug!("Token revoked");
        Ok(())
    }
}
