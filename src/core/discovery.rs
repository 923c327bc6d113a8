//! Authorization Server Discovery
//!
//! RFC 8414 metadata lookup at `/.well-known/oauth-authorization-server`.

use async_trait::async_trait;
use std::sync::Arc;
use url::Url;

use crate::core::transport::{HttpRequest, HttpTransport};
use crate::error::{ConfigurationError, OAuth2Error};
use crate::types::{AuthorizationServerMetadata, ProviderEndpoints};

/// Well-known path of the metadata document.
pub const WELL_KNOWN_PATH: &str = "/.well-known/oauth-authorization-server";

/// Metadata URL for a server base URL.
pub fn discovery_url(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), WELL_KNOWN_PATH)
}

/// Discovery client interface (for dependency injection).
#[async_trait]
pub trait DiscoveryClient: Send + Sync {
    /// Fetch and validate the metadata document of a server.
    async fn discover(&self, base_url: &str) -> Result<AuthorizationServerMetadata, OAuth2Error>;
}

/// Default discovery client implementation.
pub struct DefaultDiscoveryClient<T: HttpTransport> {
    transport: Arc<T>,
}

impl<T: HttpTransport> DefaultDiscoveryClient<T> {
    /// Create new discovery client.
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }
}

fn discovery_failed(message: impl Into<String>) -> OAuth2Error {
    OAuth2Error::Configuration(ConfigurationError::DiscoveryFailed {
        message: message.into(),
    })
}

/// Check that the metadata carries every endpoint the session needs and that
/// each is an absolute URL.
pub fn validate_metadata(
    metadata: &AuthorizationServerMetadata,
) -> Result<ProviderEndpoints, OAuth2Error> {
    let required = [
        ("registration_endpoint", &metadata.registration_endpoint),
        ("authorization_endpoint", &metadata.authorization_endpoint),
        ("token_endpoint", &metadata.token_endpoint),
    ];

    for (name, value) in required {
        match value.as_deref() {
            None | Some("") => {
                return Err(discovery_failed(format!(
                    "metadata document is missing {}",
                    name
                )))
            }
            Some(url) => {
                Url::parse(url).map_err(|_| {
                    OAuth2Error::Configuration(ConfigurationError::InvalidEndpoint {
                        url: url.to_string(),
                    })
                })?;
            }
        }
    }

    metadata
        .endpoints()
        .ok_or_else(|| discovery_failed("metadata document is missing endpoints"))
}

#[async_trait]
impl<T: HttpTransport> DiscoveryClient for DefaultDiscoveryClient<T> {
    #[tracing::instrument(skip(self))]
    async fn discover(&self, base_url: &str) -> Result<AuthorizationServerMetadata, OAuth2Error> {
        let url = discovery_url(base_url);
        tracing::debug!(%url, "Fetching authorization server metadata");

        let response = self
            .transport
            .send(HttpRequest::get(url).accept_json())
            .await?;

        if response.status != 200 {
            return Err(discovery_failed(format!(
                "metadata request failed with status {}",
                response.status
            )));
        }

        let metadata: AuthorizationServerMetadata = response.json()?;
        validate_metadata(&metadata)?;

        let normalized_base = base_url.trim_end_matches('/');
        match metadata.issuer.as_deref().map(|i| i.trim_end_matches('/')) {
            Some(issuer) if issuer != normalized_base => {
                tracing::warn!(
                    issuer,
                    base_url = normalized_base,
                    "Issuer differs from the base URL"
                );
            }
            None => tracing::warn!("Metadata document has no issuer"),
            _ => {}
        }

        Ok(metadata)
    }
}

#[cfg(test)]
pub(crate) fn mock_metadata(base_url: &str) -> AuthorizationServerMetadata {
    let base = base_url.trim_end_matches('/');
    AuthorizationServerMetadata {
        issuer: Some(base.to_string()),
        authorization_endpoint: Some(format!("{}/oauth2/authorize", base)),
        token_endpoint: Some(format!("{}/oauth2/token", base)),
        registration_endpoint: Some(format!("{}/oauth2/register", base)),
        userinfo_endpoint: Some(format!("{}/oauth2/userinfo", base)),
        revocation_endpoint: Some(format!("{}/oauth2/revoke", base)),
        scopes_supported: vec!["xmpp".to_string(), "openid".to_string()],
        code_challenge_methods_supported: vec!["S256".to_string()],
        ..Default::default()
    }
}
