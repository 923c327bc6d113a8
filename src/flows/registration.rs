//! Dynamic Client Registration
//!
//! RFC 7591 registration against the server's `registration_endpoint`.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::core::{HttpRequest, HttpTransport};
use crate::error::{create_error_from_response, OAuth2Error, ProtocolError};
use crate::types::{
    ApplicationType, ClientAuthMethod, ClientCredentials, ClientRegistrationRequest,
    ClientRegistrationResponse, GrantType, SessionConfig,
};

/// Registration metadata for a session configuration.
///
/// The application type follows the redirect URI: `web` for `https://`,
/// `native` otherwise.
pub fn build_registration_request(config: &SessionConfig) -> ClientRegistrationRequest {
    let extras = &config.registration_extras;

    ClientRegistrationRequest {
        client_name: config.client_name.clone(),
        client_uri: config.client_uri.clone(),
        redirect_uris: vec![config.redirect_uri.clone()],
        application_type: ApplicationType::for_redirect_uri(&config.redirect_uri),
        grant_types: vec![
            GrantType::AuthorizationCode.as_str().to_string(),
            GrantType::RefreshToken.as_str().to_string(),
        ],
        response_types: vec!["code".to_string()],
        token_endpoint_auth_method: None,
        scope: (!config.scopes.is_empty()).then(|| config.scopes.join(" ")),
        logo_uri: extras.logo_uri.clone(),
        contacts: extras.contacts.clone(),
        tos_uri: extras.tos_uri.clone(),
        policy_uri: extras.policy_uri.clone(),
        software_id: extras.software_id.clone(),
        software_version: extras.software_version.clone(),
    }
}

/// Client registrar interface.
#[async_trait]
pub trait ClientRegistrar: Send + Sync {
    /// Register a client and return its credentials.
    async fn register(
        &self,
        registration_endpoint: &str,
        request: &ClientRegistrationRequest,
    ) -> Result<ClientCredentials, OAuth2Error>;
}

/// Default registrar implementation.
pub struct DefaultClientRegistrar<T: HttpTransport> {
    transport: Arc<T>,
    timeout: Duration,
}

impl<T: HttpTransport> DefaultClientRegistrar<T> {
    pub fn new(transport: Arc<T>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }
}

fn missing(field: &str) -> OAuth2Error {
    OAuth2Error::Protocol(ProtocolError::MissingField {
        field: field.to_string(),
    })
}

/// Extract credentials from a registration response.
pub fn credentials_from_response(
    response: ClientRegistrationResponse,
) -> Result<ClientCredentials, OAuth2Error> {
    let client_id = response
        .client_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| missing("client_id"))?;
    let client_secret = response.client_secret.ok_or_else(|| missing("client_secret"))?;

    let auth_method = match response.token_endpoint_auth_method.as_deref() {
        None => ClientAuthMethod::default(),
        Some(method) => ClientAuthMethod::parse(method).unwrap_or_else(|| {
            tracing::warn!(method, "Unsupported token endpoint auth method, using client_secret_basic");
            ClientAuthMethod::default()
        }),
    };

    Ok(ClientCredentials {
        client_id,
        client_secret,
        auth_method,
        expires_at: response.client_secret_expires_at.filter(|&t| t != 0),
    })
}

#[async_trait]
impl<T: HttpTransport> ClientRegistrar for DefaultClientRegistrar<T> {
    #[tracing::instrument(skip(self, request), fields(client_name = %request.client_name))]
    async fn register(
        &self,
        registration_endpoint: &str,
        request: &ClientRegistrationRequest,
    ) -> Result<ClientCredentials, OAuth2Error> {
        let http_request = HttpRequest::post(registration_endpoint)
            .accept_json()
            .json(request)?
            .timeout(self.timeout);

        let response = self.transport.send(http_request).await?;

        if response.status != 200 && response.status != 201 {
            return Err(create_error_from_response(response.status, &response.body));
        }

        let registration: ClientRegistrationResponse = response.json()?;
        let credentials = credentials_from_response(registration)?;

        tracing::info!(
            client_id = %credentials.client_id,
            auth_method = credentials.auth_method.as_str(),
            "Registered OAuth client"
        );

        Ok(credentials)
    }
}
