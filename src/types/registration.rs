//! Client Registration Types
//!
//! RFC 7591 dynamic client registration as implemented by `mod_http_oauth2`.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::ClientAuthMethod;

/// Application type, which decides what redirect URIs a client may use.
///
/// `web` clients are limited to `https://` URLs on the host of
/// `client_uri`; `native` clients may use loopback URLs, custom schemes or
/// the out-of-band URN.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationType {
    Web,
    Native,
}

impl ApplicationType {
    /// `Web` for `https://` redirect URIs, `Native` for everything else.
    pub fn for_redirect_uri(redirect_uri: &str) -> Self {
        if redirect_uri.starts_with("https://") {
            Self::Web
        } else {
            Self::Native
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Native => "native",
        }
    }
}

/// Registration request body.
#[derive(Clone, Debug, Serialize)]
pub struct ClientRegistrationRequest {
    pub client_name: String,
    pub client_uri: String,
    pub redirect_uris: Vec<String>,
    pub application_type: ApplicationType,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub grant_types: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub response_types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_endpoint_auth_method: Option<ClientAuthMethod>,
    /// Space-separated scopes the client promises to restrict itself to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub contacts: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tos_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub software_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub software_version: Option<String>,
}

/// Registration response.
///
/// Prosody echoes the submitted metadata and adds the issued credentials.
/// `client_id` and `client_secret` are optional here so that their absence
/// can be reported by name.
#[derive(Clone, Debug, Deserialize)]
pub struct ClientRegistrationResponse {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<SecretString>,
    #[serde(default)]
    pub client_id_issued_at: Option<i64>,
    /// `0` means the secret does not expire.
    #[serde(default)]
    pub client_secret_expires_at: Option<i64>,
    #[serde(default)]
    pub token_endpoint_auth_method: Option<String>,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub application_type: Option<ApplicationType>,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
    #[serde(default)]
    pub grant_types: Vec<String>,
    #[serde(default)]
    pub response_types: Vec<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Credentials of a registered client.
#[derive(Clone)]
pub struct ClientCredentials {
    /// Client identifier.
    pub client_id: String,
    /// Client secret.
    pub client_secret: SecretString,
    /// How to authenticate at the token endpoint.
    pub auth_method: ClientAuthMethod,
    /// Secret expiry as a Unix timestamp, `None` if it never expires.
    pub expires_at: Option<i64>,
}

impl ClientCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: SecretString::new(client_secret.into()),
            auth_method: ClientAuthMethod::default(),
            expires_at: None,
        }
    }

    pub fn with_auth_method(mut self, auth_method: ClientAuthMethod) -> Self {
        self.auth_method = auth_method;
        self
    }

    /// Whether the server-assigned secret expiry has passed.
    pub fn is_secret_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| expires_at <= chrono::Utc::now().timestamp())
    }
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("auth_method", &self.auth_method)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
