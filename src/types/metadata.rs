//! Authorization Server Metadata
//!
//! RFC 8414 document served at `/.well-known/oauth-authorization-server`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Authorization server metadata.
///
/// The three endpoints needed for registration and the authorization-code
/// grant are optional here so that a missing one can be reported by name
/// instead of as a generic decoding failure.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AuthorizationServerMetadata {
    /// Issuer identifier.
    #[serde(default)]
    pub issuer: Option<String>,
    /// Authorization endpoint URL.
    #[serde(default)]
    pub authorization_endpoint: Option<String>,
    /// Token endpoint URL.
    #[serde(default)]
    pub token_endpoint: Option<String>,
    /// Dynamic client registration endpoint (RFC 7591).
    #[serde(default)]
    pub registration_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userinfo_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revocation_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub introspection_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwks_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_documentation: Option<String>,
    #[serde(default)]
    pub scopes_supported: Vec<String>,
    #[serde(default)]
    pub response_types_supported: Vec<String>,
    #[serde(default)]
    pub grant_types_supported: Vec<String>,
    #[serde(default)]
    pub token_endpoint_auth_methods_supported: Vec<String>,
    #[serde(default)]
    pub code_challenge_methods_supported: Vec<String>,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Endpoints required for registration and the authorization-code grant,
/// validated during discovery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderEndpoints {
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub registration_endpoint: String,
}

impl AuthorizationServerMetadata {
    /// Required endpoints, if all of them are present and non-empty.
    pub fn endpoints(&self) -> Option<ProviderEndpoints> {
        let get = |v: &Option<String>| v.as_ref().filter(|s| !s.is_empty()).cloned();
        Some(ProviderEndpoints {
            authorization_endpoint: get(&self.authorization_endpoint)?,
            token_endpoint: get(&self.token_endpoint)?,
            registration_endpoint: get(&self.registration_endpoint)?,
        })
    }

    /// Whether the server advertises S256 PKCE support. An empty list means
    /// the server did not say.
    pub fn supports_s256(&self) -> bool {
        self.code_challenge_methods_supported.is_empty()
            || self
                .code_challenge_methods_supported
                .iter()
                .any(|m| m == "S256")
    }
}
