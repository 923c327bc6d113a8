//! Configuration Types
//!
//! Session configuration and client authentication settings.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Redirect URI for clients that cannot receive redirects; the server shows
/// the code to the user instead.
pub const OOB_REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

/// Path of the `mod_rest` endpoint, relative to the base URL.
pub const REST_PATH: &str = "/rest";

/// Default configuration values.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_REFRESH_THRESHOLD_SECS: u64 = 60;

/// Configuration for a [`crate::ProsodyRestSession`].
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Server base URL, e.g. `https://xmpp.example.com:5281`.
    pub base_url: Url,
    /// Human-readable client name shown in the consent dialog.
    pub client_name: String,
    /// Link to a page describing the client.
    pub client_uri: String,
    /// Redirect URI registered for this client.
    pub redirect_uri: String,
    /// Scopes requested when none are passed explicitly.
    pub scopes: Vec<String>,
    /// Send a PKCE challenge with authorization requests.
    pub use_pkce: bool,
    /// HTTP timeout.
    pub timeout: Duration,
    /// Refresh the access token before `mod_rest` calls when it is about
    /// to expire.
    pub auto_refresh: bool,
    /// Refresh tokens this many seconds before expiry.
    pub refresh_threshold_secs: u64,
    /// How long an authorization URL stays redeemable.
    pub state_max_age: Duration,
    /// Optional registration metadata.
    pub registration_extras: RegistrationExtras,
}

impl SessionConfig {
    /// Base URL as a string without trailing slash.
    pub fn base_url_str(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Absolute URL of a path below the base URL.
    pub fn url_for(&self, path: &str) -> String {
        debug_assert!(path.starts_with('/'));
        format!("{}{}", self.base_url_str(), path)
    }
}

/// Optional client metadata sent along with the registration request.
#[derive(Clone, Debug, Default)]
pub struct RegistrationExtras {
    pub logo_uri: Option<String>,
    pub contacts: Vec<String>,
    pub tos_uri: Option<String>,
    pub policy_uri: Option<String>,
    pub software_id: Option<String>,
    pub software_version: Option<String>,
}

/// Client authentication method at the token endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
    /// client_id and client_secret in request body.
    ClientSecretPost,
    /// HTTP Basic Authentication header.
    #[default]
    ClientSecretBasic,
    /// No client authentication (public client).
    None,
}

impl ClientAuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClientSecretPost => "client_secret_post",
            Self::ClientSecretBasic => "client_secret_basic",
            Self::None => "none",
        }
    }

    /// Parse a registration response value. Unknown methods yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "client_secret_post" => Some(Self::ClientSecretPost),
            "client_secret_basic" => Some(Self::ClientSecretBasic),
            "none" => Some(Self::None),
            _ => None,
        }
    }
}

/// Grant type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    AuthorizationCode,
    RefreshToken,
}

impl GrantType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthorizationCode => "authorization_code",
            Self::RefreshToken => "refresh_token",
        }
    }
}
