//! Error Types
//!
//! Error hierarchy for discovery, registration, authorization and `mod_rest`
//! calls, plus mapping of the error bodies Prosody sends back.

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Root error type.
#[derive(Error, Debug)]
pub enum OAuth2Error {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Authorization error: {0}")]
    Authorization(#[from] AuthorizationError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("REST error: {0}")]
    Rest(#[from] RestError),
}

impl OAuth2Error {
    /// Get error code for telemetry.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "PROSODY_CONFIG",
            Self::Authorization(_) => "PROSODY_AUTH",
            Self::Token(_) => "PROSODY_TOKEN",
            Self::Network(_) => "PROSODY_NETWORK",
            Self::Protocol(_) => "PROSODY_PROTOCOL",
            Self::Provider(_) => "PROSODY_PROVIDER",
            Self::Rest(_) => "PROSODY_REST",
        }
    }

    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_retryable(),
            Self::Provider(ProviderError::ServerError { .. }) => true,
            Self::Provider(ProviderError::TemporarilyUnavailable { .. }) => true,
            Self::Rest(RestError::Failed { status, .. }) => *status >= 500,
            _ => false,
        }
    }

    /// Check if error requires the user to go through authorization again.
    pub fn needs_reauth(&self) -> bool {
        matches!(
            self,
            Self::Token(TokenError::Expired)
                | Self::Token(TokenError::NotAcquired)
                | Self::Token(TokenError::NoRefreshToken)
                | Self::Provider(ProviderError::InvalidGrant { .. })
                | Self::Authorization(AuthorizationError::AccessDenied { .. })
                | Self::Rest(RestError::Unauthorized { .. })
        )
    }
}

/// Configuration error.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Missing required field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid endpoint URL: {url}")]
    InvalidEndpoint { url: String },

    #[error("Server does not advertise {name}")]
    MissingEndpoint { name: String },

    #[error("Discovery failed: {message}")]
    DiscoveryFailed { message: String },
}

/// Authorization callback error.
#[derive(Error, Debug)]
pub enum AuthorizationError {
    #[error("Access denied by user")]
    AccessDenied {
        error_description: Option<String>,
        error_uri: Option<String>,
    },

    #[error("State parameter mismatch (possible CSRF attack)")]
    StateMismatch { expected: String, received: String },

    #[error("State parameter expired")]
    StateExpired { state: String },

    #[error("Invalid request: {message}")]
    InvalidRequest {
        message: String,
        error_uri: Option<String>,
    },
}

/// Token-related error.
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("No access token, authorize first")]
    NotAcquired,

    #[error("Token expired")]
    Expired,

    #[error("No refresh token available")]
    NoRefreshToken,

    #[error("Unsupported token type: {token_type}")]
    UnsupportedType { token_type: String },
}

/// Network/transport error.
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("Request timeout after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("TLS error: {message}")]
    TlsError { message: String },

    #[error("HTTP client setup failed: {message}")]
    ClientSetup { message: String },
}

impl NetworkError {
    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::TlsError { .. } | Self::ClientSetup { .. })
    }
}

/// Protocol/response parsing error.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Unexpected redirect to: {location}")]
    UnexpectedRedirect { location: String },

    #[error("Response too large: {size} bytes")]
    ResponseTooLarge { size: usize },

    #[error("Invalid JSON: {message}")]
    InvalidJson { message: String },
}

/// Error reported by the authorization server (`mod_http_oauth2`).
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Invalid client credentials")]
    InvalidClient { error_description: Option<String> },

    #[error("Invalid client metadata: {message}")]
    InvalidClientMetadata { message: String },

    #[error("Invalid redirect URI: {message}")]
    InvalidRedirectUri { message: String },

    #[error("Invalid grant: {message}")]
    InvalidGrant { message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Invalid scope: {scope}")]
    InvalidScope { scope: String },

    #[error("Unauthorized client for this grant type")]
    UnauthorizedClient { error_description: Option<String> },

    #[error("Unsupported grant type: {grant_type}")]
    UnsupportedGrantType { grant_type: String },

    #[error("Access denied: {message}")]
    AccessDenied { message: String },

    #[error("Server error: {message}")]
    ServerError { message: String },

    #[error("Server temporarily unavailable")]
    TemporarilyUnavailable { retry_after: Option<Duration> },
}

/// Error returned by `mod_rest`.
#[derive(Error, Debug)]
pub enum RestError {
    #[error("Unauthorized: {}", .text.as_deref().unwrap_or("token rejected"))]
    Unauthorized { text: Option<String> },

    #[error("HTTP {status}: {}", describe(.condition.as_deref(), .text.as_deref()))]
    Failed {
        status: u16,
        condition: Option<String>,
        text: Option<String>,
    },
}

fn describe(condition: Option<&str>, text: Option<&str>) -> String {
    match (condition, text) {
        (Some(c), Some(t)) => format!("{} ({})", t, c),
        (Some(c), None) => c.to_string(),
        (None, Some(t)) => t.to_string(),
        (None, None) => "request failed".to_string(),
    }
}

/// Result type for this crate.
pub type OAuth2Result<T> = Result<T, OAuth2Error>;

/// OAuth 2.0 error response (RFC 6749 Section 5.2).
#[derive(Debug, Clone, Deserialize)]
pub struct OAuth2ErrorResponse {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub error_uri: Option<String>,
}

/// Prosody `util.error` envelope, e.g.
///
/// ```json
/// {
///   "error": {
///     "type": "modify",
///     "condition": "bad-request",
///     "text": "Invalid client metadata",
///     "extra": { "error": "invalid_client_metadata" }
///   },
///   "type": "error",
///   "code": 400
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ProsodyErrorResponse {
    pub error: ProsodyErrorDetails,
}

/// See [`ProsodyErrorResponse`].
#[derive(Debug, Clone, Deserialize)]
pub struct ProsodyErrorDetails {
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub extra: Option<serde_json::Value>,
}

impl ProsodyErrorResponse {
    /// Flatten into the RFC 6749 shape. OAuth error codes carried in
    /// `extra` win over the XMPP condition.
    pub fn into_oauth2(self) -> OAuth2ErrorResponse {
        let details = self.error;
        let extra_str = |key: &str| {
            details
                .extra
                .as_ref()
                .and_then(|e| e.get(key))
                .and_then(|v| v.as_str())
                .map(String::from)
        };

        let error = extra_str("error")
            .or_else(|| details.condition.clone())
            .unwrap_or_else(|| "server_error".to_string());
        let error_description = extra_str("error_description").or_else(|| details.text.clone());

        OAuth2ErrorResponse {
            error,
            error_description,
            error_uri: extra_str("error_uri"),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    OAuth2(OAuth2ErrorResponse),
    Prosody(ProsodyErrorResponse),
}

/// Parse error response from HTTP body, accepting both error shapes.
pub fn parse_error_response(body: &str) -> Option<OAuth2ErrorResponse> {
    match serde_json::from_str::<ErrorBody>(body).ok()? {
        ErrorBody::OAuth2(response) => Some(response),
        ErrorBody::Prosody(response) => Some(response.into_oauth2()),
    }
}

/// Map an authorization server error response to an error type.
pub fn map_provider_error(response: &OAuth2ErrorResponse) -> ProviderError {
    let description = |fallback: &str| {
        response
            .error_description
            .clone()
            .unwrap_or_else(|| fallback.to_string())
    };

    match response.error.as_str() {
        "invalid_client" => ProviderError::InvalidClient {
            error_description: response.error_description.clone(),
        },
        "invalid_client_metadata" => ProviderError::InvalidClientMetadata {
            message: description("Invalid client metadata"),
        },
        "invalid_redirect_uri" => ProviderError::InvalidRedirectUri {
            message: description("Invalid redirect URI"),
        },
        "invalid_grant" | "expired_token" | "login_required" | "not-authorized" => {
            ProviderError::InvalidGrant {
                message: description("Invalid grant"),
            }
        }
        "invalid_scope" => ProviderError::InvalidScope {
            scope: response.error_description.clone().unwrap_or_default(),
        },
        "unauthorized_client" => ProviderError::UnauthorizedClient {
            error_description: response.error_description.clone(),
        },
        "unsupported_grant_type" => ProviderError::UnsupportedGrantType {
            grant_type: response.error_description.clone().unwrap_or_default(),
        },
        "access_denied" | "forbidden" => ProviderError::AccessDenied {
            message: description("Access denied"),
        },
        "server_error" | "internal-server-error" => ProviderError::ServerError {
            message: description("Server error"),
        },
        "temporarily_unavailable" | "service-unavailable" => {
            ProviderError::TemporarilyUnavailable { retry_after: None }
        }
        _ => ProviderError::InvalidRequest {
            message: description(&response.error),
        },
    }
}

/// Map an error carried in an authorization redirect to an error type.
pub fn map_authorization_error(
    error: &str,
    error_description: Option<String>,
    error_uri: Option<String>,
) -> AuthorizationError {
    match error {
        "access_denied" => AuthorizationError::AccessDenied {
            error_description,
            error_uri,
        },
        _ => AuthorizationError::InvalidRequest {
            message: error_description.unwrap_or_else(|| error.to_string()),
            error_uri,
        },
    }
}

/// Create error from an authorization server HTTP response.
pub fn create_error_from_response(status: u16, body: &str) -> OAuth2Error {
    if let Some(response) = parse_error_response(body) {
        return OAuth2Error::Provider(map_provider_error(&response));
    }

    let error = match status {
        400 => ProviderError::InvalidRequest {
            message: "Bad request".to_string(),
        },
        401 => ProviderError::InvalidClient {
            error_description: Some("Unauthorized".to_string()),
        },
        403 => ProviderError::AccessDenied {
            message: "Forbidden".to_string(),
        },
        429 | 503 => ProviderError::TemporarilyUnavailable {
            retry_after: Some(Duration::from_secs(60)),
        },
        _ => ProviderError::ServerError {
            message: format!("HTTP {}", status),
        },
    };

    OAuth2Error::Provider(error)
}

/// Create error from a `mod_rest` HTTP response.
pub fn create_rest_error(status: u16, body: &str) -> OAuth2Error {
    let details = serde_json::from_str::<ProsodyErrorResponse>(body)
        .ok()
        .map(|r| r.error);
    let (condition, text) = match details {
        Some(d) => (d.condition, d.text),
        None if body.trim().is_empty() => (None, None),
        None => (None, Some(body.trim().to_string())),
    };

    if status == 401 {
        return OAuth2Error::Rest(RestError::Unauthorized { text });
    }

    OAuth2Error::Rest(RestError::Failed {
        status,
        condition,
        text,
    })
}
