//! Session Configuration Builder
//!
//! Fluent builder for [`SessionConfig`].

use std::time::Duration;
use url::Url;

use crate::core::DEFAULT_STATE_MAX_AGE;
use crate::error::{ConfigurationError, OAuth2Error};
use crate::types::{
    RegistrationExtras, SessionConfig, DEFAULT_REFRESH_THRESHOLD_SECS, DEFAULT_TIMEOUT_SECS,
    OOB_REDIRECT_URI,
};

/// Client name used when none is set.
pub const DEFAULT_CLIENT_NAME: &str = "Prosody mod_rest OAuth 2 example";

/// Client URI used when none is set.
pub const DEFAULT_CLIENT_URI: &str = "https://modules.prosody.im/mod_rest";

/// Session configuration builder.
#[derive(Default)]
pub struct SessionConfigBuilder {
    base_url: Option<String>,
    client_name: Option<String>,
    client_uri: Option<String>,
    redirect_uri: Option<String>,
    scopes: Vec<String>,
    use_pkce: bool,
    timeout: Duration,
    auto_refresh: bool,
    refresh_threshold_secs: u64,
    state_max_age: Duration,
    registration_extras: RegistrationExtras,
}

impl SessionConfigBuilder {
    /// Create new configuration builder.
    pub fn new() -> Self {
        Self {
            use_pkce: true,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            auto_refresh: true,
            refresh_threshold_secs: DEFAULT_REFRESH_THRESHOLD_SECS,
            state_max_age: DEFAULT_STATE_MAX_AGE,
            ..Default::default()
        }
    }

    /// Server base URL, e.g. `https://xmpp.example.com:5281`.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = Some(name.into());
        self
    }

    pub fn client_uri(mut self, uri: impl Into<String>) -> Self {
        self.client_uri = Some(uri.into());
        self
    }

    /// Redirect URI. Defaults to the out-of-band URN, for which the server
    /// displays the code instead of redirecting.
    pub fn redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(uri.into());
        self
    }

    /// Add a default scope.
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scopes.push(scope.into());
        self
    }

    /// Replace the default scopes.
    pub fn scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Enable or disable PKCE (default: enabled).
    pub fn use_pkce(mut self, enabled: bool) -> Self {
        self.use_pkce = enabled;
        self
    }

    /// Set HTTP timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enable or disable refreshing before `mod_rest` calls (default: enabled).
    pub fn auto_refresh(mut self, enabled: bool) -> Self {
        self.auto_refresh = enabled;
        self
    }

    pub fn refresh_threshold_secs(mut self, secs: u64) -> Self {
        self.refresh_threshold_secs = secs;
        self
    }

    /// How long the code from an authorization URL is accepted
    /// (default: 10 minutes).
    pub fn state_max_age(mut self, max_age: Duration) -> Self {
        self.state_max_age = max_age;
        self
    }

    /// Optional client metadata for registration.
    pub fn registration_extras(mut self, extras: RegistrationExtras) -> Self {
        self.registration_extras = extras;
        self
    }

    pub fn software(mut self, id: impl Into<String>, version: impl Into<String>) -> Self {
        self.registration_extras.software_id = Some(id.into());
        self.registration_extras.software_version = Some(version.into());
        self
    }

    pub fn contact(mut self, contact: impl Into<String>) -> Self {
        self.registration_extras.contacts.push(contact.into());
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<SessionConfig, OAuth2Error> {
        let base_url = self.base_url.ok_or_else(|| {
            OAuth2Error::Configuration(ConfigurationError::MissingRequired {
                field: "base_url".to_string(),
            })
        })?;
        let base_url = parse_base_url(base_url.trim())?;

        let client_name = self
            .client_name
            .unwrap_or_else(|| DEFAULT_CLIENT_NAME.to_string());
        if client_name.trim().is_empty() {
            return Err(invalid("client_name must not be empty"));
        }

        let client_uri = self
            .client_uri
            .unwrap_or_else(|| DEFAULT_CLIENT_URI.to_string());
        parse_uri("client_uri", &client_uri)?;

        let redirect_uri = self
            .redirect_uri
            .unwrap_or_else(|| OOB_REDIRECT_URI.to_string());
        parse_uri("redirect_uri", &redirect_uri)?;

        if self.timeout.is_zero() {
            return Err(invalid("timeout must be greater than zero"));
        }

        Ok(SessionConfig {
            base_url,
            client_name,
            client_uri,
            redirect_uri,
            scopes: self.scopes,
            use_pkce: self.use_pkce,
            timeout: self.timeout,
            auto_refresh: self.auto_refresh,
            refresh_threshold_secs: self.refresh_threshold_secs,
            state_max_age: self.state_max_age,
            registration_extras: self.registration_extras,
        })
    }
}

fn invalid(message: impl Into<String>) -> OAuth2Error {
    OAuth2Error::Configuration(ConfigurationError::InvalidConfig {
        message: message.into(),
    })
}

fn parse_base_url(value: &str) -> Result<Url, OAuth2Error> {
    let url = Url::parse(value).map_err(|e| invalid(format!("invalid base_url {}: {}", value, e)))?;

    if !matches!(url.scheme(), "http" | "https") || url.host().is_none() {
        return Err(invalid(format!("base_url must be an http(s) URL, got {}", value)));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("base_url must not have a query or fragment"));
    }
    if url.scheme() == "http" {
        tracing::warn!(base_url = %url, "Using plain HTTP, tokens will be sent unencrypted");
    }

    Ok(url)
}

fn parse_uri(field: &str, value: &str) -> Result<Url, OAuth2Error> {
    Url::parse(value).map_err(|e| invalid(format!("invalid {} {}: {}", field, value, e)))
}

/// Create new session configuration builder.
pub fn session_config() -> SessionConfigBuilder {
    SessionConfigBuilder::new()
}
