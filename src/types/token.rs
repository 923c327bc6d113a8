//! Token Types
//!
//! Token endpoint responses and the token held by a session.

use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::collections::HashMap;

use crate::error::{OAuth2Error, TokenError};

/// Token response from the token endpoint (RFC 6749 Section 5.1).
///
/// Prosody answers with e.g.
///
/// ```json
/// {
///   "scope": "openid xmpp",
///   "expires_in": 3600,
///   "token_type": "bearer",
///   "refresh_token": "secret-token:MjswYm5N...",
///   "access_token": "secret-token:MjswYm5N..."
/// }
/// ```
#[derive(Clone, Deserialize)]
pub struct TokenResponse {
    /// Access token.
    pub access_token: String,
    /// Token type (Prosody sends lowercase "bearer").
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Expires in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// Refresh token.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Granted scopes.
    #[serde(default)]
    pub scope: Option<String>,
    /// ID token (OIDC).
    #[serde(default)]
    pub id_token: Option<String>,
    /// Additional fields.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("scope", &self.scope)
            .finish()
    }
}

/// Token held by a session.
#[derive(Clone)]
pub struct StoredToken {
    access_token: SecretString,
    refresh_token: Option<SecretString>,
    /// Token type.
    pub token_type: String,
    /// Expiration time.
    pub expires_at: Option<DateTime<Utc>>,
    /// Granted scopes.
    pub scopes: Vec<String>,
    /// ID token (OIDC).
    pub id_token: Option<String>,
}

impl StoredToken {
    /// Create a bearer token, e.g. one saved from an earlier session.
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            access_token: SecretString::new(access_token.into()),
            refresh_token: refresh_token.map(SecretString::new),
            token_type: default_token_type(),
            expires_at,
            scopes: Vec::new(),
            id_token: None,
        }
    }

    /// Create from token response.
    pub fn from_response(response: &TokenResponse) -> Self {
        // A lifetime too large to represent is treated as no expiry.
        let expires_at = response
            .expires_in
            .and_then(seconds_from_now);

        let scopes = response
            .scope
            .as_ref()
            .map(|s| s.split_whitespace().map(String::from).collect())
            .unwrap_or_default();

        Self {
            access_token: SecretString::new(response.access_token.clone()),
            refresh_token: response.refresh_token.clone().map(SecretString::new),
            token_type: response.token_type.clone(),
            expires_at,
            scopes,
            id_token: response.id_token.clone(),
        }
    }

    /// Apply a refresh response. The server may omit the refresh token, in
    /// which case the current one stays valid.
    pub fn refreshed(&self, response: &TokenResponse) -> Self {
        let mut next = Self::from_response(response);
        if next.refresh_token.is_none() {
            next.refresh_token = self.refresh_token.clone();
        }
        if next.scopes.is_empty() {
            next.scopes = self.scopes.clone();
        }
        next
    }

    /// Access token value.
    pub fn access_token(&self) -> &str {
        self.access_token.expose_secret()
    }

    /// Refresh token value.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_ref().map(|t| t.expose_secret().as_str())
    }

    /// Check if has refresh token.
    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token.is_some()
    }

    /// Check if token is expired.
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .map(|exp| exp <= Utc::now())
            .unwrap_or(false)
    }

    /// Check if token is expiring soon.
    pub fn is_expiring_soon(&self, threshold_secs: u64) -> bool {
        match (self.expires_at, seconds_from_now(threshold_secs)) {
            (Some(exp), Some(limit)) => exp <= limit,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    /// Get remaining lifetime in seconds.
    pub fn remaining_lifetime(&self) -> Option<i64> {
        self.expires_at
            .map(|exp| (exp - Utc::now()).num_seconds().max(0))
    }

    /// `Authorization` header value. Only bearer tokens are supported.
    pub fn authorization_header(&self) -> Result<String, OAuth2Error> {
        if !self.token_type.eq_ignore_ascii_case("bearer") {
            return Err(OAuth2Error::Token(TokenError::UnsupportedType {
                token_type: self.token_type.clone(),
            }));
        }
        Ok(format!("Bearer {}", self.access_token.expose_secret()))
    }
}

/// `secs` from now, `None` when out of range.
fn seconds_from_now(secs: u64) -> Option<DateTime<Utc>> {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|delta| Utc::now().checked_add_signed(delta))
}

impl std::fmt::Debug for StoredToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredToken")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .field("scopes", &self.scopes)
            .finish()
    }
}
