//! Authorization Types
//!
//! Types for the authorization-code grant.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Parameters for authorization URL generation.
#[derive(Clone, Debug, Default)]
pub struct AuthorizationParams {
    /// Requested scopes (overrides the session default).
    pub scopes: Option<Vec<String>>,
    /// Custom state value (auto-generated if not provided).
    pub state: Option<String>,
    /// Login hint, e.g. the account's JID.
    pub login_hint: Option<String>,
    /// Prompt behavior.
    pub prompt: Option<Prompt>,
    /// Additional parameters.
    pub extra_params: HashMap<String, String>,
}

/// Result of authorization URL generation.
#[derive(Clone, Debug)]
pub struct AuthorizationUrl {
    /// The URL to open in a browser.
    pub url: String,
    /// State parameter for CSRF validation.
    pub state: String,
}

/// What the user brings back from the authorization step.
#[derive(Clone, Debug)]
pub enum TokenRequest {
    /// The bare authorization code, as shown for out-of-band redirects.
    Code(String),
    /// The full redirect URL, including `code` and `state`.
    Callback(String),
}

impl TokenRequest {
    /// Interpret user input: a URL carrying `code` or `error` in its query
    /// is a callback, anything else is a bare code.
    pub fn from_input(input: &str) -> Self {
        let input = input.trim();
        let is_callback = url::Url::parse(input)
            .map(|url| {
                url.query_pairs()
                    .any(|(key, _)| key == "code" || key == "error")
            })
            .unwrap_or(false);

        if is_callback {
            Self::Callback(input.to_string())
        } else {
            Self::Code(input.to_string())
        }
    }
}

/// Code exchange request sent to the token endpoint.
#[derive(Clone)]
pub struct CodeExchangeRequest {
    /// Authorization code.
    pub code: String,
    /// Redirect URI (must match the authorization request).
    pub redirect_uri: String,
    /// PKCE code verifier, if a challenge was sent.
    pub code_verifier: Option<String>,
}

impl std::fmt::Debug for CodeExchangeRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeExchangeRequest")
            .field("code", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .field("code_verifier", &self.code_verifier.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Prompt behavior for authorization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Prompt {
    /// Do not display any authentication or consent UI.
    None,
    /// Force re-authentication.
    Login,
    /// Force consent screen.
    Consent,
    /// Force account selection.
    SelectAccount,
}

impl Prompt {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Login => "login",
            Self::Consent => "consent",
            Self::SelectAccount => "select_account",
        }
    }
}

/// PKCE challenge method.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PkceMethod {
    /// SHA-256 hash (recommended).
    #[default]
    S256,
    /// Plain text (not recommended).
    Plain,
}

impl PkceMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::S256 => "S256",
            Self::Plain => "plain",
        }
    }
}

/// PKCE parameters.
#[derive(Clone)]
pub struct PkceParams {
    /// Code verifier (keep secret).
    pub code_verifier: String,
    /// Code challenge (sent in authorization URL).
    pub code_challenge: String,
    /// Challenge method used.
    pub code_challenge_method: PkceMethod,
}

impl std::fmt::Debug for PkceParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PkceParams")
            .field("code_verifier", &"[REDACTED]")
            .field("code_challenge", &self.code_challenge)
            .field("code_challenge_method", &self.code_challenge_method)
            .finish()
    }
}
