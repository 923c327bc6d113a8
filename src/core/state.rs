//! State Management
//!
//! `state` parameter generation and the pending authorization a session
//! keeps between building the authorization URL and fetching the token.

use base64::Engine;
use constant_time_eq::constant_time_eq;
use rand::Rng;
use std::time::{Duration, Instant};

use crate::error::{AuthorizationError, OAuth2Error};
use crate::types::PkceParams;

/// How long a pending authorization stays valid.
pub const DEFAULT_STATE_MAX_AGE: Duration = Duration::from_secs(600);

/// Generate a random, URL-safe state value.
pub fn generate_state() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Authorization request awaiting its code.
#[derive(Clone, Debug)]
pub struct PendingAuthorization {
    /// State sent with the authorization request.
    pub state: String,
    /// Redirect URI sent with the authorization request.
    pub redirect_uri: String,
    /// Scopes requested.
    pub scopes: Vec<String>,
    /// PKCE parameters, if a challenge was sent.
    pub pkce: Option<PkceParams>,
    created_at: Instant,
}

impl PendingAuthorization {
    pub fn new(
        state: String,
        redirect_uri: String,
        scopes: Vec<String>,
        pkce: Option<PkceParams>,
    ) -> Self {
        Self {
            state,
            redirect_uri,
            scopes,
            pkce,
            created_at: Instant::now(),
        }
    }

    pub fn is_expired(&self, max_age: Duration) -> bool {
        self.created_at.elapsed() > max_age
    }

    /// PKCE verifier to send with the code exchange.
    pub fn code_verifier(&self) -> Option<String> {
        self.pkce.as_ref().map(|p| p.code_verifier.clone())
    }

    /// Fail once the pending authorization has outlived `max_age`.
    ///
    /// This is the only check a bare code pasted by the user gets, as it
    /// carries no state.
    pub fn check_age(&self, max_age: Duration) -> Result<(), OAuth2Error> {
        if self.is_expired(max_age) {
            return Err(OAuth2Error::Authorization(AuthorizationError::StateExpired {
                state: self.state.clone(),
            }));
        }
        Ok(())
    }

    /// Validate the state returned with a callback URL. A callback without
    /// a state is a mismatch.
    pub fn verify(&self, received: Option<&str>, max_age: Duration) -> Result<(), OAuth2Error> {
        self.check_age(max_age)?;

        let received = received.unwrap_or_default();
        if !constant_time_eq(received.as_bytes(), self.state.as_bytes()) {
            return Err(OAuth2Error::Authorization(AuthorizationError::StateMismatch {
                expected: self.state.clone(),
                received: received.to_string(),
            }));
        }
        Ok(())
    }
}
