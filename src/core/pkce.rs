//! PKCE Generator
//!
//! RFC 7636 Proof Key for Code Exchange.

use base64::Engine;
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::error::{ConfigurationError, OAuth2Error};
use crate::types::{PkceMethod, PkceParams};

/// Characters allowed in a code verifier (RFC 7636 Section 4.1).
const VERIFIER_CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";

/// PKCE generator interface (for dependency injection).
pub trait PkceGenerator: Send + Sync {
    /// Generate PKCE parameters.
    fn generate(&self, method: PkceMethod) -> PkceParams;
}

/// Compute the challenge for a verifier.
pub fn compute_challenge(verifier: &str, method: PkceMethod) -> String {
    match method {
        PkceMethod::Plain => verifier.to_string(),
        PkceMethod::S256 => {
            let hash = Sha256::digest(verifier.as_bytes());
            base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(hash)
        }
    }
}

/// Default PKCE generator implementation.
pub struct DefaultPkceGenerator {
    verifier_length: usize,
}

impl DefaultPkceGenerator {
    /// Create new PKCE generator with default verifier length (64).
    pub fn new() -> Self {
        Self { verifier_length: 64 }
    }

    /// Create PKCE generator with custom verifier length, which must be
    /// between 43 and 128.
    pub fn with_length(length: usize) -> Result<Self, OAuth2Error> {
        if !(43..=128).contains(&length) {
            return Err(OAuth2Error::Configuration(ConfigurationError::InvalidConfig {
                message: format!(
                    "PKCE verifier length must be between 43 and 128, got {}",
                    length
                ),
            }));
        }
        Ok(Self {
            verifier_length: length,
        })
    }

    fn generate_verifier(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..self.verifier_length)
            .map(|_| VERIFIER_CHARSET[rng.gen_range(0..VERIFIER_CHARSET.len())] as char)
            .collect()
    }
}

impl Default for DefaultPkceGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl PkceGenerator for DefaultPkceGenerator {
    fn generate(&self, method: PkceMethod) -> PkceParams {
        let code_verifier = self.generate_verifier();
        let code_challenge = compute_challenge(&code_verifier, method);

        PkceParams {
            code_verifier,
            code_challenge,
            code_challenge_method: method,
        }
    }
}

/// Generator returning a fixed verifier, for tests.
pub struct FixedPkceGenerator {
    verifier: String,
}

impl FixedPkceGenerator {
    pub fn new(verifier: impl Into<String>) -> Self {
        Self {
            verifier: verifier.into(),
        }
    }
}

impl PkceGenerator for FixedPkceGenerator {
    fn generate(&self, method: PkceMethod) -> PkceParams {
        PkceParams {
            code_verifier: self.verifier.clone(),
            code_challenge: compute_challenge(&self.verifier, method),
            code_challenge_method: method,
        }
    }
}
