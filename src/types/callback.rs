//! Callback Types
//!
//! Parameters carried by the authorization redirect.

use url::Url;

use crate::error::{map_authorization_error, AuthorizationError, OAuth2Error};

/// Callback parameters from authorization redirect.
#[derive(Clone, Debug, Default)]
pub struct CallbackParams {
    /// Authorization code (if success).
    pub code: Option<String>,
    /// State parameter.
    pub state: Option<String>,
    /// Error code (if authorization failed).
    pub error: Option<String>,
    /// Error description.
    pub error_description: Option<String>,
    /// Error URI.
    pub error_uri: Option<String>,
}

impl CallbackParams {
    /// Parse callback parameters from URL.
    pub fn from_url(url: &Url) -> Self {
        let mut params = Self::default();

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" => params.code = Some(value.into_owned()),
                "state" => params.state = Some(value.into_owned()),
                "error" => params.error = Some(value.into_owned()),
                "error_description" => params.error_description = Some(value.into_owned()),
                "error_uri" => params.error_uri = Some(value.into_owned()),
                _ => {}
            }
        }

        params
    }

    /// Parse callback parameters from URL string.
    pub fn from_url_str(url_str: &str) -> Result<Self, OAuth2Error> {
        let url = Url::parse(url_str).map_err(|e| {
            OAuth2Error::Authorization(AuthorizationError::InvalidRequest {
                message: format!("Invalid callback URL: {}", e),
                error_uri: None,
            })
        })?;
        Ok(Self::from_url(&url))
    }

    /// Check if callback contains an error.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// The authorization code, or the error the server redirected with.
    pub fn into_code(self) -> Result<(String, Option<String>), OAuth2Error> {
        if let Some(error) = self.error {
            return Err(OAuth2Error::Authorization(map_authorization_error(
                &error,
                self.error_description,
                self.error_uri,
            )));
        }

        let code = self.code.filter(|c| !c.is_empty()).ok_or_else(|| {
            OAuth2Error::Authorization(AuthorizationError::InvalidRequest {
                message: "Missing authorization code in callback".to_string(),
                error_uri: None,
            })
        })?;

        Ok((code, self.state))
    }
}
