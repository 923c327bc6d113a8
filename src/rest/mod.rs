//! mod_rest Client
//!
//! Bearer-authenticated JSON requests to Prosody's `/rest` endpoint.
//!
//! The payload is a stanza in mod_rest's JSON mapping, e.g.
//! `{"disco": true, "to": "jabber.org"}`; the reply is the response stanza
//! in the same mapping. Path suffixes select mod_rest's shorthand routes,
//! e.g. `ping/example.com`.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::core::{HttpRequest, HttpTransport};
use crate::error::{create_rest_error, OAuth2Error};
use crate::types::{SessionConfig, StoredToken, REST_PATH};

/// Client for the `mod_rest` endpoint of one server.
pub struct RestClient<T: HttpTransport> {
    endpoint: String,
    transport: Arc<T>,
    timeout: Duration,
}

impl<T: HttpTransport> RestClient<T> {
    pub fn new(config: &SessionConfig, transport: Arc<T>) -> Self {
        Self {
            endpoint: config.url_for(REST_PATH),
            transport,
            timeout: config.timeout,
        }
    }

    /// `<base_url>/rest`.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, path: &str) -> String {
        let path = path.trim_matches('/');
        if path.is_empty() {
            self.endpoint.clone()
        } else {
            format!("{}/{}", self.endpoint, path)
        }
    }

    /// POST a JSON payload and return the decoded reply. An empty success
    /// body yields `Value::Null`.
    #[tracing::instrument(skip(self, token, payload), fields(url = tracing::field::Empty))]
    pub async fn post_json<P: Serialize + ?Sized + Sync>(
        &self,
        path: &str,
        token: &StoredToken,
        payload: &P,
    ) -> Result<serde_json::Value, OAuth2Error> {
        let url = self.url(path);
        tracing::Span::current().record("url", url.as_str());

        let request = HttpRequest::post(url)
            .accept_json()
            .authorization(token.authorization_header()?)
            .json(payload)?
            .timeout(self.timeout);

        let response = self.transport.send(request).await?;

        if !response.is_success() {
            let err = create_rest_error(response.status, &response.body);
            tracing::warn!(status = response.status, error = %err, "mod_rest request failed");
            return Err(err);
        }

        if response.body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }

        response.json()
    }
}
