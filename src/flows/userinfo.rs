//! UserInfo
//!
//! OpenID Connect userinfo request, answered by Prosody with the JID of the
//! account that authorized the token.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::core::{HttpRequest, HttpTransport};
use crate::error::{create_rest_error, OAuth2Error};
use crate::types::{StoredToken, UserInfo};

/// UserInfo client interface.
#[async_trait]
pub trait UserInfoClient: Send + Sync {
    /// Fetch claims about the token's subject.
    async fn userinfo(&self, token: &StoredToken) -> Result<UserInfo, OAuth2Error>;
}

/// Default userinfo client implementation.
pub struct DefaultUserInfoClient<T: HttpTransport> {
    userinfo_endpoint: String,
    transport: Arc<T>,
    timeout: Duration,
}

impl<T: HttpTransport> DefaultUserInfoClient<T> {
    pub fn new(userinfo_endpoint: impl Into<String>, transport: Arc<T>, timeout: Duration) -> Self {
        Self {
            userinfo_endpoint: userinfo_endpoint.into(),
            transport,
            timeout,
        }
    }
}

#[async_trait]
impl<T: HttpTransport> UserInfoClient for DefaultUserInfoClient<T> {
    #[tracing::instrument(skip(self, token))]
    async fn userinfo(&self, token: &StoredToken) -> Result<UserInfo, OAuth2Error> {
        let request = HttpRequest::get(&self.userinfo_endpoint)
            .accept_json()
            .authorization(token.authorization_header()?)
            .timeout(self.timeout);

        let response = self.transport.send(request).await?;
        if !response.is_success() {
            // Bearer-protected like mod_rest, so the error shape is the same.
            return Err(create_rest_error(response.status, &response.body));
        }

        let info: UserInfo = response.json()?;
        tracing::debug!(sub = %info.sub, "Fetched userinfo");
        Ok(info)
    }
}
