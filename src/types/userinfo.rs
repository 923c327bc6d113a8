//! UserInfo Types

use serde::Deserialize;
use std::collections::HashMap;

/// OpenID Connect userinfo response, e.g.
/// `{"iss": "https://xmpp.example.com:5281", "sub": "xmpp:alice@example.com"}`.
#[derive(Clone, Debug, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    pub iss: Option<String>,
    pub sub: String,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl UserInfo {
    /// Bare JID of the authorized account, if `sub` is an `xmpp:` URI.
    pub fn jid(&self) -> Option<&str> {
        self.sub.strip_prefix("xmpp:")
    }
}
