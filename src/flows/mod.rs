//! Flows
//!
//! Requests against the authorization server: client registration, the
//! authorization-code grant, refresh, revocation and userinfo.

pub mod authorization_code;
pub mod refresh;
pub mod registration;
pub mod revocation;
pub mod userinfo;

pub use authorization_code::{AuthorizationCodeFlow, AuthorizationCodeFlowImpl};
pub use refresh::{RefreshFlow, RefreshFlowImpl};
pub use registration::{build_registration_request, ClientRegistrar, DefaultClientRegistrar};
pub use revocation::{DefaultTokenRevoker, TokenRevoker, TokenTypeHint};
pub use userinfo::{DefaultUserInfoClient, UserInfoClient};

use secrecy::ExposeSecret;
use std::time::Duration;

use crate::core::{HttpRequest, HttpResponse};
use crate::error::{create_error_from_response, OAuth2Error};
use crate::types::{ClientAuthMethod, ClientCredentials, TokenResponse};

/// Build a form POST to a client-authenticated endpoint (token, revocation),
/// applying the client's authentication method.
pub(crate) fn client_authenticated_request(
    url: &str,
    credentials: &ClientCredentials,
    mut params: Vec<(&'static str, String)>,
    timeout: Duration,
) -> HttpRequest {
    let secret = credentials.client_secret.expose_secret();

    match credentials.auth_method {
        ClientAuthMethod::ClientSecretBasic => {}
        ClientAuthMethod::ClientSecretPost => {
            params.push(("client_id", credentials.client_id.clone()));
            params.push(("client_secret", secret.clone()));
        }
        ClientAuthMethod::None => {
            params.push(("client_id", credentials.client_id.clone()));
        }
    }

    let request = HttpRequest::post(url)
        .accept_json()
        .form(&params)
        .timeout(timeout);

    if credentials.auth_method == ClientAuthMethod::ClientSecretBasic {
        request.basic_auth(&credentials.client_id, secret)
    } else {
        request
    }
}

/// Decode a token endpoint response.
pub(crate) fn parse_token_response(response: &HttpResponse) -> Result<TokenResponse, OAuth2Error> {
    if response.status != 200 {
        return Err(create_error_from_response(response.status, &response.body));
    }
    response.json()
}
