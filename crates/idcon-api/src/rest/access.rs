// Authentication endpoints
//
// Username/password are exchanged for a bearer token at
// `POST /accessTokens/login`; the token is then installed on the client.
// The self endpoint reports who we are and what we may do.

use std::collections::{BTreeMap, BTreeSet};

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::auth::{DELEGATIONS_HEADER, ENTITLEMENTS_HEADER, TOKEN_EXPIRE_HEADER, TOKEN_HEADER};
use crate::error::Error;
use crate::rest::client::{RestClient, handle_response, header_string, parse_error};
use crate::rest::models::{AccessToken, SelfInfo, User};

impl RestClient {
    /// Authenticate with username/password and install the issued token.
    ///
    /// `POST /accessTokens/login` with HTTP Basic credentials.
    pub async fn login(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<AccessToken, Error> {
        let url = self.url("accessTokens/login")?;
        debug!(username, "logging in at {url}");

        let resp = self
            .http()
            .post(url)
            .basic_auth(username, Some(password.expose_secret()))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let err = parse_error(resp).await;
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {err}"),
            });
        }

        let token =
            header_string(resp.headers(), TOKEN_HEADER).ok_or_else(|| Error::Authentication {
                message: format!("login response carried no {TOKEN_HEADER} header"),
            })?;
        let expires_at = header_string(resp.headers(), TOKEN_EXPIRE_HEADER);

        self.set_token(SecretString::from(token.clone()));
        debug!("login successful");
        Ok(AccessToken { token, expires_at })
    }

    /// Invalidate the current token on the server and forget it locally.
    ///
    /// `POST /accessTokens/logout`
    pub async fn logout(&self) -> Result<(), Error> {
        debug!("logging out");
        let result = self.post_empty("accessTokens/logout", &()).await;
        self.clear_token();
        result
    }

    /// The authenticated user with entitlements and delegations.
    ///
    /// `GET /users/self`; entitlements and delegations travel as JSON in
    /// response headers.
    pub async fn self_info(&self) -> Result<SelfInfo, Error> {
        let resp = self.get_raw("users/self").await?;

        let entitlements: BTreeMap<String, BTreeSet<String>> =
            parse_json_header(resp.headers(), ENTITLEMENTS_HEADER)?.unwrap_or_default();
        let delegations: Vec<String> =
            parse_json_header(resp.headers(), DELEGATIONS_HEADER)?.unwrap_or_default();
        let user: User = handle_response(resp).await?;

        debug!(
            username = %user.username,
            entitlements = entitlements.len(),
            "loaded self"
        );
        Ok(SelfInfo {
            user,
            entitlements,
            delegations,
        })
    }
}

fn parse_json_header<T: serde::de::DeserializeOwned>(
    headers: &reqwest::header::HeaderMap,
    name: &'static str,
) -> Result<Option<T>, Error> {
    header_string(headers, name)
        .map(|raw| {
            serde_json::from_str(&raw).map_err(|e| Error::InvalidHeader {
                name,
                message: e.to_string(),
            })
        })
        .transpose()
}
