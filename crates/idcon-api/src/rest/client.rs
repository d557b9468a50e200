// REST API HTTP client
//
// Wraps `reqwest::Client` with base-URL joining, bearer-token injection,
// conditional-request headers and error mapping. Endpoint groups (users,
// roles, schemas, ...) are implemented as inherent methods in sibling
// files to keep this module focused on transport mechanics.

use std::sync::{PoisonError, RwLock};

use reqwest::header::{ETAG, HeaderMap, HeaderValue, IF_MATCH, LOCATION};
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace, warn};
use url::Url;

use crate::auth::{DOMAIN_HEADER, ERROR_CODE_HEADER, ERROR_INFO_HEADER};
use crate::error::{ClientException, Error};
use crate::rest::models::{ErrorBody, Versioned};
use crate::transport::TransportConfig;

const PREFER_HEADER: &str = "Prefer";
const RETURN_CONTENT: &str = "return-content";

/// Raw HTTP client for the REST API.
///
/// Every request carries the domain header; authenticated requests carry
/// the bearer token obtained at login. Single-entity reads capture the
/// `ETag` header, and conditional writes send it back as `If-Match`.
pub struct RestClient {
    http: reqwest::Client,
    base_url: Url,
    domain: String,
    token: RwLock<Option<SecretString>>,
}

impl RestClient {
    /// Create a client for the API rooted at `base_url` (e.g.
    /// `https://idm.example.com/syncope/rest`) within `domain`.
    pub fn new(base_url: &str, domain: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(domain).map_err(|e| Error::InvalidHeader {
            name: DOMAIN_HEADER,
            message: e.to_string(),
        })?;
        headers.insert(DOMAIN_HEADER, value);

        let http = transport.build_client_with_headers(headers)?;
        Ok(Self::with_client(http, normalize_base_url(base_url)?, domain))
    }

    /// Wrap an existing `reqwest::Client` (caller manages default headers).
    pub fn with_client(http: reqwest::Client, base_url: Url, domain: &str) -> Self {
        Self {
            http,
            base_url,
            domain: domain.to_owned(),
            token: RwLock::new(None),
        }
    }

    /// The domain every request is scoped to.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// The API base URL (always ends with `/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The underlying HTTP client (for auth flows that need direct access).
    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    // ── Token management ─────────────────────────────────────────────

    /// Install a bearer token for subsequent requests.
    pub fn set_token(&self, token: SecretString) {
        trace!("storing access token");
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    /// Forget the bearer token.
    pub fn clear_token(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Whether a bearer token is installed.
    pub fn has_token(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn apply_token(&self, builder: RequestBuilder) -> RequestBuilder {
        let guard = self.token.read().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join a relative path (e.g. `"users/abc"`) onto the base URL.
    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, Error> {
        let url = self.url(path)?;
        debug!("{method} {url}");
        Ok(self.apply_token(self.http.request(method, url)))
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let resp = self.request(Method::GET, path)?.send().await?;
        handle_response(resp).await
    }

    pub(crate) async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        trace!(?params, "query parameters");
        let resp = self.request(Method::GET, path)?.query(params).send().await?;
        handle_response(resp).await
    }

    /// GET a single entity, capturing its `ETag`.
    pub(crate) async fn get_versioned<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Versioned<T>, Error> {
        let resp = self.request(Method::GET, path)?.send().await?;
        let etag = header_string(resp.headers(), ETAG.as_str());
        let entity = handle_response(resp).await?;
        Ok(Versioned { entity, etag })
    }

    /// GET returning the raw response after status checking, for callers
    /// that need response headers.
    pub(crate) async fn get_raw(&self, path: &str) -> Result<reqwest::Response, Error> {
        let resp = self.request(Method::GET, path)?.send().await?;
        if resp.status().is_success() {
            Ok(resp)
        } else {
            Err(parse_error(resp).await)
        }
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let resp = self
            .request(Method::POST, path)?
            .header(PREFER_HEADER, RETURN_CONTENT)
            .json(body)
            .send()
            .await?;
        handle_response(resp).await
    }

    pub(crate) async fn post_conditional<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        etag: Option<&str>,
        body: &B,
    ) -> Result<T, Error> {
        let builder = self
            .request(Method::POST, path)?
            .header(PREFER_HEADER, RETURN_CONTENT)
            .json(body);
        let resp = with_if_match(builder, etag)?.send().await?;
        handle_response(resp).await
    }

    /// POST that answers `201 Created` without a body; returns the last
    /// path segment of the `Location` header (the new key), if any.
    pub(crate) async fn post_created<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Option<String>, Error> {
        let resp = self.request(Method::POST, path)?.json(body).send().await?;
        if !resp.status().is_success() {
            return Err(parse_error(resp).await);
        }
        Ok(header_string(resp.headers(), LOCATION.as_str())
            .and_then(|location| location.rsplit('/').next().map(String::from))
            .filter(|key| !key.is_empty()))
    }

    pub(crate) async fn post_empty<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), Error> {
        let resp = self.request(Method::POST, path)?.json(body).send().await?;
        handle_empty(resp).await
    }

    /// POST with query parameters and no body.
    pub(crate) async fn post_query(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<(), Error> {
        let resp = self.request(Method::POST, path)?.query(params).send().await?;
        handle_empty(resp).await
    }

    pub(crate) async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        etag: Option<&str>,
        body: &B,
    ) -> Result<T, Error> {
        let builder = self
            .request(Method::PUT, path)?
            .header(PREFER_HEADER, RETURN_CONTENT)
            .json(body);
        let resp = with_if_match(builder, etag)?.send().await?;
        handle_response(resp).await
    }

    pub(crate) async fn put_empty<B: Serialize + Sync>(
        &self,
        path: &str,
        etag: Option<&str>,
        body: &B,
    ) -> Result<(), Error> {
        let builder = self.request(Method::PUT, path)?.json(body);
        let resp = with_if_match(builder, etag)?.send().await?;
        handle_empty(resp).await
    }

    pub(crate) async fn delete(&self, path: &str, etag: Option<&str>) -> Result<(), Error> {
        let builder = self.request(Method::DELETE, path)?;
        let resp = with_if_match(builder, etag)?.send().await?;
        handle_empty(resp).await
    }

    pub(crate) async fn delete_with_response<T: DeserializeOwned>(
        &self,
        path: &str,
        etag: Option<&str>,
    ) -> Result<T, Error> {
        let builder = self
            .request(Method::DELETE, path)?
            .header(PREFER_HEADER, RETURN_CONTENT);
        let resp = with_if_match(builder, etag)?.send().await?;
        handle_response(resp).await
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

/// Ensure the base URL ends with `/` so relative joins keep its path.
fn normalize_base_url(raw: &str) -> Result<Url, Error> {
    let mut url = Url::parse(raw)?;
    let path = url.path().trim_end_matches('/').to_owned();
    url.set_path(&format!("{path}/"));
    Ok(url)
}

fn with_if_match(builder: RequestBuilder, etag: Option<&str>) -> Result<RequestBuilder, Error> {
    match etag {
        Some(tag) => {
            let value = HeaderValue::from_str(tag).map_err(|e| Error::InvalidHeader {
                name: "If-Match",
                message: e.to_string(),
            })?;
            Ok(builder.header(IF_MATCH, value))
        }
        None => Ok(builder),
    }
}

pub(crate) fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

// ── Response handling ────────────────────────────────────────────────

pub(crate) async fn handle_response<T: DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, Error> {
    if !resp.status().is_success() {
        return Err(parse_error(resp).await);
    }
    let body = resp.text().await?;
    serde_json::from_str(&body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body,
        }
    })
}

async fn handle_empty(resp: reqwest::Response) -> Result<(), Error> {
    if resp.status().is_success() {
        Ok(())
    } else {
        Err(parse_error(resp).await)
    }
}

/// Map a non-success response to a typed error.
///
/// Typed exceptions come from the JSON body (a single error object or a
/// list of them) or, failing that, from the error-code/info headers.
pub(crate) async fn parse_error(resp: reqwest::Response) -> Error {
    let status = resp.status();
    let path = resp.url().path().to_owned();
    let header_exceptions = exceptions_from_headers(status, resp.headers());
    let raw = resp.text().await.unwrap_or_default();

    if status.is_server_error() {
        warn!(%status, %path, "server error");
    } else {
        debug!(%status, %path, "request failed");
    }

    let message = if raw.is_empty() {
        status.to_string()
    } else {
        raw.chars().take(500).collect()
    };

    match status {
        StatusCode::UNAUTHORIZED => return Error::Unauthorized { message },
        StatusCode::FORBIDDEN => return Error::Forbidden { message },
        _ => {}
    }

    let mut exceptions = exceptions_from_body(status, &raw);
    if exceptions.is_empty() {
        exceptions = header_exceptions;
    }
    if !exceptions.is_empty() {
        return Error::Client(exceptions);
    }

    match status {
        StatusCode::NOT_FOUND => Error::NotFound { path },
        StatusCode::PRECONDITION_FAILED => Error::PreconditionFailed { message },
        _ => Error::Server {
            status: status.as_u16(),
            message,
        },
    }
}

fn exceptions_from_body(status: StatusCode, raw: &str) -> Vec<ClientException> {
    let bodies = serde_json::from_str::<Vec<ErrorBody>>(raw)
        .or_else(|_| serde_json::from_str::<ErrorBody>(raw).map(|b| vec![b]))
        .unwrap_or_default();

    bodies
        .into_iter()
        .map(|b| ClientException {
            status: if b.status == 0 {
                status.as_u16()
            } else {
                b.status
            },
            kind: b.kind,
            elements: b.elements,
        })
        .collect()
}

/// Build exceptions from `X-Application-Error-Code` and the matching
/// `Type:message` entries of `X-Application-Error-Info`.
fn exceptions_from_headers(status: StatusCode, headers: &HeaderMap) -> Vec<ClientException> {
    let infos: Vec<&str> = headers
        .get_all(ERROR_INFO_HEADER)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();

    headers
        .get_all(ERROR_CODE_HEADER)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(|kind| {
            let prefix = format!("{kind}:");
            let elements = infos
                .iter()
                .filter_map(|info| info.strip_prefix(&prefix))
                .map(|e| e.trim().to_owned())
                .collect();
            ClientException {
                status: status.as_u16(),
                kind: kind.to_owned(),
                elements,
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_trailing_slash() {
        let url = normalize_base_url("https://idm.example.com/syncope/rest").unwrap();
        assert_eq!(url.as_str(), "https://idm.example.com/syncope/rest/");
        assert_eq!(
            url.join("users/abc").unwrap().as_str(),
            "https://idm.example.com/syncope/rest/users/abc"
        );
    }

    #[test]
    fn header_exceptions_pair_codes_with_info() {
        let mut headers = HeaderMap::new();
        headers.append(ERROR_CODE_HEADER, HeaderValue::from_static("InvalidUser"));
        headers.append(
            ERROR_INFO_HEADER,
            HeaderValue::from_static("InvalidUser:username is required"),
        );
        headers.append(
            ERROR_INFO_HEADER,
            HeaderValue::from_static("Other:not for this code"),
        );

        let exceptions = exceptions_from_headers(StatusCode::BAD_REQUEST, &headers);
        assert_eq!(exceptions.len(), 1);
        assert_eq!(exceptions[0].kind, "InvalidUser");
        assert_eq!(exceptions[0].elements, vec!["username is required"]);
        assert_eq!(exceptions[0].status, 400);
    }

    #[test]
    fn body_exceptions_accept_single_or_list() {
        let single = r#"{"status":409,"type":"EntityExists","elements":["admin"]}"#;
        assert_eq!(exceptions_from_body(StatusCode::CONFLICT, single).len(), 1);

        let list = r#"[{"type":"A","elements":[]},{"type":"B","elements":["x"]}]"#;
        let parsed = exceptions_from_body(StatusCode::BAD_REQUEST, list);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].status, 400);
    }
}
