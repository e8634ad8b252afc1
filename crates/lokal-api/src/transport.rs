// HTTP transport for talking to the Lokal daemon.
//
// Owns the `reqwest::Client` (user agent, timeout, auth headers) and turns
// non-2xx responses into typed errors, so callers only ever inspect
// successful responses or an `Error` that still carries the raw body.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde::Serialize;
use tracing::{debug, trace};
use url::Url;

use crate::auth::{BasicAuth, Credentials};
use crate::error::Error;
use crate::version::SERVER_VERSION_HEADER;

/// Fixed `User-Agent` sent on every request.
pub const USER_AGENT: &str = "Lokal Rust - github.com/lokal-so/lokal-rs";

/// Header carrying the API token.
pub const API_TOKEN_HEADER: &str = "X-Auth-Token";

/// Tuning for the underlying HTTP client.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: USER_AGENT.into(),
        }
    }
}

/// A successful (2xx) daemon response, fully buffered.
#[derive(Debug, Clone)]
pub struct DaemonResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl DaemonResponse {
    /// Look up a header as UTF-8 text.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Raw request/response exchange with the daemon.
///
/// Every non-2xx status is raised as an error: 409 becomes
/// [`Error::DuplicateTunnel`], anything else [`Error::Status`].
#[derive(Debug, Clone)]
pub struct Transport {
    http: reqwest::Client,
    base_url: Url,
    basic: Option<BasicAuth>,
}

impl Transport {
    /// Build a transport for `base_url`.
    ///
    /// Injects `X-Auth-Token` as a sensitive default header when a token
    /// is configured. Basic auth is attached per request.
    pub fn new(
        base_url: Url,
        credentials: &Credentials,
        config: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        if let Some(ref token) = credentials.api_token {
            let mut value =
                HeaderValue::from_str(token.expose_secret()).map_err(|e| Error::InvalidHeader {
                    message: format!("invalid API token header value: {e}"),
                })?;
            value.set_sensitive(true);
            headers.insert(API_TOKEN_HEADER, value);
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url,
            basic: credentials.basic.clone(),
        })
    }

    /// The daemon base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append an absolute API path (e.g. `/api/tunnel/start`) to the base URL,
    /// keeping any path prefix the base URL carries.
    pub fn url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    pub async fn get(&self, path: &str) -> Result<DaemonResponse, Error> {
        self.request::<()>(Method::GET, path, None).await
    }

    pub async fn post<B: Serialize + ?Sized + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<DaemonResponse, Error> {
        self.request(Method::POST, path, Some(body)).await
    }

    /// Issue a request, optionally with a JSON body.
    pub async fn request<B: Serialize + ?Sized + Sync>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<DaemonResponse, Error> {
        let url = self.url(path)?;
        debug!("{method} {url}");

        let mut builder = self.http.request(method, url);
        if let Some(ref basic) = self.basic {
            builder = builder.basic_auth(&basic.username, Some(basic.password.expose_secret()));
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let resp = builder.send().await?;
        Self::handle_response(resp).await
    }

    async fn handle_response(resp: reqwest::Response) -> Result<DaemonResponse, Error> {
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.text().await?;
        trace!(status = status.as_u16(), "daemon response: {body}");

        if status == StatusCode::CONFLICT {
            let server_version = headers
                .get(SERVER_VERSION_HEADER)
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());
            return Err(Error::DuplicateTunnel {
                body,
                server_version,
            });
        }
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(DaemonResponse {
            status,
            headers,
            body,
        })
    }
}
