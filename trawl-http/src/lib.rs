//! Minimal HTTP client with safe logging and flexible auth.
//!
//! - Request options: headers, `Auth`, query params, timeout
//! - Redacts authorization, cookie and CSRF values; never logs secrets
//! - Optional *raw* request/response logging via `TRAWL_HTTP_RAW=1`
//! - Exactly one attempt per call; callers decide what a failure means
//!
//! Example (no_run):
//! ```rust
//! # async fn demo() -> Result<(), trawl_http::HttpError> {
//! let client = trawl_http::HttpClient::new("https://api.example.com")?;
//! let got: serde_json::Value = client
//!     .get_json("v1/items", trawl_http::RequestOpts::default())
//!     .await?;
//! # Ok(()) }
//! ```

use reqwest::header::{COOKIE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::env;
use std::time::Duration;
use thiserror::Error;

const RAW_ENV: &str = "TRAWL_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024;
const CSRF_HEADER: &str = "x-csrf-token";

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

fn is_secret_header(name: &str) -> bool {
    name.eq_ignore_ascii_case("authorization")
        || name.eq_ignore_ascii_case("cookie")
        || name.eq_ignore_ascii_case(CSRF_HEADER)
}

fn is_secret_param(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "access_token"
            | "authorization"
            | "auth"
            | "auth_token"
            | "ct0"
            | "key"
            | "api_key"
            | "token"
            | "secret"
            | "bearer"
    )
}

/// Render a best-effort curl command for repro/debug, with secrets redacted.
fn make_curl(method: &Method, url: &Url, headers: &HeaderMap) -> String {
    let mut parts = vec!["curl".to_string(), format!("-X{}", method)];
    for (name, value) in redact_headers(headers) {
        parts.push(format!("-H '{}: {}'", name, value.replace('\'', r"'\''")));
    }
    parts.push(format!("'{}'", url.as_str()));
    parts.join(" ")
}

fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let key = k.as_str().to_string();
            let val = if is_secret_header(&key) {
                "<redacted>".to_string()
            } else {
                v.to_str().unwrap_or("").to_string()
            };
            (key, val)
        })
        .collect()
}

fn redact_query(query: &[(&str, Cow<'_, str>)]) -> Vec<(String, String)> {
    query
        .iter()
        .map(|(k, v)| {
            let shown = if is_secret_param(k) {
                "<redacted>".to_string()
            } else {
                v.as_ref().to_string()
            };
            ((*k).to_string(), shown)
        })
        .collect()
}

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}, body_snippet: {1}")]
    Decode(String, String),
    #[error("server returned error {status}: {message}, request_id={request_id}")]
    Api {
        status: StatusCode,
        message: String,
        request_id: String,
    },
}

/// Authentication strategies supported by the HTTP client helpers.
///
/// ```
/// use trawl_http::Auth;
///
/// let auth = Auth::CookieSession {
///     bearer: "public-bearer",
///     cookie: "auth_token=a; ct0=b",
///     csrf: "b",
/// };
/// assert_eq!(auth.kind(), "cookie_session");
/// ```
#[derive(Clone, Debug)]
pub enum Auth<'a> {
    /// Browser-style session: app bearer + cookie jar + CSRF echo header
    CookieSession {
        bearer: &'a str,
        cookie: &'a str,
        csrf: &'a str,
    },
    None,
}

impl Auth<'_> {
    /// Name logged instead of the secret itself.
    pub fn kind(&self) -> &'static str {
        match self {
            Auth::CookieSession { .. } => "cookie_session",
            Auth::None => "none",
        }
    }
}

/// Per-request tuning knobs for the HTTP client.
///
/// ```
/// use trawl_http::RequestOpts;
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(30)),
///     query: Some(vec![("count", "20".into())]),
///     ..Default::default()
/// };
///
/// assert_eq!(opts.timeout.unwrap().as_secs(), 30);
/// assert!(opts.auth.is_none());
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    pub timeout: Option<Duration>,
    pub auth: Option<Auth<'a>>,
    pub headers: Option<HeaderMap>,
    pub query: Option<Vec<(&'a str, Cow<'a, str>)>>,
}

#[derive(Clone, Debug)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    pub default_timeout: Duration,
}

impl HttpClient {
    /// Construct a client anchored to a base URL.
    ///
    /// ```no_run
    /// use trawl_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://api.example.com")?;
    /// assert_eq!(client.default_timeout, Duration::from_secs(15));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base,
            inner,
            default_timeout: Duration::from_secs(15),
        })
    }

    /// Override the default timeout returned by [`HttpClient::new`].
    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// GET JSON with per-request options (headers/query/auth/timeout).
    pub async fn get_json<T>(&self, path: &str, opts: RequestOpts<'_>) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        self.request_json(Method::GET, path, opts).await
    }

    async fn request_json<T>(
        &self,
        method: Method,
        path: &str,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        let url = self
            .base
            .join(path)
            .map_err(|e| HttpError::Url(e.to_string()))?;

        let timeout = opts.timeout.unwrap_or(self.default_timeout);
        let mut headers = opts.headers.clone().unwrap_or_default();
        let auth = opts.auth.as_ref().unwrap_or(&Auth::None);
        apply_auth(&mut headers, auth)?;

        let mut rb = self
            .inner
            .request(method.clone(), url.clone())
            .timeout(timeout)
            .headers(headers.clone());
        if let Some(q) = &opts.query {
            let pairs: Vec<(&str, &str)> = q.iter().map(|(k, v)| (*k, v.as_ref())).collect();
            rb = rb.query(&pairs);
        }
        let request = rb.build().map_err(|e| HttpError::Build(e.to_string()))?;

        let req_id = uuid::Uuid::new_v4().simple().to_string();
        tracing::debug!(
            req_id=%req_id,
            method=%method,
            host_path=%format!("{}{}", url.host_str().unwrap_or("-"), url.path()),
            query=?opts.query.as_deref().map(redact_query).unwrap_or_default(),
            timeout_ms=timeout.as_millis() as u64,
            auth_kind=auth.kind(),
            "http.request.start"
        );
        if raw_enabled() {
            let curl = make_curl(&method, request.url(), request.headers());
            tracing::debug!(target: "http.raw", %req_id, %curl, "request");
        }

        let t0 = std::time::Instant::now();
        let resp = self.inner.execute(request).await.map_err(|err| {
            tracing::warn!(req_id=%req_id, message=%err, "http.network_error.send");
            HttpError::Network(err.to_string())
        })?;
        let status = resp.status();
        let resp_headers = resp.headers().clone();
        let bytes = resp.bytes().await.map_err(|err| {
            tracing::warn!(req_id=%req_id, message=%err, "http.network_error.body");
            HttpError::Network(err.to_string())
        })?;
        let dur_ms = t0.elapsed().as_millis() as u64;

        let upstream_id = resp_headers
            .get("x-transaction-id")
            .or_else(|| resp_headers.get("x-request-id"))
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string();
        let remaining = resp_headers
            .get("x-rate-limit-remaining")
            .and_then(|v| v.to_str().ok());

        tracing::debug!(
            req_id=%req_id,
            %status,
            duration_ms=dur_ms,
            body_len=bytes.len(),
            upstream_id=%upstream_id,
            rate_limit.remaining=?remaining,
            "http.response.headers"
        );

        if raw_enabled() {
            let mut body = bytes.to_vec();
            let truncated = body.len() > RAW_MAX_BODY;
            body.truncate(RAW_MAX_BODY);
            tracing::debug!(
                target: "http.raw",
                %req_id,
                %status,
                headers=?redact_headers(&resp_headers),
                body=%String::from_utf8_lossy(&body),
                truncated,
                "response"
            );
        }

        let snippet = snip_body(&bytes);
        if status.is_success() {
            return serde_json::from_slice::<T>(&bytes).map_err(|e| {
                tracing::warn!(
                    req_id=%req_id,
                    serde_err=%e,
                    body_snippet=%snippet,
                    "http.response.decode_error"
                );
                HttpError::Decode(e.to_string(), snippet)
            });
        }

        let message = extract_error_message(&bytes);
        tracing::warn!(
            req_id=%req_id,
            %status,
            message=%message,
            upstream_id=%upstream_id,
            "http.error"
        );
        Err(HttpError::Api {
            status,
            message,
            request_id: upstream_id,
        })
    }
}

fn apply_auth(headers: &mut HeaderMap, auth: &Auth<'_>) -> Result<(), HttpError> {
    match auth {
        Auth::CookieSession {
            bearer,
            cookie,
            csrf,
        } => {
            headers.insert(reqwest::header::AUTHORIZATION, bearer_value(bearer)?);
            headers.insert(COOKIE, header_value("cookie", cookie)?);
            headers.insert(
                HeaderName::from_static(CSRF_HEADER),
                header_value(CSRF_HEADER, csrf)?,
            );
        }
        Auth::None => {}
    }
    Ok(())
}

fn header_value(name: &str, raw: &str) -> Result<HeaderValue, HttpError> {
    let mut value = HeaderValue::from_str(raw)
        .map_err(|e| HttpError::Build(format!("invalid {name} header: {e}")))?;
    value.set_sensitive(true);
    Ok(value)
}

fn bearer_value(raw: &str) -> Result<HeaderValue, HttpError> {
    let tok = sanitize_token(raw)?;
    header_value("authorization", &format!("Bearer {tok}"))
}

fn extract_error_message(body: &[u8]) -> String {
    // {"errors":[{"message":"...", "code": 32}]}
    #[derive(Deserialize)]
    struct TwErrors {
        errors: Vec<TwErr>,
    }
    #[derive(Deserialize)]
    struct TwErr {
        #[serde(default)]
        message: String,
        #[serde(default)]
        detail: String,
    }

    // {"message":"..."} / {"detail":"..."} / {"error":"..."}
    #[derive(Deserialize)]
    struct Msg {
        #[serde(default)]
        message: String,
        #[serde(default)]
        detail: String,
        #[serde(default)]
        error: String,
    }

    if let Ok(tw) = serde_json::from_slice::<TwErrors>(body) {
        if let Some(first) = tw.errors.into_iter().next() {
            if !first.message.is_empty() {
                return first.message;
            }
            if !first.detail.is_empty() {
                return first.detail;
            }
        }
    }
    if let Ok(m) = serde_json::from_slice::<Msg>(body) {
        for candidate in [m.message, m.detail, m.error] {
            if !candidate.is_empty() {
                return candidate;
            }
        }
    }
    snip_body(body)
}

fn snip_body(body: &[u8]) -> String {
    let snip = String::from_utf8_lossy(body);
    if snip.chars().count() > 500 {
        let mut cut: String = snip.chars().take(500).collect();
        cut.push_str("...");
        cut
    } else {
        snip.into_owned()
    }
}

fn sanitize_token(raw: &str) -> Result<String, HttpError> {
    let mut s = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string();
    s.retain(|ch| !ch.is_ascii_whitespace());

    if !s.is_ascii() {
        return Err(HttpError::Build("token contains non-ASCII bytes".into()));
    }
    if s.bytes().any(|b| b < 0x20 || b == 0x7F) {
        return Err(HttpError::Build("token contains control characters".into()));
    }
    Ok(s)
}
