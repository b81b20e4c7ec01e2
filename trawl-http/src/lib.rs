//! Small JSON-over-HTTP client used by the trawl API wrappers.
//!
//! - Relative paths are joined onto a fixed base URL
//! - `Auth::Bearer` tokens are sanitised before use and never logged
//! - Sensitive query parameters are redacted in logs
//! - Raw response bodies are logged (target `http.raw`) when `TRAWL_HTTP_RAW=1`
//!
//! Requests are sent exactly once. A failed request surfaces as an
//! [`HttpError`] and it is up to the caller to decide whether the run goes on.
//!
//! ```no_run
//! # async fn demo() -> Result<(), trawl_http::HttpError> {
//! let client = trawl_http::HttpClient::new("https://mastodon.example")?;
//! let got: serde_json::Value = client
//!     .get_json("api/v1/instance", trawl_http::RequestOpts::default())
//!     .await?;
//! # Ok(()) }
//! ```

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Method, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::time::{Duration, Instant};
use thiserror::Error;

const RAW_ENV: &str = "TRAWL_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024;
const SNIPPET_MAX: usize = 500;

const SECRET_PARAMS: &[&str] = &[
    "access_token",
    "authorization",
    "auth",
    "key",
    "api_key",
    "token",
    "secret",
    "client_secret",
    "bearer",
    "password",
];

fn raw_enabled() -> bool {
    matches!(
        std::env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
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

impl HttpError {
    /// HTTP status for API errors, `None` for transport or decode failures.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            HttpError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// How a request authenticates.
#[derive(Clone, Debug)]
pub enum Auth<'a> {
    /// `Authorization: Bearer <token>`
    Bearer(&'a str),
    None,
}

/// Per-request knobs.
///
/// ```
/// use trawl_http::{Auth, RequestOpts};
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(30)),
///     auth: Some(Auth::Bearer("token")),
///     query: Some(vec![("limit", "40".into())]),
///     ..Default::default()
/// };
/// assert_eq!(opts.query.unwrap().len(), 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    pub timeout: Option<Duration>,
    pub auth: Option<Auth<'a>>,
    pub query: Option<Vec<(&'a str, Cow<'a, str>)>>,
}

#[derive(Clone, Debug)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    pub default_timeout: Duration,
}

impl HttpClient {
    /// Build a client anchored at `base`. A trailing slash is added so relative
    /// paths extend the base path instead of replacing its last segment.
    ///
    /// ```
    /// use trawl_http::HttpClient;
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://mastodon.example/").unwrap();
    /// assert_eq!(client.default_timeout, Duration::from_secs(15));
    /// assert_eq!(client.base().as_str(), "https://mastodon.example/");
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let mut base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
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

    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// GET `path` (relative to the base) and decode the JSON body.
    pub async fn get_json<T>(&self, path: &str, opts: RequestOpts<'_>) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        self.send_json(Method::GET, path, opts).await
    }

    async fn send_json<T>(
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
            .join(path.trim_start_matches('/'))
            .map_err(|e| HttpError::Url(e.to_string()))?;
        let timeout = opts.timeout.unwrap_or(self.default_timeout);

        let mut rb = self
            .inner
            .request(method.clone(), url.clone())
            .timeout(timeout);
        if let Some(q) = &opts.query {
            let pairs: Vec<(&str, &str)> = q.iter().map(|(k, v)| (*k, v.as_ref())).collect();
            rb = rb.query(&pairs);
        }
        let auth_kind = match &opts.auth {
            Some(Auth::Bearer(token)) => {
                rb = rb.bearer_auth(sanitize_token(token)?);
                "bearer"
            }
            Some(Auth::None) | None => "none",
        };

        let req_id = next_request_id();
        tracing::debug!(
            req_id = %req_id,
            method = %method,
            host_path = %format!("{}{}", url.host_str().unwrap_or("-"), url.path()),
            query = ?redact_query(opts.query.as_deref().unwrap_or_default()),
            timeout_ms = timeout.as_millis() as u64,
            auth_kind,
            "http.request.start"
        );

        let started = Instant::now();
        let resp = rb.send().await.map_err(|e| {
            tracing::warn!(req_id = %req_id, message = %e, "http.network_error.send");
            HttpError::Network(e.to_string())
        })?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = resp.bytes().await.map_err(|e| {
            tracing::warn!(req_id = %req_id, message = %e, "http.network_error.body");
            HttpError::Network(e.to_string())
        })?;
        let request_id = headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string();

        tracing::debug!(
            req_id = %req_id,
            %status,
            duration_ms = started.elapsed().as_millis() as u64,
            body_len = bytes.len(),
            x_request_id = %request_id,
            rate_limit.remaining = ?header_str(&headers, "x-ratelimit-remaining"),
            rate_limit.reset = ?header_str(&headers, "x-ratelimit-reset"),
            "http.response.headers"
        );
        if raw_enabled() {
            let cut = bytes.len().min(RAW_MAX_BODY);
            tracing::info!(
                target: "http.raw",
                %req_id,
                %status,
                body = %String::from_utf8_lossy(&bytes[..cut]),
                truncated = bytes.len() > RAW_MAX_BODY,
                "response"
            );
        }

        let snippet = snip_body(&bytes);
        if status.is_success() {
            return serde_json::from_slice::<T>(&bytes).map_err(|e| {
                tracing::warn!(
                    req_id = %req_id,
                    serde_line = e.line(),
                    serde_col = e.column(),
                    serde_err = %e,
                    body_snippet = %snippet,
                    "http.response.decode_error"
                );
                HttpError::Decode(e.to_string(), snippet)
            });
        }

        let message = extract_error_message(&bytes);
        tracing::warn!(
            req_id = %req_id,
            %status,
            message = %message,
            x_request_id = %request_id,
            "http.error"
        );
        Err(HttpError::Api {
            status,
            message,
            request_id,
        })
    }
}

fn next_request_id() -> String {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    format!("r{:06}", COUNTER.fetch_add(1, Ordering::Relaxed))
}

fn header_str<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn is_secret_param(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    SECRET_PARAMS.contains(&lower.as_str())
}

fn redact_query(query: &[(&str, Cow<'_, str>)]) -> Vec<(String, String)> {
    query
        .iter()
        .map(|(k, v)| {
            let shown = if is_secret_param(k) {
                "<redacted>".to_string()
            } else {
                v.to_string()
            };
            ((*k).to_string(), shown)
        })
        .collect()
}

/// Pull a human-readable message out of an error body.
///
/// Mastodon answers `{"error": "..."}`, sometimes with `error_description`.
fn extract_error_message(body: &[u8]) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        #[serde(default)]
        error: String,
        #[serde(default)]
        error_description: String,
        #[serde(default)]
        message: String,
    }

    if let Ok(parsed) = serde_json::from_slice::<ErrorBody>(body) {
        for candidate in [parsed.error_description, parsed.error, parsed.message] {
            if !candidate.is_empty() {
                return candidate;
            }
        }
    }
    snip_body(body)
}

fn snip_body(body: &[u8]) -> String {
    let mut snip = String::from_utf8_lossy(body).into_owned();
    if snip.len() > SNIPPET_MAX {
        let mut cut = SNIPPET_MAX;
        while !snip.is_char_boundary(cut) {
            cut -= 1;
        }
        snip.truncate(cut);
        snip.push_str("...");
    }
    snip
}

fn sanitize_token(raw: &str) -> Result<String, HttpError> {
    let mut token = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string();
    token.retain(|ch| !ch.is_ascii_whitespace());

    if token.is_empty() {
        return Err(HttpError::Build("access token is empty".into()));
    }
    if !token.is_ascii() {
        return Err(HttpError::Build("access token contains non-ASCII bytes".into()));
    }
    if token.bytes().any(|b| b < 0x20 || b == 0x7F) {
        return Err(HttpError::Build(
            "access token contains control characters".into(),
        ));
    }
    HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|e| HttpError::Build(format!("invalid Authorization header: {e}")))?;
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_trimmed_and_unquoted() {
        assert_eq!(sanitize_token("  \"abc def\"\n").unwrap(), "abcdef");
    }

    #[test]
    fn empty_token_is_rejected() {
        assert!(matches!(sanitize_token(" '' "), Err(HttpError::Build(_))));
    }

    #[test]
    fn secret_query_values_are_redacted() {
        let q = vec![("limit", Cow::Borrowed("40")), ("Access_Token", Cow::Borrowed("s3cret"))];
        let shown = redact_query(&q);
        assert_eq!(shown[0], ("limit".to_string(), "40".to_string()));
        assert_eq!(shown[1].1, "<redacted>");
    }

    #[test]
    fn error_message_prefers_description() {
        let body = br#"{"error":"invalid_token","error_description":"The access token was revoked"}"#;
        assert_eq!(extract_error_message(body), "The access token was revoked");
        assert_eq!(extract_error_message(br#"{"error":"Record not found"}"#), "Record not found");
        assert_eq!(extract_error_message(b"<html>gateway</html>"), "<html>gateway</html>");
    }

    #[test]
    fn snippet_is_capped_on_char_boundary() {
        let body = "é".repeat(400);
        let snip = snip_body(body.as_bytes());
        assert!(snip.ends_with("..."));
        assert!(snip.len() <= SNIPPET_MAX + 3);
    }

    #[test]
    fn base_gets_trailing_slash() {
        let client = HttpClient::new("https://example.org/sub").unwrap();
        assert_eq!(client.base().as_str(), "https://example.org/sub/");
        assert_eq!(
            client.base().join("api/v1/x").unwrap().as_str(),
            "https://example.org/sub/api/v1/x"
        );
    }
}
