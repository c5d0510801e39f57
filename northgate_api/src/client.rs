//! HTTP transport for Northgate portals.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, COOKIE};

use crate::{headers::RequestHeaders, Error};

/// Per-request timeout used when the caller does not set one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(100);
/// Attempts made on connectivity failures before giving up.
pub const DEFAULT_MAX_ATTEMPTS: usize = 5;
/// Fixed pause between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Transport settings. Built once and shared by every request.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub max_attempts: usize,
    pub retry_delay: Duration,
    /// Skip TLS certificate validation. The Wandsworth hosts need this.
    pub accept_invalid_certs: bool,
    /// Referer placed in the default header profile.
    pub default_referer: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            accept_invalid_certs: true,
            default_referer: "https://www.wandsworth.gov.uk/".to_string(),
        }
    }
}

impl TransportConfig {
    /// Defaults overridden by `PLANSCRAPER_*` environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            timeout: Duration::from_secs(env_u64(
                "PLANSCRAPER_TIMEOUT_SECS",
                defaults.timeout.as_secs(),
            )),
            max_attempts: env_usize("PLANSCRAPER_RETRY_MAX", defaults.max_attempts),
            retry_delay: Duration::from_millis(env_u64(
                "PLANSCRAPER_RETRY_DELAY_MS",
                defaults.retry_delay.as_millis() as u64,
            )),
            accept_invalid_certs: !env_bool("PLANSCRAPER_VERIFY_TLS", !defaults.accept_invalid_certs),
            default_referer: defaults.default_referer,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// One request to the portal. Headers, when given, replace the default
/// profile entirely; they are never merged with it.
#[derive(Debug, Clone)]
pub struct PortalRequest {
    method: Method,
    url: String,
    timeout: Option<Duration>,
    headers: Option<RequestHeaders>,
    cookies: Vec<(String, String)>,
    body: Option<String>,
}

impl PortalRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            timeout: None,
            headers: None,
            cookies: Vec::new(),
            body: None,
        }
    }

    /// A POST carrying an already urlencoded form body.
    pub fn post(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            body: Some(body.into()),
            ..Self::get(url)
        }
    }

    pub fn with_headers(mut self, headers: RequestHeaders) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.push((name.into(), value.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// A successful (2xx) response, fully buffered.
#[derive(Debug, Clone)]
pub struct PortalResponse {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl PortalResponse {
    /// The body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn is_pdf(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.contains("application/pdf"))
    }
}

/// HTTP client for one crawl.
///
/// Holds a single `reqwest::Client` with a cookie store, so the ASP.NET
/// session cookie follows the postback chain. Connectivity failures are
/// retried with a fixed delay; status failures are returned immediately.
pub struct Transport {
    http: reqwest::Client,
    config: TransportConfig,
}

impl Transport {
    pub fn new(config: TransportConfig) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                Error::InvalidRequest(format!("failed to build HTTP client: {}", e))
            })?;
        Ok(Self { http, config })
    }

    pub async fn get(&self, url: &str) -> Result<PortalResponse, Error> {
        self.send(&PortalRequest::get(url)).await
    }

    pub async fn send(&self, request: &PortalRequest) -> Result<PortalResponse, Error> {
        let headers = self.header_map(request)?;
        let timeout = request.timeout.unwrap_or(self.config.timeout);
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 0usize;

        loop {
            attempt += 1;
            let builder = match request.method {
                Method::Get => self.http.get(&request.url),
                Method::Post => self.http.post(&request.url),
            };
            let mut builder = builder.headers(headers.clone()).timeout(timeout);
            if let Some(body) = &request.body {
                builder = builder.body(body.clone());
            }

            let err = match builder.send().await {
                Ok(resp) => match read_response(&request.url, resp).await {
                    Err(Error::Body { source, .. }) if is_interrupted_body(&source) => source,
                    other => return other,
                },
                Err(err) if err.is_builder() => {
                    tracing::error!("Invalid request for {}: {}", request.url, err);
                    return Err(Error::InvalidRequest(err.to_string()));
                }
                Err(err) => err,
            };

            if is_connectivity(&err) && attempt < max_attempts {
                tracing::warn!(
                    "{:?} {} failed (attempt {}/{}), retrying in {:.1}s: {}",
                    request.method,
                    request.url,
                    attempt,
                    max_attempts,
                    self.config.retry_delay.as_secs_f64(),
                    err
                );
                tokio::time::sleep(self.config.retry_delay).await;
                continue;
            }

            tracing::error!(
                "{:?} {} failed after {} attempt(s): {}",
                request.method,
                request.url,
                attempt,
                err
            );
            return Err(Error::Transport {
                url: request.url.clone(),
                attempts: attempt,
                source: err,
            });
        }
    }

    fn header_map(&self, request: &PortalRequest) -> Result<HeaderMap, Error> {
        let profile = request
            .headers
            .clone()
            .unwrap_or_else(|| RequestHeaders::browser(&self.config.default_referer));

        let mut map = HeaderMap::with_capacity(profile.len() + 1);
        for (name, value) in profile.iter() {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::InvalidRequest(format!("header name {}: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::InvalidRequest(format!("header {}: {}", name, e)))?;
            map.insert(name, value);
        }

        if !request.cookies.is_empty() {
            let cookie = request
                .cookies
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("; ");
            let value = HeaderValue::from_str(&cookie)
                .map_err(|e| Error::InvalidRequest(format!("cookie header: {}", e)))?;
            map.insert(COOKIE, value);
        }

        Ok(map)
    }
}

async fn read_response(url: &str, resp: reqwest::Response) -> Result<PortalResponse, Error> {
    let status = resp.status();
    if !status.is_success() {
        tracing::error!("Request to {} failed with status {}", url, status);
        return Err(Error::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let content_type = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = resp.bytes().await.map_err(|e| Error::Body {
        url: url.to_string(),
        source: e,
    })?;

    Ok(PortalResponse {
        url: url.to_string(),
        status: status.as_u16(),
        content_type,
        body: body.to_vec(),
    })
}

fn is_connectivity(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout() || err.is_request() || is_interrupted_body(err)
}

/// The body stream stalled or was cut off after the status line arrived.
fn is_interrupted_body(err: &reqwest::Error) -> bool {
    err.is_timeout() || (err.is_body() && !err.is_decode())
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|val| val.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|val| val.parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key).ok().as_deref().map(str::trim) {
        Some("1") | Some("true") | Some("yes") => true,
        Some("0") | Some("false") | Some("no") => false,
        _ => default,
    }
}
