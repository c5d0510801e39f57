//! Error types for the portal transport.

/// Errors that can occur when talking to the portal.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Connectivity failed (DNS, reset, timeout) and every retry was used up.
    #[error("transport failed for {url} after {attempts} attempt(s)")]
    Transport {
        url: String,
        attempts: usize,
        #[source]
        source: reqwest::Error,
    },
    /// The portal answered with a non-2xx status. Never retried.
    #[error("request to {url} failed with status {status}")]
    HttpStatus { url: String, status: u16 },
    /// The request could not be built (bad URL or header value).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// The response arrived but its body could not be read.
    #[error("failed to read response body from {url}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl Error {
    /// True for failures worth another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}
