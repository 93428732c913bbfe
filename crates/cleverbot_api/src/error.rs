use thiserror::Error;

#[derive(Debug, Error)]
pub enum CleverbotApiError {
    /// Transport-level failure (connect, timeout, body read) that outlived the
    /// retry budget, or a failed cookie bootstrap request.
    #[error("network error after {attempts} attempt(s): {message}")]
    Network {
        attempts: u32,
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("service unavailable after {attempts} attempt(s) (last_error: {last_error})")]
    ServiceUnavailable { attempts: u32, last_error: String },

    #[error("unexpected HTTP status {0}")]
    UnexpectedStatus(u16),

    #[error("empty reply from service")]
    EmptyReply,

    #[error("request denied by service (rate limited)")]
    RateLimited,

    #[error("cookie bootstrap returned no session cookie")]
    MissingCookie,

    #[error("invalid header value for {name}")]
    InvalidHeader { name: &'static str },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request was cancelled")]
    Cancelled,
}

impl CleverbotApiError {
    /// Wraps a transport failure, dropping its request URL so the query string
    /// never reaches logs or user-facing messages.
    #[must_use]
    pub fn network(attempts: u32, source: reqwest::Error) -> Self {
        let source = source.without_url();
        Self::Network {
            attempts,
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Returns `true` for failures the transport retry loop absorbs.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::ServiceUnavailable { .. })
    }
}
