use std::time::Duration;

use time::UtcOffset;

use crate::retry::{MAX_ATTEMPTS, RETRY_DELAY};
use crate::url::DEFAULT_CLEVERBOT_BASE_URL;

/// How long a bootstrapped session cookie is reused before refreshing.
pub const COOKIE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Transport configuration for Cleverbot requests.
///
/// Defaults are the protocol constants; overriding them is meant for pointing
/// the client at a local test server.
#[derive(Debug, Clone)]
pub struct CleverbotConfig {
    /// Origin for the cookie bootstrap and conversation endpoints.
    pub base_url: String,
    /// Optional per-request timeout.
    pub timeout: Option<Duration>,
    /// Total POST attempts before giving up on 503s or transport failures.
    pub max_attempts: u32,
    /// Fixed delay between attempts.
    pub retry_delay: Duration,
    /// Lifetime of a bootstrapped cookie.
    pub cookie_ttl: Duration,
    /// Offset used for the calendar date in the cookie cache-buster. The host
    /// resolves its local offset before spawning threads; `UTC` otherwise.
    pub utc_offset: UtcOffset,
}

impl Default for CleverbotConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CLEVERBOT_BASE_URL.to_string(),
            timeout: None,
            max_attempts: MAX_ATTEMPTS,
            retry_delay: RETRY_DELAY,
            cookie_ttl: COOKIE_TTL,
            utc_offset: UtcOffset::UTC,
        }
    }
}

impl CleverbotConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn with_cookie_ttl(mut self, cookie_ttl: Duration) -> Self {
        self.cookie_ttl = cookie_ttl;
        self
    }

    pub fn with_utc_offset(mut self, utc_offset: UtcOffset) -> Self {
        self.utc_offset = utc_offset;
        self
    }
}
