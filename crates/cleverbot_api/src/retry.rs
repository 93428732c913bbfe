use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::client::{await_or_cancel, is_cancelled, CancellationSignal};
use crate::error::CleverbotApiError;

/// Total POST attempts, including the first one.
pub const MAX_ATTEMPTS: u32 = 15;
/// Fixed delay before every retry.
pub const RETRY_DELAY: Duration = Duration::from_secs(1);
/// The only HTTP status the service uses to signal a transient overload.
pub const RETRYABLE_STATUS: u16 = 503;

/// Whether a response status should be retried rather than returned.
pub fn is_retryable_status(status: u16) -> bool {
    status == RETRYABLE_STATUS
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            delay: RETRY_DELAY,
        }
    }
}

/// Why a single attempt asked to be retried.
#[derive(Debug)]
pub enum RetryReason {
    ServiceUnavailable(String),
    Transport(reqwest::Error),
}

impl RetryReason {
    /// Strips the request URL from transport errors. The query string carries
    /// message text and session tokens.
    fn redacted(self) -> Self {
        match self {
            Self::Transport(error) => Self::Transport(error.without_url()),
            other => other,
        }
    }
}

/// Result of one attempt inside [`run_with_retry`].
#[derive(Debug)]
pub enum Attempt<T> {
    Done(T),
    Retry(RetryReason),
}

/// Drives `attempt` until it returns [`Attempt::Done`], an error, or the
/// policy runs out of attempts.
///
/// `attempt` receives the zero-based attempt number. Errors it returns are
/// propagated untouched. Exhaustion maps the last retry reason to
/// `ServiceUnavailable` or `Network`.
pub async fn run_with_retry<T, F, Fut>(
    policy: RetryPolicy,
    cancellation: Option<&CancellationSignal>,
    mut attempt: F,
) -> Result<T, CleverbotApiError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Attempt<T>, CleverbotApiError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut last_reason = None;

    for attempt_index in 0..max_attempts {
        if is_cancelled(cancellation) {
            return Err(CleverbotApiError::Cancelled);
        }

        let reason = match attempt(attempt_index).await? {
            Attempt::Done(value) => return Ok(value),
            Attempt::Retry(reason) => reason.redacted(),
        };

        let attempt_number = attempt_index + 1;
        match &reason {
            RetryReason::ServiceUnavailable(message) => {
                warn!(attempt = attempt_number, max_attempts, %message, "service unavailable");
            }
            RetryReason::Transport(error) => {
                warn!(attempt = attempt_number, max_attempts, %error, "transport failure");
            }
        }
        last_reason = Some(reason);

        if attempt_number < max_attempts {
            await_or_cancel(tokio::time::sleep(policy.delay), cancellation).await?;
        }
    }

    Err(exhausted(max_attempts, last_reason))
}

fn exhausted(attempts: u32, last_reason: Option<RetryReason>) -> CleverbotApiError {
    match last_reason {
        Some(RetryReason::Transport(error)) => CleverbotApiError::network(attempts, error),
        Some(RetryReason::ServiceUnavailable(last_error)) => {
            CleverbotApiError::ServiceUnavailable {
                attempts,
                last_error,
            }
        }
        None => CleverbotApiError::ServiceUnavailable {
            attempts,
            last_error: format!("failed to get a response after {attempts} tries"),
        },
    }
}
