use std::future::Future;
use std::sync::{atomic::AtomicBool, atomic::Ordering, Arc};
use std::time::Duration;

use reqwest::Client;
use time::{OffsetDateTime, UtcOffset};
use tracing::debug;

use crate::config::CleverbotConfig;
use crate::cookie::CookieCache;
use crate::error::CleverbotApiError;
use crate::headers::{bootstrap_headers, post_headers, session_cookie_from};
use crate::payload::CleverbotRequest;
use crate::retry::{is_retryable_status, run_with_retry, Attempt, RetryPolicy, RetryReason};
use crate::url::{cookie_bootstrap_url, webservice_url};

/// Optional cancellation signal shared across the cookie fetch, the POST
/// attempts and the delays between them.
pub type CancellationSignal = Arc<AtomicBool>;

const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Status and body of the response that ended the retry loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub text: String,
}

#[derive(Debug)]
pub struct CleverbotClient {
    http: Client,
    config: CleverbotConfig,
    cookies: CookieCache,
}

impl CleverbotClient {
    pub fn new(config: CleverbotConfig) -> Result<Self, CleverbotApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(CleverbotApiError::Client)?;
        let cookies = CookieCache::new(config.cookie_ttl);
        Ok(Self {
            http,
            config,
            cookies,
        })
    }

    pub fn config(&self) -> &CleverbotConfig {
        &self.config
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.config.max_attempts,
            delay: self.config.retry_delay,
        }
    }

    /// Returns the session cookie, bootstrapping it when the cache is cold or
    /// stale.
    pub async fn session_cookie(
        &self,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<String, CleverbotApiError> {
        self.cookies
            .get_or_refresh(|| self.fetch_session_cookie(cancellation))
            .await
    }

    async fn fetch_session_cookie(
        &self,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<String, CleverbotApiError> {
        let url = cookie_bootstrap_url(&self.config.base_url, today_at(self.config.utc_offset));
        debug!(%url, "bootstrapping session cookie");

        let response = await_or_cancel(
            self.http.get(&url).headers(bootstrap_headers()).send(),
            cancellation,
        )
        .await?
        .map_err(|error| CleverbotApiError::network(1, error))?;

        session_cookie_from(response.headers()).ok_or(CleverbotApiError::MissingCookie)
    }

    pub fn build_request(
        &self,
        request: &CleverbotRequest,
        session_cookie: &str,
    ) -> Result<reqwest::RequestBuilder, CleverbotApiError> {
        let headers = post_headers(session_cookie)?;
        Ok(self
            .http
            .post(webservice_url(&self.config.base_url, &request.query))
            .headers(headers)
            .body(request.body.clone()))
    }

    /// Sends `request`, retrying 503 responses and transport failures.
    ///
    /// Any other status is returned as-is; interpreting it is up to the caller.
    pub async fn post(
        &self,
        request: &CleverbotRequest,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<RawResponse, CleverbotApiError> {
        let session_cookie = self.session_cookie(cancellation).await?;
        let session_cookie = session_cookie.as_str();

        run_with_retry(self.retry_policy(), cancellation, |attempt| async move {
            self.post_once(request, session_cookie, attempt, cancellation)
                .await
        })
        .await
    }

    async fn post_once(
        &self,
        request: &CleverbotRequest,
        session_cookie: &str,
        attempt: u32,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<Attempt<RawResponse>, CleverbotApiError> {
        let sent = await_or_cancel(
            self.build_request(request, session_cookie)?.send(),
            cancellation,
        )
        .await?;
        let response = match sent {
            Ok(response) => response,
            Err(error) => return Ok(Attempt::Retry(RetryReason::Transport(error))),
        };

        let status = response.status();
        if is_retryable_status(status.as_u16()) {
            return Ok(Attempt::Retry(RetryReason::ServiceUnavailable(
                status.to_string(),
            )));
        }

        match await_or_cancel(response.text(), cancellation).await? {
            Ok(text) => {
                debug!(attempt, status = status.as_u16(), "received response");
                Ok(Attempt::Done(RawResponse {
                    status: status.as_u16(),
                    text,
                }))
            }
            Err(error) => Ok(Attempt::Retry(RetryReason::Transport(error))),
        }
    }
}

/// Current time shifted to `offset`, so `.date()` is the calendar day there.
fn today_at(offset: UtcOffset) -> OffsetDateTime {
    OffsetDateTime::now_utc().to_offset(offset)
}

pub(crate) fn is_cancelled(cancel: Option<&CancellationSignal>) -> bool {
    cancel.is_some_and(|token| token.load(Ordering::Acquire))
}

pub(crate) async fn await_or_cancel<F>(
    future: F,
    cancellation: Option<&CancellationSignal>,
) -> Result<F::Output, CleverbotApiError>
where
    F: Future,
{
    if cancellation.is_none() {
        return Ok(future.await);
    }

    let mut future = Box::pin(future);

    loop {
        if is_cancelled(cancellation) {
            return Err(CleverbotApiError::Cancelled);
        }

        if let Ok(output) = tokio::time::timeout(CANCEL_POLL_INTERVAL, &mut future).await {
            if is_cancelled(cancellation) {
                return Err(CleverbotApiError::Cancelled);
            }
            return Ok(output);
        }
    }
}
