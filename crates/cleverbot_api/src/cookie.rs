//! Owned cache for the daily session cookie.
//!
//! Reads of a fresh cookie only take the `RwLock` read side. Refreshes are
//! serialized through an async mutex and re-check the cache after acquiring
//! it, so a burst of callers hitting a cold cache produces a single bootstrap
//! request whose value all of them observe.

use std::future::Future;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::debug;

use crate::config::COOKIE_TTL;
use crate::error::CleverbotApiError;

#[derive(Debug, Clone)]
struct SessionCookie {
    value: String,
    /// `None` when the TTL reaches past what `Instant` can represent.
    expires_at: Option<Instant>,
}

impl SessionCookie {
    fn is_fresh(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|expires_at| now < expires_at)
    }
}

#[derive(Debug)]
pub struct CookieCache {
    cached: RwLock<Option<SessionCookie>>,
    refresh_guard: Mutex<()>,
    ttl: Duration,
}

impl Default for CookieCache {
    fn default() -> Self {
        Self::new(COOKIE_TTL)
    }
}

impl CookieCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cached: RwLock::new(None),
            refresh_guard: Mutex::new(()),
            ttl,
        }
    }

    /// Returns the cached cookie if it has not expired yet.
    pub fn current(&self) -> Option<String> {
        read_unpoisoned(&self.cached)
            .as_ref()
            .filter(|cookie| cookie.is_fresh(Instant::now()))
            .map(|cookie| cookie.value.clone())
    }

    /// Returns the cached cookie, running `refresh` when it is missing or
    /// expired.
    ///
    /// At most one `refresh` runs at a time; callers that queued behind it
    /// reuse its result. A failed refresh leaves the cache untouched and the
    /// error goes to the caller that ran it.
    pub async fn get_or_refresh<F, Fut>(&self, refresh: F) -> Result<String, CleverbotApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, CleverbotApiError>>,
    {
        if let Some(value) = self.current() {
            return Ok(value);
        }

        let _refreshing = self.refresh_guard.lock().await;
        if let Some(value) = self.current() {
            return Ok(value);
        }

        debug!("refreshing session cookie");
        let value = refresh().await?;
        *write_unpoisoned(&self.cached) = Some(SessionCookie {
            value: value.clone(),
            expires_at: Instant::now().checked_add(self.ttl),
        });
        Ok(value)
    }
}

fn read_unpoisoned<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn write_unpoisoned<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
