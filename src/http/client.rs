//! Provides [`RateLimitAwareClient`], the single entry point for every HTTP request
//! made against AEMET OpenData.
//!
//! Each call to [`RateLimitAwareClient::fetch`] is paced against the previous
//! request, classified into success or one of the [`FetchError`] kinds, and
//! retried in an explicit loop while the failure is retryable and the attempt
//! budget allows it.

use crate::http::error::FetchError;
use crate::http::retry::RetryPolicy;
use crate::http::transport::{RawResponse, Transport};
use log::{debug, error, warn};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde_json::Value;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Value of AEMET's `estado` body field that signals a rate-limited request.
pub const RATE_LIMIT_ESTADO: i64 = 429;

pub struct RateLimitAwareClient<T> {
    transport: T,
    policy: RetryPolicy,
    last_request: Mutex<Option<Instant>>,
}

impl<T: Transport> RateLimitAwareClient<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self {
            transport,
            policy,
            last_request: Mutex::new(None),
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// GETs `url` and parses the body as JSON.
    ///
    /// Returns `Ok(None)` for a 2xx response with an empty body.
    ///
    /// # Errors
    ///
    /// * [`FetchError::Permanent`] on a non-2xx status other than 429, or a body
    ///   that is not valid JSON. Returned after the first attempt.
    /// * [`FetchError::Exhausted`] when every attempt ended in a
    ///   [`FetchError::Transient`] or [`FetchError::RateLimited`] failure.
    pub async fn fetch(
        &self,
        url: &str,
        headers: &HeaderMap,
        timeout: Duration,
    ) -> Result<Option<Value>, FetchError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            self.pace().await;
            let failure = match self.attempt(url, headers, timeout).await {
                Ok(body) => return Ok(body),
                Err(e) => e,
            };

            if !failure.is_retryable() {
                error!("{failure}");
                return Err(failure);
            }
            if attempt >= max_attempts {
                error!("{failure}; no attempts left ({attempt}/{max_attempts})");
                return Err(FetchError::Exhausted {
                    url: url.to_string(),
                    attempts: attempt,
                    last: Box::new(failure),
                });
            }

            let wait = self.policy.wait_after(&failure, attempt);
            warn!("{failure}; attempt {attempt}/{max_attempts}, retrying in {wait:?}");
            sleep(wait).await;
            attempt += 1;
        }
    }

    async fn attempt(
        &self,
        url: &str,
        headers: &HeaderMap,
        timeout: Duration,
    ) -> Result<Option<Value>, FetchError> {
        let response = self
            .transport
            .get(url, headers, timeout)
            .await
            .map_err(|source| FetchError::Transient {
                url: url.to_string(),
                source,
            })?;
        classify(url, response)
    }

    /// Waits until `min_request_interval` has passed since the previous request.
    async fn pace(&self) {
        let wait = {
            let mut last = self
                .last_request
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let now = Instant::now();
            let wait = last
                .map(|previous| {
                    self.policy
                        .min_request_interval
                        .saturating_sub(now.saturating_duration_since(previous))
                })
                .unwrap_or_default();
            *last = Some(now + wait);
            wait
        };
        if !wait.is_zero() {
            debug!("Pacing request, sleeping {wait:?}");
            sleep(wait).await;
        }
    }
}

/// Maps a completed HTTP exchange onto the success/failure taxonomy.
pub(crate) fn classify(url: &str, response: RawResponse) -> Result<Option<Value>, FetchError> {
    let status = response.status;
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(FetchError::RateLimited {
            url: url.to_string(),
        });
    }
    if !status.is_success() {
        return Err(FetchError::Permanent {
            url: url.to_string(),
            reason: format!("HTTP {status}"),
        });
    }
    if response.body.trim().is_empty() {
        return Ok(None);
    }

    let value: Value =
        serde_json::from_str(&response.body).map_err(|e| FetchError::Permanent {
            url: url.to_string(),
            reason: format!("invalid JSON body: {e}"),
        })?;
    if value.get("estado").and_then(Value::as_i64) == Some(RATE_LIMIT_ESTADO) {
        return Err(FetchError::RateLimited {
            url: url.to_string(),
        });
    }
    Ok(Some(value))
}
