// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Jittered exponential backoff for Kubernetes API and Infoblox WAPI calls.
//!
//! Two schedules are provided:
//! - [`default_backoff`] for Kubernetes API calls made through [`retry_api_call`]
//! - [`wapi_backoff`] for in-call retries of a single WAPI request
//!
//! In-call WAPI retries only smooth over short blips (rate limiting, a grid
//! master failover). Longer outages surface to the actuator, which requeues
//! the resource after a fixed delay instead.

use anyhow::Result;
use rand::Rng;
use reqwest::StatusCode;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// Maximum total time to spend retrying a Kubernetes API call (5 minutes)
const MAX_ELAPSED_TIME_SECS: u64 = 300;

/// Initial Kubernetes API retry interval (100ms)
const INITIAL_INTERVAL_MILLIS: u64 = 100;

/// Maximum interval between Kubernetes API retries (30 seconds)
const MAX_INTERVAL_SECS: u64 = 30;

/// Backoff multiplier (exponential growth factor)
const BACKOFF_MULTIPLIER: f64 = 2.0;

/// Randomization factor (±10%)
const RANDOMIZATION_FACTOR: f64 = 0.1;

/// WAPI retry initial interval (200ms)
const WAPI_INITIAL_INTERVAL_MILLIS: u64 = 200;

/// WAPI retry maximum interval (5 seconds)
const WAPI_MAX_INTERVAL_SECS: u64 = 5;

/// WAPI retry maximum elapsed time (20 seconds), below the actuator's fixed requeue
const WAPI_MAX_ELAPSED_TIME_SECS: u64 = 20;

/// Exponential backoff with jitter.
#[derive(Debug)]
pub struct ExponentialBackoff {
    /// Interval returned by the next call to [`Self::next_backoff`] (before jitter)
    pub current_interval: Duration,
    pub initial_interval: Duration,
    pub max_interval: Duration,
    /// Give up once this much time has passed since construction
    pub max_elapsed_time: Option<Duration>,
    pub multiplier: f64,
    pub randomization_factor: f64,
    start_time: Instant,
}

impl ExponentialBackoff {
    fn new(
        initial_interval: Duration,
        max_interval: Duration,
        max_elapsed_time: Option<Duration>,
        multiplier: f64,
        randomization_factor: f64,
    ) -> Self {
        Self {
            current_interval: initial_interval,
            initial_interval,
            max_interval,
            max_elapsed_time,
            multiplier,
            randomization_factor,
            start_time: Instant::now(),
        }
    }

    /// Next backoff interval, or `None` once the elapsed time budget is spent.
    pub fn next_backoff(&mut self) -> Option<Duration> {
        if self.is_exhausted() {
            return None;
        }

        let interval = self.current_interval;
        let next = interval.as_secs_f64() * self.multiplier;
        self.current_interval = Duration::from_secs_f64(next).min(self.max_interval);

        Some(self.apply_jitter(interval))
    }

    /// True once `max_elapsed_time` has passed.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.max_elapsed_time
            .is_some_and(|max| self.start_time.elapsed() >= max)
    }

    /// Time since the backoff was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    fn apply_jitter(&self, interval: Duration) -> Duration {
        if self.randomization_factor == 0.0 {
            return interval;
        }

        let secs = interval.as_secs_f64();
        let delta = secs * self.randomization_factor;
        let jittered = rand::rng().random_range((secs - delta)..=(secs + delta));

        Duration::from_secs_f64(jittered.max(0.0))
    }
}

/// Backoff schedule for Kubernetes API retries.
///
/// 100ms doubling up to 30s between attempts, for at most 5 minutes, ±10% jitter.
#[must_use]
pub fn default_backoff() -> ExponentialBackoff {
    ExponentialBackoff::new(
        Duration::from_millis(INITIAL_INTERVAL_MILLIS),
        Duration::from_secs(MAX_INTERVAL_SECS),
        Some(Duration::from_secs(MAX_ELAPSED_TIME_SECS)),
        BACKOFF_MULTIPLIER,
        RANDOMIZATION_FACTOR,
    )
}

/// Backoff schedule for a single Infoblox WAPI request.
///
/// # Retry Schedule
///
/// 1. 200ms
/// 2. 400ms
/// 3. 800ms
/// 4. 1.6s
/// 5. 3.2s
/// 6. 5s (capped), repeated until 20 seconds have elapsed
#[must_use]
pub fn wapi_backoff() -> ExponentialBackoff {
    ExponentialBackoff::new(
        Duration::from_millis(WAPI_INITIAL_INTERVAL_MILLIS),
        Duration::from_secs(WAPI_MAX_INTERVAL_SECS),
        Some(Duration::from_secs(WAPI_MAX_ELAPSED_TIME_SECS)),
        BACKOFF_MULTIPLIER,
        RANDOMIZATION_FACTOR,
    )
}

/// Whether an HTTP status indicates a transient failure (429, 500, 502, 503, 504).
#[must_use]
pub fn is_retryable_http_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

/// Retry a Kubernetes API call with exponential backoff.
///
/// Retries on HTTP 429, 5xx and transport errors; fails immediately on other
/// client errors (not found, conflict, forbidden, ...).
///
/// # Errors
///
/// Returns the last error once a non-retryable error is seen or the backoff is
/// exhausted.
///
/// # Example
///
/// ```no_run
/// use k8s_openapi::api::core::v1::Secret;
/// use kube::{Api, Client};
/// use ibdns::reconcilers::retry::retry_api_call;
///
/// # async fn example() -> anyhow::Result<()> {
/// let client = Client::try_default().await?;
/// let secrets: Api<Secret> = Api::namespaced(client, "dns");
///
/// let secret = retry_api_call(
///     || async { secrets.get("infoblox-credentials").await },
///     "get secret infoblox-credentials",
/// )
/// .await?;
/// # Ok(())
/// # }
/// ```
pub async fn retry_api_call<T, F, Fut>(mut operation: F, operation_name: &str) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, kube::Error>>,
{
    let mut backoff = default_backoff();
    let mut attempt = 0;

    loop {
        attempt += 1;

        let e = match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(
                        operation = operation_name,
                        attempt = attempt,
                        elapsed = ?backoff.elapsed(),
                        "Kubernetes API call succeeded after retries"
                    );
                }
                return Ok(value);
            }
            Err(e) => e,
        };

        if !is_retryable_error(&e) {
            debug!(
                operation = operation_name,
                error = %e,
                "Non-retryable Kubernetes API error"
            );
            return Err(e.into());
        }

        let Some(duration) = backoff.next_backoff() else {
            error!(
                operation = operation_name,
                attempt = attempt,
                elapsed = ?backoff.elapsed(),
                error = %e,
                "Backoff exhausted, giving up"
            );
            return Err(anyhow::anyhow!(
                "{operation_name}: backoff exhausted after {attempt} attempts: {e}"
            ));
        };

        warn!(
            operation = operation_name,
            attempt = attempt,
            retry_after = ?duration,
            error = %e,
            "Retryable Kubernetes API error, will retry"
        );
        tokio::time::sleep(duration).await;
    }
}

/// Whether a Kubernetes client error is transient (429, 5xx, transport).
fn is_retryable_error(err: &kube::Error) -> bool {
    match err {
        kube::Error::Api(api_err) => {
            api_err.code == 429 || (api_err.code >= 500 && api_err.code < 600)
        }
        kube::Error::Service(_) => true,
        _ => false,
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod retry_tests;
