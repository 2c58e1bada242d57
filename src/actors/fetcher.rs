//! Fetcher - one PageSpeed measurement per target, with retries
//!
//! ## Flow
//!
//! ```text
//! Target → PageSpeedApi call ──ok──→ write readings to MetricStore → FetchReport
//!               │
//!               └─err─→ sleep (2s, 4s, 8s, ...) → next attempt (up to 5)
//! ```
//!
//! A fetch never panics and never writes anything unless a response decoded
//! successfully. Readings missing from an otherwise valid response are skipped one by
//! one.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::psi::{FetchError, FetchResult, PageSpeedApi, PsiResponse};
use crate::store::{MetricStore, PsiMetric};
use crate::target::{Strategy, Target};

/// Exponential backoff between attempts of a single fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,

    /// Delay after the first failure; doubled after every further failure
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
        }
    }

    /// Delay to wait after the given failed attempt (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_delay.saturating_mul(factor)
    }
}

/// Readings written by one successful fetch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchReport {
    pub target: Target,

    /// Attempt that succeeded (1-based)
    pub attempts: u32,

    /// Metrics written to the store, in `PsiMetric::ALL` order
    pub samples: Vec<(PsiMetric, f64)>,
}

impl FetchReport {
    pub fn value(&self, metric: PsiMetric) -> Option<f64> {
        self.samples
            .iter()
            .find_map(|(m, value)| (*m == metric).then_some(*value))
    }
}

/// Runs measurements and publishes them into the metric store
///
/// Cloning is cheap; clones share the API client and the store.
#[derive(Clone)]
pub struct Fetcher {
    api: Arc<dyn PageSpeedApi>,
    store: MetricStore,
    retry: RetryPolicy,
}

impl Fetcher {
    pub fn new(api: Arc<dyn PageSpeedApi>, store: MetricStore) -> Self {
        Self {
            api,
            store,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn store(&self) -> &MetricStore {
        &self.store
    }

    /// Measure one target and update the store
    ///
    /// Transient failures are retried with exponential backoff. After the last failed
    /// attempt the fetch waits out the final delay and returns
    /// [`FetchError::Exhausted`]; the store is left untouched.
    #[instrument(skip(self, target), fields(site = %target.url, strategy = %target.strategy))]
    pub async fn fetch(&self, target: &Target) -> FetchResult<FetchReport> {
        info!("fetching PageSpeed data");

        let mut attempt = 0;
        loop {
            attempt += 1;

            let failure = match self.api.run_pagespeed(target).await {
                Ok(response) => return Ok(self.record(target, &response, attempt)),
                Err(e) => e,
            };

            let delay = self.retry.delay_after(attempt);
            warn!(
                "attempt {attempt}/{} failed: {failure}; waiting {delay:?}",
                self.retry.max_attempts
            );
            tokio::time::sleep(delay).await;

            if attempt >= self.retry.max_attempts {
                error!("failed to fetch data after {attempt} attempts");
                return Err(FetchError::Exhausted {
                    attempts: attempt,
                    last: Box::new(failure),
                });
            }
        }
    }

    /// Fetch a single ad-hoc target on behalf of an external caller
    ///
    /// Uses the same retry policy as scheduled fetches and runs independently of any
    /// sweep in progress.
    pub async fn fetch_on_demand(
        &self,
        url: impl Into<String>,
        strategy: Strategy,
    ) -> FetchResult<FetchReport> {
        let target = Target::new(url, strategy);
        debug!("on-demand fetch for {target}");
        self.fetch(&target).await
    }

    fn record(&self, target: &Target, response: &PsiResponse, attempts: u32) -> FetchReport {
        let mut samples = Vec::with_capacity(PsiMetric::ALL.len());

        for (metric, reading) in response.readings() {
            match reading {
                Some(value) => {
                    self.store.set(metric, target, value);
                    samples.push((metric, value));
                }
                None => debug!(
                    "audit {} has no usable value, keeping previous {metric}",
                    metric.audit_id().unwrap_or("performance")
                ),
            }
        }

        info!(
            "stored {} metrics (score {:?})",
            samples.len(),
            response.reading(PsiMetric::PerformanceScore)
        );

        FetchReport {
            target: target.clone(),
            attempts,
            samples,
        }
    }
}
