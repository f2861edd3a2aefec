// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Exponential backoff for store setup.
//!
//! Connecting to the database and creating tables are retried so a store
//! started alongside its database comes up cleanly. Searches never retry: a
//! failed read is reported to the caller on the first error.
//!
//! ```
//! use std::time::Duration;
//! use marketplace_search::RetryConfig;
//!
//! let setup = RetryConfig::store_setup();
//! assert_eq!(setup.max_attempts, 5);
//! assert_eq!(setup.delay_before(2), Duration::from_millis(400));
//! ```

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::metrics;

/// Backoff schedule for a setup step.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub factor: f64,
    /// Total attempts, including the first
    pub max_attempts: usize,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::store_setup()
    }
}

impl RetryConfig {
    /// Five attempts, 200ms doubling to a 2s cap: gives up after roughly 3 seconds.
    #[must_use]
    pub fn store_setup() -> Self {
        Self {
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(2),
            factor: 2.0,
            max_attempts: 5,
        }
    }

    #[cfg(test)]
    pub fn test() -> Self {
        Self {
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(10),
            factor: 2.0,
            max_attempts: 3,
        }
    }

    /// Wait before retry number `retry` (1-based).
    pub fn delay_before(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry.saturating_sub(1)).unwrap_or(i32::MAX);
        let secs = self.initial_delay.as_secs_f64() * self.factor.powi(exponent);
        Duration::try_from_secs_f64(secs)
            .map(|delay| delay.min(self.max_delay))
            .unwrap_or(self.max_delay)
    }
}

/// Run `step` until it succeeds or the attempts run out; returns the last error.
pub async fn retry<F, Fut, T, E>(step: &'static str, config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut failures: u32 = 0;
    loop {
        match operation().await {
            Ok(value) => {
                if failures > 0 {
                    info!(step, failures, "Store setup step recovered");
                }
                return Ok(value);
            }
            Err(err) => {
                failures += 1;
                if failures as usize >= config.max_attempts {
                    warn!(step, attempts = failures, error = %err, "Store setup step gave up");
                    return Err(err);
                }
                let delay = config.delay_before(failures);
                metrics::record_setup_retry(step);
                warn!(
                    step,
                    attempt = failures,
                    max_attempts = config.max_attempts,
                    error = %err,
                    ?delay,
                    "Store setup step failed, retrying"
                );
                sleep(delay).await;
            }
        }
    }
}
