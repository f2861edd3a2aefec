// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for marketplace-search.
//!
//! Uses the `metrics` crate for backend-agnostic metrics collection.
//! The host service is responsible for choosing the exporter (Prometheus, OTEL, etc.)
//!
//! # Metric Naming Convention
//! - `marketplace_search_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Labels
//! - `target`: user_name, listing_product_name, listing_business_name, listing_location
//! - `status`: success, rejected, error
//! - `reason`: which validation rejected the request
//! - `step`: store setup step being retried

use metrics::{counter, histogram};
use std::time::{Duration, Instant};

/// Record a search request outcome
pub fn record_search_query(target: &str, status: &str) {
    counter!(
        "marketplace_search_queries_total",
        "target" => target.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record search latency
pub fn record_search_latency(target: &str, duration: Duration) {
    histogram!(
        "marketplace_search_seconds",
        "target" => target.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Record how many entities a search matched and how many it returned
pub fn record_search_results(target: &str, total: u64, returned: usize) {
    histogram!(
        "marketplace_search_total_elements",
        "target" => target.to_string()
    )
    .record(total as f64);
    histogram!(
        "marketplace_search_page_elements",
        "target" => target.to_string()
    )
    .record(returned as f64);
}

/// Record a request rejected before reaching the store
pub fn record_rejection(reason: &str) {
    counter!(
        "marketplace_search_rejections_total",
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// Record a store failure during a search
pub fn record_store_error(entity: &str) {
    counter!(
        "marketplace_search_store_errors_total",
        "entity" => entity.to_string()
    )
    .increment(1);
}

/// Record a page size that was clamped to the maximum
pub fn record_page_size_clamped() {
    counter!("marketplace_search_page_size_clamped_total").increment(1);
}

/// Record a retried store setup step (connect, schema creation)
pub fn record_setup_retry(step: &'static str) {
    counter!("marketplace_search_setup_retries_total", "step" => step).increment(1);
}

/// A timing guard that records search latency on drop
pub struct LatencyTimer {
    target: &'static str,
    start: Instant,
}

impl LatencyTimer {
    /// Start a new latency timer
    pub fn new(target: &'static str) -> Self {
        Self {
            target,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        record_search_latency(self.target, self.start.elapsed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Note: These tests verify the API compiles and doesn't panic.
    // No recorder is installed, so every call is a no-op.

    #[test]
    fn test_search_metrics() {
        record_search_query("user_name", "success");
        record_search_query("listing_location", "rejected");
        record_search_query("listing_product_name", "error");

        record_search_latency("user_name", Duration::from_micros(500));
        record_search_results("user_name", 42, 24);
        record_search_results("listing_business_name", 0, 0);
    }

    #[test]
    fn test_rejection_and_error_metrics() {
        record_rejection("invalid_page_number");
        record_rejection("invalid_sort_field");
        record_store_error("listing");
        record_page_size_clamped();
        record_setup_retry("sql_connect");
    }

    #[test]
    fn test_latency_timer() {
        {
            let timer = LatencyTimer::new("user_name");
            std::thread::sleep(Duration::from_micros(10));
            assert!(timer.elapsed() >= Duration::from_micros(10));
        }
        // Timer recorded on drop
    }
}
