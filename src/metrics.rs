// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for metasync.
//!
//! Uses the `metrics` crate for backend-agnostic metrics collection.
//! The embedding application is responsible for choosing the exporter
//! (Prometheus, OTEL, etc.)
//!
//! # Metric Naming Convention
//! - `metasync_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Labels
//! - `operation`: push, delete, upsert, fetch_merge
//! - `reason`: policy, scheduled, threshold, forced

use metrics::{counter, gauge, histogram};
use std::time::Duration;

/// Record a completed push batch and its latency.
pub fn record_push(events: usize, duration: Duration) {
    counter!("metasync_push_events_total").increment(events as u64);
    histogram!("metasync_push_seconds").record(duration.as_secs_f64());
}

/// Record a delete batch sent to the backend.
pub fn record_deleted(count: usize) {
    counter!("metasync_deleted_total").increment(count as u64);
}

/// Record an upsert batch sent to the backend.
pub fn record_upserted(count: usize) {
    counter!("metasync_upserted_total").increment(count as u64);
}

/// Record a fetch-then-merge resolution round.
pub fn record_fetch_merge(count: usize, duration: Duration) {
    counter!("metasync_fetch_merge_docs_total").increment(count as u64);
    histogram!("metasync_fetch_merge_seconds").record(duration.as_secs_f64());
}

/// Record a commit and why it fired.
pub fn record_commit(reason: &'static str) {
    counter!("metasync_commits_total", "reason" => reason).increment(1);
}

/// Set the number of events awaiting a commit.
pub fn set_uncommitted_events(count: u64) {
    gauge!("metasync_uncommitted_events").set(count as f64);
}

/// Record a schema cache refresh.
pub fn record_schema_refresh() {
    counter!("metasync_schema_refreshes_total").increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    // These verify the API compiles and doesn't panic without a
    // recorder installed.

    #[test]
    fn counters_and_histograms() {
        record_push(10, Duration::from_millis(12));
        record_deleted(500);
        record_upserted(500);
        record_fetch_merge(42, Duration::from_millis(3));
    }

    #[test]
    fn commits_and_gauges() {
        record_commit("policy");
        record_commit("scheduled");
        record_commit("threshold");
        set_uncommitted_events(7);
        record_schema_refresh();
    }
}
