//! Metrics for the catalog sync and read paths.
//!
//! Names follow the Prometheus conventions and are listed once in
//! [`MetricName`] so call sites never carry magic strings.

use std::fmt;
use std::net::SocketAddr;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Export fetch
    ExportFetchSuccess,
    ExportFetchError,
    ExportBytes,
    ExportFetchDuration,

    // Sync pipeline
    SyncRecordsSeen,
    SyncRecordsEligible,
    SyncRecordsSkipped,
    SyncStationsWritten,
    SyncReferencesWritten,
    SyncRunsSuccess,
    SyncRunsError,
    SyncDuration,

    // Read path
    SearchRequests,
    SearchRejected,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::ExportFetchSuccess => "catalog_export_fetch_success_total",
            MetricName::ExportFetchError => "catalog_export_fetch_error_total",
            MetricName::ExportBytes => "catalog_export_bytes",
            MetricName::ExportFetchDuration => "catalog_export_fetch_duration_seconds",
            MetricName::SyncRecordsSeen => "catalog_sync_records_seen_total",
            MetricName::SyncRecordsEligible => "catalog_sync_records_eligible_total",
            MetricName::SyncRecordsSkipped => "catalog_sync_records_skipped_total",
            MetricName::SyncStationsWritten => "catalog_sync_stations_written_total",
            MetricName::SyncReferencesWritten => "catalog_sync_references_written_total",
            MetricName::SyncRunsSuccess => "catalog_sync_runs_success_total",
            MetricName::SyncRunsError => "catalog_sync_runs_error_total",
            MetricName::SyncDuration => "catalog_sync_duration_seconds",
            MetricName::SearchRequests => "catalog_search_requests_total",
            MetricName::SearchRejected => "catalog_search_rejected_total",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Install the Prometheus exporter with an HTTP listener on `port`.
pub fn init(port: u16) {
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => info!("Prometheus exporter listening on http://{}/metrics", addr),
        // Already installed in this process
        Err(e) => warn!("Prometheus exporter install failed: {}", e),
    }
}

pub mod export {
    use super::MetricName;

    pub fn fetch_success() {
        ::metrics::counter!(MetricName::ExportFetchSuccess.as_str()).increment(1);
    }

    pub fn fetch_error(reason: &'static str) {
        ::metrics::counter!(MetricName::ExportFetchError.as_str(), "reason" => reason).increment(1);
    }

    pub fn bytes(len: usize) {
        ::metrics::histogram!(MetricName::ExportBytes.as_str()).record(len as f64);
    }

    pub fn duration(secs: f64) {
        ::metrics::histogram!(MetricName::ExportFetchDuration.as_str()).record(secs);
    }
}

pub mod sync {
    use super::MetricName;

    pub fn records(seen: usize, eligible: usize) {
        ::metrics::counter!(MetricName::SyncRecordsSeen.as_str()).increment(seen as u64);
        ::metrics::counter!(MetricName::SyncRecordsEligible.as_str()).increment(eligible as u64);
        ::metrics::counter!(MetricName::SyncRecordsSkipped.as_str())
            .increment(seen.saturating_sub(eligible) as u64);
    }

    pub fn references_written(kind: &'static str, count: usize) {
        ::metrics::counter!(MetricName::SyncReferencesWritten.as_str(), "kind" => kind)
            .increment(count as u64);
    }

    pub fn stations_written(count: usize) {
        ::metrics::counter!(MetricName::SyncStationsWritten.as_str()).increment(count as u64);
    }

    pub fn run_success(secs: f64) {
        ::metrics::counter!(MetricName::SyncRunsSuccess.as_str()).increment(1);
        ::metrics::histogram!(MetricName::SyncDuration.as_str()).record(secs);
    }

    pub fn run_error() {
        ::metrics::counter!(MetricName::SyncRunsError.as_str()).increment(1);
    }
}

pub mod search {
    use super::MetricName;

    pub fn request() {
        ::metrics::counter!(MetricName::SearchRequests.as_str()).increment(1);
    }

    pub fn rejected() {
        ::metrics::counter!(MetricName::SearchRejected.as_str()).increment(1);
    }
}
