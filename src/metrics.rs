//! Import metrics
//!
//! Counters are recorded through the `metrics` facade. When a Prometheus textfile
//! is configured, `init_metrics` installs an in-process recorder and
//! `write_textfile` renders it once the run is over, so a short-lived job can be
//! picked up by a textfile collector without an HTTP listener.

use crate::error::{ImportError, Result};
use crate::filter::FilterOutcome;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{info, warn};

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub const ENTRIES_TOTAL: &str = "importer_entries_total";
pub const ENTRIES_FAILED_TOTAL: &str = "importer_entries_failed_total";
pub const BRANDS_TOTAL: &str = "importer_brands_total";
pub const NOTES_TOTAL: &str = "importer_notes_total";
pub const NOTE_LINKS_TOTAL: &str = "importer_note_links_total";
pub const PERFUMES_TOTAL: &str = "importer_perfumes_inserted_total";
pub const RUN_DURATION_SECONDS: &str = "importer_run_duration_seconds";

/// Install the Prometheus recorder. Idempotent.
pub fn init_metrics() {
    if HANDLE.get().is_some() {
        return;
    }
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            if HANDLE.set(handle).is_err() {
                warn!("Prometheus handle was already stored");
            }
            info!("Prometheus recorder installed");
        }
        Err(e) => warn!("Failed to install Prometheus recorder: {}", e),
    }
}

pub fn get_handle() -> Option<&'static PrometheusHandle> {
    HANDLE.get()
}

/// Render the recorded metrics into `path` in Prometheus text format
pub fn write_textfile(path: &Path) -> Result<()> {
    let handle = get_handle().ok_or_else(|| ImportError::Metrics {
        message: "metrics recorder is not installed".to_string(),
    })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, handle.render())?;
    info!("Wrote metrics to {}", path.display());
    Ok(())
}

/// Metric helpers for the import phases
pub struct ImportMetrics;

impl ImportMetrics {
    pub fn record_filter_outcome(outcome: FilterOutcome) {
        ::metrics::counter!(ENTRIES_TOTAL, "outcome" => outcome.as_str()).increment(1);
    }

    pub fn record_entry_failed() {
        ::metrics::counter!(ENTRIES_FAILED_TOTAL).increment(1);
    }

    pub fn record_perfume_inserted() {
        ::metrics::counter!(PERFUMES_TOTAL).increment(1);
    }

    pub fn record_brand(created: bool) {
        let action = if created { "created" } else { "reused" };
        ::metrics::counter!(BRANDS_TOTAL, "action" => action).increment(1);
    }

    pub fn record_notes(created: usize, reused: usize, links: usize) {
        ::metrics::counter!(NOTES_TOTAL, "action" => "created").increment(created as u64);
        ::metrics::counter!(NOTES_TOTAL, "action" => "reused").increment(reused as u64);
        ::metrics::counter!(NOTE_LINKS_TOTAL).increment(links as u64);
    }

    pub fn record_run_duration(seconds: f64) {
        ::metrics::histogram!(RUN_DURATION_SECONDS).record(seconds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_recording_without_recorder_is_a_no_op() {
        ImportMetrics::record_filter_outcome(FilterOutcome::Soap);
        ImportMetrics::record_brand(true);
        ImportMetrics::record_notes(1, 2, 3);
        ImportMetrics::record_run_duration(0.5);
    }

    #[test]
    fn test_textfile_contains_recorded_counters() {
        init_metrics();
        ImportMetrics::record_filter_outcome(FilterOutcome::Accepted);
        ImportMetrics::record_perfume_inserted();

        let dir = tempdir().unwrap();
        let path = dir.path().join("metrics").join("importer.prom");
        write_textfile(&path).unwrap();

        let rendered = fs::read_to_string(&path).unwrap();
        // Other tests may record into the same global recorder, so only a lower bound holds
        assert!(sample_value(&rendered, PERFUMES_TOTAL).unwrap() >= 1.0);
        assert!(
            sample_value(&rendered, &format!("{ENTRIES_TOTAL}{{outcome=\"accepted\"}}")).unwrap()
                >= 1.0
        );
    }

    fn sample_value(rendered: &str, series: &str) -> Option<f64> {
        rendered
            .lines()
            .filter(|line| !line.starts_with('#'))
            .find_map(|line| {
                let (name, value) = line.rsplit_once(' ')?;
                (name == series).then(|| value.parse().ok()).flatten()
            })
    }
}
