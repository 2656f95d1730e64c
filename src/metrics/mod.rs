//! Prometheus metrics for the edumon API and seeding commands
//!
//! This module provides metrics tracking for:
//! - API: request counts by route and status, request latency
//! - Seeding: allocation outcomes per level, run duration, rows written
//!
//! # Usage
//!
//! Call `init_metrics()` at application startup to register all metrics.
//! If initialization fails, metrics operations become no-ops.

use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};
use std::sync::OnceLock;

// ============================================================================
// Metrics Storage
// ============================================================================

/// Container for HTTP API metrics
struct ApiMetrics {
    requests: CounterVec,
    duration: HistogramVec,
}

/// Container for seeding metrics
struct SeedingMetrics {
    allocations: CounterVec,
    rows_written: CounterVec,
    run_duration: HistogramVec,
}

static API_METRICS: OnceLock<ApiMetrics> = OnceLock::new();

static SEEDING_METRICS: OnceLock<SeedingMetrics> = OnceLock::new();

/// Outcome of the one registration attempt, shared by every caller
static METRICS_INIT: OnceLock<Result<(), String>> = OnceLock::new();

// ============================================================================
// Initialization
// ============================================================================

/// Initialize all Prometheus metrics
///
/// Registration runs once per process, even with concurrent callers; every
/// call returns its outcome. After a failure every recording function
/// silently does nothing.
///
/// # Example
///
/// ```ignore
/// if let Err(e) = edumon::metrics::init_metrics() {
///     tracing::warn!(error = %e, "Metrics initialization failed");
/// }
/// ```
pub fn init_metrics() -> Result<(), Box<dyn std::error::Error>> {
    METRICS_INIT
        .get_or_init(|| register_metrics().map_err(|e| e.to_string()))
        .clone()
        .map_err(Into::into)
}

fn register_metrics() -> Result<(), Box<dyn std::error::Error>> {
    let api = ApiMetrics {
        requests: register_counter_vec!(
            "edumon_api_requests_total",
            "Total API requests by route and status",
            &["route", "status"]
        )?,
        duration: register_histogram_vec!(
            "edumon_api_request_duration_seconds",
            "API request duration in seconds",
            &["route"],
            vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
        )?,
    };

    let seeding = SeedingMetrics {
        allocations: register_counter_vec!(
            "edumon_allocations_total",
            "Group allocations by level and outcome",
            &["level", "outcome"]
        )?,
        rows_written: register_counter_vec!(
            "edumon_seeding_rows_written_total",
            "Rows written by seeding commands",
            &["command"]
        )?,
        run_duration: register_histogram_vec!(
            "edumon_seeding_run_duration_seconds",
            "Seeding command duration in seconds",
            &["command"],
            vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 300.0]
        )?,
    };

    API_METRICS
        .set(api)
        .map_err(|_| "API metrics already initialized")?;
    SEEDING_METRICS
        .set(seeding)
        .map_err(|_| "Seeding metrics already initialized")?;

    tracing::info!("Prometheus metrics initialized successfully");
    Ok(())
}

/// Check if metrics have been initialized
pub fn metrics_initialized() -> bool {
    API_METRICS.get().is_some() && SEEDING_METRICS.get().is_some()
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Record one API request
pub fn record_api_request(route: &str, status: u16, duration_secs: f64) {
    let Some(m) = API_METRICS.get() else {
        return;
    };

    let status_str = status.to_string();
    m.requests.with_label_values(&[route, &status_str]).inc();
    m.duration.with_label_values(&[route]).observe(duration_secs);
}

/// Record the outcome of one group allocation
pub fn record_allocation(level: &str, outcome: &str) {
    if let Some(m) = SEEDING_METRICS.get() {
        m.allocations.with_label_values(&[level, outcome]).inc();
    }
}

/// Record rows written by a seeding command
pub fn record_rows_written(command: &str, rows: usize) {
    if rows == 0 {
        return;
    }
    if let Some(m) = SEEDING_METRICS.get() {
        m.rows_written
            .with_label_values(&[command])
            .inc_by(rows as f64);
    }
}

/// Histogram timer guard that records duration on drop
pub struct MetricsTimer {
    timer: Option<prometheus::HistogramTimer>,
}

impl MetricsTimer {
    fn new(timer: prometheus::HistogramTimer) -> Self {
        Self { timer: Some(timer) }
    }

    /// Create a no-op timer when metrics are not initialized
    fn noop() -> Self {
        Self { timer: None }
    }
}

impl Drop for MetricsTimer {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.stop_and_record();
        }
    }
}

/// Start timing a seeding command
pub fn start_seeding_timer(command: &str) -> MetricsTimer {
    match SEEDING_METRICS.get() {
        Some(m) => MetricsTimer::new(m.run_duration.with_label_values(&[command]).start_timer()),
        None => MetricsTimer::noop(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ensure_metrics_initialized() {
        let _ = init_metrics();
    }

    #[test]
    fn test_init_metrics_is_idempotent() {
        assert!(init_metrics().is_ok());
        assert!(init_metrics().is_ok());
        assert!(metrics_initialized());
    }

    #[test]
    fn test_concurrent_init_never_fails() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| init_metrics().is_ok()))
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }

    #[test]
    fn test_encode_contains_recorded_series() {
        ensure_metrics_initialized();
        record_allocation("SD", "exact");
        record_api_request("/api/health", 200, 0.002);

        let text = encode_metrics().unwrap();
        assert!(text.contains("edumon_allocations_total"));
        assert!(text.contains("edumon_api_requests_total"));
    }

    #[test]
    fn test_seeding_recording() {
        ensure_metrics_initialized();
        record_rows_written("distribute", 12);
        record_rows_written("distribute", 0);
        let _timer = start_seeding_timer("distribute");
    }

    #[test]
    fn test_metrics_noop_without_init() {
        // Must not panic whether or not another test initialized first
        record_api_request("/test", 404, 0.001);
        record_allocation("SLB", "target_exceeds_ceiling");
        record_rows_written("accreditation", 1);
        let _timer = start_seeding_timer("reset");
    }
}
