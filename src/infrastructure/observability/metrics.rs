//! Prometheus metrics infrastructure

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, response::IntoResponse, routing::get, Router};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use super::config::MetricsConfig;

/// Longest path label kept on HTTP metrics
const MAX_PATH_LABEL: usize = 50;

/// Prometheus metrics handle for serving metrics endpoint
#[derive(Clone)]
pub struct PrometheusMetrics {
    handle: Arc<PrometheusHandle>,
}

impl PrometheusMetrics {
    /// Get the metrics as a string for the /metrics endpoint
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Initialize Prometheus metrics
pub fn init_metrics(config: &MetricsConfig) -> Option<PrometheusMetrics> {
    if !config.enabled {
        tracing::info!("Prometheus metrics disabled");
        return None;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            gauge!("edge_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);

            tracing::info!("Prometheus metrics initialized at {}", config.path);

            Some(PrometheusMetrics {
                handle: Arc::new(handle),
            })
        }
        Err(e) => {
            tracing::error!("Failed to initialize Prometheus metrics: {}", e);
            None
        }
    }
}

/// Create the metrics router
pub fn create_metrics_router(metrics: PrometheusMetrics, path: &str) -> Router {
    Router::new()
        .route(path, get(metrics_handler))
        .with_state(metrics)
}

async fn metrics_handler(State(metrics): State<PrometheusMetrics>) -> impl IntoResponse {
    metrics.render()
}

/// Record an HTTP request metric
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());

    if status >= 500 {
        counter!("http_server_errors_total", &labels).increment(1);
    }
}

/// Record how an intercepted request was answered
pub fn record_cache_outcome(strategy: &str, source: &str) {
    counter!(
        "edge_cache_requests_total",
        "strategy" => strategy.to_string(),
        "source" => source.to_string()
    )
    .increment(1);
}

/// Record a background revalidation result
pub fn record_revalidation(success: bool) {
    let outcome = if success { "success" } else { "error" };
    counter!("edge_revalidations_total", "outcome" => outcome).increment(1);
}

/// Record an install attempt
pub fn record_install(success: bool, precached: usize, duration: Duration) {
    let outcome = if success { "success" } else { "error" };

    counter!("edge_installs_total", "outcome" => outcome).increment(1);
    histogram!("edge_install_duration_seconds", "outcome" => outcome)
        .record(duration.as_secs_f64());
    gauge!("edge_precached_entries").set(precached as f64);
}

/// Record partitions removed during activation
pub fn record_partitions_purged(count: usize) {
    counter!("edge_partitions_purged_total").increment(count as u64);
}

/// Sanitize URL path for metric labels (remove IDs, limit cardinality)
fn sanitize_path(path: &str) -> String {
    let path = path.split('?').next().unwrap_or_default();

    let sanitized = path
        .split('/')
        .map(|segment| {
            let is_numeric = !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit());

            if is_numeric || uuid::Uuid::parse_str(segment).is_ok() {
                "{id}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/");

    if sanitized.len() > MAX_PATH_LABEL {
        let mut end = MAX_PATH_LABEL;
        while !sanitized.is_char_boundary(end) {
            end -= 1;
        }
        sanitized[..end].to_string()
    } else {
        sanitized
    }
}
