use axum::{extract::State, http::StatusCode, response::IntoResponse};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;

use crate::AppState;

pub struct MetricsState {
    pub handle: PrometheusHandle,
}

fn builder() -> PrometheusBuilder {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0],
        )
        .expect("failed to set histogram buckets")
}

/// Installs the global Prometheus recorder. Call once at startup.
pub fn setup_metrics_recorder() -> MetricsState {
    let handle = builder()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    MetricsState { handle }
}

/// A recorder that is not installed globally, for tests and tools.
pub fn detached_metrics() -> MetricsState {
    MetricsState {
        handle: builder().build_recorder().handle(),
    }
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let metrics = state.metrics.handle.render();
    (StatusCode::OK, metrics)
}
