use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use metrics::{counter, gauge, histogram};
use std::time::Instant;

/// Label for requests that matched no route, so probes for random paths share one series.
const UNMATCHED_ROUTE: &str = "unmatched";

/// Records request count, latency and in-flight requests per route template.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_owned());

    // The scrape endpoint would otherwise dominate its own output
    if route == "/metrics" {
        return next.run(request).await;
    }

    let method = request.method().as_str().to_owned();
    let started = Instant::now();

    gauge!("http_requests_in_flight", "route" => route.clone()).increment(1.0);
    let response = next.run(request).await;
    gauge!("http_requests_in_flight", "route" => route.clone()).decrement(1.0);

    let status = response.status();
    counter!(
        "http_requests_total",
        "method" => method.clone(),
        "route" => route.clone(),
        "status" => status.as_u16().to_string()
    )
    .increment(1);
    histogram!(
        "http_request_duration_seconds",
        "method" => method,
        "route" => route.clone()
    )
    .record(started.elapsed().as_secs_f64());

    if status.is_server_error() {
        tracing::warn!(route = %route, status = status.as_u16(), "Request failed");
    }

    response
}
