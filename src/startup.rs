use axum::{
    extract::Request,
    http::{header, header::InvalidHeaderValue, HeaderValue, Method},
    middleware::from_fn,
    response::Html,
    routing::{delete, get, patch, post},
    Json, Router,
};
use once_cell::sync::Lazy;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_scalar::Scalar;

use crate::{
    handlers,
    middleware::{metrics_middleware, request_id_middleware},
    openapi::ApiDoc,
};

pub fn build_router(state: Arc<crate::AppState>) -> Result<Router, InvalidHeaderValue> {
    let cors = CorsLayer::new()
        .allow_origin(state.config.cors_origin.parse::<HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_credentials(true);

    // Employee routes
    let employee_routes = Router::new()
        .route(
            "/",
            get(handlers::employee_handler::get_employee).patch(handlers::employee_handler::update_employee),
        )
        .route("/absences", get(handlers::employee_handler::get_absences_this_year))
        .route("/absences/{year}", get(handlers::employee_handler::get_absences))
        .route("/vacation-days", get(handlers::employee_handler::get_vacation_days_this_year))
        .route("/vacation-days/{year}", get(handlers::employee_handler::get_vacation_days))
        .route("/office-days", get(handlers::employee_handler::get_office_days_this_year))
        .route("/office-days/{year}", get(handlers::employee_handler::get_office_days))
        .route("/overtime", get(handlers::employee_handler::get_overtime));

    // Workday routes
    let workday_routes = Router::new()
        .route(
            "/",
            get(handlers::workdays_handler::list_workdays).post(handlers::workdays_handler::create_workday),
        )
        .route(
            "/{id}",
            get(handlers::workdays_handler::get_workday)
                .patch(handlers::workdays_handler::update_workday)
                .delete(handlers::workdays_handler::delete_workday),
        )
        .route("/{id}/worktime", get(handlers::workdays_handler::get_workday_worktime));

    // Worktime routes
    let worktime_routes = Router::new()
        .route("/", post(handlers::worktimes_handler::create_worktime))
        .route(
            "/{id}",
            patch(handlers::worktimes_handler::update_worktime).delete(handlers::worktimes_handler::delete_worktime),
        );

    // Project routes
    let project_routes = Router::new()
        .route(
            "/",
            get(handlers::projects_handler::list_projects).post(handlers::projects_handler::create_project),
        )
        .route(
            "/{id}",
            get(handlers::projects_handler::get_project)
                .patch(handlers::projects_handler::update_project)
                .delete(handlers::projects_handler::delete_project),
        );

    // Project time routes
    let projecttime_routes = Router::new()
        .route(
            "/",
            get(handlers::projecttimes_handler::list_projecttimes)
                .post(handlers::projecttimes_handler::create_projecttime),
        )
        .route("/{id}", delete(handlers::projecttimes_handler::delete_projecttime));

    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request| {
        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = tracing::field::Empty,
        )
    });

    let router = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_handler))
        .nest("/api/employee", employee_routes)
        .nest("/api/workdays", workday_routes)
        .nest("/api/worktimes", worktime_routes)
        .nest("/api/projects", project_routes)
        .nest("/api/projecttimes", projecttime_routes)
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .route("/docs", get(scalar_docs))
        .layer(from_fn(metrics_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(trace)
        .layer(cors)
        .with_state(state);

    Ok(router)
}

// Rendered once; the document is static for the life of the process
static DOCS_HTML: Lazy<String> = Lazy::new(|| Scalar::new(ApiDoc::openapi()).to_html());

async fn scalar_docs() -> Html<&'static str> {
    Html(DOCS_HTML.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support;
    use axum::{body::Body, http::StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_and_docs_are_public() {
        let (state, _store) = test_support::state();
        let app = build_router(state).unwrap();

        let health = app
            .clone()
            .oneshot(axum::http::Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let docs = app
            .oneshot(axum::http::Request::get("/api-docs/openapi.json").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(health.status(), StatusCode::OK);
        assert!(health.headers().contains_key(crate::middleware::REQUEST_ID_HEADER));
        assert_eq!(docs.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn scalar_page_embeds_the_api_document() {
        let (state, _store) = test_support::state();
        let app = build_router(state).unwrap();

        let response = app
            .oneshot(axum::http::Request::get("/docs").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("Worklog API"));
    }

    #[tokio::test]
    async fn api_routes_require_a_token() {
        let (state, _store) = test_support::state();
        let app = build_router(state).unwrap();

        let response = app
            .oneshot(axum::http::Request::get("/api/workdays").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
