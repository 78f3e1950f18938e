use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use gqlgate_graphql::ServiceRegistry;
use serde::Serialize;
use serde_json::json;

#[derive(Serialize)]
pub struct HealthResponse<'a> {
    status: &'a str,
}

#[derive(Serialize)]
pub struct ReadyResponse<'a> {
    status: &'a str,
    services: usize,
}

pub async fn root() -> impl IntoResponse {
    let body = json!({
        "service": "gqlgate",
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::OK, Json(body))
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

/// Ready as soon as a schema is active, even one with no services.
pub async fn readyz(State(registry): State<Arc<ServiceRegistry>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(ReadyResponse {
            status: "ready",
            services: registry.service_count(),
        }),
    )
}
