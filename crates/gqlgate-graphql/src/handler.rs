//! Axum HTTP handlers for the gateway endpoints.
//!
//! - `POST /graphql` - Executes a query against the active schema
//! - `GET /graphql/sdl` - Active schema as SDL text
//! - `POST /registry` - Registers a service from its description URL
//! - `DELETE /registry?name=` - Unregisters a service
//! - `GET /registry` - Lists registered service names

use std::sync::Arc;

use async_graphql::{Request, Variables};
use axum::Json;
use axum::Router;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::GatewayError;
use crate::registry::ServiceRegistry;

/// State shared across gateway handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub registry: Arc<ServiceRegistry>,
}

impl GatewayState {
    pub fn new(registry: Arc<ServiceRegistry>) -> Self {
        Self { registry }
    }
}

/// GraphQL request body.
#[derive(Debug, Deserialize)]
pub struct GraphQLRequest {
    /// The GraphQL query string; an absent query executes as `""`.
    #[serde(default)]
    pub query: String,

    /// Optional operation name for multi-operation documents.
    #[serde(rename = "operationName")]
    pub operation_name: Option<String>,

    /// Optional variables for the query.
    pub variables: Option<serde_json::Value>,
}

/// `POST /registry` body.
#[derive(Debug, Deserialize)]
pub struct RegisterServiceRequest {
    /// Unique service name.
    pub name: String,
    /// URL (or path) of the service's API description.
    pub url: String,
}

/// `DELETE /registry` query parameters.
#[derive(Debug, Deserialize)]
pub struct UnregisterServiceParams {
    pub name: String,
}

/// `GET /registry` response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceList {
    pub services: Vec<String>,
}

/// Routes served by the gateway, with their state applied.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/graphql", post(graphql_handler))
        .route("/graphql/sdl", get(sdl_handler))
        .route(
            "/registry",
            post(register_service)
                .delete(unregister_service)
                .get(list_services),
        )
        .with_state(state)
}

/// Handles `POST /graphql`.
///
/// The engine's response is returned as-is; field errors are part of the
/// response body and never change the HTTP status.
pub async fn graphql_handler(
    State(state): State<GatewayState>,
    Json(request): Json<GraphQLRequest>,
) -> impl IntoResponse {
    let schema = state.registry.current_schema();

    debug!(
        operation = request.operation_name.as_deref().unwrap_or_default(),
        "Processing GraphQL request"
    );

    let mut gql_request = Request::new(request.query);
    if let Some(operation_name) = request.operation_name {
        gql_request = gql_request.operation_name(operation_name);
    }
    if let Some(variables) = request.variables {
        gql_request = gql_request.variables(Variables::from_json(variables));
    }

    let response = schema.execute(gql_request).await;
    if response.is_err() {
        debug!(errors = response.errors.len(), "GraphQL request completed with errors");
    }
    Json(response)
}

/// Handles `GET /graphql/sdl`.
pub async fn sdl_handler(State(state): State<GatewayState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        state.registry.current_schema().sdl(),
    )
}

/// Handles `POST /registry`: fetches the description at `url`, registers it
/// and rebuilds the schema. Responds `200` with an empty body.
pub async fn register_service(
    State(state): State<GatewayState>,
    Json(request): Json<RegisterServiceRequest>,
) -> Response {
    let name = request.name.trim();
    if name.is_empty() {
        return error_response(&GatewayError::InvalidRequest(
            "service name must not be empty".into(),
        ));
    }
    if request.url.trim().is_empty() {
        return error_response(&GatewayError::InvalidRequest(
            "service url must not be empty".into(),
        ));
    }

    match state
        .registry
        .register_from_location(name, request.url.trim())
        .await
    {
        Ok(report) => {
            for rejected in &report.rejections {
                debug!(service = %rejected.service, "{}", rejected.rejection);
            }
            StatusCode::OK.into_response()
        }
        Err(e) => error_response(&e),
    }
}

/// Handles `DELETE /registry?name=`. Unknown names are accepted.
/// Responds `204`.
pub async fn unregister_service(
    State(state): State<GatewayState>,
    Query(params): Query<UnregisterServiceParams>,
) -> Response {
    match state.registry.unregister(&params.name).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(&e),
    }
}

/// Handles `GET /registry`.
pub async fn list_services(State(state): State<GatewayState>) -> Json<ServiceList> {
    Json(ServiceList {
        services: state.registry.list_service_names(),
    })
}

/// Renders a gateway error with its status code and a JSON error body.
pub fn error_response(err: &GatewayError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        warn!(error = %err, code = err.error_code(), "Gateway request failed");
    } else {
        debug!(error = %err, code = err.error_code(), "Gateway request rejected");
    }
    (status, Json(err.to_json())).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graphql_request_defaults_query() {
        let request: GraphQLRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.query, "");
        assert!(request.operation_name.is_none());

        let request: GraphQLRequest = serde_json::from_str(
            r#"{"query":"{ _health }","operationName":"Health","variables":{"id":"1"}}"#,
        )
        .unwrap();
        assert_eq!(request.operation_name.as_deref(), Some("Health"));
        assert_eq!(request.variables.unwrap()["id"], "1");
    }

    #[test]
    fn test_error_response_status() {
        let response = error_response(&GatewayError::InvalidRequest("bad".into()));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = error_response(&GatewayError::Internal("boom".into()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
