use std::sync::Arc;
use std::time::Duration;

use axum::error_handling::HandleErrorLayer;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{BoxError, Json, Router};
use common::logger::{TraceId, annotate_span, root_span};
use once_cell::sync::Lazy;
use orderservice::{OrderService, ServiceError};
use regex::Regex;
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tracing::{Instrument, warn};

static ORDER_UID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{12,64}$").unwrap());

/// `request_timeout` is `HTTP_TIMEOUT` from config — the read/write timeout
/// analog for a request handled end to end by this router.
pub fn router(service: Arc<OrderService>, request_timeout: Duration) -> Router {
    Router::new()
        .route("/order/:order_id", get(get_order))
        .route("/ping", get(ping))
        .route("/healthz", get(healthz))
        .route("/swagger/*path", get(swagger_stub))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_timeout))
                .layer(TimeoutLayer::new(request_timeout)),
        )
        .with_state(service)
}

async fn handle_timeout(err: BoxError) -> Response {
    if err.is::<tower::timeout::error::Elapsed>() {
        (
            StatusCode::REQUEST_TIMEOUT,
            Json(json!({ "error": "request timed out" })),
        )
            .into_response()
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "internal error" })),
        )
            .into_response()
    }
}

async fn ping() -> &'static str {
    "pong"
}

async fn healthz() -> &'static str {
    "ok"
}

async fn swagger_stub() -> &'static str {
    "swagger docs are not bundled with this build"
}


async fn get_order(
    State(service): State<Arc<OrderService>>,
    Path(order_id): Path<String>,
) -> Response {
    let trace_id = TraceId::new(order_id.clone());
    let span = root_span("http_get_order", &trace_id);

    async move {
        if order_id.is_empty() || !ORDER_UID_PATTERN.is_match(&order_id) {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "invalid or empty orderID" })),
            )
                .into_response();
        }

        annotate_span(&order_id);

        match service.get(&order_id).await {
            Ok(order) => {
                let public: domain::PublicOrder = (&order).into();
                Json(public).into_response()
            }
            Err(ServiceError::NotFound) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": "Order not found" }))).into_response()
            }
            Err(e) => {
                warn!(error = %e, order_id, "failed to fetch order");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "internal error" })),
                )
                    .into_response()
            }
        }
    }
    .instrument(span)
    .await
}
