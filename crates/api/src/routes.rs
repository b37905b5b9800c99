//! HTTP route handlers.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use switchboard_common::{Intent, ResponseSection, SwitchboardError};
use tracing::{error, info};

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub classifier: String,
}

/// Health check endpoint.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.uptime_seconds(),
        classifier: state.router.classifier_name().to_string(),
    })
}

/// Route request body.
#[derive(Debug, Deserialize)]
pub struct RouteRequest {
    pub content: String,
}

/// Route response body.
#[derive(Debug, Serialize)]
pub struct RouteResponse {
    pub id: String,
    pub intent: Intent,
    /// Composed text with source labels
    pub content: String,
    pub sections: Vec<ResponseSection>,
    pub fallback_used: bool,
}

/// API error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: String,
    pub code: &'static str,
}

impl From<SwitchboardError> for ErrorResponse {
    fn from(err: SwitchboardError) -> Self {
        let (status, code) = match err {
            SwitchboardError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            SwitchboardError::ClassificationUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "CLASSIFICATION_UNAVAILABLE")
            }
            SwitchboardError::AdapterUnavailable { .. } => {
                (StatusCode::BAD_GATEWAY, "ADAPTER_UNAVAILABLE")
            }
            SwitchboardError::TicketCreation(_) => (StatusCode::BAD_GATEWAY, "TICKET_CREATION_FAILED"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };
        Self {
            status,
            error: err.to_string(),
            code,
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Classify a request and return the routed answer.
pub async fn route_request(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RouteRequest>,
) -> Result<Json<RouteResponse>, ErrorResponse> {
    info!(
        content_preview = %request.content.chars().take(50).collect::<String>(),
        "Received route request"
    );

    let routed = state.router.route(&request.content).await.map_err(|e| {
        error!(error = %e, "Routing failed");
        ErrorResponse::from(e)
    })?;

    Ok(Json(RouteResponse {
        content: routed.text(),
        id: routed.request_id,
        intent: routed.intent,
        sections: routed.sections,
        fallback_used: routed.fallback_used,
    }))
}
