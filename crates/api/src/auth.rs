//! API key authentication middleware.
//!
//! Bearer token authentication for API endpoints, enabled when
//! `SWITCHBOARD_API_KEY` is set. The `/health` endpoint is exempt.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tracing::warn;

use crate::state::AppState;

/// Configuration for API key authentication.
#[derive(Clone)]
pub struct ApiKeyConfig {
    key_bytes: Vec<u8>,
}

impl std::fmt::Debug for ApiKeyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyConfig").finish_non_exhaustive()
    }
}

impl ApiKeyConfig {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key_bytes: key.into().into_bytes(),
        }
    }

    /// Constant-time comparison.
    fn verify(&self, provided: &[u8]) -> bool {
        if self.key_bytes.len() != provided.len() {
            return false;
        }
        let mut result: u8 = 0;
        for (a, b) in self.key_bytes.iter().zip(provided.iter()) {
            result |= a ^ b;
        }
        result == 0
    }
}

#[derive(Debug, serde::Serialize)]
struct AuthError {
    error: String,
    code: &'static str,
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Reject requests without a valid bearer key when one is configured.
pub async fn api_key_auth(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(ref api_key) = state.api_key else {
        return next.run(request).await;
    };

    if request.uri().path() == "/health" {
        return next.run(request).await;
    }

    match extract_bearer_token(request.headers()) {
        Some(token) if api_key.verify(token.as_bytes()) => next.run(request).await,
        Some(_) => {
            warn!("Invalid API key provided");
            unauthorized("Invalid API key", "INVALID_API_KEY")
        }
        None => {
            warn!("Missing Authorization header");
            unauthorized(
                "Missing or invalid Authorization header. Use: Authorization: Bearer <key>",
                "MISSING_API_KEY",
            )
        }
    }
}

fn unauthorized(error: &str, code: &'static str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(AuthError {
            error: error.into(),
            code,
        }),
    )
        .into_response()
}
