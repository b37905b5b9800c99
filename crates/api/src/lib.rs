//! HTTP API for Switchboard.
//!
//! # Endpoints
//!
//! - `GET /health` - Health check
//! - `POST /api/v1/route` - Classify a request and return the routed answer
//!
//! # Security Features
//!
//! - Optional bearer-key authentication (`SWITCHBOARD_API_KEY`)
//! - Request body size limit (64 KiB)
//! - Configurable CORS origins

pub mod auth;
pub mod routes;
pub mod state;

use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub use auth::ApiKeyConfig;
pub use state::AppState;

/// Maximum accepted request body.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Create the API router with all routes configured.
///
/// `cors_origins` of `None` or containing `"*"` allows any origin.
pub fn create_router(state: Arc<AppState>, cors_origins: Option<Vec<String>>) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/api/v1/route", post(routes::route_request))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::api_key_auth,
        ))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

fn cors_layer(origins: Option<Vec<String>>) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    match origins {
        Some(origins) if !origins.iter().any(|o| o == "*") => {
            let parsed: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|o| match o.parse::<HeaderValue>() {
                    Ok(value) => Some(value),
                    Err(_) => {
                        warn!(origin = %o, "Ignoring invalid CORS origin");
                        None
                    }
                })
                .collect();
            base.allow_origin(AllowOrigin::list(parsed))
        }
        _ => base.allow_origin(Any),
    }
}

/// Start the API server on the given address.
pub async fn serve(
    state: Arc<AppState>,
    addr: SocketAddr,
    cors_origins: Option<Vec<String>>,
) -> anyhow::Result<()> {
    let router = create_router(state, cors_origins);

    info!(%addr, "Starting Switchboard API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
