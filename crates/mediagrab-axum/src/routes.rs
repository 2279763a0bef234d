//! Route definitions and router construction.

use axum::Router;
use axum::routing::{delete, get, post};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::bootstrap::{AppContext, CorsConfig};
use crate::handlers;
use crate::state::AppState;

/// Build CORS layer from configuration.
fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    match config {
        CorsConfig::AllowAll => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        CorsConfig::AllowOrigins(origins) => {
            use axum::http::HeaderValue;
            let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            CorsLayer::new()
                .allow_origin(allowed)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    }
}

/// API routes without the `/api` prefix (nested under it by the caller).
fn api_routes() -> Router<AppState> {
    Router::new()
        // Pre-flight metadata and advisories
        .route("/info", post(handlers::info::video_info))
        .route("/platform-advisory", get(handlers::info::platform_advisory))
        // Downloads API
        .route("/downloads", post(handlers::downloads::start))
        .route("/downloads/{id}", get(handlers::downloads::snapshot))
        .route("/downloads/{id}/cancel", post(handlers::downloads::cancel))
        .route("/downloads/{id}/file", get(handlers::downloads::retrieve))
        // Cookies API
        .route(
            "/cookies",
            get(handlers::cookies::list).post(handlers::cookies::upload),
        )
        .route("/cookies/{name}", delete(handlers::cookies::delete))
        // Events (SSE)
        .route("/events", get(handlers::events::stream))
        // Service status
        .route("/status", get(handlers::status::status))
}

/// Create the main Axum router with all API routes.
///
/// Axum 0.8 uses brace syntax for path parameters: `{id}`, `{name}`.
pub fn create_router(ctx: AppContext, cors_config: &CorsConfig) -> Router {
    let state: AppState = Arc::new(ctx);
    let cors = build_cors_layer(cors_config);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes().with_state(state).layer(cors))
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
