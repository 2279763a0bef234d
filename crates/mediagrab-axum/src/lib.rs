//! Axum web adapter for mediagrab.
//!
//! Exposes the download engine's operations over HTTP and SSE, and hosts
//! the composition root that wires concrete implementations together.

pub mod bootstrap;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod sse;
pub mod state;

// Re-export primary types
pub use bootstrap::{AppContext, CorsConfig, ServerConfig, bootstrap, start_server};
pub use error::HttpError;
pub use routes::create_router;
pub use sse::SseBroadcaster;
pub use state::AppState;
