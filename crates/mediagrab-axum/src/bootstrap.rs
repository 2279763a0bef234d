//! Server bootstrap - the composition root.
//!
//! This module is the only place where infrastructure is wired together
//! for the web adapter: the yt-dlp extractor, the SSE broadcaster, and
//! the download engine are all instantiated here.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use mediagrab_core::ports::NoopActivityLog;
use mediagrab_download::{
    DownloadEngine, DownloadEngineDeps, EngineConfig, YtDlpExtractor, build_engine,
};

use crate::sse::SseBroadcaster;

/// CORS configuration for the web server.
#[derive(Debug, Clone, Default)]
pub enum CorsConfig {
    /// Allow all origins (development mode).
    #[default]
    AllowAll,
    /// Allow specific origins (production mode).
    AllowOrigins(Vec<String>),
}

/// Server configuration for the web adapter.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port for the HTTP server.
    pub port: u16,
    /// Base directory for downloads, cookies, and bundled tools.
    pub base_dir: PathBuf,
    /// CORS configuration.
    pub cors: CorsConfig,
}

impl ServerConfig {
    /// Config rooted at the current directory on the default port.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            port: 5000,
            base_dir: PathBuf::from("."),
            cors: CorsConfig::default(),
        }
    }
}

/// Application context for the web adapter.
pub struct AppContext {
    /// The download orchestration engine.
    pub engine: Arc<DownloadEngine>,
    /// SSE broadcaster for real-time events.
    pub sse: Arc<SseBroadcaster>,
}

/// Bootstrap the server with all services.
pub fn bootstrap(config: &ServerConfig) -> Result<AppContext> {
    let engine_config = EngineConfig::rooted_at(&config.base_dir);
    engine_config.ensure_directories()?;

    tracing::info!(
        download_dir = %engine_config.download_dir.display(),
        cookie_dir = %engine_config.cookie_dir.display(),
        "Bootstrap resolved paths"
    );

    let sse = Arc::new(SseBroadcaster::with_defaults());

    let engine = Arc::new(build_engine(DownloadEngineDeps {
        config: engine_config,
        extractor: Arc::new(YtDlpExtractor::new()),
        events: Arc::new((*sse).clone()),
        activity: Arc::new(NoopActivityLog),
    }));

    Ok(AppContext { engine, sse })
}

/// Start the web server on the configured port.
pub async fn start_server(config: ServerConfig) -> Result<()> {
    use tokio::net::TcpListener;

    let ctx = bootstrap(&config)?;
    let app = crate::routes::create_router(ctx, &config.cors);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("mediagrab server listening on http://{addr}");

    axum::serve(listener, app).await?;
    Ok(())
}
