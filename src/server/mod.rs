use crate::config::Config;
use crate::jobs::JobController;
use crate::registry::JobRegistry;
use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chunkforge_av::{FfmpegTool, MediaTool};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

pub mod error;
pub mod routes_api;
pub mod routes_jobs;

pub use error::AppError;

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub jobs: Arc<JobController>,
}

impl AppContext {
    /// Build the context with an explicit media tool.
    pub fn with_tool(config: Config, tool: Arc<dyn MediaTool>) -> Result<Self> {
        let registry = JobRegistry::open(&config.storage.data_dir).with_context(|| {
            format!(
                "Failed to open job registry under {:?}",
                config.storage.data_dir
            )
        })?;
        let jobs = JobController::new(registry, tool, config.split.clone());
        Ok(Self {
            config: Arc::new(config),
            jobs: Arc::new(jobs),
        })
    }

    /// Build the context with the ffmpeg/ffprobe tool from config.
    pub fn from_config(config: Config) -> Result<Self> {
        let tool = FfmpegTool::discover(
            config.tools.ffmpeg_path.as_deref(),
            config.tools.ffprobe_path.as_deref(),
        )
        .with_timeout(Duration::from_secs(config.tools.timeout_secs));
        tracing::info!(
            "Using ffmpeg at {:?}, ffprobe at {:?}",
            tool.ffmpeg_path(),
            tool.ffprobe_path()
        );
        Self::with_tool(config, Arc::new(tool))
    }
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext, static_dir: Option<PathBuf>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    let body_limit = ctx.config.server.max_upload_bytes();

    let mut app = Router::new()
        // Health check
        .route("/health", get(health_check))
        .merge(routes_jobs::job_routes())
        .nest("/api", routes_api::api_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx);

    // Serve static files if directory is provided
    if let Some(dir) = static_dir {
        if dir.exists() {
            tracing::info!("Serving static files from {:?}", dir);
            let index_path = dir.join("index.html");
            app = app.fallback_service(
                ServeDir::new(&dir)
                    .append_index_html_on_directories(true)
                    .not_found_service(ServeFile::new(index_path)),
            );
        } else {
            tracing::warn!("Static directory {:?} does not exist", dir);
        }
    }

    app
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// Start the HTTP server
pub async fn start_server(config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let static_dir = config.server.static_dir.clone();
    let ctx = AppContext::from_config(config)?;
    let app = create_router(ctx, static_dir);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
