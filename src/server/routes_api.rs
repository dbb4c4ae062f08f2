use crate::registry::Job;
use crate::server::{AppContext, AppError};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chunkforge_av::{check_tools, ToolInfo};
use chunkforge_common::Error;

pub fn api_routes() -> Router<AppContext> {
    Router::new()
        .route("/", get(api_info))
        .route("/jobs", get(list_jobs))
        .route("/jobs/:job_id", get(get_job))
        .route("/tools", get(get_tools))
}

async fn api_info(State(ctx): State<AppContext>) -> impl IntoResponse {
    Json(serde_json::json!({
        "service": "chunkforge",
        "status": "running",
        "version": env!("CARGO_PKG_VERSION"),
        "defaults": {
            "chunk_duration": ctx.jobs.settings().default_chunk_duration,
            "overlap": ctx.jobs.settings().default_overlap,
            "max_chunks": ctx.jobs.settings().max_chunks,
        },
        "endpoints": {
            "upload": "POST /upload",
            "split": "POST /split",
            "download": "GET /download/<filename>",
            "cleanup": "DELETE /cleanup/<job_id>",
            "health": "GET /health",
            "jobs": "GET /api/jobs",
            "tools": "GET /api/tools",
        }
    }))
}

async fn list_jobs(State(ctx): State<AppContext>) -> Result<Json<Vec<Job>>, AppError> {
    Ok(Json(ctx.jobs.list()?))
}

/// Accepts a full job id or an unambiguous prefix of one.
async fn get_job(
    State(ctx): State<AppContext>,
    Path(key): Path<String>,
) -> Result<Json<Job>, AppError> {
    let id = ctx.jobs.resolve(&key)?;
    Ok(Json(ctx.jobs.get(id)?))
}

async fn get_tools(State(ctx): State<AppContext>) -> Result<Json<Vec<ToolInfo>>, AppError> {
    let tools = ctx.config.tools.clone();
    let infos = tokio::task::spawn_blocking(move || {
        check_tools(tools.ffmpeg_path.as_deref(), tools.ffprobe_path.as_deref())
    })
    .await
    .map_err(|e| Error::io(format!("tool check failed: {e}")))?;
    Ok(Json(infos))
}
