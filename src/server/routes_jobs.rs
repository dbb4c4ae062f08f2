//! Upload, split, download and cleanup endpoints.

use crate::registry::ChunkRecord;
use crate::server::{AppContext, AppError};
use axum::{
    body::Body,
    extract::{rejection::JsonRejection, Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use chunkforge_common::{Error, JobId};
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;

/// Multipart field carrying the video.
const FILE_FIELD: &str = "file";

pub fn job_routes() -> Router<AppContext> {
    Router::new()
        .route("/upload", post(upload))
        .route("/split", post(split))
        .route("/download/:filename", get(download))
        .route("/cleanup/:job_id", delete(cleanup))
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    Error::invalid_input(format!("failed to read upload: {e}")).into()
}

#[derive(Debug, Serialize)]
struct UploadResponse {
    message: &'static str,
    job_id: JobId,
    filename: String,
    stored_filename: String,
}

async fn upload(
    State(ctx): State<AppContext>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            tracing::debug!("Ignoring multipart field {:?}", field.name());
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let mut ticket = ctx.jobs.begin_upload(&filename).await?;

        // Returning early drops the ticket, which discards the partial upload.
        loop {
            match field.chunk().await {
                Ok(Some(bytes)) => ticket.write_chunk(&bytes).await?,
                Ok(None) => break,
                Err(e) => {
                    tracing::debug!(
                        "Upload for job {} broke off after {} bytes",
                        ticket.job_id(),
                        ticket.bytes_written()
                    );
                    return Err(multipart_error(e));
                }
            }
        }

        let job = ctx.jobs.finish_upload(ticket).await?;
        return Ok(Json(UploadResponse {
            message: "File uploaded successfully",
            job_id: job.id,
            filename: job.original_filename,
            stored_filename: job.stored_filename,
        }));
    }

    Err(Error::invalid_input("no file part in request").into())
}

#[derive(Debug, Deserialize)]
struct SplitRequest {
    #[serde(alias = "file_id")]
    job_id: String,
    chunk_duration: Option<f64>,
    overlap: Option<f64>,
}

#[derive(Debug, Serialize)]
struct SplitResponse {
    message: &'static str,
    job_id: JobId,
    duration: f64,
    chunk_count: usize,
    zip_filename: String,
    download_url: String,
    chunks: Vec<ChunkRecord>,
}

async fn split(
    State(ctx): State<AppContext>,
    payload: Result<Json<SplitRequest>, JsonRejection>,
) -> Result<Json<SplitResponse>, AppError> {
    let Json(request) =
        payload.map_err(|e| Error::invalid_input(format!("invalid split request: {e}")))?;
    let job_id: JobId = request.job_id.parse()?;

    let job = ctx
        .jobs
        .split(job_id, request.chunk_duration, request.overlap)
        .await?;
    let record = job
        .split
        .ok_or_else(|| Error::io(format!("job {job_id} has no split record")))?;

    Ok(Json(SplitResponse {
        message: "Video split successfully",
        job_id,
        duration: record.duration,
        chunk_count: record.chunks.len(),
        download_url: format!("/download/{}", record.archive_filename),
        zip_filename: record.archive_filename,
        chunks: record.chunks,
    }))
}

async fn download(
    State(ctx): State<AppContext>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    let archive = ctx.jobs.archive(&filename)?;

    let file = tokio::fs::File::open(&archive.path)
        .await
        .map_err(|_| Error::not_found(format!("archive {filename}")))?;
    let size = file.metadata().await.map_err(Error::from)?.len();

    tracing::debug!("Serving archive {} ({} bytes)", archive.filename, size);

    let body = Body::from_stream(ReaderStream::new(file));
    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", archive.filename),
            ),
            (header::CONTENT_LENGTH, size.to_string()),
        ],
        body,
    )
        .into_response())
}

#[derive(Debug, Serialize)]
struct CleanupResponse {
    message: &'static str,
    job_id: JobId,
    removed: Vec<String>,
    failed: Vec<String>,
}

async fn cleanup(
    State(ctx): State<AppContext>,
    Path(job_id): Path<String>,
) -> Result<Json<CleanupResponse>, AppError> {
    let job_id: JobId = job_id.parse()?;
    let report = ctx.jobs.cleanup(job_id).await;

    Ok(Json(CleanupResponse {
        message: "Cleanup completed",
        job_id,
        removed: report.removed,
        failed: report.failed,
    }))
}
