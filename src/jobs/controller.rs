//! Job lifecycle: upload -> split -> download -> cleanup.
//!
//! The controller owns the [`JobRegistry`], the [`MediaTool`] and a lock per
//! job id. Split and cleanup on the same job serialize on that lock; jobs
//! never contend with each other.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use chunkforge_av::{
    job_id_from_archive_name, split_video, write_archive, MediaTool, PlanParams,
};
use chunkforge_common::paths::{sanitize_filename, video_extension, video_extensions};
use chunkforge_common::{Error, JobId, Result};
use dashmap::DashMap;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::config::SplitConfig;
use crate::registry::{ChunkRecord, CleanupReport, Job, JobRegistry, SplitRecord};

/// An upload in progress. Nothing is registered until
/// [`JobController::finish_upload`] writes the manifest.
///
/// Dropping an unfinished ticket (a failed write, or a request abandoned
/// mid-body) removes the job directory it reserved.
#[derive(Debug)]
pub struct UploadTicket {
    job_id: JobId,
    original_filename: String,
    stored_filename: String,
    path: PathBuf,
    file: tokio::fs::File,
    bytes_written: u64,
    reserved: Option<PathBuf>,
}

impl UploadTicket {
    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Append a piece of the uploaded body.
    pub async fn write_chunk(&mut self, data: &[u8]) -> Result<()> {
        self.file.write_all(data).await?;
        self.bytes_written += data.len() as u64;
        Ok(())
    }
}

impl Drop for UploadTicket {
    fn drop(&mut self) {
        let Some(dir) = self.reserved.take() else {
            return;
        };
        tracing::debug!(
            "Discarding upload for job {} after {} bytes",
            self.job_id,
            self.bytes_written
        );
        if let Err(e) = std::fs::remove_dir_all(&dir) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to remove abandoned upload {:?}: {}", dir, e);
            }
        }
    }
}

/// A resolved, downloadable archive.
#[derive(Debug, Clone)]
pub struct ArchiveFile {
    pub job_id: JobId,
    pub filename: String,
    pub path: PathBuf,
}

pub struct JobController {
    registry: JobRegistry,
    tool: Arc<dyn MediaTool>,
    settings: SplitConfig,
    locks: DashMap<JobId, Arc<Mutex<()>>>,
}

impl JobController {
    pub fn new(registry: JobRegistry, tool: Arc<dyn MediaTool>, settings: SplitConfig) -> Self {
        Self {
            registry,
            tool,
            settings,
            locks: DashMap::new(),
        }
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &SplitConfig {
        &self.settings
    }

    fn lock_for(&self, id: JobId) -> Arc<Mutex<()>> {
        self.locks
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Forget the lock of `id` once nobody holds or waits on it.
    ///
    /// Callers drop their own clone first. Clones are only handed out under
    /// the map's shard lock, so a count of one cannot race with `lock_for`.
    fn release_lock(&self, id: JobId) {
        self.locks
            .remove_if(&id, |_, lock| Arc::strong_count(lock) == 1);
    }

    #[cfg(test)]
    pub(crate) fn tracked_locks(&self) -> usize {
        self.locks.len()
    }

    /// Validate the client filename and open the job's source file for writing.
    pub async fn begin_upload(&self, filename: &str) -> Result<UploadTicket> {
        if filename.trim().is_empty() {
            return Err(Error::invalid_input("no file selected"));
        }

        let original_filename = sanitize_filename(filename);
        let extension = video_extension(std::path::Path::new(&original_filename))
            .ok_or_else(|| {
                Error::invalid_input(format!(
                    "file type not allowed; accepted: {}",
                    video_extensions().join(", ")
                ))
            })?;

        let (job_id, paths) = self.registry.reserve()?;
        let reserved = paths.dir.clone();
        let stored_filename = format!("source.{extension}");
        let path = paths.dir.join(&stored_filename);

        let file = match tokio::fs::File::create(&path).await {
            Ok(f) => f,
            Err(e) => {
                self.discard(job_id).await;
                return Err(e.into());
            }
        };

        tracing::debug!("Receiving upload {:?} as job {}", original_filename, job_id);

        Ok(UploadTicket {
            job_id,
            original_filename,
            stored_filename,
            path,
            file,
            bytes_written: 0,
            reserved: Some(reserved),
        })
    }

    /// Flush the source file and register the job in state `Uploaded`.
    pub async fn finish_upload(&self, mut ticket: UploadTicket) -> Result<Job> {
        let result = async {
            ticket.file.flush().await?;
            ticket.file.sync_all().await?;
            let job = Job::new(
                ticket.job_id,
                ticket.original_filename.clone(),
                ticket.stored_filename.clone(),
            );
            self.registry.save(&job)?;
            Ok::<_, Error>(job)
        }
        .await;

        match result {
            Ok(job) => {
                ticket.reserved = None;
                tracing::info!(
                    "Uploaded {:?} ({} bytes) as job {}",
                    job.original_filename,
                    ticket.bytes_written,
                    job.id
                );
                Ok(job)
            }
            Err(e) => {
                // The ticket's drop removes the reserved directory.
                tracing::warn!("Failed to store upload {:?}: {}", ticket.path, e);
                Err(e)
            }
        }
    }

    async fn discard(&self, id: JobId) {
        let registry = self.registry.clone();
        let _ = tokio::task::spawn_blocking(move || registry.delete(id)).await;
    }

    /// Upload an in-memory body in one call.
    pub async fn upload(&self, filename: &str, data: &[u8]) -> Result<Job> {
        let mut ticket = self.begin_upload(filename).await?;
        ticket.write_chunk(data).await?;
        self.finish_upload(ticket).await
    }

    /// Resolve request parameters against the configured defaults.
    pub fn plan_params(&self, chunk_duration: Option<f64>, overlap: Option<f64>) -> Result<PlanParams> {
        PlanParams::new(
            chunk_duration.unwrap_or(self.settings.default_chunk_duration),
            overlap.unwrap_or(self.settings.default_overlap),
        )
    }

    /// Split an uploaded job and package its chunks.
    ///
    /// Either every step succeeds and the job becomes `Split`, or the job is
    /// left `Uploaded` with no chunk directory or archive.
    pub async fn split(
        &self,
        id: JobId,
        chunk_duration: Option<f64>,
        overlap: Option<f64>,
    ) -> Result<Job> {
        // Parameter errors never reach the media tool.
        let params = self.plan_params(chunk_duration, overlap)?;

        // Unknown ids never get a lock entry.
        self.registry.get(id)?;

        let lock = self.lock_for(id);
        let result = {
            let _guard = lock.lock().await;
            self.split_locked(id, params).await
        };
        drop(lock);
        self.release_lock(id);
        result
    }

    async fn split_locked(&self, id: JobId, params: PlanParams) -> Result<Job> {
        // Re-read under the lock: a concurrent split or cleanup may have won.
        let mut job = self.registry.get(id)?;
        if job.is_split() {
            return Err(Error::AlreadySplit(id.to_string()));
        }

        let paths = self.registry.paths(id);
        let source = paths.source(&job);

        tracing::info!(
            "Splitting job {} ({:?}): chunk={}s overlap={}s",
            id,
            job.original_filename,
            params.chunk_length(),
            params.overlap()
        );

        let output = split_video(
            self.tool.as_ref(),
            &source,
            &paths.chunks_dir,
            &params,
            Some(self.settings.max_chunks),
        )
        .await
        .inspect_err(|e| tracing::warn!("Split of job {} failed: {}", id, e))?;

        for (window, chunk) in output.windows.iter().zip(&output.chunks) {
            tracing::debug!(
                "Job {} chunk {}: [{:.3}, {:.3}) -> {:?}",
                id,
                window.index,
                window.start,
                window.end,
                chunk.file_name().unwrap_or_default()
            );
        }

        let chunks = output.chunks.clone();
        let archive = paths.archive.clone();
        let archived = tokio::task::spawn_blocking(move || write_archive(&chunks, &archive))
            .await
            .map_err(|e| Error::archive(format!("archive task failed: {e}")))
            .and_then(|r| r);
        if let Err(e) = archived {
            tracing::warn!("Archiving job {} failed: {}", id, e);
            self.rollback_split(&paths.chunks_dir, None).await;
            return Err(e);
        }

        let archive_filename = paths
            .archive
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let chunk_records = output
            .windows
            .iter()
            .zip(&output.chunks)
            .map(|(w, path)| {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                ChunkRecord::new(w, name)
            })
            .collect();

        job.mark_split(SplitRecord {
            chunk_duration: params.chunk_length(),
            overlap: params.overlap(),
            duration: output.duration,
            chunks: chunk_records,
            archive_filename,
            completed_at: Utc::now(),
        });

        if let Err(e) = self.registry.save(&job) {
            tracing::warn!("Recording split of job {} failed: {}", id, e);
            self.rollback_split(&paths.chunks_dir, Some(paths.archive.clone()))
                .await;
            return Err(e);
        }

        tracing::info!(
            "Job {} split into {} chunks ({:.3}s)",
            id,
            output.windows.len(),
            output.duration
        );

        Ok(job)
    }

    async fn rollback_split(&self, chunks_dir: &std::path::Path, archive: Option<PathBuf>) {
        let chunks_dir = chunks_dir.to_path_buf();
        let _ = tokio::task::spawn_blocking(move || {
            if let Err(e) = std::fs::remove_dir_all(&chunks_dir) {
                tracing::warn!("Failed to roll back {:?}: {}", chunks_dir, e);
            }
            if let Some(archive) = archive {
                let _ = std::fs::remove_file(archive);
            }
        })
        .await;
    }

    /// Find the archive behind a download filename.
    ///
    /// Anything that is not the exact archive name of a split job is
    /// `NotFound`, including well-formed names of unsplit or deleted jobs.
    pub fn archive(&self, filename: &str) -> Result<ArchiveFile> {
        let not_found = || Error::not_found(format!("archive {filename}"));

        let id: JobId = job_id_from_archive_name(filename)
            .and_then(|s| s.parse().ok())
            .ok_or_else(not_found)?;
        let paths = self.registry.paths(id);
        if paths.archive.file_name().and_then(|n| n.to_str()) != Some(filename) {
            return Err(not_found());
        }

        let job = match self.registry.get(id) {
            Ok(job) => job,
            Err(Error::JobNotFound(_)) => return Err(not_found()),
            Err(e) => return Err(e),
        };
        if !job.is_split() || !paths.archive.is_file() {
            return Err(not_found());
        }

        Ok(ArchiveFile {
            job_id: id,
            filename: filename.to_string(),
            path: paths.archive,
        })
    }

    /// Remove every artifact of a job. Always succeeds; failures are listed.
    pub async fn cleanup(&self, id: JobId) -> CleanupReport {
        let lock = self.lock_for(id);
        let report = {
            let _guard = lock.lock().await;
            let registry = self.registry.clone();
            match tokio::task::spawn_blocking(move || registry.delete(id)).await {
                Ok(report) => report,
                Err(e) => {
                    tracing::warn!("Cleanup task for job {} failed: {}", id, e);
                    CleanupReport {
                        removed: Vec::new(),
                        failed: vec![id.to_string()],
                    }
                }
            }
        };
        drop(lock);
        self.release_lock(id);

        tracing::info!(
            "Cleaned up job {}: {} removed, {} failed",
            id,
            report.removed.len(),
            report.failed.len()
        );
        report
    }

    pub fn get(&self, id: JobId) -> Result<Job> {
        self.registry.get(id)
    }

    pub fn list(&self) -> Result<Vec<Job>> {
        self.registry.list()
    }

    /// Resolve a full id or unique prefix.
    pub fn resolve(&self, key: &str) -> Result<JobId> {
        self.registry.resolve(key)
    }
}
