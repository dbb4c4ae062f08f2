use chrono::{DateTime, Utc};
use chunkforge_av::ChunkWindow;
use chunkforge_common::JobId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Uploaded,
    Split,
}

/// One produced chunk, as recorded in the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub index: u32,
    pub start: f64,
    pub end: f64,
    pub filename: String,
}

impl ChunkRecord {
    pub fn new(window: &ChunkWindow, filename: String) -> Self {
        Self {
            index: window.index,
            start: window.start,
            end: window.end,
            filename,
        }
    }
}

/// Outcome of a successful split.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitRecord {
    pub chunk_duration: f64,
    pub overlap: f64,
    pub duration: f64,
    pub chunks: Vec<ChunkRecord>,
    pub archive_filename: String,
    pub completed_at: DateTime<Utc>,
}

/// A job manifest, persisted as `job.json` in the job directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub original_filename: String,
    pub stored_filename: String,
    pub state: JobState,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split: Option<SplitRecord>,
}

impl Job {
    pub fn new(id: JobId, original_filename: String, stored_filename: String) -> Self {
        Self {
            id,
            original_filename,
            stored_filename,
            state: JobState::Uploaded,
            created_at: Utc::now(),
            split: None,
        }
    }

    pub fn is_split(&self) -> bool {
        self.state == JobState::Split && self.split.is_some()
    }

    /// Transition `Uploaded -> Split`.
    pub fn mark_split(&mut self, record: SplitRecord) {
        self.state = JobState::Split;
        self.split = Some(record);
    }
}

/// Filesystem locations owned by one job.
#[derive(Debug, Clone)]
pub struct JobPaths {
    pub dir: PathBuf,
    pub manifest: PathBuf,
    pub chunks_dir: PathBuf,
    pub archive: PathBuf,
}

impl JobPaths {
    pub fn source(&self, job: &Job) -> PathBuf {
        self.dir.join(&job.stored_filename)
    }

    /// Chunk files in index order; empty until the job is split.
    pub fn chunks(&self, job: &Job) -> Vec<PathBuf> {
        job.split
            .iter()
            .flat_map(|s| s.chunks.iter())
            .map(|c| self.chunks_dir.join(&c.filename))
            .collect()
    }
}

/// What a deletion removed and what it could not.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupReport {
    pub removed: Vec<String>,
    pub failed: Vec<String>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}
