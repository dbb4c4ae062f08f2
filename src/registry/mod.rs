//! Filesystem-backed job registry.
//!
//! Every job owns exactly one directory, `<data_dir>/jobs/<job_id>/`, and
//! nothing outside it. A directory only counts as a job once its `job.json`
//! manifest exists, so a half-written upload is never visible. Lookups parse
//! the id exactly; prefix lookup is available only through [`JobRegistry::resolve`],
//! which refuses ambiguous prefixes.

mod types;

pub use types::*;

use chunkforge_common::{Error, JobId, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Manifest file name inside each job directory.
pub const MANIFEST_FILE: &str = "job.json";
/// Chunk directory name inside each job directory.
pub const CHUNKS_DIR: &str = "chunks";
/// Shortest prefix [`JobRegistry::resolve`] will scan for.
pub const MIN_PREFIX_LEN: usize = 4;

#[derive(Debug, Clone)]
pub struct JobRegistry {
    jobs_dir: PathBuf,
}

impl JobRegistry {
    /// Open (creating if needed) the registry under `data_dir`.
    pub fn open(data_dir: &Path) -> Result<Self> {
        let jobs_dir = data_dir.join("jobs");
        std::fs::create_dir_all(&jobs_dir).map_err(|e| {
            Error::io(format!(
                "failed to create job directory {}: {e}",
                jobs_dir.display()
            ))
        })?;
        Ok(Self { jobs_dir })
    }

    pub fn jobs_dir(&self) -> &Path {
        &self.jobs_dir
    }

    pub fn paths(&self, id: JobId) -> JobPaths {
        let dir = self.jobs_dir.join(id.to_string());
        JobPaths {
            manifest: dir.join(MANIFEST_FILE),
            chunks_dir: dir.join(CHUNKS_DIR),
            archive: dir.join(chunkforge_av::archive_file_name(id)),
            dir,
        }
    }

    /// Mint a fresh job id and create its (empty) directory.
    pub fn reserve(&self) -> Result<(JobId, JobPaths)> {
        loop {
            let id = JobId::new();
            let paths = self.paths(id);
            match std::fs::create_dir(&paths.dir) {
                Ok(()) => return Ok((id, paths)),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Atomically write the job's manifest.
    pub fn save(&self, job: &Job) -> Result<()> {
        let paths = self.paths(job.id);
        let json = serde_json::to_vec_pretty(job)
            .map_err(|e| Error::io(format!("failed to encode manifest: {e}")))?;

        let mut tmp = tempfile::Builder::new()
            .prefix(".job-")
            .suffix(".json")
            .tempfile_in(&paths.dir)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&paths.manifest).map_err(|e| Error::Io(e.error))?;

        Ok(())
    }

    /// Load the job with exactly this id.
    pub fn get(&self, id: JobId) -> Result<Job> {
        let manifest = self.paths(id).manifest;
        let content = match std::fs::read(&manifest) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::job_not_found(id))
            }
            Err(e) => return Err(e.into()),
        };

        let job: Job = serde_json::from_slice(&content).map_err(|e| {
            Error::io(format!("corrupt manifest {}: {e}", manifest.display()))
        })?;
        if job.id != id {
            return Err(Error::io(format!(
                "manifest {} belongs to job {}",
                manifest.display(),
                job.id
            )));
        }
        Ok(job)
    }

    /// Ids of every directory that looks like a job, manifest or not.
    fn job_dirs(&self) -> Result<Vec<JobId>> {
        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&self.jobs_dir)? {
            let entry = entry?;
            if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                continue;
            }
            if let Some(id) = entry
                .file_name()
                .to_str()
                .and_then(|name| name.parse::<JobId>().ok())
            {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    /// All registered jobs, oldest first.
    pub fn list(&self) -> Result<Vec<Job>> {
        let mut jobs = Vec::new();
        for id in self.job_dirs()? {
            match self.get(id) {
                Ok(job) => jobs.push(job),
                Err(Error::JobNotFound(_)) => {}
                Err(e) => tracing::warn!("Skipping job {}: {}", id, e),
            }
        }
        jobs.sort_by_key(|j| j.created_at);
        Ok(jobs)
    }

    /// Resolve a full id, or a unique prefix of one, to a registered job id.
    ///
    /// A prefix shared by several jobs is rejected rather than guessed.
    pub fn resolve(&self, key: &str) -> Result<JobId> {
        let key = key.trim();
        if let Ok(id) = key.parse::<JobId>() {
            return Ok(id);
        }

        let prefix = key.to_ascii_lowercase();
        if prefix.len() < MIN_PREFIX_LEN
            || !prefix.chars().all(|c| c.is_ascii_hexdigit() || c == '-')
        {
            return Err(Error::invalid_input(format!("malformed job id: {key:?}")));
        }

        let matches: Vec<JobId> = self
            .job_dirs()?
            .into_iter()
            .filter(|id| id.to_string().starts_with(&prefix))
            .filter(|id| self.paths(*id).manifest.exists())
            .collect();

        match matches.as_slice() {
            [] => Err(Error::job_not_found(key)),
            [id] => Ok(*id),
            _ => Err(Error::invalid_input(format!(
                "job id prefix {key:?} is ambiguous ({} matches)",
                matches.len()
            ))),
        }
    }

    /// Remove every artifact of a job. Best effort and idempotent.
    ///
    /// The manifest goes first so the job stops resolving even if a later
    /// removal fails. Failures are logged and reported, never returned.
    pub fn delete(&self, id: JobId) -> CleanupReport {
        let paths = self.paths(id);
        let mut report = CleanupReport::default();

        if !paths.dir.exists() {
            return report;
        }

        let mut entries: Vec<PathBuf> = vec![paths.manifest.clone()];
        match std::fs::read_dir(&paths.dir) {
            Ok(rd) => entries.extend(
                rd.filter_map(|e| e.ok())
                    .map(|e| e.path())
                    .filter(|p| *p != paths.manifest),
            ),
            Err(e) => tracing::warn!("Failed to list {:?}: {}", paths.dir, e),
        }

        for path in entries {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let result = if path.is_dir() {
                std::fs::remove_dir_all(&path)
            } else {
                std::fs::remove_file(&path)
            };
            match result {
                Ok(()) => report.removed.push(name),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!("Failed to remove {:?} for job {}: {}", path, id, e);
                    report.failed.push(name);
                }
            }
        }

        if let Err(e) = std::fs::remove_dir(&paths.dir) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to remove job directory {:?}: {}", paths.dir, e);
                report.failed.push(id.to_string());
            }
        }

        report
    }
}
