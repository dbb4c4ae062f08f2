//! Chunk archive packing.
//!
//! Chunks are already-compressed media, so entries are stored rather than
//! deflated. The archive is written to a temporary file beside the
//! destination and renamed into place, so a reader never sees a partial zip.

use std::collections::HashSet;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use chunkforge_common::{Error, Result};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Archive name for a job, e.g. `<id>_video_chunks.zip`.
pub fn archive_file_name(job_id: impl std::fmt::Display) -> String {
    format!("{job_id}_video_chunks.zip")
}

/// Inverse of [`archive_file_name`]: the job id portion of an archive name.
pub fn job_id_from_archive_name(name: &str) -> Option<&str> {
    name.strip_suffix("_video_chunks.zip")
        .filter(|id| !id.is_empty())
}

/// Pack `chunks` into a zip archive at `destination`.
///
/// Each file is stored under its base name only, in the order given. The
/// destination's parent directory must exist.
///
/// # Errors
///
/// Returns [`Error::ArchiveWriteFailed`] if a chunk cannot be read, two
/// chunks share a base name, or the archive cannot be written.
pub fn write_archive(chunks: &[PathBuf], destination: &Path) -> Result<PathBuf> {
    let parent = destination
        .parent()
        .ok_or_else(|| Error::archive("destination has no parent directory"))?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".archive-")
        .suffix(".part")
        .tempfile_in(parent)
        .map_err(|e| Error::archive(format!("failed to create temporary archive: {e}")))?;

    let mut zip = ZipWriter::new(tmp.as_file_mut());
    let mut seen = HashSet::with_capacity(chunks.len());

    for chunk in chunks {
        let name = chunk
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::archive(format!("invalid chunk path: {}", chunk.display())))?;
        if !seen.insert(name) {
            return Err(Error::archive(format!("duplicate entry name: {name}")));
        }

        let mut input = File::open(chunk)
            .map_err(|e| Error::archive(format!("failed to open {}: {e}", chunk.display())))?;
        let size = input
            .metadata()
            .map_err(|e| Error::archive(format!("failed to stat {}: {e}", chunk.display())))?
            .len();

        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Stored)
            .large_file(size >= u32::MAX as u64);

        zip.start_file(name, options)
            .map_err(|e| Error::archive(format!("failed to add {name}: {e}")))?;
        io::copy(&mut input, &mut zip)
            .map_err(|e| Error::archive(format!("failed to write {name}: {e}")))?;
    }

    zip.finish()
        .map_err(|e| Error::archive(format!("failed to finalize archive: {e}")))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| Error::archive(format!("failed to flush archive: {e}")))?;
    tmp.persist(destination)
        .map_err(|e| Error::archive(format!("failed to move archive into place: {}", e.error)))?;

    #[cfg(feature = "tracing")]
    tracing::debug!(entries = chunks.len(), path = %destination.display(), "archive written");

    Ok(destination.to_path_buf())
}
