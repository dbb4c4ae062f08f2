//! Staging directory for chunk extraction.

use chunkforge_common::{Error, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Prefix of staging directories, so leftovers are recognizable.
pub const STAGING_PREFIX: &str = ".staging-";

/// A staging directory next to the final output location.
///
/// Chunks are extracted into the staging directory and only moved into place
/// by [`Workspace::finalize`], a single rename on the same filesystem. If the
/// workspace is dropped without finalizing, the staging directory and any
/// partial chunks in it are removed.
///
/// # Example
///
/// ```no_run
/// use chunkforge_av::Workspace;
/// use std::path::Path;
///
/// let workspace = Workspace::new_in(Path::new("/data/jobs/abc"))?;
/// // Extract into workspace.dir() ...
/// workspace.finalize(Path::new("/data/jobs/abc/chunks"))?;
/// # Ok::<(), chunkforge_common::Error>(())
/// ```
#[derive(Debug)]
pub struct Workspace {
    staging: TempDir,
}

impl Workspace {
    /// Create a staging directory inside `parent`, creating `parent` if needed.
    pub fn new_in(parent: &Path) -> Result<Self> {
        std::fs::create_dir_all(parent)?;
        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(parent)?;
        Ok(Self { staging })
    }

    /// Path of the staging directory.
    pub fn dir(&self) -> &Path {
        self.staging.path()
    }

    /// Move the staging directory to `destination`.
    ///
    /// An existing `destination` (left over from an earlier, interrupted
    /// run) is removed first.
    pub fn finalize(self, destination: &Path) -> Result<PathBuf> {
        if destination.exists() {
            std::fs::remove_dir_all(destination).map_err(|e| {
                Error::io(format!(
                    "failed to remove stale {}: {e}",
                    destination.display()
                ))
            })?;
        }

        std::fs::rename(self.staging.path(), destination).map_err(|e| {
            Error::io(format!(
                "failed to move staged chunks to {}: {e}",
                destination.display()
            ))
        })?;

        // The TempDir guard now points at a path that no longer exists;
        // its cleanup on drop is a no-op.
        Ok(destination.to_path_buf())
    }

    /// Discard the staging directory and everything in it.
    pub fn cleanup(self) {
        drop(self.staging);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staging_is_inside_parent() {
        let parent = tempfile::tempdir().unwrap();
        let workspace = Workspace::new_in(parent.path()).unwrap();

        assert!(workspace.dir().starts_with(parent.path()));
        let name = workspace.dir().file_name().unwrap().to_string_lossy();
        assert!(name.starts_with(STAGING_PREFIX));
        assert!(workspace.dir().is_dir());
    }

    #[test]
    fn test_finalize_moves_contents() {
        let parent = tempfile::tempdir().unwrap();
        let workspace = Workspace::new_in(parent.path()).unwrap();
        std::fs::write(workspace.dir().join("chunk_001.mp4"), b"a").unwrap();
        let staging = workspace.dir().to_path_buf();

        let dest = parent.path().join("chunks");
        let final_dir = workspace.finalize(&dest).unwrap();

        assert_eq!(final_dir, dest);
        assert!(dest.join("chunk_001.mp4").exists());
        assert!(!staging.exists());
    }

    #[test]
    fn test_finalize_replaces_stale_destination() {
        let parent = tempfile::tempdir().unwrap();
        let dest = parent.path().join("chunks");
        std::fs::create_dir_all(&dest).unwrap();
        std::fs::write(dest.join("chunk_009.mp4"), b"stale").unwrap();

        let workspace = Workspace::new_in(parent.path()).unwrap();
        std::fs::write(workspace.dir().join("chunk_001.mp4"), b"fresh").unwrap();
        workspace.finalize(&dest).unwrap();

        assert!(dest.join("chunk_001.mp4").exists());
        assert!(!dest.join("chunk_009.mp4").exists());
    }

    #[test]
    fn test_cleanup_discards_partial_output() {
        let parent = tempfile::tempdir().unwrap();
        let workspace = Workspace::new_in(&parent.path().join("job")).unwrap();
        std::fs::write(workspace.dir().join("chunk_001.mp4"), b"partial").unwrap();
        let staging = workspace.dir().to_path_buf();

        workspace.cleanup();
        assert!(!staging.exists());
    }
}
