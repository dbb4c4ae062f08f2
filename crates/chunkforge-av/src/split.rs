//! End-to-end split of one source file: probe, plan, stage, extract, move.

use std::path::{Path, PathBuf};

use chunkforge_common::{Error, Result};
use serde::Serialize;

use crate::extract::extract_chunks;
use crate::media::MediaTool;
use crate::plan::{plan_with_limit, ChunkWindow, PlanParams};
use crate::probe::probe_duration;
use crate::workspace::Workspace;

/// Result of a successful [`split_video`].
#[derive(Debug, Clone, Serialize)]
pub struct SplitOutput {
    /// Probed source duration in seconds.
    pub duration: f64,
    /// Planned windows, in index order.
    pub windows: Vec<ChunkWindow>,
    /// Final chunk files, parallel to `windows`.
    pub chunks: Vec<PathBuf>,
}

/// Split `source` into overlapping chunks under `chunks_dir`.
///
/// Chunks are extracted into a staging directory next to `chunks_dir` and
/// moved into place only once every window succeeded; on failure nothing is
/// left at `chunks_dir` and the staging directory is removed.
///
/// `max_windows` caps the plan size; a plan exceeding it is rejected before
/// any extraction starts.
///
/// # Errors
///
/// Propagates [`Error::SourceUnavailable`], [`Error::ProbeFailed`],
/// [`Error::InvalidPlanParameters`] and [`Error::ExtractionFailed`].
pub async fn split_video(
    tool: &dyn MediaTool,
    source: &Path,
    chunks_dir: &Path,
    params: &PlanParams,
    max_windows: Option<usize>,
) -> Result<SplitOutput> {
    let duration = probe_duration(tool, source).await?;

    let windows = plan_with_limit(duration, params, max_windows)?;

    let parent = chunks_dir
        .parent()
        .ok_or_else(|| Error::invalid_input("chunk directory has no parent"))?
        .to_path_buf();
    let workspace = blocking(move || Workspace::new_in(&parent)).await?;

    #[cfg(feature = "tracing")]
    tracing::info!(
        source = %source.display(),
        duration,
        chunks = windows.len(),
        chunk_length = params.chunk_length(),
        overlap = params.overlap(),
        "splitting video"
    );

    let staged = match extract_chunks(tool, source, &windows, workspace.dir()).await {
        Ok(staged) => staged,
        Err(e) => {
            let _ = blocking(move || {
                workspace.cleanup();
                Ok(())
            })
            .await;
            return Err(e);
        }
    };

    let destination = chunks_dir.to_path_buf();
    let final_dir = blocking(move || workspace.finalize(&destination)).await?;
    let chunks = staged
        .iter()
        .filter_map(|p| p.file_name())
        .map(|name| final_dir.join(name))
        .collect();

    Ok(SplitOutput {
        duration,
        windows,
        chunks,
    })
}

/// Run filesystem work off the async executor.
async fn blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::io(format!("filesystem task failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Fake {
        duration: f64,
        fail_on: Option<u32>,
    }

    #[async_trait]
    impl MediaTool for Fake {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn probe_duration(&self, _path: &Path) -> Result<f64> {
            Ok(self.duration)
        }

        async fn extract_range(
            &self,
            _source: &Path,
            window: &ChunkWindow,
            output: &Path,
        ) -> Result<()> {
            if self.fail_on == Some(window.index) {
                return Err(Error::tool_failed("ffmpeg", "boom"));
            }
            std::fs::write(output, b"chunk")?;
            Ok(())
        }
    }

    fn setup() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.mp4");
        std::fs::write(&source, b"video").unwrap();
        (dir, source)
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn splits_into_final_directory() {
        let (dir, source) = setup();
        let chunks_dir = dir.path().join("chunks");
        let tool = Fake {
            duration: 300.0,
            fail_on: None,
        };

        let out = split_video(&tool, &source, &chunks_dir, &PlanParams::default(), None)
            .await
            .unwrap();

        assert_eq!(out.duration, 300.0);
        assert_eq!(out.windows.len(), 6);
        assert_eq!(out.chunks.len(), 6);
        assert!(out.chunks.iter().all(|c| c.starts_with(&chunks_dir) && c.exists()));
        assert_eq!(entries(dir.path()), vec!["chunks", "source.mp4"]);
    }

    #[tokio::test]
    async fn failure_leaves_no_chunks() {
        let (dir, source) = setup();
        let chunks_dir = dir.path().join("chunks");
        let tool = Fake {
            duration: 300.0,
            fail_on: Some(4),
        };

        let err = split_video(&tool, &source, &chunks_dir, &PlanParams::default(), None)
            .await
            .unwrap_err();

        assert_eq!(err.failed_chunk(), Some(4));
        assert_eq!(entries(dir.path()), vec!["source.mp4"]);
    }

    #[tokio::test]
    async fn plan_over_limit_is_rejected_before_extraction() {
        let (dir, source) = setup();
        let tool = Fake {
            duration: 300.0,
            fail_on: Some(1),
        };

        let err = split_video(
            &tool,
            &source,
            &dir.path().join("chunks"),
            &PlanParams::default(),
            Some(5),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::InvalidPlanParameters(_)), "{err}");
    }
}
