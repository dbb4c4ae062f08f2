//! The [`MediaTool`] seam and its ffmpeg-backed implementation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chunkforge_common::Result;

use crate::command::{ToolCommand, DEFAULT_TIMEOUT};
use crate::plan::ChunkWindow;
use crate::probe::parse_duration_output;
use crate::tools::{get_tool_path, FFMPEG, FFPROBE};

/// External media capability: report a duration, cut a time range.
///
/// Implementations must be safe to share across threads (`Send + Sync`).
/// Callers go through [`crate::probe::probe_duration`] and
/// [`crate::extract::extract_chunks`], which add the existence checks and
/// error mapping; implementations only run the tool.
#[async_trait]
pub trait MediaTool: Send + Sync {
    /// Human-readable name identifying this implementation.
    fn name(&self) -> &'static str;

    /// Report the playable duration of `path` in seconds.
    async fn probe_duration(&self, path: &Path) -> Result<f64>;

    /// Write the `[window.start, window.end)` range of `source` to `output`
    /// without re-encoding.
    async fn extract_range(&self, source: &Path, window: &ChunkWindow, output: &Path)
        -> Result<()>;
}

/// A [`MediaTool`] backed by the `ffprobe` and `ffmpeg` CLIs.
#[derive(Debug, Clone)]
pub struct FfmpegTool {
    ffmpeg_path: PathBuf,
    ffprobe_path: PathBuf,
    timeout: Duration,
}

impl FfmpegTool {
    /// Create a tool using explicit binary paths.
    pub fn new(ffmpeg_path: PathBuf, ffprobe_path: PathBuf) -> Self {
        Self {
            ffmpeg_path,
            ffprobe_path,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Resolve both binaries, preferring configured paths over `PATH`.
    ///
    /// A tool that cannot be resolved falls back to its bare name, so the
    /// failure surfaces as [`chunkforge_common::Error::ToolNotFound`] on first
    /// use rather than at startup.
    pub fn discover(ffmpeg: Option<&Path>, ffprobe: Option<&Path>) -> Self {
        let ffmpeg_path = get_tool_path(FFMPEG, ffmpeg).unwrap_or_else(|_| PathBuf::from(FFMPEG));
        let ffprobe_path =
            get_tool_path(FFPROBE, ffprobe).unwrap_or_else(|_| PathBuf::from(FFPROBE));
        Self::new(ffmpeg_path, ffprobe_path)
    }

    /// Set the per-invocation timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Path of the ffmpeg binary in use.
    pub fn ffmpeg_path(&self) -> &Path {
        &self.ffmpeg_path
    }

    /// Path of the ffprobe binary in use.
    pub fn ffprobe_path(&self) -> &Path {
        &self.ffprobe_path
    }
}

impl Default for FfmpegTool {
    fn default() -> Self {
        Self::discover(None, None)
    }
}

/// Seconds formatted for ffmpeg time options.
fn timestamp(seconds: f64) -> String {
    format!("{seconds:.6}")
}

#[async_trait]
impl MediaTool for FfmpegTool {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    async fn probe_duration(&self, path: &Path) -> Result<f64> {
        let output = ToolCommand::new(self.ffprobe_path.clone())
            .args(["-v", "error"])
            .args(["-show_entries", "format=duration"])
            .args(["-of", "default=noprint_wrappers=1:nokey=1"])
            .arg(path)
            .timeout(self.timeout)
            .execute()
            .await?;

        parse_duration_output(&output.stdout)
    }

    async fn extract_range(
        &self,
        source: &Path,
        window: &ChunkWindow,
        output: &Path,
    ) -> Result<()> {
        ToolCommand::new(self.ffmpeg_path.clone())
            .args(["-y", "-v", "error"])
            .arg("-ss")
            .arg(timestamp(window.start))
            .arg("-to")
            .arg(timestamp(window.end))
            .arg("-i")
            .arg(source)
            .args(["-c", "copy"])
            .arg(output)
            .timeout(self.timeout)
            .execute()
            .await?;

        Ok(())
    }
}
