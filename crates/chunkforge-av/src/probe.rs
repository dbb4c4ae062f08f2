//! Duration probing.

use std::path::Path;

use chunkforge_common::{Error, Result};

use crate::media::MediaTool;

/// Parse ffprobe's `default=noprint_wrappers=1:nokey=1` duration output.
///
/// The output is a bare number of seconds on the first non-empty line.
/// Containers without a known duration print `N/A`.
pub fn parse_duration_output(stdout: &str) -> Result<f64> {
    let line = stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| Error::probe_failed("no duration reported"))?;

    let duration: f64 = line
        .parse()
        .map_err(|_| Error::probe_failed(format!("unparseable duration: {line:?}")))?;

    validate_duration(duration)
}

fn validate_duration(duration: f64) -> Result<f64> {
    if !duration.is_finite() || duration <= 0.0 {
        return Err(Error::probe_failed(format!(
            "duration must be positive, got {duration}"
        )));
    }
    Ok(duration)
}

/// Report the duration of the media file at `path` in seconds.
///
/// # Errors
///
/// - [`Error::SourceUnavailable`] if `path` is not an existing file.
/// - [`Error::ProbeFailed`] if the tool is missing, fails, or reports
///   something that is not a positive finite duration.
pub async fn probe_duration(tool: &dyn MediaTool, path: &Path) -> Result<f64> {
    if !tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
    {
        return Err(Error::SourceUnavailable(path.to_path_buf()));
    }

    let duration = match tool.probe_duration(path).await {
        Ok(d) => validate_duration(d)?,
        Err(e @ Error::ProbeFailed(_)) => return Err(e),
        Err(e) => return Err(Error::probe_failed(e.to_string())),
    };

    #[cfg(feature = "tracing")]
    tracing::debug!(path = %path.display(), tool = tool.name(), duration, "probed duration");

    Ok(duration)
}
