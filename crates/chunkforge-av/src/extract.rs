//! Chunk extraction.

use std::path::{Path, PathBuf};

use chunkforge_common::{Error, Result};

use crate::media::MediaTool;
use crate::plan::ChunkWindow;

/// Minimum zero-padding for chunk indices.
const MIN_INDEX_WIDTH: usize = 3;

/// Digit width used for chunk names in a plan of `count` windows.
///
/// At least three digits; wider when the plan is larger, so names always
/// sort lexicographically in index order.
pub fn index_width(count: usize) -> usize {
    count.to_string().len().max(MIN_INDEX_WIDTH)
}

/// File name for chunk `index`, e.g. `chunk_001.mp4`.
pub fn chunk_file_name(index: u32, width: usize, extension: &str) -> String {
    format!("chunk_{index:0width$}.{extension}")
}

/// Extract every window of `source` into `output_dir`, in index order.
///
/// `output_dir` is created if absent. Chunks keep the source's container
/// extension (falling back to `mp4`). Extraction stops at the first failing
/// window; files already written are left for the caller to discard.
///
/// # Errors
///
/// - [`Error::SourceUnavailable`] if `source` does not exist.
/// - [`Error::ExtractionFailed`] naming the first window that failed, or
///   whose output file did not appear.
pub async fn extract_chunks(
    tool: &dyn MediaTool,
    source: &Path,
    windows: &[ChunkWindow],
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    if !tokio::fs::try_exists(source).await.unwrap_or(false) {
        return Err(Error::SourceUnavailable(source.to_path_buf()));
    }

    tokio::fs::create_dir_all(output_dir).await?;

    let extension = source
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_else(|| "mp4".to_string());
    let width = index_width(windows.len());

    let mut chunks = Vec::with_capacity(windows.len());
    for window in windows {
        let output = output_dir.join(chunk_file_name(window.index, width, &extension));

        #[cfg(feature = "tracing")]
        tracing::debug!(
            index = window.index,
            start = window.start,
            end = window.end,
            output = %output.display(),
            "extracting chunk"
        );

        tool.extract_range(source, window, &output)
            .await
            .map_err(|e| Error::extraction_failed(window.index, e.to_string()))?;

        if !tokio::fs::try_exists(&output).await.unwrap_or(false) {
            return Err(Error::extraction_failed(
                window.index,
                "tool reported success but wrote no output",
            ));
        }

        chunks.push(output);
    }

    Ok(chunks)
}
