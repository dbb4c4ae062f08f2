//! # chunkforge-av
//!
//! Chunk planning and media tooling for splitting videos into overlapping
//! clips.
//!
//! This crate provides functionality for:
//! - Planning overlapping time windows over a duration (pure, no I/O)
//! - Probing a file's duration and cutting time ranges via ffprobe/ffmpeg
//! - Staging extracted chunks and moving them into place atomically
//! - Packing chunks into a single zip archive
//!
//! ## Features
//!
//! - `tracing` - Enable tracing support
//!
//! ## Example
//!
//! ```no_run
//! use chunkforge_av::{split_video, write_archive, FfmpegTool, PlanParams};
//! use std::path::Path;
//!
//! # async fn example() -> chunkforge_common::Result<()> {
//! let tool = FfmpegTool::default();
//! let params = PlanParams::new(60.0, 10.0)?;
//! let out = split_video(&tool, Path::new("talk.mp4"), Path::new("out/chunks"), &params, None).await?;
//! write_archive(&out.chunks, Path::new("out/talk_chunks.zip"))?;
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod command;
pub mod extract;
pub mod media;
pub mod plan;
pub mod probe;
pub mod split;
pub mod tools;
pub mod workspace;

// Re-exports
pub use archive::{archive_file_name, job_id_from_archive_name, write_archive};
pub use command::{ToolCommand, ToolOutput};
pub use extract::{chunk_file_name, extract_chunks};
pub use media::{FfmpegTool, MediaTool};
pub use plan::{plan, plan_windows, plan_with_limit, window_count, ChunkWindow, PlanParams};
pub use probe::probe_duration;
pub use split::{split_video, SplitOutput};
pub use tools::{check_tool, check_tools, require_tool, ToolInfo};
pub use workspace::Workspace;
