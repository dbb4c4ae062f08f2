//! Job lifecycle orchestration.
//!
//! This module provides the [`JobController`], which drives a job through
//! upload, split, download and cleanup on top of the
//! [`JobRegistry`](crate::registry::JobRegistry) and a
//! [`MediaTool`](chunkforge_av::MediaTool).

mod controller;

pub use controller::{ArchiveFile, JobController, UploadTicket};
