//! Chunkforge-Common: shared types and utilities.
//!
//! This crate provides common functionality used across chunkforge:
//!
//! - **Error Handling**: the tagged [`Error`] type, its [`ErrorKind`]
//!   taxonomy, and a result alias
//! - **Typed IDs**: [`JobId`], an exact-match UUID wrapper
//! - **Path Utilities**: upload extension allow-list and filename sanitizing
//!
//! # Examples
//!
//! ```
//! use chunkforge_common::{Error, ErrorKind, JobId, Result};
//! use chunkforge_common::paths::is_video_file;
//! use std::path::Path;
//!
//! let job_id = JobId::new();
//! assert!(is_video_file(Path::new("talk.mkv")));
//!
//! fn lookup(id: JobId) -> Result<()> {
//!     Err(Error::job_not_found(id))
//! }
//! assert_eq!(lookup(job_id).unwrap_err().kind(), ErrorKind::NotFound);
//! ```

pub mod error;
pub mod ids;
pub mod paths;

pub use error::{Error, ErrorKind, Result};
pub use ids::JobId;
