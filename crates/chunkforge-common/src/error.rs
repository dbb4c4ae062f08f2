//! Common error types used throughout chunkforge.
//!
//! Every failure carries a machine-readable [`ErrorKind`] so that callers can
//! branch on the category (bad input, missing job, external tool, filesystem)
//! instead of matching on messages.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Coarse category of an [`Error`], exposed to API clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad extension, missing fields, invalid plan parameters.
    InvalidInput,
    /// Unknown job or missing archive.
    NotFound,
    /// The probe or extraction subprocess failed.
    ExternalToolFailure,
    /// Filesystem write or delete failed.
    IoFailure,
}

impl ErrorKind {
    /// Stable string form, identical to the serialized value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::NotFound => "not_found",
            Self::ExternalToolFailure => "external_tool_failure",
            Self::IoFailure => "io_failure",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Common error type for chunkforge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Chunk length / overlap / duration cannot produce a terminating plan.
    #[error("invalid plan parameters: {0}")]
    InvalidPlanParameters(String),

    /// The job has already been split; a new upload is required.
    #[error("job {0} has already been split")]
    AlreadySplit(String),

    /// No job is registered under this id.
    #[error("job not found: {0}")]
    JobNotFound(String),

    /// Some other requested resource (archive, file) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The source media file is missing.
    #[error("source file unavailable: {}", .0.display())]
    SourceUnavailable(PathBuf),

    /// The media tool could not report a duration.
    #[error("probe failed: {0}")]
    ProbeFailed(String),

    /// A required external tool is not installed.
    #[error("tool not found: {tool}")]
    ToolNotFound { tool: String },

    /// An external tool ran but failed.
    #[error("{tool} failed: {message}")]
    ToolFailed { tool: String, message: String },

    /// Extraction of one chunk window failed; the split was aborted.
    #[error("extraction of chunk {index} failed: {message}")]
    ExtractionFailed { index: u32, message: String },

    /// The chunk archive could not be written.
    #[error("archive write failed: {0}")]
    ArchiveWriteFailed(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a new InvalidInput error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new InvalidPlanParameters error.
    pub fn invalid_plan<S: Into<String>>(msg: S) -> Self {
        Self::InvalidPlanParameters(msg.into())
    }

    /// Create a new JobNotFound error.
    pub fn job_not_found(id: impl std::fmt::Display) -> Self {
        Self::JobNotFound(id.to_string())
    }

    /// Create a new NotFound error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new ProbeFailed error.
    pub fn probe_failed<S: Into<String>>(msg: S) -> Self {
        Self::ProbeFailed(msg.into())
    }

    /// Create a tool not found error.
    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Self::ToolNotFound { tool: tool.into() }
    }

    /// Create a tool execution failed error.
    pub fn tool_failed(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolFailed {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create an extraction failure for the 1-based chunk `index`.
    pub fn extraction_failed(index: u32, message: impl Into<String>) -> Self {
        Self::ExtractionFailed {
            index,
            message: message.into(),
        }
    }

    /// Create a new ArchiveWriteFailed error.
    pub fn archive<S: Into<String>>(msg: S) -> Self {
        Self::ArchiveWriteFailed(msg.into())
    }

    /// Create a new Io error from a message.
    pub fn io<S: Into<String>>(msg: S) -> Self {
        Self::Io(std::io::Error::other(msg.into()))
    }

    /// The taxonomy bucket this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) | Self::InvalidPlanParameters(_) | Self::AlreadySplit(_) => {
                ErrorKind::InvalidInput
            }
            Self::JobNotFound(_) | Self::NotFound(_) | Self::SourceUnavailable(_) => {
                ErrorKind::NotFound
            }
            Self::ProbeFailed(_)
            | Self::ToolNotFound { .. }
            | Self::ToolFailed { .. }
            | Self::ExtractionFailed { .. } => ErrorKind::ExternalToolFailure,
            Self::ArchiveWriteFailed(_) | Self::Io(_) => ErrorKind::IoFailure,
        }
    }

    /// HTTP status code to report for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::AlreadySplit(_) => 409,
            Self::SourceUnavailable(_) => 500,
            _ => match self.kind() {
                ErrorKind::InvalidInput => 400,
                ErrorKind::NotFound => 404,
                ErrorKind::ExternalToolFailure => 502,
                ErrorKind::IoFailure => 500,
            },
        }
    }

    /// The failing chunk index, when the error came from extraction.
    pub fn failed_chunk(&self) -> Option<u32> {
        match self {
            Self::ExtractionFailed { index, .. } => Some(*index),
            _ => None,
        }
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::job_not_found("abc");
        assert_eq!(err.to_string(), "job not found: abc");

        let err = Error::extraction_failed(3, "exit status 1");
        assert_eq!(
            err.to_string(),
            "extraction of chunk 3 failed: exit status 1"
        );

        let err = Error::tool_not_found("ffprobe");
        assert_eq!(err.to_string(), "tool not found: ffprobe");

        let err = Error::SourceUnavailable(PathBuf::from("/tmp/missing.mp4"));
        assert_eq!(
            err.to_string(),
            "source file unavailable: /tmp/missing.mp4"
        );
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(Error::invalid_input("x").kind(), ErrorKind::InvalidInput);
        assert_eq!(Error::invalid_plan("x").kind(), ErrorKind::InvalidInput);
        assert_eq!(
            Error::AlreadySplit("x".into()).kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(Error::job_not_found("x").kind(), ErrorKind::NotFound);
        assert_eq!(Error::not_found("x").kind(), ErrorKind::NotFound);
        assert_eq!(
            Error::probe_failed("x").kind(),
            ErrorKind::ExternalToolFailure
        );
        assert_eq!(
            Error::extraction_failed(1, "x").kind(),
            ErrorKind::ExternalToolFailure
        );
        assert_eq!(
            Error::tool_not_found("ffmpeg").kind(),
            ErrorKind::ExternalToolFailure
        );
        assert_eq!(Error::archive("x").kind(), ErrorKind::IoFailure);
        assert_eq!(Error::io("x").kind(), ErrorKind::IoFailure);
    }

    #[test]
    fn test_http_status() {
        assert_eq!(Error::invalid_input("x").http_status(), 400);
        assert_eq!(Error::job_not_found("x").http_status(), 404);
        assert_eq!(Error::AlreadySplit("x".into()).http_status(), 409);
        assert_eq!(Error::extraction_failed(2, "x").http_status(), 502);
        assert_eq!(Error::archive("x").http_status(), 500);
    }

    #[test]
    fn test_failed_chunk() {
        assert_eq!(Error::extraction_failed(7, "boom").failed_chunk(), Some(7));
        assert_eq!(Error::probe_failed("boom").failed_chunk(), None);
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.kind(), ErrorKind::IoFailure);
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&ErrorKind::ExternalToolFailure).unwrap();
        assert_eq!(json, r#""external_tool_failure""#);
        assert_eq!(ErrorKind::IoFailure.to_string(), "io_failure");
    }
}
