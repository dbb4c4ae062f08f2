use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub split: SplitConfig,

    #[serde(default)]
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub static_dir: Option<PathBuf>,

    /// Request body limit for uploads, in MiB
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    5000
}
fn default_max_upload_mb() -> u64 {
    2048
}

impl ServerConfig {
    /// Upload body limit in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        usize::try_from(self.max_upload_mb.saturating_mul(1024 * 1024)).unwrap_or(usize::MAX)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: None,
            max_upload_mb: default_max_upload_mb(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Root for job subtrees (`<data_dir>/jobs/<job_id>/`)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SplitConfig {
    #[serde(default = "default_chunk_duration")]
    pub default_chunk_duration: f64,

    #[serde(default = "default_overlap")]
    pub default_overlap: f64,

    /// Plans with more windows than this are rejected
    #[serde(default = "default_max_chunks")]
    pub max_chunks: usize,
}

fn default_chunk_duration() -> f64 {
    60.0
}
fn default_overlap() -> f64 {
    10.0
}
fn default_max_chunks() -> usize {
    10_000
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            default_chunk_duration: default_chunk_duration(),
            default_overlap: default_overlap(),
            max_chunks: default_max_chunks(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    #[serde(default)]
    pub ffprobe_path: Option<PathBuf>,

    /// Per-invocation timeout for external tools
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    600
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            ffprobe_path: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}
