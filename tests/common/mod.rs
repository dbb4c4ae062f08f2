//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which creates a temporary data directory, default
//! config, a [`FakeMediaTool`] and the full [`AppContext`]. The
//! [`TestHarness::with_server`] constructor starts Axum on a random port for
//! HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chunkforge::config::Config;
use chunkforge::server::{create_router, AppContext};
use chunkforge_av::{ChunkWindow, MediaTool};
use chunkforge_common::{Error, Result};
use tempfile::TempDir;

/// Media tool stand-in: reports a fixed duration and writes one small file
/// per extracted window, recording every call.
pub struct FakeMediaTool {
    pub duration: f64,
    pub fail_on: Option<u32>,
    pub probes: AtomicUsize,
    pub extracted: Mutex<Vec<ChunkWindow>>,
}

impl FakeMediaTool {
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            fail_on: None,
            probes: AtomicUsize::new(0),
            extracted: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_on(duration: f64, index: u32) -> Self {
        Self {
            fail_on: Some(index),
            ..Self::new(duration)
        }
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaTool for FakeMediaTool {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn probe_duration(&self, _path: &Path) -> Result<f64> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        Ok(self.duration)
    }

    async fn extract_range(
        &self,
        _source: &Path,
        window: &ChunkWindow,
        output: &Path,
    ) -> Result<()> {
        self.extracted.lock().unwrap().push(*window);
        if self.fail_on == Some(window.index) {
            return Err(Error::tool_failed("ffmpeg", "exited with status 1"));
        }
        std::fs::write(output, format!("{:.3}-{:.3}", window.start, window.end))?;
        Ok(())
    }
}

/// Test harness wrapping a fully-constructed [`AppContext`] backed by a
/// temporary data directory.
pub struct TestHarness {
    pub ctx: AppContext,
    pub tool: Arc<FakeMediaTool>,
    pub data_dir: TempDir,
}

impl TestHarness {
    /// Create a new harness whose fake tool reports `duration` seconds.
    pub fn new(duration: f64) -> Self {
        Self::with_tool(Config::default(), FakeMediaTool::new(duration))
    }

    /// Create a new harness with a custom configuration and tool.
    pub fn with_tool(mut config: Config, tool: FakeMediaTool) -> Self {
        let data_dir = TempDir::new().expect("failed to create data dir");
        config.storage.data_dir = data_dir.path().to_path_buf();

        let tool = Arc::new(tool);
        let ctx = AppContext::with_tool(config, tool.clone()).expect("failed to build context");

        Self {
            ctx,
            tool,
            data_dir,
        }
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server(duration: f64) -> (Self, SocketAddr) {
        Self::serve(Self::new(duration)).await
    }

    /// Start an Axum server for an already-built harness.
    pub async fn serve(harness: Self) -> (Self, SocketAddr) {
        let app = create_router(harness.ctx.clone(), None);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }

    /// Directory holding all job subtrees.
    pub fn jobs_dir(&self) -> std::path::PathBuf {
        self.data_dir.path().join("jobs")
    }
}

/// Multipart form with a single `file` part.
pub fn video_form(filename: &str, body: &'static [u8]) -> reqwest::multipart::Form {
    let part = reqwest::multipart::Part::bytes(body).file_name(filename.to_string());
    reqwest::multipart::Form::new().part("file", part)
}

/// Upload a file over HTTP and return the parsed JSON response.
pub async fn upload(addr: SocketAddr, filename: &str) -> (reqwest::StatusCode, serde_json::Value) {
    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/upload"))
        .multipart(video_form(filename, b"not really a video"))
        .send()
        .await
        .expect("upload request failed");
    let status = resp.status();
    let json = resp.json().await.expect("upload response is not JSON");
    (status, json)
}
