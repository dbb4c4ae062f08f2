//! Integration tests for configuration loading and validation.

use chunkforge::config::{load_config, load_config_or_default, Config};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn defaults_match_service_defaults() {
    let config = Config::default();
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 5000);
    assert_eq!(config.server.max_upload_mb, 2048);
    assert_eq!(config.storage.data_dir, std::path::PathBuf::from("./data"));
    assert_eq!(config.split.default_chunk_duration, 60.0);
    assert_eq!(config.split.default_overlap, 10.0);
    assert_eq!(config.split.max_chunks, 10_000);
    assert_eq!(config.tools.timeout_secs, 600);
}

#[test]
fn full_config_parses() {
    let file = write_config(
        r#"
[server]
host = "127.0.0.1"
port = 8088
max_upload_mb = 64

[storage]
data_dir = "/tmp/chunkforge-test"

[split]
default_chunk_duration = 30.0
default_overlap = 5.0
max_chunks = 100

[tools]
timeout_secs = 30
"#,
    );

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8088);
    assert_eq!(config.server.max_upload_bytes(), 64 * 1024 * 1024);
    assert_eq!(
        config.storage.data_dir,
        std::path::PathBuf::from("/tmp/chunkforge-test")
    );
    assert_eq!(config.split.default_chunk_duration, 30.0);
    assert_eq!(config.split.max_chunks, 100);
    assert_eq!(config.tools.timeout_secs, 30);
}

#[test]
fn partial_config_fills_defaults() {
    let file = write_config("[server]\nport = 9000\n");
    let config = load_config(file.path()).unwrap();
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.split.default_overlap, 10.0);
}

#[test]
fn tilde_in_data_dir_is_expanded() {
    let file = write_config("[storage]\ndata_dir = \"~/chunkforge-data\"\n");
    let config = load_config(file.path()).unwrap();
    assert!(!config.storage.data_dir.to_string_lossy().starts_with('~'));
    assert!(config.storage.data_dir.ends_with("chunkforge-data"));
}

#[test]
fn tool_paths_are_expanded_before_validation() {
    let file = write_config(
        "[tools]\nffmpeg_path = \"~/bin/ffmpeg\"\nffprobe_path = \"~/bin/ffprobe\"\n",
    );
    let config = load_config(file.path()).unwrap();

    let ffmpeg = config.tools.ffmpeg_path.unwrap();
    let ffprobe = config.tools.ffprobe_path.unwrap();
    assert!(!ffmpeg.to_string_lossy().starts_with('~'));
    assert!(ffmpeg.ends_with("bin/ffmpeg"));
    assert!(!ffprobe.to_string_lossy().starts_with('~'));
}

#[test]
fn invalid_values_are_rejected() {
    let cases = [
        "[server]\nport = 0\n",
        "[split]\ndefault_chunk_duration = 0.0\n",
        "[split]\ndefault_chunk_duration = 30.0\ndefault_overlap = 30.0\n",
        "[split]\ndefault_overlap = -1.0\n",
        "[split]\nmax_chunks = 0\n",
        "[tools]\ntimeout_secs = 0\n",
        "[server]\nmax_upload_mb = 0\n",
    ];

    for content in cases {
        let file = write_config(content);
        assert!(load_config(file.path()).is_err(), "accepted: {content}");
    }
}

#[test]
fn malformed_toml_is_rejected() {
    let file = write_config("[server\nport = ");
    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
}

#[test]
fn explicit_missing_path_is_an_error() {
    let result = load_config_or_default(Some(std::path::Path::new(
        "/nonexistent/chunkforge/config.toml",
    )));
    assert!(result.is_err());
}
