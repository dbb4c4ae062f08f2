mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    expand_paths(&mut config);
    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./config.toml",
        "./chunkforge.toml",
        "~/.config/chunkforge/config.toml",
        "/etc/chunkforge/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    // Return default config if no file found
    Ok(Config::default())
}

fn expand(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) => PathBuf::from(shellexpand::tilde(s).as_ref()),
        None => path.to_path_buf(),
    }
}

fn expand_paths(config: &mut Config) {
    config.storage.data_dir = expand(&config.storage.data_dir);
    if let Some(dir) = config.server.static_dir.as_mut() {
        *dir = expand(dir);
    }
    if let Some(p) = config.tools.ffmpeg_path.as_mut() {
        *p = expand(p);
    }
    if let Some(p) = config.tools.ffprobe_path.as_mut() {
        *p = expand(p);
    }
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    // Validate server config
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }
    if config.server.max_upload_mb == 0 {
        anyhow::bail!("server.max_upload_mb must be greater than 0");
    }

    // Validate split defaults
    let split = &config.split;
    if !split.default_chunk_duration.is_finite() || split.default_chunk_duration <= 0.0 {
        anyhow::bail!(
            "split.default_chunk_duration must be positive, got {}",
            split.default_chunk_duration
        );
    }
    if !split.default_overlap.is_finite()
        || split.default_overlap < 0.0
        || split.default_overlap >= split.default_chunk_duration
    {
        anyhow::bail!(
            "split.default_overlap must be in [0, {}), got {}",
            split.default_chunk_duration,
            split.default_overlap
        );
    }
    if split.max_chunks == 0 {
        anyhow::bail!("split.max_chunks must be greater than 0");
    }

    // Validate tools
    if config.tools.timeout_secs == 0 {
        anyhow::bail!("tools.timeout_secs must be greater than 0");
    }
    for path in [&config.tools.ffmpeg_path, &config.tools.ffprobe_path]
        .into_iter()
        .flatten()
    {
        if !path.exists() {
            tracing::warn!("Configured tool path does not exist: {:?}", path);
        }
    }

    Ok(())
}
