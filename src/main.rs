mod cli;

use chunkforge::{config, server};
use chunkforge_av::{
    archive_file_name, check_tools, plan_with_limit, probe_duration, split_video, write_archive,
    FfmpegTool, PlanParams,
};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::path::{Path, PathBuf};
use std::time::Duration;

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    // Load config
    let mut config = config::load_config_or_default(config_path)?;

    // Override host/port from CLI if specified
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting chunkforge server");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );
    tracing::info!("Job data directory: {:?}", config.storage.data_dir);

    server::start_server(config).await
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "chunkforge=trace,chunkforge_av=trace,tower_http=debug".to_string()
        } else {
            "chunkforge=debug,chunkforge_av=debug,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Split {
            input,
            chunk_duration,
            overlap,
            output_dir,
            archive,
        } => split_file(
            &input,
            cli.config.as_deref(),
            chunk_duration,
            overlap,
            output_dir,
            archive,
        ),
        Commands::Plan {
            duration,
            chunk_duration,
            overlap,
            json,
        } => print_plan(cli.config.as_deref(), duration, chunk_duration, overlap, json),
        Commands::Probe { file } => probe_file(&file, cli.config.as_deref()),
        Commands::CheckTools => run_check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("chunkforge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn media_tool(config: &config::Config) -> FfmpegTool {
    FfmpegTool::discover(
        config.tools.ffmpeg_path.as_deref(),
        config.tools.ffprobe_path.as_deref(),
    )
    .with_timeout(Duration::from_secs(config.tools.timeout_secs))
}

fn plan_params(
    config: &config::Config,
    chunk_duration: Option<f64>,
    overlap: Option<f64>,
) -> Result<PlanParams> {
    Ok(PlanParams::new(
        chunk_duration.unwrap_or(config.split.default_chunk_duration),
        overlap.unwrap_or(config.split.default_overlap),
    )?)
}

fn format_hms(seconds: f64) -> String {
    let secs = seconds.max(0.0) as u64;
    let mins = secs / 60;
    let hours = mins / 60;
    format!("{:02}:{:02}:{:02}", hours, mins % 60, secs % 60)
}

fn split_file(
    input: &Path,
    config_path: Option<&Path>,
    chunk_duration: Option<f64>,
    overlap: Option<f64>,
    output_dir: Option<PathBuf>,
    archive: bool,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    if !input.is_file() {
        anyhow::bail!("Input file does not exist: {:?}", input);
    }

    let params = plan_params(&config, chunk_duration, overlap)?;
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "video".to_string());

    let output_dir = output_dir.unwrap_or_else(|| input.with_file_name(format!("{stem}_chunks")));
    let output_dir = if output_dir.is_absolute() {
        output_dir
    } else {
        std::env::current_dir()?.join(output_dir)
    };
    if output_dir.exists() && std::fs::read_dir(&output_dir)?.next().is_some() {
        anyhow::bail!("Output directory is not empty: {:?}", output_dir);
    }

    tracing::info!("Splitting {:?} into {:?}", input, output_dir);

    let tool = media_tool(&config);
    let rt = tokio::runtime::Runtime::new()?;
    let out = rt.block_on(split_video(
        &tool,
        input,
        &output_dir,
        &params,
        Some(config.split.max_chunks),
    ))?;

    println!(
        "Duration: {:.3}s ({})",
        out.duration,
        format_hms(out.duration)
    );
    for (window, chunk) in out.windows.iter().zip(&out.chunks) {
        println!(
            "  [{:>3}] {:>10.3} - {:>10.3}  {}",
            window.index,
            window.start,
            window.end,
            chunk.display()
        );
    }
    println!("{} chunks written to {}", out.chunks.len(), output_dir.display());

    if archive {
        let dest = output_dir.with_file_name(archive_file_name(&stem));
        write_archive(&out.chunks, &dest)?;
        println!("Archive: {}", dest.display());
    }

    Ok(())
}

fn print_plan(
    config_path: Option<&Path>,
    duration: f64,
    chunk_duration: Option<f64>,
    overlap: Option<f64>,
    json: bool,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let params = plan_params(&config, chunk_duration, overlap)?;
    let windows = plan_with_limit(duration, &params, Some(config.split.max_chunks))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&windows)?);
    } else {
        println!(
            "{} chunks ({}s each, {}s overlap) over {}s:",
            windows.len(),
            params.chunk_length(),
            params.overlap(),
            duration
        );
        for w in &windows {
            println!("  [{:>3}] {:>10.3} - {:>10.3}", w.index, w.start, w.end);
        }
    }

    Ok(())
}

fn probe_file(file: &Path, config_path: Option<&Path>) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let config = config::load_config_or_default(config_path)?;
    let tool = media_tool(&config);
    let rt = tokio::runtime::Runtime::new()?;
    let duration = rt.block_on(probe_duration(&tool, file))?;

    println!("File: {}", file.display());
    println!("Duration: {:.3}s ({})", duration, format_hms(duration));

    Ok(())
}

fn run_check_tools(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    println!("Checking external tools...\n");

    let tools = check_tools(
        config.tools.ffmpeg_path.as_deref(),
        config.tools.ffprobe_path.as_deref(),
    );
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version.lines().next().unwrap_or(""));
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install ffmpeg to enable splitting.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            config::Config::default()
        }
    };

    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Max upload: {} MiB", config.server.max_upload_mb);
    println!("  Data dir: {}", config.storage.data_dir.display());
    println!(
        "  Split defaults: {}s chunks, {}s overlap, at most {} chunks",
        config.split.default_chunk_duration,
        config.split.default_overlap,
        config.split.max_chunks
    );
    println!("  Tool timeout: {}s", config.tools.timeout_secs);

    Ok(())
}
