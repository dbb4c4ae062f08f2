use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chunkforge")]
#[command(author, version, about = "Split videos into overlapping chunks and serve them as one archive")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP service
    Start {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Split a local video file into overlapping chunks
    Split {
        /// Video file to split
        #[arg(required = true)]
        input: PathBuf,

        /// Chunk length in seconds (default from config)
        #[arg(long)]
        chunk_duration: Option<f64>,

        /// Overlap between consecutive chunks in seconds (default from config)
        #[arg(long)]
        overlap: Option<f64>,

        /// Directory to write chunks into (must not exist or be empty)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Also pack the chunks into a zip archive next to the output directory
        #[arg(long)]
        archive: bool,
    },

    /// Print the chunk plan for a duration without touching any file
    Plan {
        /// Total duration in seconds
        #[arg(long, required = true)]
        duration: f64,

        /// Chunk length in seconds (default from config)
        #[arg(long)]
        chunk_duration: Option<f64>,

        /// Overlap between consecutive chunks in seconds (default from config)
        #[arg(long)]
        overlap: Option<f64>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Probe a media file and print its duration
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
