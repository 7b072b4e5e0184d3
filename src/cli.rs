//! Command-line interface for gscribe
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Cloud transcription for local audio and video files
#[derive(Parser, Debug)]
#[command(
    name = "gscribe",
    version,
    about = "Transcribe local audio/video files via Google Speech-to-Text"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Audio or video file to transcribe
    #[arg(value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Google Cloud project id
    #[arg(long, value_name = "PROJECT")]
    pub project: Option<String>,

    /// Path to service-account credential JSON file
    #[arg(long, value_name = "PATH")]
    pub credentials: Option<PathBuf>,

    /// Bucket-name suffix appended to the project id
    #[arg(long, value_name = "SUFFIX")]
    pub bucket_suffix: Option<String>,

    /// Recognition language code (BCP-47, e.g. ja-JP, en-US)
    #[arg(long, value_name = "LANG")]
    pub language: Option<String>,

    /// Directory the transcript is written into
    #[arg(long, short = 'o', value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Give up on a recognition job after this long. Examples: 90s, 10m, 1h30m
    #[arg(long, value_name = "DURATION", value_parser = parse_duration_secs)]
    pub timeout: Option<u64>,

    /// Seconds between progress polls of the recognition job
    #[arg(long, value_name = "SECONDS")]
    pub poll_interval: Option<u64>,

    /// Fail on inputs that are not mono audio
    #[arg(long)]
    pub require_mono: bool,
}

/// Parse a duration string into seconds.
///
/// Supports any duration format accepted by `humantime`: bare numbers
/// (seconds), single-unit (`30s`, `5m`, `2h`), and compound (`1h30m`).
fn parse_duration_secs(s: &str) -> Result<u64, String> {
    let s = s.trim();
    // Bare number → seconds
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(secs);
    }
    humantime::parse_duration(s)
        .map(|d| d.as_secs())
        .map_err(|e| e.to_string())
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check system dependencies and credentials
    Check,

    /// Manage configuration
    Config {
        /// Action to perform
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the configuration file path
    Path,
}
