//! Main CLI parser and top-level argument handling.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;

/// Command-line interface of the file-browser task queue.
///
/// Global options configure the adapters; every one of them can also come
/// from the environment (or a `.env` file).
#[derive(Parser, Debug)]
#[command(name = "fsb")]
#[command(about = "Track file-browser downloads and uploads")]
#[command(version)]
pub struct Cli {
    /// Base URL of the file-browser API
    #[arg(
        long = "api-url",
        env = "FSB_API_URL",
        default_value = fsb_http::DEFAULT_API_URL,
        global = true
    )]
    pub api_url: String,

    /// Bearer token for the API
    #[arg(long, env = "FSB_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// Directory holding the persisted queue
    #[arg(long = "state-dir", env = "FSB_STATE_DIR", global = true)]
    pub state_dir: Option<PathBuf>,

    /// Directory finished downloads are saved into
    #[arg(
        long = "download-dir",
        env = "FSB_DOWNLOAD_DIR",
        default_value = ".",
        global = true
    )]
    pub download_dir: PathBuf,

    /// Directory the queue belongs to; each scope has its own queue
    #[arg(long, default_value = "/", global = true)]
    pub scope: String,

    /// Status poll interval in milliseconds
    #[arg(long = "poll-interval", default_value_t = 5000, global = true)]
    pub poll_interval_ms: u64,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}
