use clap::{Parser, Subcommand};
use std::path::PathBuf;

fn get_version() -> &'static str {
    const BASE_VERSION: &str = env!("CARGO_PKG_VERSION");

    if let Some(tag) = option_env!("RENDERDOC_FETCH_GIT_TAG") {
        return tag;
    }

    let commit = option_env!("RENDERDOC_FETCH_GIT_COMMIT").unwrap_or("unknown");
    let branch = option_env!("RENDERDOC_FETCH_GIT_BRANCH").unwrap_or("unknown");

    // Leaked once at startup so clap can hold a 'static str.
    let version = format!("v{}-{} ({})", BASE_VERSION, commit, branch);
    Box::leak(version.into_boxed_str())
}

#[derive(Parser)]
#[command(name = "renderdoc-fetch")]
#[command(about = "Download and unpack RenderDoc for the current platform")]
#[command(version = get_version(), propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (use multiple times for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Reduce output to errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// JSON settings file (version, installation_dir, download_dir, offline, download_timeout_secs)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Build directory the default RenderDoc directories live under
    #[arg(long, global = true, default_value = renderdoc_fetch::config::DEFAULT_BUILD_DIR)]
    pub build_dir: PathBuf,

    /// RenderDoc version to install (default: 1.33)
    #[arg(long = "renderdoc-version", global = true)]
    pub renderdoc_version: Option<String>,

    /// Directory RenderDoc is unpacked into
    #[arg(long, global = true)]
    pub install_dir: Option<PathBuf>,

    /// Directory the downloaded archive is staged in
    #[arg(long, global = true)]
    pub download_dir: Option<PathBuf>,

    /// Fail instead of downloading when RenderDoc is missing
    #[arg(long, global = true)]
    pub offline: bool,

    /// Download timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install RenderDoc if missing and print the library path
    Install,

    /// Print the library path without installing anything
    Path,

    /// Report whether RenderDoc is installed
    Status,

    /// Show the current version
    Version,
}
