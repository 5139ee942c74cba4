use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_VERSION: &str = "1.33";
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveFormat {
    Zip,
    #[serde(rename = "tar.gz")]
    TarGz,
}

/// Everything one `ensure_installed` call needs from its caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRequest {
    pub version: String,
    pub installation_root: PathBuf,
    /// Staging directory for the downloaded archive. Never the installation root.
    pub output_root: PathBuf,
    pub offline: bool,
    pub download_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallationState {
    pub present: bool,
    pub library_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    pub archive_path: PathBuf,
    pub bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    /// False when the library was already present and nothing was touched.
    pub did_work: bool,
    pub library_path: PathBuf,
}

/// Optional settings file. Every field left out keeps its default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Settings {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default, alias = "installation_directory")]
    pub installation_dir: Option<PathBuf>,
    #[serde(default, alias = "output_dir")]
    pub download_dir: Option<PathBuf>,
    #[serde(default)]
    pub offline: Option<bool>,
    #[serde(default)]
    pub download_timeout_secs: Option<u64>,
}
