use crate::types::*;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const APP_NAME: &str = "renderdoc-fetch";
pub const DEFAULT_BUILD_DIR: &str = "build";
pub const RENDERDOC_DIR_NAME: &str = "renderdoc";
pub const INSTALLATION_DIR_NAME: &str = "installation";
pub const DOWNLOAD_DIR_NAME: &str = "download";

pub const ENV_VERSION: &str = "RENDERDOC_VERSION";
pub const ENV_INSTALL_DIR: &str = "RENDERDOC_INSTALL_DIR";
pub const ENV_DOWNLOAD_DIR: &str = "RENDERDOC_DOWNLOAD_DIR";
pub const ENV_OFFLINE: &str = "RENDERDOC_OFFLINE";
pub const ENV_DOWNLOAD_TIMEOUT: &str = "RENDERDOC_DOWNLOAD_TIMEOUT";

/// Request with every default applied, rooted at `build_dir`.
pub fn default_request(build_dir: &Path) -> InstallRequest {
    let renderdoc_dir = build_dir.join(RENDERDOC_DIR_NAME);
    InstallRequest {
        version: DEFAULT_VERSION.to_string(),
        installation_root: renderdoc_dir.join(INSTALLATION_DIR_NAME),
        output_root: renderdoc_dir.join(DOWNLOAD_DIR_NAME),
        offline: false,
        download_timeout: Duration::from_secs(DEFAULT_DOWNLOAD_TIMEOUT_SECS),
    }
}

pub fn load_settings(path: &Path) -> Result<Settings> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Could not read settings file at {}", path.display()))?;

    let settings: Settings = serde_json::from_str(&content)
        .with_context(|| format!("Could not parse {} as JSON settings", path.display()))?;

    tracing::debug!("Loaded settings from {}: {:?}", path.display(), settings);
    Ok(settings)
}

/// Overlays every field that is set in `settings` onto `request`.
pub fn apply_settings(request: &mut InstallRequest, settings: &Settings) {
    if let Some(version) = &settings.version {
        request.version = version.clone();
    }
    if let Some(dir) = &settings.installation_dir {
        request.installation_root = dir.clone();
    }
    if let Some(dir) = &settings.download_dir {
        request.output_root = dir.clone();
    }
    if let Some(offline) = settings.offline {
        request.offline = offline;
    }
    if let Some(secs) = settings.download_timeout_secs {
        request.download_timeout = Duration::from_secs(secs);
    }
}

pub fn settings_from_env() -> Settings {
    settings_from_lookup(|key| std::env::var(key).ok())
}

/// Reads the `RENDERDOC_*` variables through `lookup`. Unparseable values are ignored.
pub fn settings_from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Settings {
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    let download_timeout_secs = non_empty(ENV_DOWNLOAD_TIMEOUT).and_then(|v| match v.trim().parse::<u64>() {
        Ok(secs) => Some(secs),
        Err(_) => {
            tracing::warn!("Ignoring {}={}: not a number of seconds", ENV_DOWNLOAD_TIMEOUT, v);
            None
        }
    });

    Settings {
        version: non_empty(ENV_VERSION),
        installation_dir: non_empty(ENV_INSTALL_DIR).map(Into::into),
        download_dir: non_empty(ENV_DOWNLOAD_DIR).map(Into::into),
        offline: non_empty(ENV_OFFLINE).map(|v| parse_flag(&v)),
        download_timeout_secs,
    }
}

pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
