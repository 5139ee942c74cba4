use crate::error::{InstallError, Result};
use crate::types::ArchiveFormat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Distribution channel segment of the download URL.
///
/// The server path stays on this channel regardless of the requested version;
/// only the file name inside the channel carries the requested version.
pub const CHANNEL_VERSION: &str = "1.33";

pub const DOWNLOAD_BASE_URL: &str = "https://renderdoc.org/stable";

const VERSION_PLACEHOLDER: &str = "{version}";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OsKind {
    Windows,
    Linux,
}

impl OsKind {
    /// The OS this binary was compiled for.
    pub fn current() -> Result<Self> {
        Self::from_os_name(std::env::consts::OS)
    }

    /// Maps a `std::env::consts::OS` style name onto a supported OS.
    pub fn from_os_name(name: &str) -> Result<Self> {
        match name {
            "windows" => Ok(OsKind::Windows),
            "linux" => Ok(OsKind::Linux),
            other => Err(InstallError::UnsupportedOs(other.to_string())),
        }
    }
}

impl fmt::Display for OsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OsKind::Windows => write!(f, "windows"),
            OsKind::Linux => write!(f, "linux"),
        }
    }
}

/// OS-specific facts needed to fetch, unpack and locate RenderDoc.
#[derive(Debug, PartialEq, Eq)]
pub struct OsProfile {
    pub os: OsKind,
    /// Name of the staged download inside the download directory.
    pub archive_file_name: &'static str,
    /// File name on the server; `{version}` is replaced with the requested version.
    pub remote_file_template: &'static str,
    pub library_template: &'static str,
    pub executable_template: Option<&'static str>,
    pub format: ArchiveFormat,
}

static PROFILES: [OsProfile; 2] = [
    OsProfile {
        os: OsKind::Windows,
        archive_file_name: "renderdoc.zip",
        remote_file_template: "RenderDoc_{version}_64.zip",
        library_template: "RenderDoc_{version}_64/renderdoc.dll",
        executable_template: None,
        format: ArchiveFormat::Zip,
    },
    OsProfile {
        os: OsKind::Linux,
        archive_file_name: "renderdoc.tar.gz",
        remote_file_template: "renderdoc_{version}.tar.gz",
        library_template: "renderdoc_{version}/lib/librenderdoc.so",
        executable_template: Some("renderdoc_{version}/bin/qrenderdoc"),
        format: ArchiveFormat::TarGz,
    },
];

impl OsProfile {
    pub fn resolve(os: OsKind) -> &'static OsProfile {
        match os {
            OsKind::Windows => &PROFILES[0],
            OsKind::Linux => &PROFILES[1],
        }
    }

    pub fn for_host() -> Result<&'static OsProfile> {
        let os = OsKind::current()?;
        tracing::debug!("Resolved RenderDoc profile for {}", os);
        Ok(Self::resolve(os))
    }

    pub fn all() -> &'static [OsProfile] {
        &PROFILES
    }

    pub fn download_url(&self, version: &str) -> String {
        format!(
            "{}/{}/{}",
            DOWNLOAD_BASE_URL,
            CHANNEL_VERSION,
            substitute(self.remote_file_template, version)
        )
    }

    pub fn archive_path(&self, output_root: &Path) -> PathBuf {
        output_root.join(self.archive_file_name)
    }

    pub fn library_path(&self, root: &Path, version: &str) -> PathBuf {
        join_relative(root, &substitute(self.library_template, version))
    }

    pub fn executable_path(&self, root: &Path, version: &str) -> Result<PathBuf> {
        let template = self.executable_template.ok_or(InstallError::NotImplemented(
            "RenderDoc executable path on Windows",
        ))?;
        Ok(join_relative(root, &substitute(template, version)))
    }
}

fn substitute(template: &str, version: &str) -> String {
    template.replace(VERSION_PLACEHOLDER, version)
}

// Templates use '/' so each segment is joined separately to get native separators.
fn join_relative(root: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .fold(root.to_path_buf(), |path, segment| path.join(segment))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_os_is_rejected() {
        for name in ["macos", "freebsd", "android", ""] {
            match OsKind::from_os_name(name) {
                Err(InstallError::UnsupportedOs(os)) => assert_eq!(os, name),
                other => panic!("expected UnsupportedOs for {:?}, got {:?}", name, other),
            }
        }
    }

    #[test]
    fn test_library_path_contains_version() {
        let root = Path::new("install");
        for profile in OsProfile::all() {
            for version in ["1.33", "1.17", "2.0-rc1"] {
                let path = profile.library_path(root, version);
                assert!(
                    path.to_string_lossy().contains(version),
                    "{} library path {} is missing {}",
                    profile.os,
                    path.display(),
                    version
                );
                assert!(path.starts_with(root));
            }
        }
    }

    #[test]
    fn test_linux_profile() {
        let profile = OsProfile::resolve(OsKind::Linux);
        let root = Path::new("root");

        assert_eq!(profile.archive_file_name, "renderdoc.tar.gz");
        assert_eq!(
            profile.download_url("1.33"),
            "https://renderdoc.org/stable/1.33/renderdoc_1.33.tar.gz"
        );
        assert_eq!(
            profile.library_path(root, "1.33"),
            root.join("renderdoc_1.33").join("lib").join("librenderdoc.so")
        );
        assert_eq!(
            profile.executable_path(root, "1.33").unwrap(),
            root.join("renderdoc_1.33").join("bin").join("qrenderdoc")
        );
    }

    #[test]
    fn test_windows_profile() {
        let profile = OsProfile::resolve(OsKind::Windows);
        let root = Path::new("root");

        assert_eq!(profile.archive_file_name, "renderdoc.zip");
        assert_eq!(
            profile.download_url("1.33"),
            "https://renderdoc.org/stable/1.33/RenderDoc_1.33_64.zip"
        );
        assert_eq!(
            profile.library_path(root, "1.33"),
            root.join("RenderDoc_1.33_64").join("renderdoc.dll")
        );
        assert!(matches!(
            profile.executable_path(root, "1.33"),
            Err(InstallError::NotImplemented(_))
        ));
    }

    #[test]
    fn test_channel_version_is_independent_of_requested_version() {
        let url = OsProfile::resolve(OsKind::Linux).download_url("1.20");
        assert_eq!(url, "https://renderdoc.org/stable/1.33/renderdoc_1.20.tar.gz");
    }

    #[test]
    fn test_archive_path_is_under_output_root() {
        let profile = OsProfile::resolve(OsKind::Windows);
        assert_eq!(
            profile.archive_path(Path::new("dl")),
            Path::new("dl").join("renderdoc.zip")
        );
    }
}
