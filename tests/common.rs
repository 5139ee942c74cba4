use async_trait::async_trait;
use renderdoc_fetch::download::Downloader;
use renderdoc_fetch::types::DownloadOutcome;
use renderdoc_fetch::InstallError;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::Mutex;
use tempfile::TempDir;

// Each test binary only uses part of this module.
#[allow(dead_code)]
pub struct TestContext {
    pub temp_dir: TempDir,
    pub build_dir: PathBuf,
    pub bin_path: PathBuf,
}

#[allow(dead_code)]
impl TestContext {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let build_dir = temp_dir.path().join("build");
        let bin_path = PathBuf::from(env!("CARGO_BIN_EXE_renderdoc-fetch"));

        Self {
            temp_dir,
            build_dir,
            bin_path,
        }
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = Command::new(&self.bin_path);
        cmd.arg("--build-dir").arg(&self.build_dir);
        for key in [
            "RENDERDOC_VERSION",
            "RENDERDOC_INSTALL_DIR",
            "RENDERDOC_DOWNLOAD_DIR",
            "RENDERDOC_OFFLINE",
            "RENDERDOC_DOWNLOAD_TIMEOUT",
            "RUST_LOG",
        ] {
            cmd.env_remove(key);
        }
        cmd
    }

    pub fn installation_dir(&self) -> PathBuf {
        self.build_dir.join("renderdoc").join("installation")
    }
}

#[allow(dead_code)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: std::process::ExitStatus,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            status: output.status,
        }
    }
}

#[allow(dead_code)]
impl CommandOutput {
    pub fn assert_success(&self) -> &Self {
        if !self.status.success() {
            panic!(
                "Command failed with status {:?}\nstdout: {}\nstderr: {}",
                self.status.code(),
                self.stdout,
                self.stderr
            );
        }
        self
    }

    pub fn assert_failure(&self) -> &Self {
        assert!(
            !self.status.success(),
            "Command unexpectedly succeeded\nstdout: {}",
            self.stdout
        );
        self
    }

    pub fn assert_stdout_contains(&self, text: &str) -> &Self {
        assert!(
            self.stdout.contains(text),
            "Stdout did not contain '{}'\nActual stdout: {}",
            text,
            self.stdout
        );
        self
    }

    pub fn assert_stderr_contains(&self, text: &str) -> &Self {
        assert!(
            self.stderr.contains(text),
            "Stderr did not contain '{}'\nActual stderr: {}",
            text,
            self.stderr
        );
        self
    }
}

/// Writes a tar.gz laid out like the Linux RenderDoc distribution.
#[allow(dead_code)]
pub fn write_linux_distribution(path: &Path, version: &str) {
    let file = File::create(path).unwrap();
    let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    let top = format!("renderdoc_{}", version);

    for dir in ["", "/lib", "/bin"] {
        let mut header = tar::Header::new_gnu();
        header.set_path(format!("{}{}/", top, dir)).unwrap();
        header.set_entry_type(tar::EntryType::Directory);
        header.set_size(0);
        header.set_mode(0o755);
        header.set_cksum();
        builder.append(&header, std::io::empty()).unwrap();
    }

    for (name, data) in [
        ("lib/librenderdoc.so", b"\x7fELF fake library".as_slice()),
        ("bin/qrenderdoc", b"#!/bin/sh\necho qrenderdoc\n".as_slice()),
    ] {
        let mut header = tar::Header::new_gnu();
        header.set_path(format!("{}/{}", top, name)).unwrap();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append(&header, data).unwrap();
    }

    builder.into_inner().unwrap().finish().unwrap();
}

/// Writes a zip laid out like the Windows RenderDoc distribution.
#[allow(dead_code)]
pub fn write_windows_distribution(path: &Path, version: &str) {
    let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
    let options = zip::write::FileOptions::default();
    let top = format!("RenderDoc_{}_64", version);

    zip.add_directory(format!("{}/", top), options).unwrap();
    zip.start_file(format!("{}/renderdoc.dll", top), options).unwrap();
    zip.write_all(b"MZ fake dll").unwrap();
    zip.start_file(format!("{}/qrenderdoc.exe", top), options).unwrap();
    zip.write_all(b"MZ fake exe").unwrap();
    zip.finish().unwrap();
}

/// Serves a prepared archive instead of hitting the network and records every request.
#[allow(dead_code)]
pub struct FixtureDownloader {
    fixture: PathBuf,
    pub requests: Mutex<Vec<(String, PathBuf)>>,
}

#[allow(dead_code)]
impl FixtureDownloader {
    pub fn new(fixture: impl Into<PathBuf>) -> Self {
        Self {
            fixture: fixture.into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Downloader for FixtureDownloader {
    async fn download(
        &self,
        offline: bool,
        url: &str,
        destination: &Path,
    ) -> renderdoc_fetch::Result<DownloadOutcome> {
        if offline {
            return Err(InstallError::Offline {
                url: url.to_string(),
            });
        }

        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), destination.to_path_buf()));

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let bytes = fs::copy(&self.fixture, destination).map_err(|source| InstallError::Io {
            path: destination.to_path_buf(),
            source,
        })?;

        Ok(DownloadOutcome {
            archive_path: destination.to_path_buf(),
            bytes,
        })
    }
}
