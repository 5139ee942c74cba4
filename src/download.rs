use crate::error::{InstallError, Result};
use crate::types::DownloadOutcome;
use async_trait::async_trait;
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

const USER_AGENT: &str = concat!("renderdoc-fetch/", env!("CARGO_PKG_VERSION"));

/// Fetches one archive to a local path.
///
/// Implementations must fail with [`InstallError::Offline`] before touching
/// the network when `offline` is set, and make a single attempt otherwise.
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn download(&self, offline: bool, url: &str, destination: &Path)
        -> Result<DownloadOutcome>;
}

pub struct HttpDownloader {
    client: reqwest::Client,
    show_progress: bool,
}

impl HttpDownloader {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| InstallError::Network {
                url: String::new(),
                reason: format!("could not build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            show_progress: false,
        })
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    fn progress_bar(&self, total_size: u64, filename: &str) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(total_size);
        pb.set_style(
            ProgressStyle::with_template(
                "{msg} {spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
        );
        pb.set_message(format!("Downloading {}", filename));
        pb
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(
        &self,
        offline: bool,
        url: &str,
        destination: &Path,
    ) -> Result<DownloadOutcome> {
        if offline {
            return Err(InstallError::Offline {
                url: url.to_string(),
            });
        }

        let network = |reason: String| InstallError::Network {
            url: url.to_string(),
            reason,
        };

        let parent = destination
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent).map_err(|e| InstallError::io(parent, e))?;

        tracing::info!("Downloading {}...", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(network(format!("server responded with {}", status)));
        }

        let total_size = response.content_length().unwrap_or(0);
        let filename = destination
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| url.to_string());
        let pb = self.progress_bar(total_size, &filename);

        // Stream into a sibling temp file so a failed transfer never leaves a
        // truncated archive at the staging path.
        let mut staged =
            tempfile::NamedTempFile::new_in(parent).map_err(|e| InstallError::io(parent, e))?;
        let mut downloaded = 0u64;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| network(e.to_string()))?;
            staged
                .write_all(&chunk)
                .map_err(|e| InstallError::io(staged.path().to_path_buf(), e))?;
            downloaded += chunk.len() as u64;
            pb.set_position(downloaded);
        }

        staged
            .flush()
            .map_err(|e| InstallError::io(staged.path().to_path_buf(), e))?;
        staged
            .persist(destination)
            .map_err(|e| InstallError::io(destination, e.error))?;

        pb.finish_with_message("Download complete");
        tracing::info!("Downloaded {} bytes to {}", downloaded, destination.display());

        Ok(DownloadOutcome {
            archive_path: destination.to_path_buf(),
            bytes: downloaded,
        })
    }
}
