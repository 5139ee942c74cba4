use crate::download::Downloader;
use crate::error::{InstallError, Result};
use crate::extract::{apply_executable_bits, extract_archive};
use crate::platform::OsProfile;
use crate::probe::installation_state;
use crate::types::{ArchiveFormat, InstallOutcome, InstallRequest};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Where the RenderDoc library lives (or will live) for this request.
///
/// Safe to hand out before installation; only dereference it after
/// [`ensure_installed`] has returned `Ok`.
pub fn library_path(request: &InstallRequest, profile: &OsProfile) -> PathBuf {
    profile.library_path(&request.installation_root, &request.version)
}

/// Makes sure the requested RenderDoc version is unpacked under the
/// installation root, downloading it only when the library is missing.
///
/// Not atomic: a failure can leave the installation root half populated. The
/// next call cleans it before trying again. Concurrent calls against the same
/// root are not coordinated. Extraction runs on tokio's blocking pool, so this
/// must be awaited inside a tokio runtime.
pub async fn ensure_installed(
    request: &InstallRequest,
    profile: &OsProfile,
    downloader: &dyn Downloader,
) -> Result<InstallOutcome> {
    let root = &request.installation_root;
    let version = &request.version;

    let state = installation_state(root, profile, version);
    if state.present {
        tracing::info!(
            "RenderDoc {} is already installed at {}",
            version,
            state.library_path.display()
        );
        return Ok(InstallOutcome {
            did_work: false,
            library_path: state.library_path,
        });
    }

    tracing::info!("Installing RenderDoc {} for {}...", version, profile.os);
    prepare_installation_root(root)?;

    let url = profile.download_url(version);
    let archive_path = profile.archive_path(&request.output_root);
    tracing::debug!("Staging {} at {}", url, archive_path.display());

    let downloaded = downloader
        .download(request.offline, &url, &archive_path)
        .await?;

    let format = extract_blocking(&downloaded.archive_path, root).await?;
    if format != profile.format {
        tracing::warn!(
            "{} was expected to be {:?} but contains a {:?} archive",
            profile.archive_file_name,
            profile.format,
            format
        );
    }

    let library_path = state.library_path;
    if !library_path.is_file() {
        return Err(InstallError::corrupt(
            &downloaded.archive_path,
            format!("archive does not contain {}", library_path.display()),
        ));
    }

    apply_executable_bits(profile, root, version)?;

    tracing::info!(
        "Successfully installed RenderDoc {} to {}",
        version,
        library_path.display()
    );

    Ok(InstallOutcome {
        did_work: true,
        library_path,
    })
}

/// Runs [`extract_archive`] on the blocking pool so large archives do not
/// stall the runtime's worker threads.
async fn extract_blocking(archive_path: &Path, root: &Path) -> Result<ArchiveFormat> {
    let archive = archive_path.to_path_buf();
    let destination = root.to_path_buf();

    tokio::task::spawn_blocking(move || extract_archive(&archive, &destination))
        .await
        .map_err(|e| InstallError::io(root, io::Error::new(io::ErrorKind::Other, e)))?
}

/// Leaves `root` as an empty directory.
///
/// A file in its place is replaced; an existing directory is emptied but kept.
pub fn prepare_installation_root(root: &Path) -> Result<()> {
    match fs::symlink_metadata(root) {
        Ok(metadata) if metadata.is_dir() => {
            tracing::debug!("Cleaning installation directory {}", root.display());
            clean_directory(root)
        }
        Ok(_) => {
            tracing::debug!("Replacing file at {} with a directory", root.display());
            fs::remove_file(root).map_err(|e| InstallError::io(root, e))?;
            fs::create_dir_all(root).map_err(|e| InstallError::io(root, e))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!("Creating installation directory {}", root.display());
            fs::create_dir_all(root).map_err(|e| InstallError::io(root, e))
        }
        Err(e) => Err(InstallError::io(root, e)),
    }
}

fn clean_directory(dir: &Path) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|e| InstallError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| InstallError::io(dir, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| InstallError::io(&path, e))?;

        let removed = if file_type.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        removed.map_err(|e| InstallError::io(&path, e))?;
    }
    Ok(())
}
