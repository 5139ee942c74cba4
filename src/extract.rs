//! Archive extraction for downloaded RenderDoc distributions.
//!
//! The extractor knows nothing about operating systems. It detects the
//! container from the file itself, unpacks ZIP or TAR-GZ into a destination
//! root, and refuses any entry that would land outside that root. Marking the
//! RenderDoc executable is a separate step, [`apply_executable_bits`], driven
//! by the OS profile.

use crate::error::{InstallError, Result};
use crate::platform::OsProfile;
use crate::types::ArchiveFormat;
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Write};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

const COPY_BUFFER_SIZE: usize = 64 * 1024;

impl ArchiveFormat {
    /// Detects the container format, trusting magic bytes over the file name.
    pub fn detect(archive_path: &Path) -> Result<Self> {
        let mut header = [0u8; 4];
        let read = File::open(archive_path)
            .and_then(|mut file| read_prefix(&mut file, &mut header))
            .map_err(|e| InstallError::io(archive_path, e))?;

        if let Some(format) = Self::from_magic(&header[..read]) {
            return Ok(format);
        }

        Self::from_extension(archive_path).ok_or_else(|| {
            InstallError::corrupt(archive_path, "not a ZIP or gzip-compressed TAR archive")
        })
    }

    pub fn from_magic(header: &[u8]) -> Option<Self> {
        match header {
            [b'P', b'K', 3, 4, ..] | [b'P', b'K', 5, 6, ..] | [b'P', b'K', 7, 8, ..] => {
                Some(ArchiveFormat::Zip)
            }
            [0x1f, 0x8b, ..] => Some(ArchiveFormat::TarGz),
            _ => None,
        }
    }

    pub fn from_extension(archive_path: &Path) -> Option<Self> {
        let name = archive_path.file_name()?.to_string_lossy().to_lowercase();
        if name.ends_with(".zip") {
            Some(ArchiveFormat::Zip)
        } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(ArchiveFormat::TarGz)
        } else {
            None
        }
    }
}

fn read_prefix(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Unpacks `archive_path` into `destination`, returning the detected format.
pub fn extract_archive(archive_path: &Path, destination: &Path) -> Result<ArchiveFormat> {
    let format = ArchiveFormat::detect(archive_path)?;
    info!(
        "Extracting {:?} archive {} to {}",
        format,
        archive_path.display(),
        destination.display()
    );

    fs::create_dir_all(destination).map_err(|e| InstallError::io(destination, e))?;
    let root = destination
        .canonicalize()
        .map_err(|e| InstallError::io(destination, e))?;

    match format {
        ArchiveFormat::Zip => extract_zip(archive_path, &root)?,
        ArchiveFormat::TarGz => extract_tar_gz(archive_path, &root)?,
    }

    debug!("Extraction of {} complete", archive_path.display());
    Ok(format)
}

fn extract_zip(archive_path: &Path, root: &Path) -> Result<()> {
    let file = File::open(archive_path).map_err(|e| InstallError::io(archive_path, e))?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file))
        .map_err(|e| InstallError::corrupt(archive_path, e))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| InstallError::corrupt(archive_path, e))?;
        let name = entry.name().to_string();
        let relative = enclosed_path(Path::new(&name)).ok_or_else(|| unsafe_entry(&name, root))?;
        let outpath = root.join(&relative);

        if entry.is_dir() {
            debug!("Creating directory {}", outpath.display());
            fs::create_dir_all(&outpath).map_err(|e| InstallError::io(&outpath, e))?;
            continue;
        }

        prepare_file_target(&outpath, root, &name)?;
        copy_entry(&mut entry, &outpath, archive_path)?;

        if let Some(mode) = entry.unix_mode() {
            apply_archived_mode(&outpath, mode)?;
        }
    }

    Ok(())
}

fn extract_tar_gz(archive_path: &Path, root: &Path) -> Result<()> {
    let file = File::open(archive_path).map_err(|e| InstallError::io(archive_path, e))?;
    let mut archive = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
    let entries = archive
        .entries()
        .map_err(|e| InstallError::corrupt(archive_path, e))?;

    let mut symlinks: Vec<(PathBuf, String)> = Vec::new();

    for entry in entries {
        let mut entry = entry.map_err(|e| InstallError::corrupt(archive_path, e))?;
        let entry_path = entry
            .path()
            .map_err(|e| InstallError::corrupt(archive_path, e))?
            .into_owned();
        let name = entry_path.to_string_lossy().to_string();
        let relative = enclosed_path(&entry_path).ok_or_else(|| unsafe_entry(&name, root))?;
        let outpath = root.join(&relative);
        let entry_type = entry.header().entry_type();

        if entry_type.is_dir() {
            debug!("Creating directory {}", outpath.display());
            fs::create_dir_all(&outpath).map_err(|e| InstallError::io(&outpath, e))?;
        } else if entry_type.is_file() {
            prepare_file_target(&outpath, root, &name)?;
            copy_entry(&mut entry, &outpath, archive_path)?;
            if let Ok(mode) = entry.header().mode() {
                apply_archived_mode(&outpath, mode)?;
            }
        } else if entry_type.is_symlink() || entry_type.is_hard_link() {
            let target = entry
                .link_name()
                .map_err(|e| InstallError::corrupt(archive_path, e))?
                .ok_or_else(|| InstallError::corrupt(archive_path, format!("link '{}' has no target", name)))?
                .into_owned();
            // Symlink targets resolve against the link's directory, hard links against the root.
            let resolved = if entry_type.is_symlink() {
                relative.parent().unwrap_or(Path::new("")).join(&target)
            } else {
                target.clone()
            };
            if target.is_absolute() || enclosed_path(&resolved).is_none() {
                return Err(unsafe_entry(&name, root));
            }

            if entry_type.is_hard_link() && !resolves_inside(&root.join(&resolved), root) {
                return Err(unsafe_entry(&name, root));
            }

            prepare_file_target(&outpath, root, &name)?;
            entry.unpack_in(root).map_err(|e| {
                if e.to_string().contains("outside of destination") {
                    unsafe_entry(&name, root)
                } else {
                    InstallError::io(&outpath, e)
                }
            })?;

            // The target text can still escape through links extracted earlier.
            if entry_type.is_symlink() {
                reject_escaping_link(&outpath, root, &name)?;
                symlinks.push((outpath, name));
            }
        } else {
            debug!("Skipping {:?} entry {}", entry_type, name);
        }
    }

    // A link that dangled when it was written may escape once later entries exist.
    for (link, name) in &symlinks {
        reject_escaping_link(link, root, name)?;
    }

    Ok(())
}

/// False only when `path` can be resolved and lands outside `root`.
fn resolves_inside(path: &Path, root: &Path) -> bool {
    match path.canonicalize() {
        Ok(resolved) => resolved.starts_with(root),
        Err(_) => true,
    }
}

fn reject_escaping_link(link: &Path, root: &Path, name: &str) -> Result<()> {
    if resolves_inside(link, root) {
        return Ok(());
    }

    fs::remove_file(link).map_err(|e| InstallError::io(link, e))?;
    Err(unsafe_entry(name, root))
}

/// Normalizes an archive path lexically; `None` if it leaves the root.
fn enclosed_path(path: &Path) -> Option<PathBuf> {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    return None;
                }
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(normalized)
}

fn unsafe_entry(name: &str, root: &Path) -> InstallError {
    InstallError::UnsafeEntry {
        entry: name.to_string(),
        destination: root.to_path_buf(),
    }
}

/// Creates the parent of `outpath` and checks that, after resolving any
/// symlinks already extracted, it is still inside `root`.
fn prepare_file_target(outpath: &Path, root: &Path, name: &str) -> Result<()> {
    let parent = outpath.parent().unwrap_or(root);
    fs::create_dir_all(parent).map_err(|e| InstallError::io(parent, e))?;

    let resolved = parent
        .canonicalize()
        .map_err(|e| InstallError::io(parent, e))?;
    if !resolved.starts_with(root) {
        return Err(unsafe_entry(name, root));
    }

    // Never write through a link left by an earlier entry.
    if let Ok(metadata) = fs::symlink_metadata(outpath) {
        if metadata.file_type().is_symlink() {
            fs::remove_file(outpath).map_err(|e| InstallError::io(outpath, e))?;
        }
    }

    Ok(())
}

fn copy_entry(reader: &mut impl Read, outpath: &Path, archive_path: &Path) -> Result<u64> {
    let mut outfile = File::create(outpath).map_err(|e| InstallError::io(outpath, e))?;
    let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
    let mut written = 0u64;

    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(InstallError::corrupt(
                    archive_path,
                    format!("reading entry for {}: {}", outpath.display(), e),
                ))
            }
        };
        outfile
            .write_all(&buffer[..n])
            .map_err(|e| InstallError::io(outpath, e))?;
        written += n as u64;
    }

    outfile.flush().map_err(|e| InstallError::io(outpath, e))?;
    debug!("Wrote {} bytes to {}", written, outpath.display());
    Ok(written)
}

fn apply_archived_mode(path: &Path, mode: u32) -> Result<()> {
    if mode & 0o111 != 0 {
        make_executable(path)?;
    }
    Ok(())
}

/// Adds the execute bit for owner, group and others. No-op off unix.
#[allow(unused_variables)]
pub fn make_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let mut permissions = fs::metadata(path)
            .map_err(|e| InstallError::io(path, e))?
            .permissions();
        permissions.set_mode(permissions.mode() | 0o111);
        fs::set_permissions(path, permissions).map_err(|e| InstallError::io(path, e))?;

        debug!("Set executable permission on {}", path.display());
    }

    Ok(())
}

/// Post-extraction fix-up: marks the profile's executable under `root`.
///
/// Profiles without an executable (Windows) are left untouched.
pub fn apply_executable_bits(
    profile: &OsProfile,
    root: &Path,
    version: &str,
) -> Result<Option<PathBuf>> {
    if profile.executable_template.is_none() {
        debug!("No executable to mark for {}", profile.os);
        return Ok(None);
    }

    let executable = profile.executable_path(root, version)?;
    make_executable(&executable)?;
    info!("Marked {} as executable", executable.display());
    Ok(Some(executable))
}
