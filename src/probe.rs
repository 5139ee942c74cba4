//! Cheap idempotence check for an existing installation.
//!
//! Only the presence of the library file is checked. A truncated or
//! wrong-version file at the expected path still counts as installed.

use crate::platform::OsProfile;
use crate::types::InstallationState;
use std::path::Path;

pub fn installation_state(root: &Path, profile: &OsProfile, version: &str) -> InstallationState {
    let library_path = profile.library_path(root, version);
    let present = library_path.is_file();
    tracing::debug!(
        "Library {} at {}",
        if present { "found" } else { "not found" },
        library_path.display()
    );
    InstallationState {
        present,
        library_path,
    }
}

pub fn is_installed(root: &Path, profile: &OsProfile, version: &str) -> bool {
    installation_state(root, profile, version).present
}
