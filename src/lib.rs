//! Build-time installer for the RenderDoc graphics debugger.
//!
//! [`install::ensure_installed`] checks whether the requested RenderDoc
//! version is already unpacked under an installation root and, if not,
//! downloads the archive for the host OS and extracts it there.

pub mod config;
pub mod download;
pub mod error;
pub mod extract;
pub mod install;
pub mod platform;
pub mod probe;
pub mod types;


pub use error::{InstallError, Result};
