//! Manifest discovery and release configuration.
//!
//! A run is described by an `agkbuild.yaml` manifest. Paths inside it are
//! relative to the folder that contains the manifest.
//!
//! # Example
//!
//! ```ignore
//! use agkbuild::config::load;
//!
//! let loaded = load(None)?;
//! println!("{} release(s)", loaded.manifest.releases.len());
//! ```

mod manifest;
mod release;

use std::path::{Path, PathBuf};

use crate::error::{AgkError, Result};

pub use manifest::Manifest;
pub use release::{
    glob_set, is_pattern, normalize_entry, DebianConfig, IncludeFile, InstallerConfig,
    MediaFilter, MediaMatcher, PackageMetadata, ReleaseConfig,
};

/// The name of the manifest file.
pub const MANIFEST_FILENAME: &str = "agkbuild.yaml";

/// A manifest together with where it was found.
#[derive(Debug)]
pub struct LoadedManifest {
    /// Folder relative paths in the manifest are resolved against.
    pub root: PathBuf,

    /// The manifest file itself.
    pub path: PathBuf,

    pub manifest: Manifest,
}

/// Load a manifest from a file, a folder containing `agkbuild.yaml`, or
/// the current folder when `path` is `None`.
pub fn load(path: Option<&Path>) -> Result<LoadedManifest> {
    let given = path.unwrap_or_else(|| Path::new("."));
    let manifest_path = if given.is_dir() {
        given.join(MANIFEST_FILENAME)
    } else {
        given.to_path_buf()
    };

    if !manifest_path.exists() {
        return Err(AgkError::Config {
            message: format!("Manifest not found: {}", manifest_path.display()),
            help: Some("Run `agkbuild init` to generate one".to_string()),
        });
    }

    let manifest = Manifest::load(&manifest_path)?;
    let root = manifest_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    Ok(LoadedManifest {
        root,
        path: manifest_path,
        manifest,
    })
}
