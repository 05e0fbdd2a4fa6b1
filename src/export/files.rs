//! File system helpers shared by the exports.

use std::fs;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use crate::error::{AgkError, Result};
use crate::plan::MediaManifest;
use crate::project::IGNORE_FILES;
use crate::types::ResolvedFile;

/// Remove `dir` if it exists and create it empty.
pub fn reset_dir(dir: &Path) -> Result<()> {
    remove_dir(dir)?;
    fs::create_dir_all(dir).map_err(|e| AgkError::io(dir, format!("Failed to create folder: {}", e)))
}

pub fn remove_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir)
            .map_err(|e| AgkError::io(dir, format!("Failed to remove folder: {}", e)))?;
    }
    Ok(())
}

/// Copy one file, creating the destination's parent folders.
pub fn copy_file(source: &Path, destination: &Path) -> Result<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| AgkError::io(parent, format!("Failed to create folder: {}", e)))?;
    }
    fs::copy(source, destination).map_err(|e| AgkError::Io {
        path: source.to_path_buf(),
        message: format!("Failed to copy to {}: {}", destination.display(), e),
    })?;
    Ok(())
}

pub fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| AgkError::io(path, format!("Failed to read file: {}", e)))
}

pub fn write_text(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|e| AgkError::io(path, format!("Failed to write file: {}", e)))
}

/// Mark a player binary executable.
#[cfg(unix)]
pub fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .map_err(|e| AgkError::io(path, format!("Failed to set permissions: {}", e)))
}

#[cfg(not(unix))]
pub fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

/// Copy every file of a media manifest under `destination`.
pub fn copy_media(media: &MediaManifest, destination: &Path) -> Result<usize> {
    fs::create_dir_all(destination)
        .map_err(|e| AgkError::io(destination, format!("Failed to create folder: {}", e)))?;
    for file in &media.files {
        copy_file(&file.path, &destination.join(&file.relative))?;
    }
    Ok(media.len())
}

/// File-name globs for `copy_tree`, matched case-insensitively.
fn skip_set(skip: &[&str]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in IGNORE_FILES.iter().chain(skip) {
        let glob = GlobBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| AgkError::Config {
                message: format!("Invalid skip pattern '{}': {}", pattern, e),
                help: None,
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| AgkError::Config {
        message: format!("Invalid skip patterns: {}", e),
        help: None,
    })
}

/// Copy a folder tree, leaving out files whose names match `skip`.
pub fn copy_tree(source: &Path, destination: &Path, skip: &[&str]) -> Result<usize> {
    let skip = skip_set(skip)?;
    let mut copied = 0;
    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry.map_err(|e| AgkError::io(source, format!("Failed to scan folder: {}", e)))?;
        let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
        let target = destination.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .map_err(|e| AgkError::io(&target, format!("Failed to create folder: {}", e)))?;
        } else if !skip.is_match(entry.file_name()) {
            copy_file(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// True when `dir` exists and holds at least one entry.
pub fn has_entries(dir: &Path) -> bool {
    fs::read_dir(dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

/// Copy a release's extra files into an output folder.
pub fn copy_include_files(files: &[ResolvedFile], folder: &Path) -> Result<Vec<PathBuf>> {
    let mut copied = Vec::with_capacity(files.len());
    for file in files {
        let destination = folder.join(&file.destination);
        copy_file(&file.source, &destination)?;
        copied.push(destination);
    }
    Ok(copied)
}

/// A scratch folder removed when dropped.
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    /// Create `path` empty, replacing anything left from an earlier run.
    pub fn create(path: PathBuf) -> Result<Self> {
        reset_dir(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}
