//! Zip archives of export folders, and appending to linked APKs.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{AgkError, Result};

use super::files::remove_dir;

fn zip_error(path: &Path, e: zip::result::ZipError) -> AgkError {
    AgkError::io(path, format!("Failed to write archive: {}", e))
}

fn deflated() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

#[cfg(unix)]
fn file_mode(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode()
}

#[cfg(not(unix))]
fn file_mode(_metadata: &fs::Metadata) -> u32 {
    0o644
}

fn add_file<W: io::Write + io::Seek>(
    writer: &mut ZipWriter<W>,
    zip: &Path,
    source: &Path,
    name: String,
    options: SimpleFileOptions,
) -> Result<()> {
    let mut input =
        File::open(source).map_err(|e| AgkError::io(source, format!("Failed to open file: {}", e)))?;
    writer.start_file(name, options).map_err(|e| zip_error(zip, e))?;
    io::copy(&mut input, writer).map_err(|e| AgkError::io(zip, format!("Failed to write archive: {}", e)))?;
    Ok(())
}

/// Zip `folder` into `zip`, entries named relative to the folder, then
/// remove the folder. File permissions are kept so Linux players stay
/// executable.
pub fn archive_folder(folder: &Path, zip: &Path) -> Result<()> {
    let file = File::create(zip).map_err(|e| AgkError::io(zip, format!("Failed to create archive: {}", e)))?;
    let mut writer = ZipWriter::new(file);

    for entry in WalkDir::new(folder).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| AgkError::io(folder, format!("Failed to scan folder: {}", e)))?;
        let relative = entry.path().strip_prefix(folder).unwrap_or(entry.path());
        let name = relative.to_string_lossy().replace('\\', "/");

        if entry.file_type().is_dir() {
            writer
                .add_directory(format!("{}/", name), deflated())
                .map_err(|e| zip_error(zip, e))?;
            continue;
        }

        let metadata = entry
            .metadata()
            .map_err(|e| AgkError::io(entry.path(), format!("Failed to read file: {}", e)))?;
        let options = deflated().unix_permissions(file_mode(&metadata));
        add_file(&mut writer, zip, entry.path(), name, options)?;
    }

    writer.finish().map_err(|e| zip_error(zip, e))?;
    remove_dir(folder)
}

/// Append files to an existing zip, as (source, entry name) pairs.
pub fn append_files(zip: &Path, entries: &[(PathBuf, String)]) -> Result<()> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(zip)
        .map_err(|e| AgkError::io(zip, format!("Failed to open archive: {}", e)))?;
    let mut writer = ZipWriter::new_append(file).map_err(|e| zip_error(zip, e))?;

    for (source, name) in entries {
        add_file(&mut writer, zip, source, name.clone(), deflated())?;
    }

    writer.finish().map_err(|e| zip_error(zip, e))?;
    Ok(())
}
