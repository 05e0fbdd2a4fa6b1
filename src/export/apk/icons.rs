//! Launcher and notification icons, scaled into the player's `resOrig`
//! density folders.

use std::path::{Path, PathBuf};

use image::imageops::FilterType;

use crate::error::{AgkError, Result};
use crate::types::ApkType;

use super::settings::ApkSettings;

/// Size the Ouya large icon must have.
pub const OUYA_ICON_SIZE: (u32, u32) = (732, 412);

/// One scaled copy of an icon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconJob {
    pub source: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Resource folder under `resOrig`, e.g. `drawable-xhdpi`.
    pub folder: String,
    pub file: &'static str,
}

impl IconJob {
    fn square(source: &Path, size: u32, folder: impl Into<String>, file: &'static str) -> Self {
        Self {
            source: source.to_path_buf(),
            width: size,
            height: size,
            folder: folder.into(),
            file,
        }
    }

    /// Path relative to the scratch folder.
    pub fn resource(&self) -> PathBuf {
        Path::new("resOrig").join(&self.folder).join(self.file)
    }
}

/// Every scaled icon the settings call for.
pub fn icon_jobs(settings: &ApkSettings) -> Vec<IconJob> {
    let ouya = settings.apk_type == ApkType::Ouya;
    let density = |name: &str| {
        if ouya {
            format!("drawable-{}-v4", name)
        } else {
            format!("drawable-{}", name)
        }
    };
    let mut jobs = Vec::new();

    if let Some(icon) = &settings.app_icon {
        if settings.is_store() {
            jobs.push(IconJob::square(icon, 192, "drawable-xxxhdpi", "icon.png"));
            jobs.push(IconJob::square(icon, 144, "drawable-xxhdpi", "icon.png"));
        }
        let main = if ouya { "app_icon.png" } else { "icon.png" };
        for (size, name) in [(96, "xhdpi"), (72, "hdpi"), (48, "mdpi"), (36, "ldpi")] {
            jobs.push(IconJob::square(icon, size, density(name), main));
        }
    }

    if let Some(icon) = settings.notification_icon.as_ref().filter(|_| settings.is_store()) {
        for (size, folder) in [(96, "drawable-xxxhdpi"), (72, "drawable-xxhdpi")] {
            jobs.push(IconJob::square(icon, size, folder, "icon_white.png"));
        }
        for (size, name) in [(48, "xhdpi"), (36, "hdpi"), (24, "mdpi"), (24, "ldpi")] {
            jobs.push(IconJob::square(icon, size, density(name), "icon_white.png"));
        }
    }

    if let (true, Some(icon)) = (ouya, &settings.ouya_icon) {
        jobs.push(IconJob {
            source: icon.clone(),
            width: 320,
            height: 180,
            folder: "drawable".to_string(),
            file: "icon.png",
        });
    }

    jobs
}

/// Scale one icon into `scratch`. Returns the written resource path
/// relative to `scratch`.
pub fn render_icon(job: &IconJob, scratch: &Path) -> Result<PathBuf> {
    let image = image::open(&job.source)
        .map_err(|e| AgkError::io(&job.source, format!("Failed to load icon: {}", e)))?;
    let scaled = image.resize_exact(job.width, job.height, FilterType::Lanczos3);

    let resource = job.resource();
    let target = scratch.join(&resource);
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| AgkError::io(parent, format!("Failed to create folder: {}", e)))?;
    }
    scaled
        .save_with_format(&target, image::ImageFormat::Png)
        .map_err(|e| AgkError::io(&target, format!("Failed to write icon: {}", e)))?;
    Ok(resource)
}

/// The Ouya large icon is used unscaled and must be exactly 732x412.
pub fn check_ouya_icon(path: &Path) -> Result<()> {
    let (width, height) = image::image_dimensions(path)
        .map_err(|e| AgkError::io(path, format!("Failed to read icon: {}", e)))?;
    if (width, height) != OUYA_ICON_SIZE {
        return Err(AgkError::invalid(format!(
            "Ouya large icon must be {}x{} pixels, found {}x{}",
            OUYA_ICON_SIZE.0, OUYA_ICON_SIZE.1, width, height
        )));
    }
    Ok(())
}
