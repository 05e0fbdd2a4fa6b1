//! APK settings: the project's `[apk_settings]` with release overrides
//! applied, and the checks the AGK IDE runs before exporting.

use std::path::{Path, PathBuf};

use crate::error::{AgkError, Result};
use crate::plan::ReleasePlan;
use crate::types::ApkType;

use super::super::Secrets;

/// Minimum API level for each `sdk_version` index of the project file.
const SDK_API_LEVELS: [u32; 12] = [16, 17, 18, 19, 21, 22, 23, 24, 25, 26, 27, 28];

/// The `permission_flags` bit set of an AGK project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Permissions(u32);

impl Permissions {
    pub const WRITE: u32 = 0x001;
    pub const INTERNET: u32 = 0x002;
    pub const WAKE: u32 = 0x004;
    pub const GPS: u32 = 0x008;
    pub const IAP: u32 = 0x010;
    pub const EXPANSION: u32 = 0x020;
    pub const LOCATION: u32 = 0x040;
    pub const PUSH: u32 = 0x080;
    pub const CAMERA: u32 = 0x100;
    pub const VIBRATE: u32 = 0x200;
    pub const RECORD_AUDIO: u32 = 0x400;

    pub fn new(bits: u32) -> Self {
        Self(bits)
    }

    pub fn has(&self, flag: u32) -> bool {
        self.0 & flag != 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Landscape,
    Portrait,
    All,
}

impl Orientation {
    /// Indexes past the known ones mean "all".
    pub fn from_index(index: i64) -> Self {
        match index {
            0 => Orientation::Landscape,
            1 => Orientation::Portrait,
            _ => Orientation::All,
        }
    }

    /// Value for `android:screenOrientation`.
    pub fn android_name(&self) -> &'static str {
        match self {
            Orientation::Landscape => "sensorLandscape",
            Orientation::Portrait => "sensorPortrait",
            Orientation::All => "fullSensor",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArCore {
    None,
    Optional,
    Required,
}

impl ArCore {
    fn from_index(index: i64) -> Self {
        match index {
            1 => ArCore::Optional,
            2 => ArCore::Required,
            _ => ArCore::None,
        }
    }
}

/// Keystore and alias handed to jarsigner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signing {
    pub keystore: PathBuf,
    pub keystore_password: String,
    pub alias: String,
    pub alias_password: String,
}

#[derive(Debug, Clone)]
pub struct ApkSettings {
    pub apk_type: ApkType,
    pub app_name: String,
    pub package_name: String,
    pub app_icon: Option<PathBuf>,
    pub notification_icon: Option<PathBuf>,
    pub ouya_icon: Option<PathBuf>,
    pub firebase_config: Option<PathBuf>,
    pub orientation: Orientation,
    pub arcore: ArCore,
    pub min_sdk: u32,
    pub url_scheme: Option<String>,
    pub deep_link: Option<String>,
    pub play_app_id: Option<String>,
    pub admob_app_id: Option<String>,
    pub permissions: Permissions,
    pub version_name: String,
    pub build_number: u32,
    pub keystore: Option<PathBuf>,
    pub keystore_password: Option<String>,
    pub alias: Option<String>,
    pub alias_password: Option<String>,
}

impl ApkSettings {
    /// Gather the settings for one APK flavour. Relative file paths are
    /// taken from the project folder.
    pub fn resolve(plan: &ReleasePlan, apk_type: ApkType, secrets: &Secrets) -> Result<Self> {
        let get = |key: &str| {
            plan.setting("apk_settings", key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let path = |key: &str| get(key).map(|p| plan.project.base_path.join(p));
        let int = |key: &str| -> Result<Option<i64>> {
            get(key)
                .map(|raw| {
                    raw.parse::<i64>().map_err(|_| AgkError::Config {
                        message: format!("APK setting {} '{}' is not a whole number", key, raw),
                        help: None,
                    })
                })
                .transpose()
        };
        let missing = |key: &str| AgkError::MissingField {
            release: plan.label.clone(),
            field: format!("apk.{}", key),
        };

        let sdk_index = int("sdk_version")?.ok_or_else(|| missing("sdk_version"))?;
        let min_sdk = usize::try_from(sdk_index)
            .ok()
            .and_then(|i| i.checked_sub(1))
            .and_then(|i| SDK_API_LEVELS.get(i).copied())
            .ok_or_else(|| AgkError::Config {
                message: format!("Invalid APK sdk_version {}", sdk_index),
                help: Some(format!("Use 1 to {}", SDK_API_LEVELS.len())),
            })?;

        let build_number = int("version_number")?
            .ok_or_else(|| missing("version_number"))
            .and_then(|n| {
                u32::try_from(n).map_err(|_| AgkError::Config {
                    message: format!("APK version_number {} is out of range", n),
                    help: None,
                })
            })?;

        let version_name = get("version_name")
            .or_else(|| plan.project.version.clone())
            .unwrap_or_else(|| build_number.to_string());

        let permissions = int("permission_flags")?.unwrap_or(0);

        Ok(Self {
            apk_type,
            app_name: get("app_name").unwrap_or_default(),
            package_name: get("package_name").unwrap_or_default(),
            app_icon: path("app_icon_path"),
            notification_icon: path("notif_icon_path"),
            ouya_icon: path("ouya_icon_path"),
            firebase_config: path("firebase_config_path"),
            orientation: Orientation::from_index(int("orientation")?.unwrap_or(2)),
            arcore: ArCore::from_index(int("arcore")?.unwrap_or(0)),
            min_sdk,
            url_scheme: get("url_scheme"),
            deep_link: get("deep_link"),
            play_app_id: get("play_app_id"),
            admob_app_id: get("admob_app_id"),
            permissions: Permissions::new(u32::try_from(permissions).unwrap_or(0)),
            version_name,
            build_number,
            keystore: path("keystore_path"),
            keystore_password: get("keystore_password").or_else(|| secrets.keystore_password.clone()),
            alias: get("alias"),
            alias_password: get("alias_password").or_else(|| secrets.alias_password.clone()),
        })
    }

    /// Check the settings, failing on the first problem.
    pub fn validate(&self) -> Result<()> {
        check_app_name(&self.app_name)?;
        check_package_name(&self.package_name)?;

        if let Some(scheme) = &self.url_scheme {
            if scheme.contains([':', '/']) {
                return Err(AgkError::invalid("URL scheme must not contain : or /"));
            }
        }
        if let Some(link) = &self.deep_link {
            let rest = link
                .strip_prefix("https://")
                .or_else(|| link.strip_prefix("http://"))
                .ok_or_else(|| AgkError::invalid("Deep link must start with http:// or https://"))?;
            if rest.is_empty() {
                return Err(AgkError::invalid(
                    "Deep link must have a domain after http:// or https://",
                ));
            }
        }

        check_file(self.app_icon.as_deref(), "png", "App icon")?;
        check_file(self.notification_icon.as_deref(), "png", "Notification icon")?;
        if self.apk_type == ApkType::Ouya {
            if self.ouya_icon.is_none() {
                return Err(AgkError::invalid("You must select an Ouya large icon"));
            }
            check_file(self.ouya_icon.as_deref(), "png", "Ouya large icon")?;
        }
        check_file(self.firebase_config.as_deref(), "json", "Google services config file")?;

        if !self.version_name.chars().all(|c| c.is_ascii_digit() || c == '.') {
            return Err(AgkError::invalid(
                "Version name contains invalid characters, must be 0-9 and . only",
            ));
        }

        if let Some(keystore) = &self.keystore {
            if !keystore.is_file() {
                return Err(AgkError::io(keystore, "Could not find keystore file"));
            }
            check_password(self.keystore_password.as_deref(), "keystore")?;
        }
        if self.alias.is_some() {
            check_password(self.alias_password.as_deref(), "alias")?;
        }

        if self.include_push_notify() && !self.include_firebase() {
            return Err(AgkError::Validation {
                message: "Push notifications on Android use Firebase".to_string(),
                help: Some("Set apk firebase_config_path to a google-services.json".to_string()),
            });
        }
        Ok(())
    }

    /// Keystore to sign with; the AGK debug keystore when none is set.
    pub fn signing(&self, debug_keystore: &Path) -> Signing {
        match &self.keystore {
            None => Signing {
                keystore: debug_keystore.to_path_buf(),
                keystore_password: "android".to_string(),
                alias: "androiddebugkey".to_string(),
                alias_password: "android".to_string(),
            },
            Some(keystore) => {
                let keystore_password = self.keystore_password.clone().unwrap_or_default();
                let (alias, alias_password) = match &self.alias {
                    Some(alias) => (alias.clone(), self.alias_password.clone().unwrap_or_default()),
                    None => ("mykeystore".to_string(), keystore_password.clone()),
                };
                Signing {
                    keystore: keystore.clone(),
                    keystore_password,
                    alias,
                    alias_password,
                }
            }
        }
    }

    pub fn is_google(&self) -> bool {
        self.apk_type == ApkType::Google
    }

    /// Google and Amazon share the modern player; Ouya does not.
    pub fn is_store(&self) -> bool {
        matches!(self.apk_type, ApkType::Google | ApkType::Amazon)
    }

    pub fn include_firebase(&self) -> bool {
        self.firebase_config.is_some() && self.is_store()
    }

    pub fn include_push_notify(&self) -> bool {
        self.permissions.has(Permissions::PUSH) && self.is_google()
    }

    pub fn include_google_play(&self) -> bool {
        self.play_app_id.is_some() && self.is_google()
    }

    pub fn include_admob(&self) -> bool {
        self.admob_app_id.is_some() && self.is_google()
    }

    /// `minSdkVersion` written to the manifest.
    pub fn manifest_min_sdk(&self) -> u32 {
        if self.is_store() {
            self.min_sdk
        } else {
            15
        }
    }

    pub fn target_sdk(&self) -> u32 {
        if self.is_google() {
            28
        } else {
            15
        }
    }
}

fn check_app_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(AgkError::invalid("You must enter an app name"));
    }
    if name.chars().count() > 30 {
        return Err(AgkError::invalid("App name must be less than 30 characters"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | ' ' | '_'))
    {
        return Err(AgkError::invalid(
            "App name contains invalid characters, it must not contain quotes or < > characters",
        ));
    }
    Ok(())
}

fn check_package_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(AgkError::invalid("You must enter a package name"));
    }
    if name.len() > 100 {
        return Err(AgkError::invalid("Package name must be less than 100 characters"));
    }
    if !name.contains('.') {
        return Err(AgkError::invalid(
            "Package name must contain at least one dot character",
        ));
    }
    if !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return Err(AgkError::invalid("Package name must begin with a letter"));
    }
    if name.ends_with('.') {
        return Err(AgkError::invalid("Package name must not end with a dot"));
    }
    if name
        .split('.')
        .skip(1)
        .any(|part| !part.starts_with(|c: char| c.is_ascii_alphabetic()))
    {
        return Err(AgkError::invalid(
            "Package name invalid, a dot must be followed by a letter",
        ));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_')
    {
        return Err(AgkError::invalid(
            "Package name contains invalid characters, must be A-Z 0-9 . and underscore only",
        ));
    }
    Ok(())
}

fn check_file(path: Option<&Path>, extension: &str, what: &str) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let matches = path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case(extension));
    if !matches {
        return Err(AgkError::invalid(format!(
            "{} must be a .{} file",
            what, extension
        )));
    }
    if !path.is_file() {
        return Err(AgkError::io(path, format!("Could not find {}", what.to_lowercase())));
    }
    Ok(())
}

fn check_password(password: Option<&str>, what: &str) -> Result<()> {
    match password {
        None | Some("") => Err(AgkError::Validation {
            message: format!("You must enter your {} password", what),
            help: Some(format!(
                "Set AGKBUILD_{}_PASSWORD in the environment",
                what.to_uppercase()
            )),
        }),
        Some(p) if p.contains('"') => Err(AgkError::invalid(format!(
            "The {} password cannot contain double quotes",
            what
        ))),
        Some(_) => Ok(()),
    }
}
