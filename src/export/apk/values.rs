//! `values.xml` string resources and the Firebase identifiers read from
//! `google-services.json`.

use serde_json::Value;

use crate::error::{AgkError, Result};

use super::settings::ApkSettings;

/// The identifiers an APK needs from a Firebase config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirebaseIds {
    pub project_number: String,
    pub firebase_url: String,
    pub mobilesdk_app_id: String,
    pub api_key: String,
}

fn firebase_error(message: String) -> AgkError {
    AgkError::Config {
        message,
        help: Some("Download google-services.json again from the Firebase console".to_string()),
    }
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl FirebaseIds {
    /// Pick the identifiers of the Android client registered for `package`.
    pub fn from_json(config: &Value, package: &str) -> Result<Self> {
        let project_info = config.get("project_info");
        let project_number = text(project_info.and_then(|p| p.get("project_number")))
            .ok_or_else(|| firebase_error("Firebase config has no project_number".to_string()))?;
        let firebase_url = text(project_info.and_then(|p| p.get("firebase_url")))
            .ok_or_else(|| firebase_error("Firebase config has no firebase_url".to_string()))?;

        let client = config
            .get("client")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .find(|client| {
                client
                    .pointer("/client_info/android_client_info/package_name")
                    .and_then(Value::as_str)
                    == Some(package)
            })
            .ok_or_else(|| {
                firebase_error(format!(
                    "Firebase config has no client for package '{}'",
                    package
                ))
            })?;

        let mobilesdk_app_id = text(client.pointer("/client_info/mobilesdk_app_id")).ok_or_else(|| {
            firebase_error(format!("Firebase client '{}' has no mobilesdk_app_id", package))
        })?;

        // Current configs hold a list of keys; older ones a single object.
        let api_key = match client.get("api_key") {
            Some(Value::Array(keys)) => keys.iter().find_map(|k| text(k.get("current_key"))),
            Some(key) => text(key.get("current_key")),
            None => None,
        }
        .ok_or_else(|| firebase_error(format!("Firebase client '{}' has no current_key", package)))?;

        Ok(Self {
            project_number,
            firebase_url,
            mobilesdk_app_id,
            api_key,
        })
    }
}

/// Replace the text of every `<string name="...">` element opened by
/// `open_tag`. Returns `None` when the element is absent.
fn set_string(contents: &str, open_tag: &str, value: &str) -> Option<String> {
    let mut result = String::with_capacity(contents.len());
    let mut rest = contents;
    let mut found = false;

    while let Some(start) = rest.find(open_tag) {
        let after = start + open_tag.len();
        let Some(len) = rest[after..].find("</string>") else {
            break;
        };
        if len == 0 {
            // An empty element is left alone.
            result.push_str(&rest[..after]);
            rest = &rest[after..];
            continue;
        }
        result.push_str(&rest[..after]);
        result.push_str(value);
        rest = &rest[after + len..];
        found = true;
    }

    result.push_str(rest);
    found.then_some(result)
}

fn require(contents: &str, name: &str, translatable: bool, value: &str) -> Result<String> {
    let tag = if translatable {
        format!(r#"<string name="{}">"#, name)
    } else {
        format!(r#"<string name="{}" translatable="false">"#, name)
    };
    set_string(contents, &tag, value).ok_or_else(|| AgkError::Build {
        message: format!("Could not find {} entry in values.xml", name),
        help: Some("The AGK android player files may be damaged".to_string()),
    })
}

/// Fill the player's `values.xml`.
pub fn patch_values(
    settings: &ApkSettings,
    contents: &str,
    firebase: Option<&FirebaseIds>,
) -> Result<String> {
    let mut contents = require(contents, "app_name", true, &settings.app_name)?;

    if let Some(id) = settings.play_app_id.as_deref().filter(|_| settings.is_google()) {
        contents = require(&contents, "games_app_id", true, id)?;
    }
    if let Some(id) = settings.admob_app_id.as_deref().filter(|_| settings.is_google()) {
        contents = require(&contents, "admob_app_id", true, id)?;
    }

    if let Some(ids) = firebase {
        contents = require(&contents, "gcm_defaultSenderId", false, &ids.project_number)?;
        contents = require(&contents, "firebase_database_url", false, &ids.firebase_url)?;
        contents = require(&contents, "google_app_id", false, &ids.mobilesdk_app_id)?;
        contents = require(&contents, "google_api_key", false, &ids.api_key)?;
        contents = require(&contents, "google_crash_reporting_api_key", false, &ids.api_key)?;
    }

    Ok(contents)
}
