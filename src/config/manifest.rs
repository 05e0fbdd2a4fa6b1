//! Release manifest (agkbuild.yaml) parsing.
//!
//! The manifest lists every release to build, in order, plus settings
//! shared by the whole run.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AgkError, Result};

use super::release::ReleaseConfig;

/// Build manifest loaded from agkbuild.yaml.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Manifest {
    /// AppGameKit Classic install folder. Located automatically if unset.
    pub agk_path: Option<PathBuf>,

    /// Stop at the first failed release instead of building the rest.
    pub fail_fast: bool,

    /// Releases in build order.
    pub releases: Vec<ReleaseConfig>,
}

impl Manifest {
    /// Load manifest from an agkbuild.yaml file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AgkError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to read manifest: {}", e),
        })?;

        Self::parse(&content)
    }

    /// Parse manifest from YAML string.
    pub fn parse(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| AgkError::Parse {
            message: format!("Invalid manifest: {}", e),
            help: Some("Check agkbuild.yaml syntax".to_string()),
        })
    }

    /// Keep only the releases whose name is listed. An empty selection
    /// keeps everything; a name that matches nothing is an error.
    pub fn select(&mut self, names: &[String]) -> Result<()> {
        if names.is_empty() {
            return Ok(());
        }

        for name in names {
            if !self.releases.iter().any(|r| r.name.as_deref() == Some(name)) {
                return Err(AgkError::Config {
                    message: format!("No release named '{}' in manifest", name),
                    help: Some("Release names come from each release's `name` field".to_string()),
                });
            }
        }

        self.releases
            .retain(|r| r.name.as_ref().is_some_and(|n| names.contains(n)));
        Ok(())
    }
}
