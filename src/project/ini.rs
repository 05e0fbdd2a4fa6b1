//! Minimal INI reader for AGK project files and IDE settings.
//!
//! Sections keep their declaration order. Keys before the first section
//! land in the unnamed section `""`.

use std::path::Path;

use crate::error::{AgkError, Result};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IniFile {
    sections: Vec<(String, Vec<(String, String)>)>,
}

impl IniFile {
    /// Read and parse an INI file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AgkError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to read file: {}", e),
        })?;
        Self::parse(&content).map_err(|e| match e {
            AgkError::Parse { message, help } => AgkError::Parse {
                message: format!("{}: {}", path.display(), message),
                help,
            },
            other => other,
        })
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut ini = IniFile::default();
        let mut current = String::new();

        for (index, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                current = name.to_string();
                ini.section_mut(&current);
                continue;
            }

            let (key, value) = line.split_once('=').ok_or_else(|| AgkError::Parse {
                message: format!("line {}: expected key=value, found '{}'", index + 1, line),
                help: None,
            })?;
            ini.set(&current, key.trim(), value.trim());
        }

        Ok(ini)
    }

    /// Look up a value.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .iter()
            .find(|(name, _)| name == section)
            .and_then(|(_, entries)| entries.iter().find(|(k, _)| k == key))
            .map(|(_, v)| v.as_str())
    }

    /// Insert or replace a value.
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        let entries = self.section_mut(section);
        match entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => entries.push((key.to_string(), value.to_string())),
        }
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.sections.iter().any(|(name, _)| name == section)
    }

    fn section_mut(&mut self, section: &str) -> &mut Vec<(String, String)> {
        let index = match self.sections.iter().position(|(name, _)| name == section) {
            Some(index) => index,
            None => {
                self.sections.push((section.to_string(), Vec::new()));
                self.sections.len() - 1
            }
        };
        &mut self.sections[index].1
    }
}
