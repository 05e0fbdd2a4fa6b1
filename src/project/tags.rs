//! Include tags.
//!
//! AGK has no conditional compilation, so release variants swap include
//! files instead. A tagged include in `main.agc` looks like:
//!
//! ```text
//! #insert "version-full.agc" // @@demo anything after the tag is ignored
//! ```
//!
//! Before compiling, every tagged line is rewritten to include the file
//! mapped to its tag, and `main.agc` is restored afterwards.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AgkError, Result};

/// A parsed tagged include line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedInclude<'a> {
    /// Leading whitespace.
    pub indent: &'a str,
    /// `#include` or `#insert`.
    pub directive: &'a str,
    /// File currently named by the line.
    pub file: &'a str,
    /// Tag name after `@@`.
    pub tag: &'a str,
}

/// Parse a line of the form `#include "file" // @@tag`.
pub fn parse_tagged_line(line: &str) -> Option<TaggedInclude<'_>> {
    let trimmed = line.trim_start();
    let indent = &line[..line.len() - trimmed.len()];

    let directive = ["#include", "#insert"]
        .into_iter()
        .find(|d| trimmed.starts_with(d))?;
    let rest = &trimmed[directive.len()..];
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let rest = rest.trim_start();

    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let close = rest[1..].find(quote)? + 1;
    let file = &rest[1..close];
    if file.is_empty() {
        return None;
    }

    let rest = rest[close + 1..].trim_start().strip_prefix("//")?;
    let rest = rest.trim_start().strip_prefix("@@")?;
    let end = rest
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    let tag = &rest[..end];
    if tag.is_empty() {
        return None;
    }

    Some(TaggedInclude {
        indent,
        directive,
        file,
        tag,
    })
}

/// Tags used in a source file, in order of first appearance.
pub fn find_tags(source: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for line in source.lines() {
        if let Some(tagged) = parse_tagged_line(line) {
            if !tags.iter().any(|t| t == tagged.tag) {
                tags.push(tagged.tag.to_string());
            }
        }
    }
    tags
}

/// Rewrite every tagged include to name its mapped file.
pub fn substitute_tags(source: &str, tags: &BTreeMap<String, String>) -> Result<String> {
    let mut output = String::with_capacity(source.len());

    for line in source.split_inclusive('\n') {
        let body = line.trim_end_matches(['\r', '\n']);
        let ending = &line[body.len()..];

        match parse_tagged_line(body) {
            Some(tagged) => {
                if tags.is_empty() {
                    return Err(AgkError::Config {
                        message: "main.agc contains include tags, but none were given".to_string(),
                        help: Some(format!(
                            "Add `include_tags: {{ {}: <file> }}` to the release",
                            tagged.tag
                        )),
                    });
                }
                let file = tags.get(tagged.tag).ok_or_else(|| AgkError::Config {
                    message: format!("No value given for include tag named '{}'", tagged.tag),
                    help: None,
                })?;
                output.push_str(tagged.indent);
                output.push_str(tagged.directive);
                output.push_str(" \"");
                output.push_str(file);
                output.push('"');
                output.push_str(ending);
            }
            None => output.push_str(line),
        }
    }

    Ok(output)
}

/// Restores `main.agc` from its backup when dropped.
#[derive(Debug)]
pub struct TagGuard {
    main: PathBuf,
    backup: PathBuf,
    restored: bool,
}

impl TagGuard {
    /// Back up `main` and write the substituted source in its place.
    ///
    /// Refuses to run if a backup from an interrupted run is still present.
    pub fn apply(main: &Path, tags: &BTreeMap<String, String>) -> Result<Self> {
        let backup = backup_path(main);
        if backup.exists() {
            return Err(AgkError::Build {
                message: format!("{} already exists", backup.display()),
                help: Some(
                    "A previous run was interrupted; restore main.agc from the backup first"
                        .to_string(),
                ),
            });
        }

        let source = fs::read_to_string(main).map_err(|e| AgkError::io(main, e))?;
        let substituted = substitute_tags(&source, tags)?;

        fs::rename(main, &backup).map_err(|e| AgkError::io(main, e))?;
        let guard = Self {
            main: main.to_path_buf(),
            backup,
            restored: false,
        };
        fs::write(main, substituted).map_err(|e| AgkError::io(main, e))?;

        Ok(guard)
    }

    /// Put the original source back.
    pub fn restore(mut self) -> Result<()> {
        self.restore_inner()
    }

    fn restore_inner(&mut self) -> Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        fs::rename(&self.backup, &self.main).map_err(|e| AgkError::io(&self.main, e))
    }
}

impl Drop for TagGuard {
    fn drop(&mut self) {
        if let Err(e) = self.restore_inner() {
            eprintln!("error: failed to restore main.agc: {}", e);
        }
    }
}

fn backup_path(main: &Path) -> PathBuf {
    let mut name = main.file_name().unwrap_or_default().to_os_string();
    name.push(".backup");
    main.with_file_name(name)
}
