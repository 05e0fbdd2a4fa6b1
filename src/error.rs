use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for agkbuild operations
#[derive(Error, Diagnostic, Debug)]
pub enum AgkError {
    #[error("IO error: {0}")]
    #[diagnostic(code(agkbuild::io))]
    IoError(#[from] std::io::Error),

    #[error("IO error with {path}: {message}")]
    #[diagnostic(code(agkbuild::io))]
    Io { path: PathBuf, message: String },

    #[error("Parse error: {message}")]
    #[diagnostic(code(agkbuild::parse))]
    Parse {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(agkbuild::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Release '{release}' is missing required field '{field}'")]
    #[diagnostic(code(agkbuild::config::missing_field))]
    MissingField { release: String, field: String },

    #[error("Platform error: {message}")]
    #[diagnostic(
        code(agkbuild::platform),
        help("Valid targets: windows-x86, windows-x64, linux-x86, linux-x64, html5, android, google-apk, amazon-apk, ouya-apk")
    )]
    Platform { message: String },

    #[error("Validation error: {message}")]
    #[diagnostic(code(agkbuild::validate))]
    Validation {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("{tool} failed{}: {output}", .code.map(|c| format!(" with exit code {}", c)).unwrap_or_default())]
    #[diagnostic(code(agkbuild::tool))]
    ToolFailed {
        tool: String,
        code: Option<i32>,
        output: String,
    },

    #[error("Media file not found: {path}")]
    #[diagnostic(
        code(agkbuild::media),
        help("Media include/exclude entries are relative to the project's media folder")
    )]
    MediaNotFound { path: PathBuf },

    #[error("Build error: {message}")]
    #[diagnostic(code(agkbuild::build))]
    Build {
        message: String,
        #[help]
        help: Option<String>,
    },
}

impl AgkError {
    /// Shorthand for an `Io` error with context about the path involved.
    pub fn io(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        AgkError::Io {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Shorthand for a `Validation` error without help text.
    pub fn invalid(message: impl Into<String>) -> Self {
        AgkError::Validation {
            message: message.into(),
            help: None,
        }
    }

    /// Exit code reported by the external tool, when this error came from one.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            AgkError::ToolFailed { code, .. } => *code,
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AgkError>;
