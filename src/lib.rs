//! agkbuild - Build and package AppGameKit Classic releases
//!
//! Reads an `agkbuild.yaml` manifest of releases, compiles each AGK project
//! once and exports it to Windows, Linux, HTML5 and Android (APK), with
//! optional zip archives, NSIS installers and Debian packages.

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod output;
pub mod pipeline;
pub mod plan;
pub mod project;
pub mod toolchain;
pub mod types;
pub mod validation;

pub use config::{load, LoadedManifest, Manifest, ReleaseConfig, MANIFEST_FILENAME};
pub use error::{AgkError, Result};
pub use export::Exporter;
pub use pipeline::{build_release, run_plans, FailurePolicy, ReleaseOutcome, ReleaseStatus, RunSummary};
pub use plan::{resolve_all, resolve_release, ReleasePlan};
pub use project::AgkProject;
pub use toolchain::{CommandRunner, Invocation, SystemRunner, ToolOutput, Toolchain};
pub use types::{Architecture, BuildAction, Platform, PlatformTarget};
pub use validation::{validate_manifest, validate_release, ValidationResult};
