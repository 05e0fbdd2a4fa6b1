//! Init command implementation.
//!
//! Generates an `agkbuild.yaml` manifest for the AGK project found in a
//! folder.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;

use crate::config::MANIFEST_FILENAME;
use crate::error::{AgkError, Result};
use crate::output::{display_path, plural, Printer};
use crate::project::{parse_tagged_line, AgkProject};

/// Generate an agkbuild.yaml for an AGK project
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Folder containing the .agk project (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite an existing agkbuild.yaml
    #[arg(long)]
    pub force: bool,
}

fn find_projects(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| AgkError::Io {
        path: dir.to_path_buf(),
        message: format!("Failed to read folder: {}", e),
    })?;

    let mut projects: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("agk"))
        })
        .collect();
    projects.sort();
    Ok(projects)
}

/// Tagged includes of `main.agc` as (tag, current file), first one per tag.
fn current_tags(source: &str) -> Vec<(String, String)> {
    let mut tags: Vec<(String, String)> = Vec::new();
    for include in source.lines().filter_map(parse_tagged_line) {
        if !tags.iter().any(|(tag, _)| tag == include.tag) {
            tags.push((include.tag.to_string(), include.file.to_string()));
        }
    }
    tags
}

fn manifest_yaml(project: &AgkProject, file_name: &str, tags: &[(String, String)]) -> String {
    let mut yaml = String::new();
    yaml.push_str("# agkbuild release manifest\n");
    yaml.push_str("releases:\n");
    yaml.push_str(&format!("  - project: {}\n", file_name));
    yaml.push_str("    platforms: [windows-x64, linux-x64, html5]\n");

    if !tags.is_empty() {
        yaml.push_str("    include_tags:\n");
        for (tag, file) in tags {
            yaml.push_str(&format!("      {}: {}\n", tag, file));
        }
    }

    if project.setting("apk_settings", "app_type").is_some() {
        yaml.push_str("    # Add `android` to platforms to export the project's APK.\n");
    }
    yaml
}

pub fn run(args: InitArgs, printer: &Printer) -> Result<()> {
    let manifest_path = args.path.join(MANIFEST_FILENAME);

    if manifest_path.exists() && !args.force {
        return Err(AgkError::Build {
            message: format!("{} already exists", MANIFEST_FILENAME),
            help: Some("Use --force to overwrite".to_string()),
        });
    }

    printer.status("Scanning", &display_path(&args.path));
    let projects = find_projects(&args.path)?;
    let Some(project_file) = projects.first() else {
        return Err(AgkError::Config {
            message: format!("No .agk project found in {}", args.path.display()),
            help: Some("Run init in the folder that holds your AGK project".to_string()),
        });
    };
    if projects.len() > 1 {
        printer.warning(
            "Found",
            &format!(
                "{}, using {}",
                plural(projects.len(), "project", "projects"),
                display_path(project_file)
            ),
        );
    }

    let project = AgkProject::open(project_file)?;
    let source = fs::read_to_string(project.main_source()).unwrap_or_default();
    let tags = current_tags(&source);

    let file_name = project_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let yaml = manifest_yaml(&project, &file_name, &tags);

    fs::write(&manifest_path, &yaml).map_err(|e| AgkError::Io {
        path: manifest_path.clone(),
        message: format!("Failed to write manifest: {}", e),
    })?;

    if !tags.is_empty() {
        let names: Vec<&str> = tags.iter().map(|(tag, _)| tag.as_str()).collect();
        printer.info("Tags", &names.join(", "));
    }
    printer.success(
        "Created",
        &format!("{} for {}", MANIFEST_FILENAME, project.name),
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Manifest;
    use crate::output::Verbosity;
    use tempfile::tempdir;

    fn quiet() -> Printer {
        Printer::new().with_verbosity(Verbosity::Quiet)
    }

    fn project(dir: &Path, main: &str) {
        fs::write(dir.join("MyGame.agk"), "[apk_settings]\napp_type=0\n").unwrap();
        fs::write(dir.join("main.agc"), main).unwrap();
    }

    #[test]
    fn test_init_creates_manifest() {
        let dir = tempdir().unwrap();
        project(dir.path(), "Sync()\n");

        let args = InitArgs {
            path: dir.path().to_path_buf(),
            force: false,
        };
        run(args, &quiet()).unwrap();

        let content = fs::read_to_string(dir.path().join(MANIFEST_FILENAME)).unwrap();
        let manifest = Manifest::parse(&content).unwrap();
        assert_eq!(manifest.releases.len(), 1);
        assert_eq!(
            manifest.releases[0].project.as_deref(),
            Some(Path::new("MyGame.agk"))
        );
        assert!(content.contains("android"));
    }

    #[test]
    fn test_init_lists_include_tags() {
        let dir = tempdir().unwrap();
        project(dir.path(), "#include \"demo-on.agc\" // @@demo\n");

        let args = InitArgs {
            path: dir.path().to_path_buf(),
            force: false,
        };
        run(args, &quiet()).unwrap();

        let content = fs::read_to_string(dir.path().join(MANIFEST_FILENAME)).unwrap();
        let manifest = Manifest::parse(&content).unwrap();
        assert_eq!(
            manifest.releases[0].include_tags.get("demo").map(String::as_str),
            Some("demo-on.agc")
        );
    }

    #[test]
    fn test_init_errors_if_manifest_exists() {
        let dir = tempdir().unwrap();
        project(dir.path(), "Sync()\n");
        fs::write(dir.path().join(MANIFEST_FILENAME), "releases: []").unwrap();

        let args = InitArgs {
            path: dir.path().to_path_buf(),
            force: false,
        };
        assert!(run(args, &quiet()).is_err());
    }

    #[test]
    fn test_init_force_overwrites() {
        let dir = tempdir().unwrap();
        project(dir.path(), "Sync()\n");
        fs::write(dir.path().join(MANIFEST_FILENAME), "releases: []").unwrap();

        let args = InitArgs {
            path: dir.path().to_path_buf(),
            force: true,
        };
        run(args, &quiet()).unwrap();

        let content = fs::read_to_string(dir.path().join(MANIFEST_FILENAME)).unwrap();
        assert!(content.contains("MyGame.agk"));
    }

    #[test]
    fn test_init_without_project() {
        let dir = tempdir().unwrap();
        let args = InitArgs {
            path: dir.path().to_path_buf(),
            force: false,
        };
        let err = run(args, &quiet()).unwrap_err();
        assert!(err.to_string().contains("No .agk project"));
    }
}
