//! The AppGameKit Classic install: compiler, players and export data.
//!
//! The install root is taken from, in order: the `--agk-path` flag, the
//! `AGK_PATH` environment variable, the manifest's `agk_path`, and the
//! IDE settings in `%LOCALAPPDATA%/agk/geany.conf`.

mod runner;

use std::env::consts::EXE_SUFFIX;
use std::path::{Path, PathBuf};

use crate::error::{AgkError, Result};
use crate::project::IniFile;
use crate::types::ApkType;

pub use runner::{CommandRunner, Invocation, SystemRunner, ToolOutput};

/// Environment variable naming the AGK install root.
pub const AGK_PATH_ENV: &str = "AGK_PATH";

/// Platform jar the Android packager links against.
pub const ANDROID_JAR: &str = "android28.jar";

/// A located AGK install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    root: PathBuf,
    compiler: PathBuf,
    data_dir: PathBuf,
}

/// Paths used by APK exports. Only checked when an APK is exported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AndroidTools {
    pub dir: PathBuf,
    pub aapt2: PathBuf,
    pub android_jar: PathBuf,
    pub jarsigner: PathBuf,
    pub zipalign: PathBuf,
    pub debug_keystore: PathBuf,
}

impl AndroidTools {
    /// Player sources for one APK flavour (`sourceGoogle`, ...).
    pub fn source_folder(&self, apk_type: ApkType) -> PathBuf {
        self.dir.join(apk_type.source_folder())
    }

    pub fn lib_dir(&self) -> PathBuf {
        self.dir.join("lib")
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.dir.join("assets")
    }
}

impl Toolchain {
    /// Find the install using the layered sources described above.
    pub fn locate(flag: Option<&Path>, manifest: Option<&Path>) -> Result<Self> {
        let env = std::env::var_os(AGK_PATH_ENV).map(PathBuf::from);
        let ide = ide_config_path().and_then(|conf| agk_path_from_ide_config(&conf));

        let root = flag
            .map(Path::to_path_buf)
            .or(env)
            .or_else(|| manifest.map(Path::to_path_buf))
            .or(ide)
            .ok_or_else(|| AgkError::Config {
                message: "Could not determine the path to AppGameKit Classic".to_string(),
                help: Some(format!(
                    "Pass --agk-path, set {}, or add `agk_path` to the manifest",
                    AGK_PATH_ENV
                )),
            })?;

        Self::at(&root)
    }

    /// Use the install at `root`, checking the compiler and data folder exist.
    pub fn at(root: &Path) -> Result<Self> {
        let compiler = root
            .join("Tier 1")
            .join("Compiler")
            .join(format!("AGKCompiler{}", EXE_SUFFIX));
        let data_dir = root.join("Tier 1").join("Editor").join("data");

        verify(root, &compiler)?;
        verify(root, &data_dir)?;

        Ok(Self {
            root: root.to_path_buf(),
            compiler,
            data_dir,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn compiler(&self) -> &Path {
        &self.compiler
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// HTML5 player template folder (`2D`, `2Ddynamic`, `3D`, `3Ddynamic`).
    pub fn html5_template(&self, folder: &str) -> PathBuf {
        self.data_dir.join("html5").join(folder)
    }

    pub fn windows_players(&self) -> PathBuf {
        self.root.join("Players").join("Windows")
    }

    pub fn linux_players(&self) -> PathBuf {
        self.root.join("Players").join("Linux")
    }

    /// Locate and check the Android packaging tools.
    pub fn android_tools(&self) -> Result<AndroidTools> {
        let dir = self.data_dir.join("android");
        let tools = AndroidTools {
            aapt2: dir.join(format!("aapt2{}", EXE_SUFFIX)),
            android_jar: dir.join(ANDROID_JAR),
            jarsigner: dir
                .join("jre")
                .join("bin")
                .join(format!("jarsigner{}", EXE_SUFFIX)),
            zipalign: dir.join(format!("zipalign{}", EXE_SUFFIX)),
            debug_keystore: dir.join("debug.keystore"),
            dir,
        };

        for path in [
            &tools.aapt2,
            &tools.android_jar,
            &tools.jarsigner,
            &tools.zipalign,
        ] {
            verify(&self.root, path)?;
        }
        Ok(tools)
    }
}

fn verify(root: &Path, path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    let shown = path.strip_prefix(root).unwrap_or(path);
    Err(AgkError::Config {
        message: format!("Could not find \"{}\" in the AGK install", shown.display()),
        help: Some(format!("Checked {}", root.display())),
    })
}

fn ide_config_path() -> Option<PathBuf> {
    let local = std::env::var_os("LOCALAPPDATA")?;
    Some(PathBuf::from(local).join("agk").join("geany.conf"))
}

/// Read the install root from the IDE's `[buildAGK] compiler_path`.
fn agk_path_from_ide_config(conf: &Path) -> Option<PathBuf> {
    let ini = IniFile::load(conf).ok()?;
    let compiler_path = ini.get("buildAGK", "compiler_path")?;
    let root = install_root_from_compiler_path(compiler_path)?;
    root.exists().then_some(root)
}

/// `C:\\AGK\\Tier 1\\Compiler\\AGKCompiler.exe` → `C:\AGK`.
pub fn install_root_from_compiler_path(compiler_path: &str) -> Option<PathBuf> {
    let normalized = compiler_path.replace("\\\\", "\\");
    let lower = normalized.to_lowercase().replace('/', "\\");
    let index = lower.find("\\tier 1\\compiler")?;
    Some(PathBuf::from(&normalized[..index]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn fake_install(root: &Path) {
        let compiler = root.join("Tier 1/Compiler");
        fs::create_dir_all(&compiler).unwrap();
        fs::write(compiler.join(format!("AGKCompiler{}", EXE_SUFFIX)), "").unwrap();
        fs::create_dir_all(root.join("Tier 1/Editor/data/android/jre/bin")).unwrap();
    }

    #[test]
    fn test_at_verifies_layout() {
        let dir = tempdir().unwrap();
        assert!(Toolchain::at(dir.path()).is_err());

        fake_install(dir.path());
        let toolchain = Toolchain::at(dir.path()).unwrap();
        assert!(toolchain.compiler().ends_with(format!("AGKCompiler{}", EXE_SUFFIX)));
        assert_eq!(
            toolchain.html5_template("2D"),
            dir.path().join("Tier 1/Editor/data/html5/2D")
        );
    }

    #[test]
    fn test_flag_wins() {
        let dir = tempdir().unwrap();
        fake_install(dir.path());
        let toolchain = Toolchain::locate(Some(dir.path()), Some(Path::new("/nowhere"))).unwrap();
        assert_eq!(toolchain.root(), dir.path());
    }

    #[test]
    fn test_android_tools_checked_lazily() {
        let dir = tempdir().unwrap();
        fake_install(dir.path());
        let toolchain = Toolchain::at(dir.path()).unwrap();

        let err = toolchain.android_tools().unwrap_err();
        assert!(err.to_string().contains("aapt2"));

        let android = dir.path().join("Tier 1/Editor/data/android");
        fs::write(android.join(format!("aapt2{}", EXE_SUFFIX)), "").unwrap();
        fs::write(android.join(ANDROID_JAR), "").unwrap();
        fs::write(android.join(format!("jre/bin/jarsigner{}", EXE_SUFFIX)), "").unwrap();
        fs::write(android.join(format!("zipalign{}", EXE_SUFFIX)), "").unwrap();

        let tools = toolchain.android_tools().unwrap();
        assert_eq!(tools.source_folder(ApkType::Amazon), android.join("sourceAmazon"));
    }

    #[test]
    fn test_install_root_from_compiler_path() {
        assert_eq!(
            install_root_from_compiler_path("C:\\\\Games\\\\AGK\\\\Tier 1\\\\Compiler\\\\AGKCompiler.exe"),
            Some(PathBuf::from("C:\\Games\\AGK"))
        );
        assert_eq!(
            install_root_from_compiler_path("D:\\AGK\\tier 1\\COMPILER\\AGKCompiler.exe"),
            Some(PathBuf::from("D:\\AGK"))
        );
        assert_eq!(install_root_from_compiler_path("C:\\elsewhere\\agk.exe"), None);
    }
}
