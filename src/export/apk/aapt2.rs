//! aapt2 daemon batches.
//!
//! `aapt2 m` reads commands from stdin, one argument per line, with a
//! blank line ending each command. It reports progress and errors on
//! stderr, printing `Done` after each command and `Error` when one fails.

use std::path::Path;

use crate::error::{AgkError, Result};
use crate::toolchain::ToolOutput;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aapt2Batch {
    script: String,
}

impl Aapt2Batch {
    pub fn new() -> Self {
        Self::default()
    }

    fn command<I, S>(&mut self, args: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for arg in args {
            self.script.push_str(arg.as_ref());
            self.script.push('\n');
        }
        self.script.push('\n');
    }

    /// Compile one resource into `resMerged`.
    pub fn compile(&mut self, resource: &Path) {
        let resource = resource.display().to_string();
        self.command(["compile", "-o", "resMerged", resource.as_str()]);
    }

    /// Link the compiled resources into an unsigned package.
    pub fn link(&mut self, android_jar: &Path, manifest: &Path, output: &Path, compiled: &[impl AsRef<Path>]) {
        let mut args = vec![
            "l".to_string(),
            "-I".to_string(),
            android_jar.display().to_string(),
            "--manifest".to_string(),
            manifest.display().to_string(),
            "-o".to_string(),
            output.display().to_string(),
            "--auto-add-overlay".to_string(),
            "--no-version-vectors".to_string(),
        ];
        for file in compiled {
            args.push("-R".to_string());
            args.push(file.as_ref().display().to_string());
        }
        self.command(args);
    }

    pub fn is_empty(&self) -> bool {
        self.script.is_empty()
    }

    /// The stdin script, ending with `quit`.
    pub fn finish(mut self) -> String {
        self.command(["quit"]);
        self.script
    }
}

/// Fail when aapt2 reported anything other than progress.
pub fn check_output(output: &ToolOutput) -> Result<()> {
    let lines: Vec<&str> = output
        .stderr
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let errors: Vec<&str> = lines
        .iter()
        .copied()
        .filter(|l| *l != "Error" && *l != "Done")
        .collect();

    if !errors.is_empty() || lines.contains(&"Error") || !output.success() {
        let message = if errors.is_empty() {
            "unspecified error".to_string()
        } else {
            errors.join("\n")
        };
        return Err(AgkError::ToolFailed {
            tool: "aapt2".to_string(),
            code: output.code,
            output: message,
        });
    }
    Ok(())
}
