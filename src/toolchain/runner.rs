//! Running external tools.
//!
//! Every subprocess goes through a [`CommandRunner`] so exports can be
//! exercised without an AGK install. [`SystemRunner`] spawns real
//! processes; tests substitute a recording runner.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{AgkError, Result};

/// Flags whose following argument is a password.
const SECRET_FLAGS: &[&str] = &["-storepass", "-keypass"];

/// A fully described subprocess call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    /// Text written to the process's stdin.
    pub stdin: Option<String>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: vec![],
            cwd: None,
            stdin: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<std::ffi::OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        for arg in args {
            self = self.arg(arg);
        }
        self
    }

    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Arguments for display, with password values hidden.
    pub fn display_args(&self) -> String {
        let mut shown = Vec::with_capacity(self.args.len());
        let mut hide_next = false;
        for arg in &self.args {
            shown.push(if hide_next { "****" } else { arg.as_str() });
            hide_next = SECRET_FLAGS.contains(&arg.as_str());
        }
        shown.join(" ")
    }

    /// Program file name, for messages.
    pub fn tool_name(&self) -> String {
        self.program
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.display().to_string())
    }
}

/// What a finished process reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code; `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Fail with the tool's exit code unless it exited cleanly.
    pub fn check(self, tool: &str) -> Result<Self> {
        if self.success() {
            return Ok(self);
        }
        let output = [self.stderr.trim(), self.stdout.trim()]
            .into_iter()
            .find(|s| !s.is_empty())
            .unwrap_or("no output")
            .to_string();
        Err(AgkError::ToolFailed {
            tool: tool.to_string(),
            code: self.code,
            output,
        })
    }

    /// For tools that report errors on stdout and print nothing on
    /// success: any stdout is a failure, as is a non-zero exit.
    pub fn check_silent(self, tool: &str) -> Result<Self> {
        let reported = self.stdout.trim();
        if !reported.is_empty() {
            return Err(AgkError::ToolFailed {
                tool: tool.to_string(),
                code: self.code,
                output: reported.to_string(),
            });
        }
        self.check(tool)
    }
}

/// Runs one process to completion.
pub trait CommandRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<ToolOutput>;
}

/// Spawns real processes.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<ToolOutput> {
        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if invocation.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            });
        if let Some(cwd) = &invocation.cwd {
            command.current_dir(cwd);
        }

        let mut child = command.spawn().map_err(|e| AgkError::Io {
            path: invocation.program.clone(),
            message: format!("Failed to start {}: {}", invocation.tool_name(), e),
        })?;

        // Stdin is written while the output is drained.
        let stdin = child.stdin.take();
        let (written, output) = std::thread::scope(|scope| {
            let writer = scope.spawn(move || match (&invocation.stdin, stdin) {
                (Some(input), Some(mut stdin)) => stdin.write_all(input.as_bytes()),
                _ => Ok(()),
            });
            let output = child.wait_with_output();
            let written = writer.join().unwrap_or_else(|_| {
                Err(std::io::Error::other("stdin writer panicked"))
            });
            (written, output)
        });

        let output = output.map_err(|e| AgkError::Io {
            path: invocation.program.clone(),
            message: format!("Failed to wait for {}: {}", invocation.tool_name(), e),
        })?;
        // A tool may exit without reading all of its input.
        if let Err(e) = written {
            if e.kind() != std::io::ErrorKind::BrokenPipe {
                return Err(AgkError::Io {
                    path: invocation.program.clone(),
                    message: format!("Failed to write to {}: {}", invocation.tool_name(), e),
                });
            }
        }

        Ok(ToolOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_builder() {
        let inv = Invocation::new("/agk/Tier 1/Compiler/AGKCompiler.exe")
            .args(["-agk", "main.agc"])
            .cwd("/game");
        assert_eq!(inv.args, vec!["-agk", "main.agc"]);
        assert_eq!(inv.cwd, Some(PathBuf::from("/game")));
        assert_eq!(inv.tool_name(), "AGKCompiler");
    }

    #[test]
    fn test_display_args_hides_passwords() {
        let inv = Invocation::new("jarsigner").args([
            "-storepass",
            "hunter2",
            "-keystore",
            "game.keystore",
            "-keypass",
            "hunter3",
        ]);
        assert_eq!(
            inv.display_args(),
            "-storepass **** -keystore game.keystore -keypass ****"
        );
    }

    #[test]
    fn test_check_reports_exit_code() {
        let out = ToolOutput {
            code: Some(2),
            stdout: String::new(),
            stderr: "boom\n".to_string(),
        };
        let err = out.check("zipalign").unwrap_err();
        assert_eq!(err.exit_code(), Some(2));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_check_silent_fails_on_stdout() {
        let out = ToolOutput {
            code: Some(0),
            stdout: "main.agc:3: Error: Unexpected token\n".to_string(),
            stderr: String::new(),
        };
        let err = out.check_silent("AGKCompiler").unwrap_err();
        assert!(err.to_string().contains("Unexpected token"));
    }

    #[test]
    fn test_check_passes_success() {
        let out = ToolOutput {
            code: Some(0),
            ..Default::default()
        };
        assert!(out.check("x").is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_feeds_stdin() {
        let out = SystemRunner
            .run(&Invocation::new("cat").stdin("hello"))
            .unwrap();
        assert!(out.success());
        assert_eq!(out.stdout, "hello");
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_large_batch_echoed_to_stderr() {
        // Far larger than a pipe buffer in both directions.
        let batch = "compile\n-o\nresMerged\nres/values/values.xml\n\n".repeat(20_000);
        let out = SystemRunner
            .run(&Invocation::new("sh").args(["-c", "cat >&2"]).stdin(batch.clone()))
            .unwrap();
        assert!(out.success());
        assert_eq!(out.stderr.len(), batch.len());
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_missing_program() {
        let err = SystemRunner
            .run(&Invocation::new("/definitely/not/here"))
            .unwrap_err();
        assert!(matches!(err, AgkError::Io { .. }));
    }
}
