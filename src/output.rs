//! Terminal output formatting for agkbuild.
//!
//! Cargo-style status lines with right-aligned coloured verbs. All status
//! output goes to stderr; stdout is reserved for machine-readable output
//! such as `agkbuild plan --json`.

use std::io::{self, IsTerminal, Write};
use std::path::Path;

/// ANSI escape codes.
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";

/// Width for right-aligned verb column.
const VERB_WIDTH: usize = 12;

/// How much status output to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// Warnings and errors only.
    Quiet,
    #[default]
    Normal,
    /// Also print every external tool invocation.
    Verbose,
}

/// Terminal-aware status printer.
///
/// Prints Cargo-style status lines to stderr with optional ANSI colours.
/// Colour is enabled when stderr is a terminal.
pub struct Printer {
    color: bool,
    verbosity: Verbosity,
}

impl Default for Printer {
    fn default() -> Self {
        Self::new()
    }
}

impl Printer {
    /// Create a printer, auto-detecting colour support.
    pub fn new() -> Self {
        Self {
            color: io::stderr().is_terminal(),
            verbosity: Verbosity::Normal,
        }
    }

    /// Set how much gets printed.
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// The current verbosity level.
    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// Print a status line with a green bold verb.
    /// e.g. "   Exporting MyGame for windows x86"
    pub fn status(&self, verb: &str, message: &str) {
        if self.verbosity > Verbosity::Quiet {
            self.print_line(GREEN, verb, message);
        }
    }

    /// Print a success/completion line with a green bold verb.
    pub fn success(&self, verb: &str, message: &str) {
        if self.verbosity > Verbosity::Quiet {
            self.print_line(GREEN, verb, message);
        }
    }

    /// Print an informational line with a cyan bold verb.
    pub fn info(&self, verb: &str, message: &str) {
        if self.verbosity > Verbosity::Quiet {
            self.print_line(CYAN, verb, message);
        }
    }

    /// Print a dim detail line, only with `--verbose`.
    pub fn detail(&self, verb: &str, message: &str) {
        if self.verbosity >= Verbosity::Verbose {
            self.print_line(DIM, verb, message);
        }
    }

    /// Print a warning line with a yellow bold verb. Shown even when quiet.
    pub fn warning(&self, verb: &str, message: &str) {
        self.print_line(YELLOW, verb, message);
    }

    /// Print an error line with a red bold verb. Shown even when quiet.
    pub fn error(&self, verb: &str, message: &str) {
        self.print_line(RED, verb, message);
    }

    /// Format a string as dim/grey.
    pub fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    /// Format a string as bold.
    pub fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    /// Format a string as cyan (for paths and artifacts).
    pub fn cyan(&self, text: &str) -> String {
        self.paint(CYAN, text)
    }

    /// Format a diagnostic severity label with colour.
    pub fn severity(&self, label: &str, is_error: bool) -> String {
        let color = if is_error { RED } else { YELLOW };
        if self.color {
            format!("{BOLD}{color}{label}{RESET}")
        } else {
            label.to_string()
        }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.color {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn print_line(&self, color: &str, verb: &str, message: &str) {
        let mut stderr = io::stderr().lock();
        if self.color {
            let _ = writeln!(
                stderr,
                "{BOLD}{color}{verb:>VERB_WIDTH$}{RESET} {message}"
            );
        } else {
            let _ = writeln!(stderr, "{verb:>VERB_WIDTH$} {message}");
        }
    }
}

/// Pluralize a count: `plural(1, "release", "releases")` → "1 release".
pub fn plural(n: usize, singular: &str, pluralized: &str) -> String {
    if n == 1 {
        format!("{} {}", n, singular)
    } else {
        format!("{} {}", n, pluralized)
    }
}

/// Return a relative display path when possible, absolute otherwise.
pub fn display_path(path: &Path) -> String {
    if let Ok(cwd) = std::env::current_dir() {
        if let Ok(relative) = path.strip_prefix(&cwd) {
            let s = relative.display().to_string();
            if s.is_empty() {
                return ".".to_string();
            }
            return s;
        }
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plural() {
        assert_eq!(plural(1, "release", "releases"), "1 release");
        assert_eq!(plural(0, "target", "targets"), "0 targets");
        assert_eq!(plural(3, "target", "targets"), "3 targets");
    }

    #[test]
    fn test_display_path_absolute() {
        let p = Path::new("/nonexistent/path/to/file");
        assert_eq!(display_path(p), "/nonexistent/path/to/file");
    }

    #[test]
    fn test_verbosity_order() {
        assert!(Verbosity::Quiet < Verbosity::Normal);
        assert!(Verbosity::Normal < Verbosity::Verbose);
        let printer = Printer::new().with_verbosity(Verbosity::Quiet);
        assert_eq!(printer.verbosity(), Verbosity::Quiet);
    }
}
