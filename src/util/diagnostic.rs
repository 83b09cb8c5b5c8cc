//! User-friendly diagnostic messages.
//!
//! Every fatal error is rendered with its root cause, any captured tool
//! output, and a suggested fix.

use std::fmt;
use std::path::PathBuf;

/// Common suggestion messages for consistent error handling.
pub mod suggestions {
    /// Suggestion when CMake cannot be executed.
    pub const INSTALL_CMAKE: &str = "Install CMake and ensure `cmake` is on your PATH";

    /// Suggestion when a configure or build step fails.
    pub const BUILD_FAILED: &str = "help: Run `extforge build --verbose` for more details";

    /// Suggestion when an extension argument is malformed.
    pub const EXTENSION_SYNTAX: &str = "Pass extensions as `--ext <name>=<source-dir>`";

    /// Suggestion when no extensions are configured.
    pub const NO_EXTENSIONS: &str =
        "help: Add an `[[extension]]` table to .extforge/config.toml or pass `--ext`";
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic message with optional suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Primary message
    pub message: String,
    /// Severity level
    pub severity: Severity,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
    /// Related location (file path)
    pub location: Option<PathBuf>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Error,
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            ..Diagnostic::error(message)
        }
    }

    /// Add context to the diagnostic.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Add a suggestion for fixing the issue.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Add a file location.
    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Format the diagnostic for terminal output.
    ///
    /// Context lines are printed without decoration so captured tool
    /// output stays byte-for-byte readable.
    pub fn format(&self, color: bool) -> String {
        let mut output = String::new();

        let severity_str = match (color, self.severity) {
            (true, Severity::Error) => "\x1b[1;31merror\x1b[0m".to_string(),
            (true, Severity::Warning) => "\x1b[1;33mwarning\x1b[0m".to_string(),
            (false, severity) => severity.to_string(),
        };

        output.push_str(&format!("{}: {}\n", severity_str, self.message));

        if let Some(ref path) = self.location {
            output.push_str(&format!("  --> {}\n", path.display()));
        }

        for ctx in &self.context {
            output.push_str(ctx);
            output.push('\n');
        }

        if !self.suggestions.is_empty() {
            output.push('\n');
            for suggestion in &self.suggestions {
                if suggestion.starts_with("help:") {
                    output.push_str(&format!("{}\n", suggestion));
                } else {
                    output.push_str(&format!("help: {}\n", suggestion));
                }
            }
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_plain() {
        let diag = Diagnostic::error("configure step failed")
            .with_context("CMake Error at CMakeLists.txt:1")
            .with_suggestion("Install CMake");

        let text = diag.format(false);
        assert!(text.starts_with("error: configure step failed\n"));
        assert!(text.contains("\nCMake Error at CMakeLists.txt:1\n"));
        assert!(text.contains("help: Install CMake"));
    }

    #[test]
    fn test_help_prefix_not_doubled() {
        let diag = Diagnostic::warning("x").with_suggestion(suggestions::BUILD_FAILED);
        let text = diag.to_string();
        assert!(text.starts_with("warning: x"));
        assert!(!text.contains("help: help:"));
    }

    #[test]
    fn test_location() {
        let diag = Diagnostic::error("bad").with_location("/tmp/lib");
        assert!(diag.format(false).contains("  --> /tmp/lib"));
    }
}
