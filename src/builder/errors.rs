//! Build error types and diagnostics.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// The external step a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildStep {
    Configure,
    Build,
}

impl fmt::Display for BuildStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildStep::Configure => write!(f, "configure"),
            BuildStep::Build => write!(f, "build"),
        }
    }
}

/// Error during extension configuration or build.
///
/// Probe failures never show up here: the CPU probe degrades to an
/// unspecified job count instead.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("`{tool}` must be installed to build the following extensions: {}", .targets.join(", "))]
    ToolUnavailable { tool: String, targets: Vec<String> },

    #[error("no {language} compiler could be determined for extension `{target}`")]
    CompilerUnresolved {
        language: &'static str,
        target: String,
    },

    #[error("configure step failed for extension `{target}` ({})", describe_exit(.exit_code))]
    ConfigureFailed {
        target: String,
        exit_code: Option<i32>,
        output: String,
    },

    #[error("build step failed for extension `{target}` ({})", describe_exit(.exit_code))]
    BuildFailed {
        target: String,
        exit_code: Option<i32>,
        output: String,
    },

    #[error("filesystem error at {}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid extension `{name}`: {reason}")]
    InvalidExtension { name: String, reason: String },

    #[error("{} extensions failed to build", .0.len())]
    Multiple(Vec<BuildError>),
}

fn describe_exit(code: &Option<i32>) -> String {
    match *code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code".to_string(),
    }
}

impl BuildError {
    /// Create a step failure for the given step.
    pub fn step_failed(
        step: BuildStep,
        target: impl Into<String>,
        exit_code: Option<i32>,
        output: impl Into<String>,
    ) -> Self {
        let target = target.into();
        let output = output.into();
        match step {
            BuildStep::Configure => BuildError::ConfigureFailed {
                target,
                exit_code,
                output,
            },
            BuildStep::Build => BuildError::BuildFailed {
                target,
                exit_code,
                output,
            },
        }
    }

    /// The extension this error belongs to, if it is target-specific.
    pub fn target(&self) -> Option<&str> {
        match self {
            BuildError::CompilerUnresolved { target, .. }
            | BuildError::ConfigureFailed { target, .. }
            | BuildError::BuildFailed { target, .. } => Some(target),
            BuildError::InvalidExtension { name, .. } => Some(name),
            BuildError::ToolUnavailable { .. }
            | BuildError::Filesystem { .. }
            | BuildError::Multiple(_) => None,
        }
    }

    /// The failed external step, if any.
    pub fn step(&self) -> Option<BuildStep> {
        match self {
            BuildError::ConfigureFailed { .. } => Some(BuildStep::Configure),
            BuildError::BuildFailed { .. } => Some(BuildStep::Build),
            _ => None,
        }
    }

    /// The exit code of the failed external step, if one was observed.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            BuildError::ConfigureFailed { exit_code, .. }
            | BuildError::BuildFailed { exit_code, .. } => *exit_code,
            _ => None,
        }
    }

    /// Captured output of the external tool.
    pub fn tool_output(&self) -> Option<&str> {
        match self {
            BuildError::ConfigureFailed { output, .. } | BuildError::BuildFailed { output, .. } => {
                Some(output)
            }
            _ => None,
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            BuildError::ToolUnavailable { tool, targets } => {
                Diagnostic::error(self.to_string())
                    .with_context(format!("`{} --version` could not be executed", tool))
                    .with_context(format!("pending extensions: {}", targets.join(", ")))
                    .with_suggestion(suggestions::INSTALL_CMAKE)
            }

            BuildError::CompilerUnresolved { language, .. } => {
                let var = if *language == "C" {
                    "C_COMPILER"
                } else {
                    "CXX_COMPILER"
                };
                Diagnostic::error(self.to_string())
                    .with_context(format!("the {} compiler override is empty", language))
                    .with_suggestion(format!("Unset `{}` or set it to a compiler command", var))
            }

            BuildError::ConfigureFailed { output, .. } | BuildError::BuildFailed { output, .. } => {
                let mut diag = Diagnostic::error(self.to_string());
                for line in output.lines() {
                    diag = diag.with_context(line);
                }
                diag.with_suggestion(suggestions::BUILD_FAILED)
            }

            BuildError::Filesystem { path, source } => Diagnostic::error(self.to_string())
                .with_location(path.clone())
                .with_context(source.to_string()),

            BuildError::InvalidExtension { .. } => Diagnostic::error(self.to_string())
                .with_suggestion(suggestions::EXTENSION_SYNTAX),

            BuildError::Multiple(errors) => {
                let mut diag = Diagnostic::error(self.to_string());
                for error in errors {
                    diag = diag.with_context(error.to_string());
                }
                diag
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_unavailable_names_all_targets() {
        let err = BuildError::ToolUnavailable {
            tool: "cmake".into(),
            targets: vec!["core".into(), "extra".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("cmake"));
        assert!(msg.contains("core, extra"));
        assert_eq!(err.target(), None);
    }

    #[test]
    fn test_step_failed_constructor() {
        let err = BuildError::step_failed(BuildStep::Configure, "core", Some(2), "boom");
        assert!(matches!(err, BuildError::ConfigureFailed { .. }));
        assert_eq!(err.step(), Some(BuildStep::Configure));
        assert_eq!(err.exit_code(), Some(2));
        assert_eq!(err.target(), Some("core"));
        assert_eq!(err.tool_output(), Some("boom"));
        assert!(err.to_string().contains("exit code 2"));

        let err = BuildError::step_failed(BuildStep::Build, "core", None, "");
        assert_eq!(err.step(), Some(BuildStep::Build));
        assert!(err.to_string().contains("no exit code"));
    }

    #[test]
    fn test_diagnostic_keeps_tool_output_verbatim() {
        let err = BuildError::step_failed(
            BuildStep::Build,
            "core",
            Some(1),
            "src/a.cpp:3: error: expected ';'\nmake: *** [all] Error 2",
        );
        let diag = err.to_diagnostic();
        assert!(diag
            .context
            .iter()
            .any(|line| line == "src/a.cpp:3: error: expected ';'"));
        assert!(diag.context.iter().any(|line| line == "make: *** [all] Error 2"));
    }
}
