//! CMake invocation.
//!
//! The orchestrator talks to CMake through the [`BuildTool`] trait so the
//! step sequencing can be tested without a real toolchain.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::util::process::{combined_output, find_cmake, ProcessBuilder};

/// Outcome of one external tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    /// Captured stdout and stderr.
    pub output: String,
}

impl ProcessResult {
    pub fn success(output: impl Into<String>) -> Self {
        ProcessResult {
            exit_code: Some(0),
            output: output.into(),
        }
    }

    pub fn failure(exit_code: i32, output: impl Into<String>) -> Self {
        ProcessResult {
            exit_code: Some(exit_code),
            output: output.into(),
        }
    }

    pub fn failed(&self) -> bool {
        self.exit_code != Some(0)
    }
}

/// An external build tool with a configure and a build step.
pub trait BuildTool {
    /// Name used in diagnostics.
    fn name(&self) -> String;

    /// Whether the tool can be executed at all.
    fn check_available(&self) -> bool;

    /// Run `<tool> <source_dir> <args...>` inside `working_dir`.
    ///
    /// `env` entries are layered over the inherited environment.
    fn configure(
        &self,
        source_dir: &Path,
        args: &[String],
        working_dir: &Path,
        env: &[(String, String)],
    ) -> Result<ProcessResult>;

    /// Run `<tool> --build . --target <target> <args...>` inside `working_dir`.
    fn build(&self, working_dir: &Path, target: &str, args: &[String]) -> Result<ProcessResult>;
}

/// The real CMake executable.
#[derive(Debug, Clone)]
pub struct CMakeTool {
    program: PathBuf,
}

impl CMakeTool {
    /// Use `cmake` from PATH.
    pub fn new() -> Self {
        CMakeTool {
            program: find_cmake().unwrap_or_else(|| PathBuf::from("cmake")),
        }
    }

    /// Use a specific CMake executable.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        CMakeTool {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn run(&self, cmd: ProcessBuilder) -> Result<ProcessResult> {
        tracing::debug!("running `{}`", cmd.display_command());
        let output = cmd.exec()?;
        let result = ProcessResult {
            exit_code: output.status.code(),
            output: combined_output(&output),
        };
        if !result.output.is_empty() {
            tracing::debug!("{}", result.output.trim_end());
        }
        Ok(result)
    }
}

impl Default for CMakeTool {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildTool for CMakeTool {
    fn name(&self) -> String {
        self.program
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "cmake".to_string())
    }

    fn check_available(&self) -> bool {
        match ProcessBuilder::new(&self.program).arg("--version").exec_and_check() {
            Ok(output) => {
                let version = String::from_utf8_lossy(&output.stdout);
                tracing::debug!("found {}", version.lines().next().unwrap_or("cmake"));
                true
            }
            Err(e) => {
                tracing::debug!("cmake unavailable: {:#}", e);
                false
            }
        }
    }

    fn configure(
        &self,
        source_dir: &Path,
        args: &[String],
        working_dir: &Path,
        env: &[(String, String)],
    ) -> Result<ProcessResult> {
        let cmd = ProcessBuilder::new(&self.program)
            .arg(source_dir)
            .args(args)
            .envs(env.iter().map(|(k, v)| (k, v)))
            .cwd(working_dir);
        self.run(cmd)
    }

    fn build(&self, working_dir: &Path, target: &str, args: &[String]) -> Result<ProcessResult> {
        let cmd = ProcessBuilder::new(&self.program)
            .args(["--build", ".", "--target", target])
            .args(args)
            .cwd(working_dir);
        self.run(cmd)
    }
}
