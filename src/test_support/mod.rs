//! Test utilities and mocks for extforge unit tests.
//!
//! `RecordingTool` stands in for CMake: it records every invocation and
//! answers with scripted results keyed by the extension's source directory
//! name.
//!
//! # Example
//!
//! ```rust,ignore
//! let tool = RecordingTool::new().fail_configure("core", 1, "CMake Error");
//! let report = BuildOrchestrator::new(&tool, &ctx).run(&extensions)?;
//! assert_eq!(tool.invocations().len(), 1);
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{bail, Result};

use crate::builder::cmake::{BuildTool, ProcessResult};
use crate::builder::errors::BuildStep;

/// One recorded call into the tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Configure {
        source_dir: PathBuf,
        args: Vec<String>,
        working_dir: PathBuf,
        env: Vec<(String, String)>,
    },
    Build {
        working_dir: PathBuf,
        target: String,
        args: Vec<String>,
    },
}

#[derive(Debug, Clone)]
enum Scripted {
    Exit(ProcessResult),
    SpawnError,
}

/// Mock build tool that records invocations.
#[derive(Debug, Default)]
pub struct RecordingTool {
    available: bool,
    invocations: Mutex<Vec<Invocation>>,
    scripted: HashMap<(String, BuildStep), Scripted>,
    /// Source dir name of the most recent configure, used to key build results.
    current: Mutex<Option<String>>,
}

impl RecordingTool {
    /// A tool where every step succeeds.
    pub fn new() -> Self {
        RecordingTool {
            available: true,
            ..Default::default()
        }
    }

    /// A tool that fails the availability check.
    pub fn unavailable() -> Self {
        RecordingTool::default()
    }

    /// Make the configure step for `name` exit with `code`.
    pub fn fail_configure(mut self, name: &str, code: i32, output: &str) -> Self {
        self.scripted.insert(
            (name.to_string(), BuildStep::Configure),
            Scripted::Exit(ProcessResult::failure(code, output)),
        );
        self
    }

    /// Make the build step for `name` exit with `code`.
    pub fn fail_build(mut self, name: &str, code: i32, output: &str) -> Self {
        self.scripted.insert(
            (name.to_string(), BuildStep::Build),
            Scripted::Exit(ProcessResult::failure(code, output)),
        );
        self
    }

    /// Make the configure step for `name` fail to spawn.
    pub fn spawn_error(mut self, name: &str) -> Self {
        self.scripted
            .insert((name.to_string(), BuildStep::Configure), Scripted::SpawnError);
        self
    }

    /// All invocations so far, in order.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn record(&self, invocation: Invocation) {
        if let Ok(mut calls) = self.invocations.lock() {
            calls.push(invocation);
        }
    }

    fn answer(&self, name: &str, step: BuildStep) -> Result<ProcessResult> {
        match self.scripted.get(&(name.to_string(), step)) {
            Some(Scripted::Exit(result)) => Ok(result.clone()),
            Some(Scripted::SpawnError) => bail!("failed to spawn `cmake`"),
            None => Ok(ProcessResult::success("")),
        }
    }
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl BuildTool for RecordingTool {
    fn name(&self) -> String {
        "cmake".to_string()
    }

    fn check_available(&self) -> bool {
        self.available
    }

    fn configure(
        &self,
        source_dir: &Path,
        args: &[String],
        working_dir: &Path,
        env: &[(String, String)],
    ) -> Result<ProcessResult> {
        self.record(Invocation::Configure {
            source_dir: source_dir.to_path_buf(),
            args: args.to_vec(),
            working_dir: working_dir.to_path_buf(),
            env: env.to_vec(),
        });
        let name = dir_name(source_dir);
        if let Ok(mut current) = self.current.lock() {
            *current = Some(name.clone());
        }
        self.answer(&name, BuildStep::Configure)
    }

    fn build(&self, working_dir: &Path, target: &str, args: &[String]) -> Result<ProcessResult> {
        self.record(Invocation::Build {
            working_dir: working_dir.to_path_buf(),
            target: target.to_string(),
            args: args.to_vec(),
        });
        let name = self
            .current
            .lock()
            .ok()
            .and_then(|current| current.clone())
            .unwrap_or_default();
        self.answer(&name, BuildStep::Build)
    }
}
