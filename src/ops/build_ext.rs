//! Build orchestration for native extensions.
//!
//! Runs, for each extension in order: argument generation, the CMake
//! configure step, then the build step. The tool is checked once up front;
//! if it cannot run, no extension is touched.
//!
//! ```text
//! Idle -> ToolChecked -> per extension: Configuring -> Building -> Done | Failed
//! ```
//!
//! Steps are blocking and sequential. There is no timeout and no retry:
//! a hung tool hangs the run, and retries are up to the caller.

use std::path::PathBuf;

use serde::Serialize;

use crate::builder::args::BUILD_TARGET;
use crate::builder::cmake::{BuildTool, ProcessResult};
use crate::builder::context::BuildContext;
use crate::builder::errors::{BuildError, BuildStep};
use crate::builder::events::BuildEvent;
use crate::core::extension::ExtensionDescriptor;

/// What to do with remaining extensions after one fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Stop at the first failure; later extensions are skipped.
    #[default]
    FailFast,
    /// Attempt every extension and report all failures.
    BestEffort,
}

impl std::str::FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fail-fast" => Ok(FailurePolicy::FailFast),
            "best-effort" => Ok(FailurePolicy::BestEffort),
            _ => Err(format!(
                "invalid failure policy '{}'; expected 'fail-fast' or 'best-effort'",
                s
            )),
        }
    }
}

/// Terminal state of one extension.
#[derive(Debug)]
pub enum TargetState {
    Done { artifact: PathBuf },
    Failed(BuildError),
    /// Not attempted because an earlier extension failed under fail-fast.
    Skipped,
}

/// Result for one extension.
#[derive(Debug)]
pub struct TargetOutcome {
    pub name: String,
    pub state: TargetState,
}

impl TargetOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self.state, TargetState::Done { .. })
    }

    /// Artifact path, when the extension was built.
    pub fn artifact(&self) -> Option<&PathBuf> {
        match self.state {
            TargetState::Done { ref artifact } => Some(artifact),
            _ => None,
        }
    }

    /// JSON event describing this outcome.
    pub fn to_event(&self) -> BuildEvent {
        let (step, exit_code, message) = match self.state {
            TargetState::Failed(ref e) => (e.step(), e.exit_code(), Some(e.to_string())),
            _ => (None, None, None),
        };
        BuildEvent::ExtensionFinished {
            name: self.name.clone(),
            success: self.is_done(),
            artifact: self.artifact().cloned(),
            skipped: matches!(self.state, TargetState::Skipped),
            step,
            exit_code,
            message,
        }
    }
}

/// A successfully built extension, as handed to the packaging layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuiltExtension {
    pub name: String,
    pub artifact: PathBuf,
}

/// Per-extension outcomes of one run, in build order.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub outcomes: Vec<TargetOutcome>,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(TargetOutcome::is_done)
    }

    pub fn built(&self) -> Vec<BuiltExtension> {
        self.outcomes
            .iter()
            .filter_map(|o| {
                o.artifact().map(|artifact| BuiltExtension {
                    name: o.name.clone(),
                    artifact: artifact.clone(),
                })
            })
            .collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = &BuildError> {
        self.outcomes.iter().filter_map(|o| match o.state {
            TargetState::Failed(ref e) => Some(e),
            _ => None,
        })
    }

    /// Convert into the built extensions, or the failure(s).
    pub fn into_result(self) -> Result<Vec<BuiltExtension>, BuildError> {
        let built = self.built();
        let mut errors: Vec<BuildError> = self
            .outcomes
            .into_iter()
            .filter_map(|o| match o.state {
                TargetState::Failed(e) => Some(e),
                _ => None,
            })
            .collect();

        match errors.len() {
            0 => Ok(built),
            1 => Err(errors.remove(0)),
            _ => Err(BuildError::Multiple(errors)),
        }
    }
}

/// Progress callbacks for the orchestrator.
pub trait BuildObserver {
    /// An external step is about to run.
    fn step_started(&self, _ext: &ExtensionDescriptor, _step: BuildStep) {}

    /// The external step finished (successfully or not).
    fn step_finished(&self, _ext: &ExtensionDescriptor, _step: BuildStep) {}

    /// An extension reached a terminal state.
    fn extension_finished(&self, _outcome: &TargetOutcome) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default)]
pub struct NoopObserver;

impl BuildObserver for NoopObserver {}

/// Configures and builds extensions with an external build tool.
pub struct BuildOrchestrator<'a, T: BuildTool> {
    tool: &'a T,
    ctx: &'a BuildContext,
    policy: FailurePolicy,
    observer: &'a dyn BuildObserver,
}

impl<'a, T: BuildTool> BuildOrchestrator<'a, T> {
    pub fn new(tool: &'a T, ctx: &'a BuildContext) -> Self {
        BuildOrchestrator {
            tool,
            ctx,
            policy: FailurePolicy::default(),
            observer: &NoopObserver,
        }
    }

    pub fn policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn observer(mut self, observer: &'a dyn BuildObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Build every extension in order.
    ///
    /// Returns `Err` only for run-level failures (tool unavailable, output
    /// directories not creatable). Per-extension failures are recorded in
    /// the report.
    pub fn run(&self, extensions: &[ExtensionDescriptor]) -> Result<BuildReport, BuildError> {
        if extensions.is_empty() {
            return Ok(BuildReport::default());
        }

        if !self.tool.check_available() {
            return Err(BuildError::ToolUnavailable {
                tool: self.tool.name(),
                targets: extensions.iter().map(|e| e.name().to_string()).collect(),
            });
        }

        self.ctx.layout.ensure()?;

        let mut report = BuildReport::default();
        let mut halted = false;

        for ext in extensions {
            let state = if halted {
                tracing::debug!("skipping `{}` after an earlier failure", ext.name());
                TargetState::Skipped
            } else {
                match self.build_extension(ext) {
                    Ok(artifact) => TargetState::Done { artifact },
                    Err(e) => {
                        tracing::debug!("`{}` failed: {}", ext.name(), e);
                        halted = self.policy == FailurePolicy::FailFast;
                        TargetState::Failed(e)
                    }
                }
            };

            let outcome = TargetOutcome {
                name: ext.name().to_string(),
                state,
            };
            self.observer.extension_finished(&outcome);
            report.outcomes.push(outcome);
        }

        Ok(report)
    }

    /// Configure then build one extension, returning its artifact path.
    pub fn build_extension(&self, ext: &ExtensionDescriptor) -> Result<PathBuf, BuildError> {
        let args = self.ctx.args().generate(ext)?;

        if !ext.has_cmake_lists() {
            tracing::warn!(
                "no CMakeLists.txt in {} for `{}`",
                ext.source_dir().display(),
                ext.name()
            );
        }

        let layout = &self.ctx.layout;
        let work_dir = layout.ensure_work_dir(ext)?;
        let env = self.ctx.options.configure_env();

        tracing::debug!("configuring `{}`", ext.name());
        self.observer.step_started(ext, BuildStep::Configure);
        let result = self
            .tool
            .configure(ext.source_dir(), &args.configure, &work_dir, &env);
        self.observer.step_finished(ext, BuildStep::Configure);
        check_step(BuildStep::Configure, ext, result)?;

        tracing::debug!("building `{}`", ext.name());
        self.observer.step_started(ext, BuildStep::Build);
        let result = self.tool.build(&work_dir, BUILD_TARGET, &args.build);
        self.observer.step_finished(ext, BuildStep::Build);
        check_step(BuildStep::Build, ext, result)?;

        Ok(layout.artifact_path(ext, self.ctx.host.os_family))
    }
}

/// Turn a step result into an error unless the tool exited with 0.
fn check_step(
    step: BuildStep,
    ext: &ExtensionDescriptor,
    result: anyhow::Result<ProcessResult>,
) -> Result<(), BuildError> {
    match result {
        Ok(res) if !res.failed() => Ok(()),
        Ok(res) => Err(BuildError::step_failed(step, ext.name(), res.exit_code, res.output)),
        Err(e) => Err(BuildError::step_failed(step, ext.name(), None, format!("{:#}", e))),
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use tempfile::TempDir;

    use super::*;
    use crate::builder::layout::OutputLayout;
    use crate::builder::options::BuildOptions;
    use crate::builder::platform::{HostFacts, OsFamily};
    use crate::test_support::{Invocation, RecordingTool};

    fn context(root: &Path, family: OsFamily) -> BuildContext {
        let options = BuildOptions {
            python: PathBuf::from("/usr/bin/python3"),
            ..Default::default()
        };
        BuildContext::new(
            HostFacts::new(family).with_cpus(4).with_pointer_width(64),
            options,
            OutputLayout::new(root),
            root,
        )
    }

    fn ext(root: &Path, name: &str) -> ExtensionDescriptor {
        ExtensionDescriptor::new(name, root.join(name)).unwrap()
    }

    #[test]
    fn test_success_runs_configure_then_build() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(tmp.path(), OsFamily::Linux);
        let tool = RecordingTool::new();

        let report = BuildOrchestrator::new(&tool, &ctx)
            .run(&[ext(tmp.path(), "core")])
            .unwrap();

        assert!(report.is_success());
        let built = report.into_result().unwrap();
        assert_eq!(built.len(), 1);
        assert_eq!(built[0].artifact, ctx.layout.module_dir.join("core.so"));

        let calls = tool.invocations();
        assert_eq!(calls.len(), 2);
        match &calls[0] {
            Invocation::Configure {
                source_dir,
                working_dir,
                args,
                ..
            } => {
                assert_eq!(source_dir, &tmp.path().join("core"));
                assert_eq!(working_dir, &ctx.layout.build_dir.join("temp").join("core"));
                assert!(args.contains(&"-DCMAKE_BUILD_TYPE=Release".to_string()));
            }
            other => panic!("expected configure, got {:?}", other),
        }
        match &calls[1] {
            Invocation::Build { target, args, .. } => {
                assert_eq!(target, BUILD_TARGET);
                assert_eq!(args, &vec!["--config", "Release", "--", "-j4"]);
            }
            other => panic!("expected build, got {:?}", other),
        }

        for dir in ctx.layout.dirs() {
            assert!(dir.is_dir());
        }
    }

    #[test]
    fn test_each_extension_gets_its_own_work_dir() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(tmp.path(), OsFamily::Linux);
        let tool = RecordingTool::new();

        BuildOrchestrator::new(&tool, &ctx)
            .run(&[ext(tmp.path(), "a"), ext(tmp.path(), "b")])
            .unwrap();

        let dirs: Vec<PathBuf> = tool
            .invocations()
            .into_iter()
            .map(|call| match call {
                Invocation::Configure { working_dir, .. } | Invocation::Build { working_dir, .. } => {
                    working_dir
                }
            })
            .collect();

        assert_eq!(dirs.len(), 4);
        // Configure and build of one extension share a directory.
        assert_eq!(dirs[0], dirs[1]);
        assert_eq!(dirs[2], dirs[3]);
        assert_ne!(dirs[0], dirs[2]);
        assert_eq!(dirs[0], ctx.layout.work_dir(&ext(tmp.path(), "a")));
        assert!(dirs[2].is_dir());
    }

    #[test]
    fn test_tool_unavailable_touches_nothing() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(tmp.path(), OsFamily::Linux);
        let tool = RecordingTool::unavailable();

        let err = BuildOrchestrator::new(&tool, &ctx)
            .run(&[ext(tmp.path(), "core"), ext(tmp.path(), "extra")])
            .unwrap_err();

        match err {
            BuildError::ToolUnavailable { targets, .. } => {
                assert_eq!(targets, vec!["core", "extra"]);
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(tool.invocations().is_empty());
        assert!(!ctx.layout.build_dir.exists());
    }

    #[test]
    fn test_configure_failure_skips_build() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(tmp.path(), OsFamily::Linux);
        let tool = RecordingTool::new().fail_configure("core", 1, "CMake Error: no compiler");

        let report = BuildOrchestrator::new(&tool, &ctx)
            .run(&[ext(tmp.path(), "core")])
            .unwrap();

        assert!(!report.is_success());
        assert_eq!(tool.invocations().len(), 1);
        assert!(tool
            .invocations()
            .iter()
            .all(|c| matches!(c, Invocation::Configure { .. })));

        let err = report.into_result().unwrap_err();
        assert_eq!(err.step(), Some(BuildStep::Configure));
        assert_eq!(err.exit_code(), Some(1));
        assert_eq!(err.tool_output(), Some("CMake Error: no compiler"));
    }

    #[test]
    fn test_build_failure_is_reported() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(tmp.path(), OsFamily::Linux);
        let tool = RecordingTool::new().fail_build("core", 2, "error: expected ';'");

        let report = BuildOrchestrator::new(&tool, &ctx)
            .run(&[ext(tmp.path(), "core")])
            .unwrap();

        let err = report.into_result().unwrap_err();
        assert!(matches!(err, BuildError::BuildFailed { exit_code: Some(2), .. }));
    }

    #[test]
    fn test_fail_fast_skips_remaining() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(tmp.path(), OsFamily::Linux);
        let tool = RecordingTool::new().fail_configure("a", 1, "");

        let report = BuildOrchestrator::new(&tool, &ctx)
            .run(&[ext(tmp.path(), "a"), ext(tmp.path(), "b")])
            .unwrap();

        assert!(matches!(report.outcomes[0].state, TargetState::Failed(_)));
        assert!(matches!(report.outcomes[1].state, TargetState::Skipped));
        assert_eq!(tool.invocations().len(), 1);
    }

    #[test]
    fn test_best_effort_attempts_all() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(tmp.path(), OsFamily::Linux);
        let tool = RecordingTool::new()
            .fail_configure("a", 1, "")
            .fail_build("c", 1, "");

        let report = BuildOrchestrator::new(&tool, &ctx)
            .policy(FailurePolicy::BestEffort)
            .run(&[ext(tmp.path(), "a"), ext(tmp.path(), "b"), ext(tmp.path(), "c")])
            .unwrap();

        assert!(report.outcomes[1].is_done());
        assert_eq!(report.failures().count(), 2);
        assert_eq!(report.built().len(), 1);
        assert!(matches!(report.into_result(), Err(BuildError::Multiple(ref e)) if e.len() == 2));
    }

    #[test]
    fn test_compiler_unresolved_spawns_nothing() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = context(tmp.path(), OsFamily::Darwin);
        ctx.options.c_compiler = Some(String::new());
        let tool = RecordingTool::new();

        let report = BuildOrchestrator::new(&tool, &ctx)
            .run(&[ext(tmp.path(), "core")])
            .unwrap();

        let err = report.into_result().unwrap_err();
        assert!(matches!(err, BuildError::CompilerUnresolved { language: "C", .. }));
        assert!(tool.invocations().is_empty());
    }

    #[test]
    fn test_spawn_error_is_configure_failure() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(tmp.path(), OsFamily::Linux);
        let tool = RecordingTool::new().spawn_error("core");

        let report = BuildOrchestrator::new(&tool, &ctx)
            .run(&[ext(tmp.path(), "core")])
            .unwrap();
        let err = report.into_result().unwrap_err();
        assert_eq!(err.step(), Some(BuildStep::Configure));
        assert_eq!(err.exit_code(), None);
    }

    #[test]
    fn test_windows_build_args() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = context(tmp.path(), OsFamily::Windows);
        ctx.options.debug = true;
        let tool = RecordingTool::new();

        let report = BuildOrchestrator::new(&tool, &ctx)
            .run(&[ext(tmp.path(), "core")])
            .unwrap();
        assert_eq!(
            report.built()[0].artifact,
            ctx.layout.module_dir.join("core.pyd")
        );

        match &tool.invocations()[1] {
            Invocation::Build { args, .. } => {
                assert_eq!(args, &vec!["--config", "Debug", "--", "/m"]);
            }
            other => panic!("expected build, got {:?}", other),
        }
    }

    #[test]
    fn test_configure_env_is_forwarded() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = context(tmp.path(), OsFamily::Linux);
        ctx.options.version_info = Some("1.2.3".into());
        let tool = RecordingTool::new();

        BuildOrchestrator::new(&tool, &ctx)
            .run(&[ext(tmp.path(), "core")])
            .unwrap();

        match &tool.invocations()[0] {
            Invocation::Configure { env, .. } => {
                assert_eq!(env.len(), 1);
                assert_eq!(env[0].0, "CXXFLAGS");
                assert!(env[0].1.contains("VERSION_INFO"));
            }
            other => panic!("expected configure, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_run() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(tmp.path(), OsFamily::Linux);
        let tool = RecordingTool::unavailable();
        let report = BuildOrchestrator::new(&tool, &ctx).run(&[]).unwrap();
        assert!(report.is_success());
    }

    #[test]
    fn test_outcome_events() {
        let outcome = TargetOutcome {
            name: "core".into(),
            state: TargetState::Failed(BuildError::step_failed(
                BuildStep::Build,
                "core",
                Some(2),
                "",
            )),
        };
        let json = outcome.to_event().to_json();
        assert!(json.contains("\"success\":false"));
        assert!(json.contains("\"step\":\"build\""));

        let skipped = TargetOutcome {
            name: "b".into(),
            state: TargetState::Skipped,
        };
        assert!(skipped.to_event().to_json().contains("\"skipped\":true"));
    }

    #[test]
    fn test_parse_policy() {
        assert_eq!("fail-fast".parse::<FailurePolicy>().unwrap(), FailurePolicy::FailFast);
        assert_eq!("Best-Effort".parse::<FailurePolicy>().unwrap(), FailurePolicy::BestEffort);
        assert!("retry".parse::<FailurePolicy>().is_err());
    }
}
