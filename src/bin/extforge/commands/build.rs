//! `extforge build` command
//!
//! Configures and builds every extension, then reports where the
//! artifacts landed.

use std::time::Instant;

use anyhow::Result;

use extforge::builder::events::BuildEvent;
use extforge::builder::{BuildStep, EnvSnapshot};
use extforge::ops::build_ext::{BuildObserver, TargetOutcome, TargetState};
use extforge::util::shell::{Shell, Status};
use extforge::{
    BuildContext, BuildOrchestrator, CMakeTool, ExtensionDescriptor, GlobalContext, HostFacts,
};

use crate::cli::BuildArgs;
use crate::commands::resolve_extensions;

pub fn execute(args: BuildArgs, shell: &Shell) -> Result<()> {
    let gctx = GlobalContext::new()?;
    let config = gctx.load_config();
    let root = gctx.cwd();

    let extensions = resolve_extensions(&args.flags, &config, root)?;

    let env = EnvSnapshot::capture();
    let ctx = BuildContext::resolve(
        root,
        HostFacts::probe(),
        &args.flags.overrides(),
        &env,
        &config,
        args.flags.module_dir.as_deref(),
    );
    let configured = config.policy()?;
    let policy = args.policy.or(configured).unwrap_or_default();

    let tool = match args.cmake {
        Some(program) => CMakeTool::with_program(program),
        None => CMakeTool::new(),
    };

    let observer = ShellObserver { shell };
    let start = Instant::now();
    let result = BuildOrchestrator::new(&tool, &ctx)
        .policy(policy)
        .observer(&observer)
        .run(&extensions);
    shell.finish_spinner();
    let report = result?;

    let elapsed = start.elapsed();
    let built = report.built().len();
    shell.event(&BuildEvent::BuildFinished {
        success: report.is_success(),
        duration_ms: elapsed.as_millis() as u64,
        extensions_built: built as u64,
    });

    report.into_result()?;

    shell.status(
        Status::Finished,
        format!(
            "{} extension{} in {:.2}s",
            built,
            if built == 1 { "" } else { "s" },
            elapsed.as_secs_f64()
        ),
    );
    Ok(())
}

/// Drives status lines, the spinner, and JSON events from orchestrator
/// progress.
struct ShellObserver<'a> {
    shell: &'a Shell,
}

impl BuildObserver for ShellObserver<'_> {
    fn step_started(&self, ext: &ExtensionDescriptor, step: BuildStep) {
        let status = match step {
            BuildStep::Configure => Status::Configuring,
            BuildStep::Build => Status::Building,
        };
        self.shell.status(status, ext.name());
        self.shell.start_spinner(format!("{} {}", step, ext.name()));
    }

    fn step_finished(&self, _ext: &ExtensionDescriptor, _step: BuildStep) {
        self.shell.finish_spinner();
    }

    fn extension_finished(&self, outcome: &TargetOutcome) {
        self.shell.event(&outcome.to_event());

        match outcome.state {
            TargetState::Done { ref artifact } => self.shell.status(
                Status::Finished,
                format!("{} -> {}", outcome.name, artifact.display()),
            ),
            TargetState::Skipped => self.shell.status(
                Status::Skipped,
                format!("{} (an earlier extension failed)", outcome.name),
            ),
            // Reported with its captured output once the run is over
            TargetState::Failed(_) => {}
        }
    }
}
