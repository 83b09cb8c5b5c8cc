//! `extforge args` command
//!
//! Prints the CMake invocations a build would run, without running them.
//! `--host-os`, `--cpus` and `--pointer-width` stand in for the probed
//! host so other platforms can be inspected.

use anyhow::Result;

use extforge::builder::args::BUILD_TARGET;
use extforge::builder::EnvSnapshot;
use extforge::util::shell::Shell;
use extforge::{BuildContext, GlobalContext, HostFacts};

use crate::cli::ArgsArgs;
use crate::commands::resolve_extensions;

pub fn execute(args: ArgsArgs, shell: &Shell) -> Result<()> {
    let gctx = GlobalContext::new()?;
    let config = gctx.load_config();
    let root = gctx.cwd();

    let extensions = resolve_extensions(&args.flags, &config, root)?;

    let mut host = match args.host_os {
        Some(family) => HostFacts::new(family),
        None => HostFacts::probe(),
    };
    if let Some(cpus) = args.cpus {
        host = host.with_cpus(cpus);
    }
    if let Some(bits) = args.pointer_width {
        host = host.with_pointer_width(bits);
    }

    let env = EnvSnapshot::capture();
    let ctx = BuildContext::resolve(
        root,
        host,
        &args.flags.overrides(),
        &env,
        &config,
        args.flags.module_dir.as_deref(),
    );
    let cxx_env = ctx.options.configure_env();

    for ext in &extensions {
        let cmake_args = ctx.args().generate(ext)?;

        if shell.is_json() {
            let value = serde_json::json!({
                "reason": "extension-args",
                "name": ext.name(),
                "source_dir": ext.source_dir(),
                "working_dir": ctx.layout.work_dir(ext),
                "configure": cmake_args.configure,
                "build": cmake_args.build,
                "env": cxx_env.iter().cloned().collect::<std::collections::BTreeMap<_, _>>(),
                "artifact": ctx.layout.artifact_path(ext, ctx.host.os_family),
            });
            println!("{}", value);
            continue;
        }

        println!("[{}]", ext.name());
        println!("working dir: {}", ctx.layout.work_dir(ext).display());
        for (key, value) in &cxx_env {
            println!("env: {}={}", key, value);
        }
        println!(
            "configure: cmake {} {}",
            ext.source_dir().display(),
            cmake_args.configure.join(" ")
        );
        println!(
            "build: cmake --build . --target {} {}",
            BUILD_TARGET,
            cmake_args.build.join(" ")
        );
        println!(
            "artifact: {}",
            ctx.layout
                .artifact_path(ext, ctx.host.os_family)
                .display()
        );
    }
    Ok(())
}
