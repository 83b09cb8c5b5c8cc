//! extforge CLI - CMake build orchestration for native extension modules

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use extforge::util::shell::Shell;
use extforge::BuildError;

use crate::cli::{Cli, Commands, MessageFormat};

fn main() {
    let cli = Cli::parse();
    let shell = Shell::from_flags(
        cli.quiet,
        cli.verbose,
        cli.color,
        cli.message_format == MessageFormat::Json,
    );

    // Logs go to stderr so that JSON events on stdout stay parseable
    let filter = if cli.verbose {
        EnvFilter::new("extforge=debug")
    } else if cli.quiet || shell.is_json() {
        EnvFilter::new("extforge=error")
    } else {
        EnvFilter::new("extforge=info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    if let Err(e) = run(cli.command, &shell) {
        report_error(&shell, &e);
        std::process::exit(1);
    }
}

fn run(command: Commands, shell: &Shell) -> Result<()> {
    match command {
        Commands::Build(args) => commands::build::execute(args, shell),
        Commands::Args(args) => commands::args::execute(args, shell),
        Commands::Probe => commands::probe::execute(shell),
        Commands::Clean(args) => commands::clean::execute(args, shell),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}

fn report_error(shell: &Shell, err: &anyhow::Error) {
    let Some(build_err) = err.downcast_ref::<BuildError>() else {
        if shell.is_json() {
            shell.error(format!("{:#}", err));
        } else {
            eprintln!("error: {:#}", err);
        }
        return;
    };

    if shell.is_json() {
        shell.error(build_err);
        return;
    }

    // Each failure carries its own captured output
    if let BuildError::Multiple(errors) = build_err {
        for inner in errors {
            eprint!("{}", inner.to_diagnostic().format(shell.use_color()));
        }
    }
    eprint!("{}", build_err.to_diagnostic().format(shell.use_color()));
}
