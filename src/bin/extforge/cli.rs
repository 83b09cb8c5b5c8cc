//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell as CompletionShell;

use extforge::builder::OptionOverrides;
use extforge::util::shell::ColorChoice;
use extforge::{ExtensionDescriptor, FailurePolicy, OsFamily};

/// extforge - CMake build orchestration for native extension modules
#[derive(Parser)]
#[command(name = "extforge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Coloring: auto, always, never
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Output format for messages: human, json
    #[arg(long, global = true, default_value = "human")]
    pub message_format: MessageFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum MessageFormat {
    Human,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Configure and build native extensions with CMake
    Build(BuildArgs),

    /// Print the CMake arguments without running anything
    Args(ArgsArgs),

    /// Show detected host facts
    Probe,

    /// Remove build outputs
    Clean(CleanArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Options shared by `build` and `args`.
#[derive(Args)]
pub struct BuildFlags {
    /// Extension to build, as `name=source-dir` (repeatable)
    #[arg(long = "ext", value_name = "NAME=DIR")]
    pub extensions: Vec<ExtensionDescriptor>,

    /// Build with the Debug configuration
    #[arg(short, long, conflicts_with = "release")]
    pub debug: bool,

    /// Build with the Release configuration, even if config selects Debug
    #[arg(long)]
    pub release: bool,

    /// Optimization flags for the compiler (overrides OPT_FLAGS)
    #[arg(short, long, allow_hyphen_values = true)]
    pub opt_flags: Option<String>,

    /// C compiler (overrides C_COMPILER)
    #[arg(long)]
    pub c_compiler: Option<String>,

    /// C++ compiler (overrides CXX_COMPILER)
    #[arg(long)]
    pub cxx_compiler: Option<String>,

    /// Hardware-acceleration backend selector (overrides USE_GPU)
    #[arg(long)]
    pub gpu: Option<String>,

    /// Parallel-execution backend selector (overrides USE_OMP)
    #[arg(long)]
    pub omp: Option<String>,

    /// Interpreter executable (overrides PYTHON_EXECUTABLE)
    #[arg(long)]
    pub python: Option<PathBuf>,

    /// Version string compiled in as VERSION_INFO
    #[arg(long)]
    pub version_info: Option<String>,

    /// Directory for built extension modules
    #[arg(long)]
    pub module_dir: Option<PathBuf>,
}

impl BuildFlags {
    pub fn overrides(&self) -> OptionOverrides {
        OptionOverrides {
            debug: match (self.debug, self.release) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            },
            opt_flags: self.opt_flags.clone(),
            c_compiler: self.c_compiler.clone(),
            cxx_compiler: self.cxx_compiler.clone(),
            gpu_backend: self.gpu.clone(),
            omp_backend: self.omp.clone(),
            python: self.python.clone(),
            version_info: self.version_info.clone(),
        }
    }
}

#[derive(Args)]
pub struct BuildArgs {
    #[command(flatten)]
    pub flags: BuildFlags,

    /// What to do after a failure: fail-fast, best-effort
    #[arg(long, env = "EXTFORGE_POLICY")]
    pub policy: Option<FailurePolicy>,

    /// CMake executable
    #[arg(long, value_name = "PATH")]
    pub cmake: Option<PathBuf>,
}

#[derive(Args)]
pub struct ArgsArgs {
    #[command(flatten)]
    pub flags: BuildFlags,

    /// Generate for this OS family instead of the host
    #[arg(long)]
    pub host_os: Option<OsFamily>,

    /// Assume this many logical CPUs instead of probing
    #[arg(long)]
    pub cpus: Option<usize>,

    /// Assume this pointer width in bits
    #[arg(long)]
    pub pointer_width: Option<u32>,
}

#[derive(Args)]
pub struct CleanArgs {
    /// Also remove the archive and binary directories and the extension
    /// artifacts in the module directory
    #[arg(long)]
    pub all: bool,

    /// Extension whose artifact `--all` removes, as `name=source-dir`
    /// (repeatable; defaults to the configured extensions)
    #[arg(long = "ext", value_name = "NAME=DIR")]
    pub extensions: Vec<ExtensionDescriptor>,

    /// Module directory used by the build
    #[arg(long)]
    pub module_dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: CompletionShell,
}
