//! CMake argument generation.
//!
//! Turns host facts, resolved options and the output layout into the two
//! token lists handed to CMake: configure arguments and build arguments.
//! Everything here is pure; the CPU count comes in through [`HostFacts`].
//!
//! Each OS family gets its own generator. Windows uses a multi-config
//! generator (per-configuration output flags, `/m`, `-A x64`); the POSIX
//! families use a single-config generator with explicit compilers and a
//! `-j` job count.

use std::fmt;

use serde::Serialize;

use crate::builder::errors::BuildError;
use crate::builder::layout::OutputLayout;
use crate::builder::options::BuildOptions;
use crate::builder::platform::{HostFacts, OsFamily};
use crate::core::extension::ExtensionDescriptor;

/// Top-level CMake target requested by the build step.
pub const BUILD_TARGET: &str = "python";

/// Default C compiler on non-Windows hosts.
pub const DEFAULT_C_COMPILER: &str = "gcc";

/// Default C++ compiler on non-Windows hosts.
pub const DEFAULT_CXX_COMPILER: &str = "g++";

/// CMake build configuration name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BuildConfiguration {
    Debug,
    Release,
}

impl BuildConfiguration {
    pub fn from_debug(debug: bool) -> Self {
        if debug {
            BuildConfiguration::Debug
        } else {
            BuildConfiguration::Release
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BuildConfiguration::Debug => "Debug",
            BuildConfiguration::Release => "Release",
        }
    }

    /// Suffix used by CMake's per-configuration variables (`_DEBUG`).
    pub fn upper(&self) -> &'static str {
        match self {
            BuildConfiguration::Debug => "DEBUG",
            BuildConfiguration::Release => "RELEASE",
        }
    }
}

impl fmt::Display for BuildConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Configure and build argument lists for one extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CMakeArgs {
    pub configure: Vec<String>,
    pub build: Vec<String>,
}

/// Generates CMake arguments for one build run.
#[derive(Debug, Clone, Copy)]
pub struct ArgumentBuilder<'a> {
    host: &'a HostFacts,
    options: &'a BuildOptions,
    layout: &'a OutputLayout,
}

impl<'a> ArgumentBuilder<'a> {
    pub fn new(host: &'a HostFacts, options: &'a BuildOptions, layout: &'a OutputLayout) -> Self {
        ArgumentBuilder {
            host,
            options,
            layout,
        }
    }

    /// The build configuration selected by the debug option.
    pub fn configuration(&self) -> BuildConfiguration {
        BuildConfiguration::from_debug(self.options.debug)
    }

    /// Generate both argument lists for an extension.
    ///
    /// Fails with [`BuildError::CompilerUnresolved`] before anything is run
    /// when a compiler override resolves to an empty name.
    pub fn generate(&self, ext: &ExtensionDescriptor) -> Result<CMakeArgs, BuildError> {
        let cfg = self.configuration();

        let mut configure = self.common_configure_args();
        let mut build = vec!["--config".to_string(), cfg.as_str().to_string()];

        let family = match self.host.os_family {
            OsFamily::Windows => windows_args(self.host, self.layout, cfg),
            OsFamily::Linux | OsFamily::Darwin | OsFamily::OtherPosix => {
                posix_args(self.host, self.options, ext, cfg)?
            }
        };
        configure.extend(family.configure);
        build.extend(family.build);

        configure.extend(self.feature_args());

        tracing::debug!("configure args for `{}`: {:?}", ext.name(), configure);
        tracing::debug!("build args for `{}`: {:?}", ext.name(), build);

        Ok(CMakeArgs { configure, build })
    }

    /// Output locations, interpreter, and the packaging marker.
    fn common_configure_args(&self) -> Vec<String> {
        vec![
            define("CMAKE_ARCHIVE_OUTPUT_DIRECTORY", self.layout.archive_dir.display()),
            define("CMAKE_LIBRARY_OUTPUT_DIRECTORY", self.layout.module_dir.display()),
            define("CMAKE_RUNTIME_OUTPUT_DIRECTORY", self.layout.binary_dir.display()),
            define("PYTHON_EXECUTABLE", self.options.python.display()),
            define("PYTHON_SETUP_FLAG:STR", "Yes"),
        ]
    }

    /// Optimization flags and optional backends, only when requested.
    fn feature_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(ref flags) = self.options.opt_flags {
            args.push(define("OPT_FLAGS", flags));
        }
        if let Some(ref gpu) = self.options.gpu_backend {
            args.push(define("USE_GPU:STR", gpu));
        }
        if let Some(ref omp) = self.options.omp_backend {
            args.push(define("USE_OMP:STR", omp));
        }
        args
    }
}

/// The family-specific part of an argument set.
#[derive(Debug, Default)]
struct FamilyArgs {
    configure: Vec<String>,
    build: Vec<String>,
}

fn windows_args(host: &HostFacts, layout: &OutputLayout, cfg: BuildConfiguration) -> FamilyArgs {
    let mut configure = vec![
        define(
            &format!("CMAKE_LIBRARY_OUTPUT_DIRECTORY_{}", cfg.upper()),
            layout.module_dir.display(),
        ),
        define(
            &format!("CMAKE_RUNTIME_OUTPUT_DIRECTORY_{}", cfg.upper()),
            layout.module_dir.display(),
        ),
    ];
    if host.is_64bit() {
        configure.extend(["-A".to_string(), "x64".to_string()]);
    }

    FamilyArgs {
        configure,
        build: vec!["--".to_string(), "/m".to_string()],
    }
}

fn posix_args(
    host: &HostFacts,
    options: &BuildOptions,
    ext: &ExtensionDescriptor,
    cfg: BuildConfiguration,
) -> Result<FamilyArgs, BuildError> {
    let cc = resolve_compiler(options.c_compiler.as_deref(), DEFAULT_C_COMPILER, "C", ext)?;
    let cxx = resolve_compiler(options.cxx_compiler.as_deref(), DEFAULT_CXX_COMPILER, "C++", ext)?;

    Ok(FamilyArgs {
        configure: vec![
            define("CMAKE_C_COMPILER", cc),
            define("CMAKE_CXX_COMPILER", cxx),
            define("CMAKE_BUILD_TYPE", cfg),
        ],
        build: vec!["--".to_string(), jobs_flag(host)],
    })
}

/// Resolve a compiler: override else default. Only emptiness is checked;
/// a command missing from PATH surfaces at configure time.
fn resolve_compiler<'s>(
    override_value: Option<&'s str>,
    default: &'s str,
    language: &'static str,
    ext: &ExtensionDescriptor,
) -> Result<&'s str, BuildError> {
    let compiler = override_value.unwrap_or(default).trim();
    if compiler.is_empty() {
        return Err(BuildError::CompilerUnresolved {
            language,
            target: ext.name().to_string(),
        });
    }
    Ok(compiler)
}

/// `-j<N>` from the probed CPU count, or bare `-j` to let the tool decide.
pub fn jobs_flag(host: &HostFacts) -> String {
    match host.logical_cpus {
        Some(n) => format!("-j{}", n),
        None => "-j".to_string(),
    }
}

fn define(key: &str, value: impl fmt::Display) -> String {
    format!("-D{}={}", key, value)
}

/// Keys of all `-D` definitions, without their `:TYPE` suffix.
pub fn defined_keys(args: &[String]) -> Vec<&str> {
    args.iter()
        .filter_map(|arg| arg.strip_prefix("-D"))
        .filter_map(|def| def.split_once('='))
        .map(|(key, _)| key.split_once(':').map_or(key, |(name, _)| name))
        .collect()
}
