//! Build options and their resolution.
//!
//! Options are resolved exactly once at the start of a run, from (highest
//! precedence first) explicit caller overrides, the process environment,
//! and the configuration files. Nothing downstream reads the environment.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::util::config::BuildConfig;
use crate::util::process::find_python;

/// Environment variables consumed by the build.
pub mod env_vars {
    /// Optimization flags forwarded to the build definition.
    pub const OPT_FLAGS: &str = "OPT_FLAGS";
    /// Hardware-acceleration backend selector.
    pub const USE_GPU: &str = "USE_GPU";
    /// Parallel-execution backend selector.
    pub const USE_OMP: &str = "USE_OMP";
    /// C compiler executable.
    pub const C_COMPILER: &str = "C_COMPILER";
    /// C++ compiler executable.
    pub const CXX_COMPILER: &str = "CXX_COMPILER";
    /// Interpreter the extension is built against.
    pub const PYTHON_EXECUTABLE: &str = "PYTHON_EXECUTABLE";
    /// Extra C++ flags, extended with the version define.
    pub const CXXFLAGS: &str = "CXXFLAGS";

    pub const ALL: [&str; 7] = [
        OPT_FLAGS,
        USE_GPU,
        USE_OMP,
        C_COMPILER,
        CXX_COMPILER,
        PYTHON_EXECUTABLE,
        CXXFLAGS,
    ];
}

/// Interpreter name used when none can be located.
pub const DEFAULT_PYTHON: &str = "python3";

/// A one-time capture of the environment variables the build consumes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    /// Capture the consumed variables from the process environment.
    pub fn capture() -> Self {
        let vars = env_vars::ALL
            .iter()
            .filter_map(|key| std::env::var(key).ok().map(|v| (key.to_string(), v)))
            .collect();
        EnvSnapshot { vars }
    }

    /// Build a snapshot from explicit pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        EnvSnapshot {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Raw value, including an empty string when the variable is set but empty.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Value, treating set-but-empty as absent.
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.trim().is_empty())
    }
}

/// Explicit, caller-supplied option values (normally CLI flags).
#[derive(Debug, Clone, Default)]
pub struct OptionOverrides {
    /// `Some(false)` forces Release over a configured Debug build.
    pub debug: Option<bool>,
    pub opt_flags: Option<String>,
    pub c_compiler: Option<String>,
    pub cxx_compiler: Option<String>,
    pub gpu_backend: Option<String>,
    pub omp_backend: Option<String>,
    pub python: Option<PathBuf>,
    pub version_info: Option<String>,
}

/// Resolved options for one build run. Immutable during the run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildOptions {
    pub debug: bool,
    pub opt_flags: Option<String>,
    pub c_compiler: Option<String>,
    pub cxx_compiler: Option<String>,
    pub gpu_backend: Option<String>,
    pub omp_backend: Option<String>,
    pub python: PathBuf,
    pub version_info: Option<String>,
    /// `CXXFLAGS` as inherited from the environment.
    pub inherited_cxxflags: Option<String>,
}

impl BuildOptions {
    /// Resolve options: overrides > environment > config > defaults.
    pub fn resolve(overrides: &OptionOverrides, env: &EnvSnapshot, config: &BuildConfig) -> Self {
        // An explicit empty value suppresses the environment instead of
        // falling through to it.
        let opt_flags = overrides
            .opt_flags
            .clone()
            .or_else(|| env.get_non_empty(env_vars::OPT_FLAGS).map(str::to_string))
            .or_else(|| config.opt_flags.clone())
            .filter(|s| !s.trim().is_empty());

        let gpu_backend = overrides
            .gpu_backend
            .clone()
            .or_else(|| env.get_non_empty(env_vars::USE_GPU).map(str::to_string))
            .or_else(|| config.gpu.clone())
            .filter(|s| !s.trim().is_empty());

        let omp_backend = overrides
            .omp_backend
            .clone()
            .or_else(|| env.get_non_empty(env_vars::USE_OMP).map(str::to_string))
            .or_else(|| config.omp.clone())
            .filter(|s| !s.trim().is_empty());

        // Compiler overrides keep empty values so they surface as
        // CompilerUnresolved when arguments are generated.
        let c_compiler = overrides
            .c_compiler
            .clone()
            .or_else(|| env.get(env_vars::C_COMPILER).map(str::to_string))
            .or_else(|| config.c_compiler.clone());

        let cxx_compiler = overrides
            .cxx_compiler
            .clone()
            .or_else(|| env.get(env_vars::CXX_COMPILER).map(str::to_string))
            .or_else(|| config.cxx_compiler.clone());

        let python = overrides
            .python
            .clone()
            .or_else(|| {
                env.get_non_empty(env_vars::PYTHON_EXECUTABLE)
                    .map(PathBuf::from)
            })
            .or_else(|| config.python.clone())
            .or_else(find_python)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PYTHON));

        let version_info = overrides
            .version_info
            .clone()
            .or_else(|| config.version_info.clone())
            .filter(|s| !s.trim().is_empty());

        BuildOptions {
            debug: overrides.debug.or(config.debug).unwrap_or(false),
            opt_flags,
            c_compiler,
            cxx_compiler,
            gpu_backend,
            omp_backend,
            python,
            version_info,
            inherited_cxxflags: env.get(env_vars::CXXFLAGS).map(str::to_string),
        }
    }

    /// Environment overrides for the configure step.
    ///
    /// When a version string is known, `CXXFLAGS` is extended with a
    /// `VERSION_INFO` define; the rest of the environment is inherited.
    pub fn configure_env(&self) -> Vec<(String, String)> {
        match self.version_info {
            Some(ref version) => {
                let base = self.inherited_cxxflags.as_deref().unwrap_or("");
                vec![(
                    env_vars::CXXFLAGS.to_string(),
                    format!("{} -DVERSION_INFO=\\\"{}\\\"", base, version),
                )]
            }
            None => Vec::new(),
        }
    }
}
