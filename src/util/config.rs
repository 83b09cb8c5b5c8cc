//! Configuration file support for extforge.
//!
//! Two configuration file locations are read:
//! - Global: `~/.extforge/config.toml` - User-wide defaults
//! - Project: `.extforge/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config. Environment
//! variables and CLI flags take precedence over both.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::extension::ExtensionDescriptor;
use crate::ops::build_ext::FailurePolicy;
use crate::util::fs::read_to_string;

/// extforge configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Build settings
    pub build: BuildConfig,

    /// Extensions to build, in order
    #[serde(rename = "extension")]
    pub extensions: Vec<ExtensionConfig>,
}

/// Build-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Build with the Debug configuration
    pub debug: Option<bool>,

    /// Optimization flags forwarded as OPT_FLAGS
    pub opt_flags: Option<String>,

    /// C compiler (non-Windows only)
    pub c_compiler: Option<String>,

    /// C++ compiler (non-Windows only)
    pub cxx_compiler: Option<String>,

    /// Hardware-acceleration backend selector
    pub gpu: Option<String>,

    /// Parallel-execution backend selector
    pub omp: Option<String>,

    /// Interpreter executable passed as PYTHON_EXECUTABLE
    pub python: Option<PathBuf>,

    /// Version string compiled in as VERSION_INFO
    pub version_info: Option<String>,

    /// Module output directory (relative to the project root)
    pub module_dir: Option<PathBuf>,

    /// Multi-extension failure policy (fail-fast, best-effort)
    pub policy: Option<String>,
}

/// One `[[extension]]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionConfig {
    /// Extension name, also the artifact base name
    pub name: String,

    /// CMake source directory (relative to the project root)
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,
}

fn default_source_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = read_to_string(path)?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if the file doesn't exist
    /// or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        let b = other.build;
        if b.debug.is_some() {
            self.build.debug = b.debug;
        }
        if b.opt_flags.is_some() {
            self.build.opt_flags = b.opt_flags;
        }
        if b.c_compiler.is_some() {
            self.build.c_compiler = b.c_compiler;
        }
        if b.cxx_compiler.is_some() {
            self.build.cxx_compiler = b.cxx_compiler;
        }
        if b.gpu.is_some() {
            self.build.gpu = b.gpu;
        }
        if b.omp.is_some() {
            self.build.omp = b.omp;
        }
        if b.python.is_some() {
            self.build.python = b.python;
        }
        if b.version_info.is_some() {
            self.build.version_info = b.version_info;
        }
        if b.module_dir.is_some() {
            self.build.module_dir = b.module_dir;
        }
        if b.policy.is_some() {
            self.build.policy = b.policy;
        }
        if !other.extensions.is_empty() {
            self.extensions = other.extensions;
        }
    }

    /// Parse the configured failure policy. An invalid value is an error.
    pub fn policy(&self) -> Result<Option<FailurePolicy>> {
        let Some(raw) = self.build.policy.as_ref() else {
            return Ok(None);
        };
        raw.parse::<FailurePolicy>()
            .map(Some)
            .map_err(|e: String| anyhow::anyhow!("invalid build.policy in config: {}", e))
    }

    /// Build descriptors for the configured extensions.
    pub fn extension_descriptors(&self, root: &Path) -> Result<Vec<ExtensionDescriptor>> {
        self.extensions
            .iter()
            .map(|ext| {
                ExtensionDescriptor::with_root(ext.name.clone(), &ext.source_dir, root)
                    .with_context(|| format!("invalid [[extension]] entry `{}`", ext.name))
            })
            .collect()
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.extforge/config.toml)
/// 2. Global config (~/.extforge/config.toml)
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    if global_path.exists() {
        config.merge(Config::load_or_default(global_path));
    }

    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}

/// Get the global extforge config directory (~/.extforge).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".extforge"))
}

/// Get the global config path (~/.extforge/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.extforge/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".extforge").join("config.toml")
}
