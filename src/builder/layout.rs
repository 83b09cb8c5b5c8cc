//! Output directory layout.
//!
//! CMake is pointed at three fixed directories under the invoking working
//! directory so the packaging layer knows where to collect artifacts:
//!
//! ```text
//! <root>/lib        static archives
//! <root>/build/lib  loadable extension modules (overridable)
//! <root>/bin        executables and test binaries
//! <root>/build      build tree
//! <root>/build/temp/<name>  CMake working directory of one extension
//! ```
//!
//! Each extension gets its own working directory, since a CMake cache is
//! bound to a single source tree.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::builder::errors::BuildError;
use crate::builder::platform::OsFamily;
use crate::core::extension::ExtensionDescriptor;
use crate::util::fs::ensure_dir;

/// Fixed output directories for one build run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputLayout {
    pub archive_dir: PathBuf,
    pub module_dir: PathBuf,
    pub binary_dir: PathBuf,
    pub build_dir: PathBuf,
}

impl OutputLayout {
    /// Derive the layout from a root directory (normally the cwd).
    pub fn new(root: &Path) -> Self {
        let build_dir = root.join("build");
        OutputLayout {
            archive_dir: root.join("lib"),
            module_dir: build_dir.join("lib"),
            binary_dir: root.join("bin"),
            build_dir,
        }
    }

    /// Override the module output directory. Relative paths resolve against `root`.
    pub fn with_module_dir(mut self, root: &Path, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        self.module_dir = if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            root.join(dir)
        };
        self
    }

    /// All directories that must exist before the configure step.
    pub fn dirs(&self) -> [&Path; 4] {
        [
            &self.archive_dir,
            &self.module_dir,
            &self.binary_dir,
            &self.build_dir,
        ]
    }

    /// Create every directory of the layout. Idempotent.
    pub fn ensure(&self) -> Result<(), BuildError> {
        for dir in self.dirs() {
            ensure_dir(dir).map_err(|source| BuildError::Filesystem {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        Ok(())
    }

    /// CMake working directory of one extension.
    pub fn work_dir(&self, ext: &ExtensionDescriptor) -> PathBuf {
        self.build_dir.join("temp").join(ext.name())
    }

    /// Create the working directory of one extension.
    pub fn ensure_work_dir(&self, ext: &ExtensionDescriptor) -> Result<PathBuf, BuildError> {
        let dir = self.work_dir(ext);
        ensure_dir(&dir).map_err(|source| BuildError::Filesystem {
            path: dir.clone(),
            source,
        })?;
        Ok(dir)
    }

    /// Final artifact path of an extension inside the module directory.
    pub fn artifact_path(&self, ext: &ExtensionDescriptor, family: OsFamily) -> PathBuf {
        self.module_dir
            .join(format!("{}{}", ext.name(), family.module_suffix()))
    }
}
