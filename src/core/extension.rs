//! Extension descriptors - what gets built.
//!
//! An extension is one named native module produced from one CMake source
//! tree. The name doubles as the artifact base name.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::builder::errors::BuildError;

/// A named build target bound to an absolute source directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtensionDescriptor {
    name: String,
    source_dir: PathBuf,
}

impl ExtensionDescriptor {
    /// Create a new descriptor.
    ///
    /// A relative `source_dir` is made absolute against the current working
    /// directory.
    pub fn new(name: impl Into<String>, source_dir: impl AsRef<Path>) -> Result<Self, BuildError> {
        let name = name.into();
        validate_name(&name)?;

        let source_dir = std::path::absolute(source_dir.as_ref()).map_err(|e| {
            BuildError::Filesystem {
                path: source_dir.as_ref().to_path_buf(),
                source: e,
            }
        })?;

        Ok(ExtensionDescriptor { name, source_dir })
    }

    /// Create a descriptor whose relative `source_dir` is resolved against `root`.
    pub fn with_root(
        name: impl Into<String>,
        source_dir: impl AsRef<Path>,
        root: &Path,
    ) -> Result<Self, BuildError> {
        let source_dir = source_dir.as_ref();
        if source_dir.is_absolute() {
            Self::new(name, source_dir)
        } else {
            Self::new(name, root.join(source_dir))
        }
    }

    /// Get the extension name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the absolute source directory.
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// Check whether the source directory holds a CMake project.
    pub fn has_cmake_lists(&self) -> bool {
        self.source_dir.join("CMakeLists.txt").exists()
    }
}

impl std::str::FromStr for ExtensionDescriptor {
    type Err = BuildError;

    /// Parse `name=source_dir`, or a bare `name` that builds from `.`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((name, dir)) => ExtensionDescriptor::new(name.trim(), dir.trim()),
            None => ExtensionDescriptor::new(s.trim(), "."),
        }
    }
}

fn validate_name(name: &str) -> Result<(), BuildError> {
    let reason = if name.is_empty() {
        Some("name is empty")
    } else if name.contains(['/', '\\']) {
        Some("name must not contain path separators")
    } else if name.chars().any(char::is_whitespace) {
        Some("name must not contain whitespace")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(BuildError::InvalidExtension {
            name: name.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}
