//! Command implementations

pub mod args;
pub mod build;
pub mod clean;
pub mod completions;
pub mod probe;

use std::path::Path;

use anyhow::{bail, Result};

use extforge::util::config::Config;
use extforge::util::diagnostic::suggestions;
use extforge::ExtensionDescriptor;

use crate::cli::BuildFlags;

/// Extensions from `--ext`, or from the configuration when none were given.
pub fn resolve_extensions(
    flags: &BuildFlags,
    config: &Config,
    root: &Path,
) -> Result<Vec<ExtensionDescriptor>> {
    let extensions = if flags.extensions.is_empty() {
        config.extension_descriptors(root)?
    } else {
        flags.extensions.clone()
    };

    if extensions.is_empty() {
        bail!("no extensions to build\n\n{}", suggestions::NO_EXTENSIONS);
    }
    Ok(extensions)
}
