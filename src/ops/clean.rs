//! Removal of build outputs.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::builder::layout::OutputLayout;
use crate::util::fs::{normalize_path, remove_dir_all_if_exists, remove_file_if_exists};

/// Remove the build tree, and with `all` the other outputs.
///
/// With `all`, the archive and binary directories are removed and the
/// given `artifacts` are deleted from the module directory. The module
/// directory itself is only removed as part of the build tree: it is often
/// a package source directory. A module directory that contains `root` is
/// refused before anything is removed.
///
/// Returns the paths that were actually removed.
pub fn clean(
    root: &Path,
    layout: &OutputLayout,
    artifacts: &[PathBuf],
    all: bool,
) -> Result<Vec<PathBuf>> {
    if all && normalize_path(root).starts_with(normalize_path(&layout.module_dir)) {
        bail!(
            "refusing to clean module directory {}: it contains the project root",
            layout.module_dir.display()
        );
    }

    let mut removed = Vec::new();
    let mut dirs = vec![&layout.build_dir];
    if all {
        dirs.extend([&layout.archive_dir, &layout.binary_dir]);
    }
    for dir in dirs {
        if remove_dir_all_if_exists(dir)? {
            tracing::debug!("removed {}", dir.display());
            removed.push(dir.clone());
        }
    }

    if all {
        for artifact in artifacts {
            if remove_file_if_exists(artifact)? {
                tracing::debug!("removed {}", artifact.display());
                removed.push(artifact.clone());
            }
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::builder::platform::OsFamily;
    use crate::core::extension::ExtensionDescriptor;
    use tempfile::TempDir;

    fn artifact(layout: &OutputLayout, root: &Path, name: &str) -> PathBuf {
        let ext = ExtensionDescriptor::new(name, root).unwrap();
        layout.artifact_path(&ext, OsFamily::Linux)
    }

    #[test]
    fn test_clean_build_dir_only() {
        let tmp = TempDir::new().unwrap();
        let layout = OutputLayout::new(tmp.path());
        layout.ensure().unwrap();

        let removed = clean(tmp.path(), &layout, &[], false).unwrap();
        assert_eq!(removed, vec![layout.build_dir.clone()]);
        assert!(layout.archive_dir.exists());
        assert!(layout.binary_dir.exists());
    }

    #[test]
    fn test_clean_all() {
        let tmp = TempDir::new().unwrap();
        let layout = OutputLayout::new(tmp.path());
        layout.ensure().unwrap();

        clean(tmp.path(), &layout, &[], true).unwrap();
        for dir in layout.dirs() {
            assert!(!dir.exists());
        }
        // Nothing left to remove.
        assert!(clean(tmp.path(), &layout, &[], true).unwrap().is_empty());
    }

    #[test]
    fn test_clean_all_keeps_sources_in_module_dir() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        let layout = OutputLayout::new(root).with_module_dir(root, "pysrc/pkg");
        layout.ensure().unwrap();

        let init = layout.module_dir.join("__init__.py");
        fs::write(&init, "").unwrap();
        let core = artifact(&layout, root, "core");
        fs::write(&core, "").unwrap();
        let other = layout.module_dir.join("other.so");
        fs::write(&other, "").unwrap();

        let removed = clean(root, &layout, &[core.clone()], true).unwrap();

        assert!(removed.contains(&core));
        assert!(!removed.contains(&layout.module_dir));
        assert!(!core.exists());
        assert!(init.exists());
        assert!(other.exists());
        assert!(layout.module_dir.is_dir());
    }

    #[test]
    fn test_clean_all_refuses_project_root_as_module_dir() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("proj");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("CMakeLists.txt"), "").unwrap();

        for dir in [".", "..", ""] {
            let layout = OutputLayout::new(&root).with_module_dir(&root, dir);
            layout.ensure().unwrap();

            let err = clean(&root, &layout, &[], true).unwrap_err();
            assert!(err.to_string().contains("refusing"), "{}", dir);
            assert!(root.join("CMakeLists.txt").exists());
            assert!(layout.build_dir.exists());
        }
    }

    #[test]
    fn test_clean_without_all_ignores_module_dir() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        let layout = OutputLayout::new(root).with_module_dir(root, ".");
        layout.ensure().unwrap();
        let core = artifact(&layout, root, "core");
        fs::write(&core, "").unwrap();

        let removed = clean(root, &layout, &[core.clone()], false).unwrap();
        assert_eq!(removed, vec![layout.build_dir.clone()]);
        assert!(core.exists());
    }
}
