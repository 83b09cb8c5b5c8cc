//! `extforge clean` command

use anyhow::Result;

use extforge::ops::clean::clean;
use extforge::util::shell::{Shell, Status};
use extforge::{GlobalContext, OsFamily, OutputLayout};

use crate::cli::CleanArgs;

pub fn execute(args: CleanArgs, shell: &Shell) -> Result<()> {
    let gctx = GlobalContext::new()?;
    let config = gctx.load_config();
    let root = gctx.cwd();

    let mut layout = OutputLayout::new(root);
    if let Some(dir) = args.module_dir.as_ref().or(config.build.module_dir.as_ref()) {
        layout = layout.with_module_dir(root, dir);
    }

    // Artifacts of the named extensions, or of the configured ones
    let extensions = if args.extensions.is_empty() {
        config.extension_descriptors(root)?
    } else {
        args.extensions
    };
    let family = OsFamily::detect();
    let artifacts: Vec<_> = extensions
        .iter()
        .map(|ext| layout.artifact_path(ext, family))
        .collect();

    let removed = clean(root, &layout, &artifacts, args.all)?;
    if removed.is_empty() {
        shell.status(Status::Info, "nothing to clean");
    }
    for path in removed {
        shell.status(Status::Removed, path.display());
    }
    Ok(())
}
