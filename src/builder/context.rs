//! Build context - host facts, resolved options, and output layout.

use std::path::{Path, PathBuf};

use crate::builder::args::ArgumentBuilder;
use crate::builder::layout::OutputLayout;
use crate::builder::options::{BuildOptions, EnvSnapshot, OptionOverrides};
use crate::builder::platform::HostFacts;
use crate::util::config::Config;

/// Everything computed once at the start of a build run.
///
/// Read-only for the rest of the run.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Host operating system, CPU count, pointer width
    pub host: HostFacts,

    /// Resolved build options
    pub options: BuildOptions,

    /// Output directories
    pub layout: OutputLayout,

    /// Directory the layout is rooted at
    pub root: PathBuf,
}

impl BuildContext {
    /// Create a context from explicit parts.
    pub fn new(host: HostFacts, options: BuildOptions, layout: OutputLayout, root: &Path) -> Self {
        BuildContext {
            host,
            options,
            layout,
            root: root.to_path_buf(),
        }
    }

    /// Resolve a context for `root`, reading the environment once.
    pub fn resolve(
        root: &Path,
        host: HostFacts,
        overrides: &OptionOverrides,
        env: &EnvSnapshot,
        config: &Config,
        module_dir: Option<&Path>,
    ) -> Self {
        let options = BuildOptions::resolve(overrides, env, &config.build);

        let mut layout = OutputLayout::new(root);
        if let Some(dir) = module_dir.or(config.build.module_dir.as_deref()) {
            layout = layout.with_module_dir(root, dir);
        }

        Self::new(host, options, layout, root)
    }

    /// Argument generator bound to this context.
    pub fn args(&self) -> ArgumentBuilder<'_> {
        ArgumentBuilder::new(&self.host, &self.options, &self.layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::platform::OsFamily;
    use crate::util::config::BuildConfig;

    #[test]
    fn test_cli_module_dir_beats_config() {
        let root = Path::new("/proj");
        let config = Config {
            build: BuildConfig {
                module_dir: Some("from-config".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let overrides = OptionOverrides {
            python: Some("python3".into()),
            ..Default::default()
        };
        let host = HostFacts::new(OsFamily::Linux);

        let ctx = BuildContext::resolve(
            root,
            host,
            &overrides,
            &EnvSnapshot::default(),
            &config,
            Some(Path::new("from-cli")),
        );
        assert_eq!(ctx.layout.module_dir, root.join("from-cli"));

        let ctx = BuildContext::resolve(root, host, &overrides, &EnvSnapshot::default(), &config, None);
        assert_eq!(ctx.layout.module_dir, root.join("from-config"));
    }
}
