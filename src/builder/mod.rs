//! Build support: host probing, argument generation, and CMake invocation.

pub mod args;
pub mod cmake;
pub mod context;
pub mod errors;
pub mod events;
pub mod layout;
pub mod options;
pub mod platform;

pub use args::{ArgumentBuilder, BuildConfiguration, CMakeArgs};
pub use cmake::{BuildTool, CMakeTool, ProcessResult};
pub use context::BuildContext;
pub use errors::{BuildError, BuildStep};
pub use layout::OutputLayout;
pub use options::{BuildOptions, EnvSnapshot, OptionOverrides};
pub use platform::{HostFacts, OsFamily};
