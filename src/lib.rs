//! extforge - CMake build orchestration for native extension modules
//!
//! This crate provides the library behind the `extforge` binary: host
//! probing, CMake argument generation, and the configure/build sequencing
//! that drops artifacts into a fixed output layout for packaging.

pub mod builder;
pub mod core;
pub mod ops;
pub mod util;

/// Test utilities and mocks for extforge unit tests.
///
/// Only compiled for tests. Provides a recording stand-in for CMake.
#[cfg(test)]
pub mod test_support;

pub use builder::{
    ArgumentBuilder, BuildContext, BuildError, BuildOptions, BuildTool, CMakeTool, HostFacts,
    OsFamily, OutputLayout,
};
pub use core::ExtensionDescriptor;
pub use ops::build_ext::{BuildOrchestrator, BuildReport, FailurePolicy};
pub use util::context::GlobalContext;
