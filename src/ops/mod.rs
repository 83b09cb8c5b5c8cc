//! High-level operations.

pub mod build_ext;
pub mod clean;

pub use build_ext::{BuildOrchestrator, BuildReport, FailurePolicy};
