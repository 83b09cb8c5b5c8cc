//! Core data structures for extforge.

pub mod extension;

pub use extension::ExtensionDescriptor;
