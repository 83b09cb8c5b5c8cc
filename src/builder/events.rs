//! Build event types for JSON output.
//!
//! Emitted one object per line with `--message-format json`. This is the
//! interface a packaging layer consumes: per extension, whether it built
//! and where the artifact landed.
//!
//! New fields may be added; existing fields are not removed or renamed.

use std::path::PathBuf;

use serde::Serialize;

use crate::builder::errors::BuildStep;

/// A build event.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "reason")]
pub enum BuildEvent {
    /// One extension reached a terminal state.
    #[serde(rename = "extension-finished")]
    ExtensionFinished {
        /// Extension name
        name: String,
        /// Whether configure and build both succeeded
        success: bool,
        /// Artifact path inside the module directory
        #[serde(skip_serializing_if = "Option::is_none")]
        artifact: Option<PathBuf>,
        /// Whether the extension was skipped after an earlier failure
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        skipped: bool,
        /// The step that failed
        #[serde(skip_serializing_if = "Option::is_none")]
        step: Option<BuildStep>,
        /// Exit code of the failed step
        #[serde(skip_serializing_if = "Option::is_none")]
        exit_code: Option<i32>,
        /// Error message
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// The whole run completed.
    #[serde(rename = "build-finished")]
    BuildFinished {
        success: bool,
        duration_ms: u64,
        extensions_built: u64,
    },
}

impl BuildEvent {
    /// Serialize to a single JSON line.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
