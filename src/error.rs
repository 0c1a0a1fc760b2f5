//! Error taxonomy for the build orchestrator.
//!
//! Pipeline-step failures (`MissingSource`, `MissingConfigArtifact`,
//! `ProcessFailed`) are caught per architecture attempt and converted into a
//! [`crate::pipeline::BuildOutcome`] so sibling architectures can still run.
//! Store and project-root failures abort the whole invocation.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("{what} not found or invalid: {path}")]
    MissingSource { what: &'static str, path: PathBuf },

    #[error("no bundled config artifact `{component}.config.{arch}`")]
    MissingConfigArtifact {
        component: &'static str,
        arch: &'static str,
    },

    #[error("configuration store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("failed to write configuration store at {path}: {source}")]
    StoreWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create project root {path}: {source}")]
    RootCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A child process failed. `code` is `None` when the process could not be
    /// started at all (e.g. the tool is not on PATH) or died to a signal;
    /// both count as step failures, not a separate category.
    #[error("`{command}` failed{}", exit_label(.code))]
    ProcessFailed { command: String, code: Option<i32> },

    #[error("failed to delete {path}: {source}")]
    DeleteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!(" with exit code {c}"),
        None => " to start".to_string(),
    }
}
