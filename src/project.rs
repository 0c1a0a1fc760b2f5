//! Project root resolution.
//!
//! The orchestrator can be invoked either from inside a checked-out project
//! tree (the current directory *is* the project) or from a parent directory,
//! in which case the project directory is created underneath it. Either way a
//! `.starship/` state directory is guaranteed to exist under the root.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::BuildError;

pub const STATE_DIR: &str = ".starship";

/// Resolved project layout for one invocation.
#[derive(Debug, Clone)]
pub struct Project {
    /// Directory the orchestrator was invoked from.
    pub base_dir: PathBuf,
    /// The project root (equal to `base_dir` when invoked in-tree).
    pub root: PathBuf,
    /// `<root>/.starship`, holds the persisted flag store.
    pub state_dir: PathBuf,
    pub name: String,
}

/// Resolve the project root relative to `current_dir`.
///
/// If `current_dir` is already named `project_name` it is the root; otherwise
/// a `project_name` subdirectory is created under it and used as the root.
pub fn resolve(current_dir: &Path, project_name: &str) -> Result<Project, BuildError> {
    let root = if current_dir.file_name().is_some_and(|n| n == project_name) {
        current_dir.to_path_buf()
    } else {
        let root = current_dir.join(project_name);
        if !root.exists() {
            fs::create_dir_all(&root).map_err(|source| BuildError::RootCreationFailed {
                path: root.clone(),
                source,
            })?;
        }
        root
    };

    let state_dir = root.join(STATE_DIR);
    fs::create_dir_all(&state_dir).map_err(|source| BuildError::RootCreationFailed {
        path: state_dir.clone(),
        source,
    })?;

    Ok(Project {
        base_dir: current_dir.to_path_buf(),
        root,
        state_dir,
        name: project_name.to_string(),
    })
}
