//! Smart clean: reconcile disk state with the persisted dirty flags.
//!
//! A component gets marked dirty (`clean<Component>=true`) when any of its
//! architecture builds fail; this is the only recovery path, there is no
//! automatic retry. `clean` deletes the marked build trees depth-first,
//! aborting the whole run on the first entry it cannot remove, then resets
//! every clean flag and persists. With no dirty flags it touches nothing.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::Store;
use crate::error::BuildError;
use crate::pipeline::{Component, COMPONENTS};
use crate::project::Project;

/// What one `smart-clean` invocation did.
#[derive(Debug, Default)]
pub struct CleanReport {
    /// Build directories that existed and were deleted.
    pub removed: Vec<PathBuf>,
    /// Dirty components whose build directory was already gone.
    pub skipped: Vec<PathBuf>,
    /// Whether the clean flags were reset (false only for the no-op case).
    pub flags_reset: bool,
}

pub fn clean(project: &Project, store: &mut Store) -> Result<CleanReport, BuildError> {
    let dirty: Vec<&&dyn Component> = COMPONENTS
        .iter()
        .filter(|c| store.flag(c.clean_flag()))
        .collect();

    if dirty.is_empty() {
        info!("[smart-clean] no clean actions requested; all clean flags are false");
        return Ok(CleanReport::default());
    }

    let mut report = CleanReport::default();
    for c in dirty {
        let build_dir = project.root.join(c.dir()).join("build");
        if build_dir.exists() {
            info!("[smart-clean] deleting {}", build_dir.display());
            remove_tree(&build_dir)?;
            report.removed.push(build_dir);
        } else {
            info!(
                "[smart-clean] skipping {} (does not exist)",
                build_dir.display()
            );
            report.skipped.push(build_dir);
        }
    }

    // All requested deletions succeeded; only now reset the flags.
    for c in COMPONENTS {
        store.set_flag(c.clean_flag(), false);
    }
    store.save()?;
    report.flags_reset = true;
    info!("[smart-clean] reset clean flags to false");

    Ok(report)
}

/// Depth-first recursive delete, files before their directory. The first
/// entry that cannot be removed aborts the whole run; there is no partial
/// cleanup retry.
fn remove_tree(path: &Path) -> Result<(), BuildError> {
    let failed = |path: &Path| {
        let path = path.to_path_buf();
        move |source| BuildError::DeleteFailed { path, source }
    };

    let entries = fs::read_dir(path).map_err(failed(path))?;
    for entry in entries {
        let entry = entry.map_err(failed(path))?;
        let entry_path = entry.path();
        let file_type = entry.file_type().map_err(failed(&entry_path))?;
        if file_type.is_dir() {
            remove_tree(&entry_path)?;
        } else {
            fs::remove_file(&entry_path).map_err(failed(&entry_path))?;
        }
    }
    fs::remove_dir(path).map_err(failed(path))
}
