//! Bootable ISO packaging.
//!
//! Wraps `mkisofs` over the staged L4Re module tree. Building the module tree
//! itself is the pipelines' job; this step only packages what is already
//! there.

use tracing::info;

use crate::error::BuildError;
use crate::pipeline::run_command;
use crate::project::Project;

pub const MODULE_STAGING: &str = "target/l4re-modules";
pub const ISO_NAME: &str = "starship-x86_64.iso";

pub fn build_iso(project: &Project) -> Result<(), BuildError> {
    let romfs = project.root.join(MODULE_STAGING);
    let iso = project.root.join("target").join(ISO_NAME);

    info!("[iso] building ISO from {}", romfs.display());
    info!("[iso] output: {}", iso.display());

    if !romfs.is_dir() {
        return Err(BuildError::MissingSource {
            what: "L4Re module staging directory",
            path: romfs,
        });
    }

    run_command(
        "mkisofs",
        &[
            "-quiet",
            "-R",
            "-o",
            &iso.to_string_lossy(),
            &romfs.to_string_lossy(),
        ],
        &project.root,
    )?;

    info!("[iso] ISO created successfully");
    Ok(())
}
