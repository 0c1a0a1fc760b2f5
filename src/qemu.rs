//! Boot the built system in QEMU.

use tracing::info;

use crate::error::BuildError;
use crate::pipeline::run_command;
use crate::project::Project;

/// Launch QEMU with the x86_64 Fiasco kernel and the packaged ISO. Blocks
/// until QEMU exits; the serial console is wired to this terminal.
pub fn run(project: &Project) -> Result<(), BuildError> {
    let kernel = project.root.join("fiasco/build/x86_64/fiasco");
    let iso = project.root.join("target/starship-x86_64.iso");
    let working_dir = project.root.join("l4/build/x86_64");

    info!("[qemu] launching QEMU for x86_64");
    info!("[qemu] kernel: {}", kernel.display());
    info!("[qemu] iso: {}", iso.display());

    if !kernel.is_file() {
        return Err(BuildError::MissingSource {
            what: "Fiasco kernel binary",
            path: kernel,
        });
    }
    if !iso.is_file() {
        return Err(BuildError::MissingSource {
            what: "bootable ISO",
            path: iso,
        });
    }

    run_command(
        "qemu-system-x86_64",
        &[
            "-kernel",
            &kernel.to_string_lossy(),
            "-cdrom",
            &iso.to_string_lossy(),
            "-serial",
            "mon:stdio",
            "-m",
            "512",
            "-no-reboot",
        ],
        &working_dir,
    )
}
