//! Command-line surface. Each subcommand maps 1:1 to one orchestrator
//! operation; failures propagate as a non-zero exit code.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "starship-builder")]
#[command(about = "StarshipOS build orchestration (Fiasco.OC, L4Re, OpenJDK)")]
pub struct Cli {
    /// Project directory name; the current directory is used as the root
    /// when its name matches, otherwise a subdirectory is created.
    #[arg(long, global = true, default_value = "StarshipOS")]
    pub project_name: String,

    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand)]
pub enum Cmd {
    /// First-time setup: create the project root and state directory,
    /// materialize the flag store, and run the requested builds from the
    /// bootstrap context.
    Initialize,

    /// Build every component the persisted flags request.
    BuildCore,

    /// Build the Fiasco.OC microkernel.
    BuildFiasco,

    /// Build the L4Re userland (consumes the Fiasco kernel binary).
    BuildL4,

    /// Build the OpenJDK runtime.
    BuildJdk,

    /// Delete build directories marked dirty by failed builds, then reset
    /// the clean flags.
    SmartClean,

    /// Package the staged L4Re modules into a bootable ISO.
    BuildIso,

    /// Boot the built kernel + ISO in QEMU.
    Run,

    /// Verify the external tools this orchestrator depends on.
    Doctor,
}
