//! # StarshipOS Builder
//!
//! Orchestrates the native build pipeline for StarshipOS: the Fiasco.OC
//! microkernel, the L4Re userland, and the OpenJDK runtime. Each component is
//! fetched, configured, and compiled by external toolchains; this tool decides
//! what needs building, runs the steps in order, and records failures so a
//! later `smart-clean` can reconcile the tree.
//!
//! ## Usage
//!
//! ```bash
//! starship-builder initialize     # First-time setup + bootstrap build
//! starship-builder build-core     # Build everything the flags request
//! starship-builder build-fiasco   # Build one component
//! starship-builder smart-clean    # Remove build dirs marked dirty
//! starship-builder build-iso      # Package a bootable ISO
//! starship-builder run            # Boot the result in QEMU
//! ```

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod app;
mod arch;
mod clean;
mod cli;
mod config;
mod doctor;
mod error;
mod iso;
mod pipeline;
mod project;
mod qemu;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = crate::cli::Cli::parse();
    crate::app::run(cli)
}
