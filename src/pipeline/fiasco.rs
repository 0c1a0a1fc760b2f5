//! Fiasco.OC microkernel pipeline.
//!
//! The kernel's own build system drives everything: `make B=build/<arch>`
//! initializes the per-architecture build area, the bundled global config is
//! dropped in as `globalconfig.out`, `make olddefconfig` resolves the
//! remaining defaults, and a parallel `make -j<N>` in the build area produces
//! the `fiasco` binary that the L4Re pipeline later picks up.

use std::fs;

use crate::arch::Arch;
use crate::error::BuildError;
use crate::pipeline::{config_artifact, cpus, run_command, BuildEnv, Component};

const SRC_DIR: &str = "src";

pub struct Fiasco;

impl Component for Fiasco {
    fn name(&self) -> &'static str {
        "fiasco"
    }

    fn dir(&self) -> &'static str {
        "fiasco"
    }

    fn build_flag(&self) -> &'static str {
        "buildFiasco"
    }

    fn clean_flag(&self) -> &'static str {
        "cleanFiasco"
    }

    fn validate(&self, env: &BuildEnv) -> Result<(), BuildError> {
        let base = env.component_dir(self);
        if !base.is_dir() {
            return Err(BuildError::MissingSource {
                what: "Fiasco base directory",
                path: base,
            });
        }
        let src = base.join(SRC_DIR);
        if !src.is_dir() {
            return Err(BuildError::MissingSource {
                what: "Fiasco source directory",
                path: src,
            });
        }
        Ok(())
    }

    fn prepare(&self, env: &BuildEnv, arch: Arch) -> Result<(), BuildError> {
        let base = env.component_dir(self);
        run_command("make", &[&format!("B=build/{arch}")], &base)
    }

    fn install_config(&self, env: &BuildEnv, arch: Arch) -> Result<(), BuildError> {
        let contents = config_artifact(self.name(), arch)?;
        let build_dir = env.build_dir(self, arch);
        fs::create_dir_all(&build_dir)?;
        fs::write(build_dir.join("globalconfig.out"), contents)?;
        Ok(())
    }

    fn normalize(&self, env: &BuildEnv, arch: Arch) -> Result<(), BuildError> {
        run_command("make", &["olddefconfig"], &env.build_dir(self, arch))
    }

    fn compile(&self, env: &BuildEnv, arch: Arch) -> Result<(), BuildError> {
        let jobs = format!("-j{}", cpus());
        run_command("make", &[&jobs], &env.build_dir(self, arch))
    }

    // The kernel binary stays in build/<arch>/; the L4Re pipeline copies it
    // into its own tree as its post-process step.
}
