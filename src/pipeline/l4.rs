//! L4Re userland pipeline.
//!
//! Mirrors the Fiasco pipeline (`make B=build/<arch>`, install `.config`,
//! `make olddefconfig`, `make`), then copies the Fiasco kernel binary into
//! the L4Re boot tree so the image tooling finds it at the conventional
//! `bin/amd64_gen/l4f/fiasco` location.

use std::fs;

use tracing::info;

use crate::arch::Arch;
use crate::error::BuildError;
use crate::pipeline::{config_artifact, run_command, BuildEnv, Component};

pub struct L4Re;

impl Component for L4Re {
    fn name(&self) -> &'static str {
        "l4"
    }

    fn dir(&self) -> &'static str {
        "l4"
    }

    fn build_flag(&self) -> &'static str {
        "buildL4"
    }

    fn clean_flag(&self) -> &'static str {
        "cleanL4"
    }

    fn validate(&self, env: &BuildEnv) -> Result<(), BuildError> {
        let base = env.component_dir(self);
        if !base.is_dir() {
            return Err(BuildError::MissingSource {
                what: "L4Re base directory",
                path: base,
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
        fs::write(build_dir.join(".config"), contents)?;
        Ok(())
    }

    fn normalize(&self, env: &BuildEnv, arch: Arch) -> Result<(), BuildError> {
        run_command("make", &["olddefconfig"], &env.build_dir(self, arch))
    }

    fn compile(&self, env: &BuildEnv, _arch: Arch) -> Result<(), BuildError> {
        // The L4Re top-level make fans out to every configured build dir;
        // parallelism is its own business.
        run_command("make", &[], &env.component_dir(self))
    }

    /// Copy the Fiasco kernel produced by the kernel pipeline into the L4Re
    /// boot tree, where the module/image tooling expects to find it.
    fn post_process(&self, env: &BuildEnv, arch: Arch) -> Result<(), BuildError> {
        let source = env
            .context
            .component_dir(env.project, "fiasco")
            .join("build")
            .join(arch.canonical())
            .join("fiasco");

        if !source.is_file() {
            return Err(BuildError::MissingSource {
                what: "Fiasco kernel binary",
                path: source,
            });
        }

        let target = env
            .build_dir(self, arch)
            .join("bin/amd64_gen/l4f/fiasco");

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&source, &target)?;
        info!("[l4] copied Fiasco kernel to {}", target.display());
        Ok(())
    }
}
