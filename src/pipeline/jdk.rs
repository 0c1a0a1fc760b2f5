//! OpenJDK runtime pipeline.
//!
//! The JDK carries its own autoconf build system, so the pipeline shape
//! differs slightly: prepare makes the checked-out `configure` script
//! executable, there is no bundled config artifact (configure owns every
//! knob), normalize runs `configure` with the StarshipOS option set, and
//! compile is `make images`. Output lands in `openjdk/build/`, which is also
//! the directory the build gate and smart-clean key on.

use std::fs;
use std::os::unix::fs::PermissionsExt;

use crate::arch::Arch;
use crate::error::BuildError;
use crate::pipeline::{run_command, BuildEnv, Component};

pub struct OpenJdk;

impl Component for OpenJdk {
    fn name(&self) -> &'static str {
        "jdk"
    }

    fn dir(&self) -> &'static str {
        "openjdk"
    }

    fn build_flag(&self) -> &'static str {
        "buildJDK"
    }

    fn clean_flag(&self) -> &'static str {
        "cleanJDK"
    }

    fn validate(&self, env: &BuildEnv) -> Result<(), BuildError> {
        let base = env.component_dir(self);
        if !base.is_dir() {
            return Err(BuildError::MissingSource {
                what: "OpenJDK source directory",
                path: base,
            });
        }
        let configure = base.join("configure");
        if !configure.is_file() {
            return Err(BuildError::MissingSource {
                what: "OpenJDK configure script",
                path: configure,
            });
        }
        Ok(())
    }

    /// Git checkouts do not always preserve the execute bit on `configure`.
    /// Also creates the build area `configure` will populate, which is the
    /// directory the build gate and smart-clean key on.
    fn prepare(&self, env: &BuildEnv, _arch: Arch) -> Result<(), BuildError> {
        let base = env.component_dir(self);
        let configure = base.join("configure");
        fs::set_permissions(&configure, fs::Permissions::from_mode(0o755))?;
        fs::create_dir_all(base.join("build"))?;
        Ok(())
    }

    /// No bundled artifact; configure resolves every option itself.
    fn install_config(&self, _env: &BuildEnv, _arch: Arch) -> Result<(), BuildError> {
        Ok(())
    }

    fn normalize(&self, env: &BuildEnv, arch: Arch) -> Result<(), BuildError> {
        let base = env.component_dir(self);
        let target = format!("--openjdk-target={}", arch.triplet());
        run_command(
            base.join("configure"),
            &[
                &target,
                "--with-debug-level=release",
                "--enable-option-checking=fatal",
                "--with-native-debug-symbols=none",
                "--with-jvm-variants=server",
                "--with-version-pre=starship",
                "--with-version-build=1",
                "--with-version-opt=reloc",
                "--with-toolchain-type=gcc",
                "--disable-warnings-as-errors",
            ],
            &base,
        )
    }

    /// `make images` manages its own job count via the configure-detected
    /// JOBS setting.
    fn compile(&self, env: &BuildEnv, _arch: Arch) -> Result<(), BuildError> {
        run_command("make", &["images"], &env.component_dir(self))
    }
}
