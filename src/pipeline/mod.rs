//! Per-architecture build pipelines.
//!
//! Each buildable component (Fiasco.OC, L4Re, OpenJDK) implements
//! [`Component`] and is registered in [`COMPONENTS`]. The driver
//! [`build_component`] decides whether a component needs building at all,
//! runs the six pipeline steps strictly in order per architecture, and
//! projects failures into the persisted clean flags.
//!
//! Structure:
//! - `fiasco` - Fiasco.OC microkernel pipeline
//! - `l4` - L4Re userland pipeline (consumes the Fiasco binary)
//! - `jdk` - OpenJDK runtime pipeline

pub mod fiasco;
pub mod jdk;
pub mod l4;

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, error, info, warn};

use crate::arch::Arch;
use crate::config::Store;
use crate::error::BuildError;
use crate::project::Project;

/// All registered components, in build order: the kernel binary produced by
/// `fiasco` is consumed by the `l4` post-process step.
pub static COMPONENTS: &[&dyn Component] = &[&fiasco::Fiasco, &l4::L4Re, &jdk::OpenJdk];

/// Get component by name.
pub fn get(name: &str) -> Option<&'static dyn Component> {
    COMPONENTS.iter().find(|c| c.name() == name).copied()
}

/// Which caller context the pipeline runs in. Bootstrap (`initialize`) is
/// invoked from the parent of the project directory; standard builds run from
/// inside it. The context is passed explicitly rather than inferred from the
/// caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildContext {
    Bootstrap,
    Standard,
}

impl BuildContext {
    /// Base source directory for a component under this context.
    pub fn component_dir(self, project: &Project, dir: &str) -> PathBuf {
        match self {
            BuildContext::Bootstrap => project.base_dir.join(&project.name).join(dir),
            BuildContext::Standard => project.base_dir.join(dir),
        }
    }
}

/// Everything a pipeline step needs to locate its inputs and outputs.
pub struct BuildEnv<'a> {
    pub project: &'a Project,
    pub context: BuildContext,
}

impl BuildEnv<'_> {
    pub fn component_dir(&self, c: &dyn Component) -> PathBuf {
        self.context.component_dir(self.project, c.dir())
    }

    /// `<component>/build/<arch>/`, the per-architecture output tree.
    pub fn build_dir(&self, c: &dyn Component, arch: Arch) -> PathBuf {
        self.component_dir(c).join("build").join(arch.canonical())
    }
}

/// Ordered pipeline steps. A failure at one step aborts the rest for that
/// architecture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Validate,
    Prepare,
    InstallConfig,
    Normalize,
    Compile,
    PostProcess,
}

impl Step {
    /// 1-based position in the pipeline, as reported in failure messages.
    pub fn number(self) -> u8 {
        match self {
            Step::Validate => 1,
            Step::Prepare => 2,
            Step::InstallConfig => 3,
            Step::Normalize => 4,
            Step::Compile => 5,
            Step::PostProcess => 6,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Step::Validate => "validate",
            Step::Prepare => "prepare",
            Step::InstallConfig => "install-config",
            Step::Normalize => "normalize",
            Step::Compile => "compile",
            Step::PostProcess => "post-process",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The step a pipeline run died at, and why.
#[derive(Debug)]
pub struct StepFailure {
    pub step: Step,
    pub error: BuildError,
}

/// Result of one (component, architecture) pipeline run. Transient; only ever
/// projected into the persisted clean flags, never stored itself.
#[derive(Debug)]
pub struct BuildOutcome {
    pub arch: Arch,
    pub failure: Option<StepFailure>,
}

impl BuildOutcome {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// A buildable component. Implementations invoke their native build system as
/// blocking child processes; streams are inherited from the orchestrator.
pub trait Component: Sync {
    fn name(&self) -> &'static str;

    /// Source directory name under the project root.
    fn dir(&self) -> &'static str;

    /// Component-level build flag key (`buildFiasco`); per-architecture flags
    /// append `.<arch>`.
    fn build_flag(&self) -> &'static str;

    /// Dirty marker key (`cleanFiasco`) consumed by `smart-clean`.
    fn clean_flag(&self) -> &'static str;

    fn validate(&self, env: &BuildEnv) -> Result<(), BuildError>;
    fn prepare(&self, env: &BuildEnv, arch: Arch) -> Result<(), BuildError>;
    fn install_config(&self, env: &BuildEnv, arch: Arch) -> Result<(), BuildError>;
    fn normalize(&self, env: &BuildEnv, arch: Arch) -> Result<(), BuildError>;
    fn compile(&self, env: &BuildEnv, arch: Arch) -> Result<(), BuildError>;

    fn post_process(&self, _env: &BuildEnv, _arch: Arch) -> Result<(), BuildError> {
        Ok(())
    }
}

/// The idempotency gate: a component whose `build/` directory exists is
/// treated as already built and skipped unconditionally. Existence only, no
/// timestamps, no hashes. A half-finished tree from a crashed run looks built
/// until `smart-clean` removes it; the clean flags exist for exactly that.
///
/// Resolved against the project root, not the context base dir, so the gate
/// and `smart-clean` always look at the same directory.
pub fn should_build(env: &BuildEnv, c: &dyn Component) -> bool {
    !env.project.root.join(c.dir()).join("build").exists()
}

/// Build one component for every architecture its flags request.
///
/// Architectures run sequentially and independently; a failure on one does
/// not stop the next. Any failure marks the component dirty in the store and
/// persists immediately, so a crash after this point still leaves the right
/// flag on disk.
pub fn build_component(
    env: &BuildEnv,
    store: &mut Store,
    c: &dyn Component,
) -> Result<Vec<BuildOutcome>, BuildError> {
    if !store.flag(c.build_flag()) {
        debug!("[{}] {} not set; skipping", c.name(), c.build_flag());
        return Ok(Vec::new());
    }

    if !should_build(env, c) {
        info!("[{}] skipping build; build/ directory already exists", c.name());
        return Ok(Vec::new());
    }

    let mut outcomes = Vec::new();
    for arch in Arch::ALL {
        let arch_key = format!("{}.{}", c.build_flag(), arch.flag_suffix());
        if !store.flag(&arch_key) {
            continue;
        }
        if arch == Arch::Arm {
            // Deliberately short-circuited until OpenJDK can be
            // cross-compiled for ARM; the L4Re image needs the JDK.
            warn!(
                "[{}] ARM build requested but not yet supported; skipping",
                c.name()
            );
            continue;
        }
        outcomes.push(run_pipeline(env, c, arch));
    }

    if outcomes.iter().any(|o| !o.is_success()) {
        store.set_flag(c.clean_flag(), true);
        store.save()?;
        warn!(
            "[{}] one or more builds failed; {}=true",
            c.name(),
            c.clean_flag()
        );
    }

    Ok(outcomes)
}

fn run_pipeline(env: &BuildEnv, c: &dyn Component, arch: Arch) -> BuildOutcome {
    info!("=== Building {} ({arch}) ===", c.name());

    match run_steps(env, c, arch) {
        Ok(()) => {
            info!("[{}] {arch} build complete", c.name());
            BuildOutcome { arch, failure: None }
        }
        Err(failure) => {
            error!(
                "[{}] {arch} build failed at step {} ({}): {}",
                c.name(),
                failure.step.number(),
                failure.step,
                failure.error
            );
            BuildOutcome {
                arch,
                failure: Some(failure),
            }
        }
    }
}

fn run_steps(env: &BuildEnv, c: &dyn Component, arch: Arch) -> Result<(), StepFailure> {
    let at = |step: Step| move |error| StepFailure { step, error };

    c.validate(env).map_err(at(Step::Validate))?;
    c.prepare(env, arch).map_err(at(Step::Prepare))?;
    c.install_config(env, arch).map_err(at(Step::InstallConfig))?;
    c.normalize(env, arch).map_err(at(Step::Normalize))?;
    c.compile(env, arch).map_err(at(Step::Compile))?;
    c.post_process(env, arch).map_err(at(Step::PostProcess))?;
    Ok(())
}

/// Bundled per-(component, architecture) configuration artifacts, resolved by
/// the `<component>.config.<arch>` naming convention. ARM artifacts are
/// absent on purpose while ARM builds are disabled.
const CONFIG_ARTIFACTS: &[(&str, &str, &str)] = &[
    (
        "fiasco",
        "x86_64",
        include_str!("../../resources/fiasco.config.x86_64"),
    ),
    (
        "l4",
        "x86_64",
        include_str!("../../resources/l4.config.x86_64"),
    ),
];

/// Look up the bundled config artifact for a component/architecture pair.
pub fn config_artifact(component: &'static str, arch: Arch) -> Result<&'static str, BuildError> {
    CONFIG_ARTIFACTS
        .iter()
        .find(|(c, a, _)| *c == component && *a == arch.canonical())
        .map(|(_, _, contents)| *contents)
        .ok_or(BuildError::MissingConfigArtifact {
            component,
            arch: arch.canonical(),
        })
}

/// Run one blocking pipeline step as a child process. stdout/stderr are
/// inherited; the call returns when the process exits. A process that cannot
/// be started (tool missing from PATH) is the same failure category as a
/// non-zero exit.
pub fn run_command<S: AsRef<OsStr>>(
    program: S,
    args: &[&str],
    dir: &Path,
) -> Result<(), BuildError> {
    let pretty = format!(
        "{} {}",
        program.as_ref().to_string_lossy(),
        args.join(" ")
    );
    debug!("running `{pretty}` in {}", dir.display());

    let status = Command::new(&program)
        .args(args)
        .current_dir(dir)
        .status()
        .map_err(|_| BuildError::ProcessFailed {
            command: pretty.clone(),
            code: None,
        })?;

    if status.success() {
        Ok(())
    } else {
        Err(BuildError::ProcessFailed {
            command: pretty,
            code: status.code(),
        })
    }
}

/// Worker-count hint handed to build systems that take `-j`. Opaque to this
/// tool; the child process manages its own parallelism.
pub fn cpus() -> String {
    std::thread::available_parallelism()
        .map(std::num::NonZero::get)
        .unwrap_or(1)
        .to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;

    /// Fake component that records which steps ran and can fail at one of
    /// them, without spawning any processes.
    struct Recorder {
        fail_at: Option<Step>,
        log: Mutex<Vec<Step>>,
    }

    impl Recorder {
        fn new(fail_at: Option<Step>) -> Self {
            Recorder {
                fail_at,
                log: Mutex::new(Vec::new()),
            }
        }

        fn record(&self, step: Step) -> Result<(), BuildError> {
            self.log.lock().unwrap().push(step);
            if self.fail_at == Some(step) {
                return Err(BuildError::ProcessFailed {
                    command: "make".to_string(),
                    code: Some(2),
                });
            }
            Ok(())
        }

        fn steps(&self) -> Vec<Step> {
            self.log.lock().unwrap().clone()
        }
    }

    impl Component for Recorder {
        fn name(&self) -> &'static str {
            "widget"
        }
        fn dir(&self) -> &'static str {
            "widget"
        }
        fn build_flag(&self) -> &'static str {
            "buildWidget"
        }
        fn clean_flag(&self) -> &'static str {
            "cleanWidget"
        }
        fn validate(&self, _env: &BuildEnv) -> Result<(), BuildError> {
            self.record(Step::Validate)
        }
        fn prepare(&self, _env: &BuildEnv, _arch: Arch) -> Result<(), BuildError> {
            self.record(Step::Prepare)
        }
        fn install_config(&self, _env: &BuildEnv, _arch: Arch) -> Result<(), BuildError> {
            self.record(Step::InstallConfig)
        }
        fn normalize(&self, _env: &BuildEnv, _arch: Arch) -> Result<(), BuildError> {
            self.record(Step::Normalize)
        }
        fn compile(&self, _env: &BuildEnv, _arch: Arch) -> Result<(), BuildError> {
            self.record(Step::Compile)
        }
        fn post_process(&self, _env: &BuildEnv, _arch: Arch) -> Result<(), BuildError> {
            self.record(Step::PostProcess)
        }
    }

    struct Fixture {
        _tmp: tempfile::TempDir,
        project: Project,
        store: Store,
    }

    fn fixture(flags: &[(&str, bool)]) -> Fixture {
        let tmp = tempfile::tempdir().unwrap();
        let cwd = tmp.path().join("StarshipOS");
        fs::create_dir(&cwd).unwrap();
        let project = crate::project::resolve(&cwd, "StarshipOS").unwrap();
        let mut store = Store::load(&project.state_dir).unwrap();
        for (key, value) in flags {
            store.set_flag(key, *value);
        }
        store.save().unwrap();
        Fixture {
            _tmp: tmp,
            project,
            store,
        }
    }

    fn env(project: &Project) -> BuildEnv<'_> {
        BuildEnv {
            project,
            context: BuildContext::Standard,
        }
    }

    #[test]
    fn step_numbers_are_pipeline_positions() {
        assert_eq!(Step::Validate.number(), 1);
        assert_eq!(Step::Compile.number(), 5);
        assert_eq!(Step::PostProcess.number(), 6);
    }

    #[test]
    fn gate_skips_when_build_dir_exists() {
        let mut fx = fixture(&[("buildWidget", true), ("buildWidget.x86_64", true)]);
        fs::create_dir_all(fx.project.root.join("widget/build")).unwrap();

        let widget = Recorder::new(None);
        let outcomes =
            build_component(&env(&fx.project), &mut fx.store, &widget).unwrap();

        assert!(outcomes.is_empty());
        assert!(widget.steps().is_empty());
    }

    #[test]
    fn gate_allows_when_build_dir_absent() {
        let fx = fixture(&[]);
        let widget = Recorder::new(None);
        let e = env(&fx.project);
        assert!(should_build(&e, &widget));
        assert!(!e.component_dir(&widget).join("build").exists());
    }

    #[test]
    fn steps_run_in_order_on_success() {
        let mut fx = fixture(&[("buildWidget", true), ("buildWidget.x86_64", true)]);
        let widget = Recorder::new(None);

        let outcomes =
            build_component(&env(&fx.project), &mut fx.store, &widget).unwrap();

        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].is_success());
        assert_eq!(
            widget.steps(),
            vec![
                Step::Validate,
                Step::Prepare,
                Step::InstallConfig,
                Step::Normalize,
                Step::Compile,
                Step::PostProcess,
            ]
        );
        // Success must not mark the component dirty.
        let reloaded = Store::load(&fx.project.state_dir).unwrap();
        assert!(!reloaded.flag("cleanWidget"));
    }

    #[test]
    fn failing_step_short_circuits_and_persists_dirty_flag() {
        let mut fx = fixture(&[("buildWidget", true), ("buildWidget.x86_64", true)]);
        let widget = Recorder::new(Some(Step::Compile));

        let outcomes =
            build_component(&env(&fx.project), &mut fx.store, &widget).unwrap();

        assert_eq!(outcomes.len(), 1);
        let failure = outcomes[0].failure.as_ref().unwrap();
        assert_eq!(failure.step, Step::Compile);
        assert_eq!(failure.step.number(), 5);
        match &failure.error {
            BuildError::ProcessFailed { code, .. } => assert_eq!(*code, Some(2)),
            other => panic!("unexpected error: {other}"),
        }
        // Post-process never ran.
        assert_eq!(*widget.steps().last().unwrap(), Step::Compile);

        // The dirty flag hit the disk immediately, not at process exit.
        let reloaded = Store::load(&fx.project.state_dir).unwrap();
        assert!(reloaded.flag("cleanWidget"));
    }

    #[test]
    fn component_flag_off_skips_entirely() {
        let mut fx = fixture(&[("buildWidget", false), ("buildWidget.x86_64", true)]);
        let widget = Recorder::new(None);
        let outcomes =
            build_component(&env(&fx.project), &mut fx.store, &widget).unwrap();
        assert!(outcomes.is_empty());
        assert!(widget.steps().is_empty());
    }

    #[test]
    fn arm_is_short_circuited_not_attempted() {
        let mut fx = fixture(&[("buildWidget", true), ("buildWidget.ARM", true)]);
        let widget = Recorder::new(None);
        let outcomes =
            build_component(&env(&fx.project), &mut fx.store, &widget).unwrap();
        assert!(outcomes.is_empty());
        assert!(widget.steps().is_empty());
        let reloaded = Store::load(&fx.project.state_dir).unwrap();
        assert!(!reloaded.flag("cleanWidget"));
    }

    #[test]
    fn gate_uses_project_root_even_when_invoked_out_of_tree() {
        // Standard-context invocation from the parent of the project dir:
        // base_dir and root differ, and the gate must follow root so it
        // agrees with what smart-clean deletes.
        let tmp = tempfile::tempdir().unwrap();
        let project = crate::project::resolve(tmp.path(), "StarshipOS").unwrap();
        assert_ne!(project.base_dir, project.root);

        let widget = Recorder::new(None);
        let e = BuildEnv {
            project: &project,
            context: BuildContext::Standard,
        };

        assert!(should_build(&e, &widget));
        fs::create_dir_all(project.root.join("widget/build")).unwrap();
        assert!(!should_build(&e, &widget));
    }

    #[test]
    fn bootstrap_and_standard_contexts_resolve_different_bases() {
        let tmp = tempfile::tempdir().unwrap();
        let project = crate::project::resolve(tmp.path(), "StarshipOS").unwrap();

        let bootstrap = BuildContext::Bootstrap.component_dir(&project, "fiasco");
        let standard = BuildContext::Standard.component_dir(&project, "fiasco");

        assert_eq!(bootstrap, tmp.path().join("StarshipOS").join("fiasco"));
        assert_eq!(standard, tmp.path().join("fiasco"));
    }

    #[test]
    fn config_artifacts_resolve_for_x86_64_only() {
        assert!(config_artifact("fiasco", Arch::X86_64).is_ok());
        assert!(config_artifact("l4", Arch::X86_64).is_ok());
        match config_artifact("fiasco", Arch::Arm) {
            Err(BuildError::MissingConfigArtifact { component, arch }) => {
                assert_eq!(component, "fiasco");
                assert_eq!(arch, "arm");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn registry_lookup_by_name() {
        assert!(get("fiasco").is_some());
        assert!(get("l4").is_some());
        assert!(get("jdk").is_some());
        assert!(get("hurd").is_none());
    }
}
