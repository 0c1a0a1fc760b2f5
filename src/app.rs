//! Dispatch from the CLI to orchestrator operations.
//!
//! Every operation resolves the project root and loads the flag store fresh;
//! nothing is shared across invocations except what the store persists.
//! Concurrent invocations against the same project root are not coordinated.

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::cli::{Cli, Cmd};
use crate::config::Store;
use crate::pipeline::{self, BuildContext, BuildEnv, Component};
use crate::project::{self, Project};

pub fn run(cli: Cli) -> Result<()> {
    if let Cmd::Doctor = cli.cmd {
        return crate::doctor::run();
    }

    let cwd = std::env::current_dir().context("cannot determine current directory")?;
    let project = project::resolve(&cwd, &cli.project_name)?;
    let mut store = Store::load(&project.state_dir)?;

    match cli.cmd {
        Cmd::Initialize => build(&project, &mut store, BuildContext::Bootstrap, pipeline::COMPONENTS),
        Cmd::BuildCore => build(&project, &mut store, BuildContext::Standard, pipeline::COMPONENTS),
        Cmd::BuildFiasco => build_one(&project, &mut store, "fiasco"),
        Cmd::BuildL4 => build_one(&project, &mut store, "l4"),
        Cmd::BuildJdk => build_one(&project, &mut store, "jdk"),
        Cmd::SmartClean => {
            let report = crate::clean::clean(&project, &mut store)?;
            info!(
                "[smart-clean] removed {} build director{}, {} already absent",
                report.removed.len(),
                if report.removed.len() == 1 { "y" } else { "ies" },
                report.skipped.len()
            );
            Ok(())
        }
        Cmd::BuildIso => crate::iso::build_iso(&project).map_err(Into::into),
        Cmd::Run => crate::qemu::run(&project).map_err(Into::into),
        Cmd::Doctor => unreachable!("handled above"),
    }
}

fn build_one(project: &Project, store: &mut Store, name: &str) -> Result<()> {
    let component = pipeline::get(name)
        .with_context(|| format!("unknown component: {name}"))?;
    build(project, store, BuildContext::Standard, &[component])
}

/// Run the requested components in order. A component failure does not stop
/// the next component; the invocation still exits non-zero at the end.
fn build(
    project: &Project,
    store: &mut Store,
    context: BuildContext,
    components: &[&dyn Component],
) -> Result<()> {
    let env = BuildEnv { project, context };
    let mut failed: Vec<String> = Vec::new();

    for c in components {
        let outcomes = pipeline::build_component(&env, store, *c)?;
        failed.extend(
            outcomes
                .iter()
                .filter(|o| !o.is_success())
                .map(|o| format!("{}/{}", c.name(), o.arch)),
        );
    }

    if !failed.is_empty() {
        bail!(
            "build failed for {}; run `starship-builder smart-clean` before rebuilding",
            failed.join(", ")
        );
    }
    Ok(())
}
