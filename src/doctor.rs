//! Check that the external toolchain this orchestrator shells out to is
//! actually present. Absence of a tool during a build surfaces as an ordinary
//! step failure; this is just the friendlier up-front report.

use anyhow::{bail, Result};

const REQUIRED_TOOLS: &[(&str, &str)] = &[
    ("make", "drives every component build"),
    ("git", "source checkouts"),
    ("mkisofs", "ISO packaging (build-iso)"),
    ("qemu-system-x86_64", "boot testing (run)"),
];

pub fn run() -> Result<()> {
    let mut ok = true;

    for (tool, why) in REQUIRED_TOOLS {
        if which::which(tool).is_ok() {
            eprintln!("[OK] {tool}");
        } else {
            eprintln!("[FAIL] missing `{tool}` in PATH ({why})");
            ok = false;
        }
    }

    if !ok {
        bail!("doctor checks failed");
    }
    Ok(())
}
