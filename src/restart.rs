//! Application restart
//!
//! The restart shortcuts spawn a fresh copy of the current executable and
//! let the running instance shut down normally, so the new process never
//! inherits half-written state.

use std::process::Command;

use anyhow::{Context, Result};
use tracing::info;

/// Spawn a new instance of this executable with no arguments (editor mode).
/// The child is not waited on; it outlives this process.
pub fn relaunch() -> Result<()> {
    let exe = std::env::current_exe().context("Failed to resolve executable path")?;
    let child = Command::new(&exe)
        .spawn()
        .with_context(|| format!("Failed to relaunch {}", exe.display()))?;
    info!(pid = child.id(), "Spawned replacement process");
    Ok(())
}

/// Spawn the editor from generator mode, e.g. when no valid configuration
/// exists yet for a conversion run.
pub fn launch_editor() -> Result<()> {
    relaunch()
}
