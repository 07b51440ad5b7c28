//! Startup requirement validation for herakles-healthcheck.
//!
//! Verifies that the proc filesystem is usable before the first cycle and
//! logs which optional tools were found. Missing individual sources only
//! produce warnings; their sections will render as unavailable.

use nix::unistd::geteuid;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::tools::{Tool, ToolProbe};

/// Kernel sources read by the report sections.
pub const PROC_SOURCES: [&str; 6] = ["stat", "loadavg", "diskstats", "net/dev", "meminfo", "mounts"];

/// Validate all runtime requirements
pub fn validate_requirements(proc_root: &Path, probe: &ToolProbe) -> Result<Vec<String>, ValidationError> {
    info!("Validating runtime requirements...");

    check_proc_root(proc_root)?;
    let missing = check_proc_sources(proc_root);
    check_user_privileges(probe);
    log_tools(probe);

    info!("Runtime requirements validated");
    Ok(missing)
}

fn check_proc_root(proc_root: &Path) -> Result<(), ValidationError> {
    if !proc_root.is_dir() {
        return Err(ValidationError::ProcRootMissing(proc_root.display().to_string()));
    }
    Ok(())
}

/// Returns the sources that do not exist below `proc_root`.
fn check_proc_sources(proc_root: &Path) -> Vec<String> {
    let missing: Vec<String> = PROC_SOURCES
        .iter()
        .filter(|source| !proc_root.join(source).exists())
        .map(|source| source.to_string())
        .collect();

    for source in &missing {
        warn!(
            "{} not found, the matching section will be unavailable",
            proc_root.join(source).display()
        );
    }
    missing
}

/// Check if running with sufficient privileges
fn check_user_privileges(probe: &ToolProbe) {
    if geteuid().is_root() {
        debug!("Running as root (uid=0)");
    } else if probe.iotop.is_some() {
        info!("Not running as root - iotop usually needs root, top I/O processes may be missing");
    }
}

fn log_tools(probe: &ToolProbe) {
    for tool in Tool::ALL {
        match probe.path(tool) {
            Some(path) => debug!("Optional tool {}: {}", tool, path.display()),
            None => debug!("Optional tool {}: not available", tool),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("proc filesystem root {0} is not a directory")]
    ProcRootMissing(String),
}
