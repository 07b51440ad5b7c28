//! Optional external diagnostic tools.
//!
//! Tools are located once at startup ([`ToolProbe::detect`]). Running a tool
//! that is missing, exits non-zero, hangs or prints something unexpected
//! yields a [`CollectError`] that callers treat as "feature unavailable".

pub mod disk_source;
pub mod ifstat;
pub mod iostat;
pub mod iotop;
pub mod mpstat;
pub mod ss;

pub use disk_source::{select_disk_source, DiskSample, DiskStatSource, IostatSource, ProcDiskSource};

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use crate::error::CollectError;

/// Extra time a tool gets beyond its own sampling window.
const TOOL_TIMEOUT_SLACK: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tool {
    Iostat,
    Mpstat,
    Ifstat,
    Iotop,
    Ss,
}

impl Tool {
    pub const ALL: [Tool; 5] = [Tool::Iostat, Tool::Mpstat, Tool::Ifstat, Tool::Iotop, Tool::Ss];

    pub fn binary(&self) -> &'static str {
        match self {
            Tool::Iostat => "iostat",
            Tool::Mpstat => "mpstat",
            Tool::Ifstat => "ifstat",
            Tool::Iotop => "iotop",
            Tool::Ss => "ss",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binary())
    }
}

/// Locations of the optional tools found on this host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolProbe {
    pub iostat: Option<PathBuf>,
    pub mpstat: Option<PathBuf>,
    pub ifstat: Option<PathBuf>,
    pub iotop: Option<PathBuf>,
    pub ss: Option<PathBuf>,
}

impl ToolProbe {
    /// Searches `PATH` for every tool.
    pub fn detect() -> Self {
        let find = |tool: Tool| match which::which(tool.binary()) {
            Ok(path) => {
                debug!("Found {} at {}", tool, path.display());
                Some(path)
            }
            Err(_) => {
                debug!("{} not found, feature unavailable", tool);
                None
            }
        };

        ToolProbe {
            iostat: find(Tool::Iostat),
            mpstat: find(Tool::Mpstat),
            ifstat: find(Tool::Ifstat),
            iotop: find(Tool::Iotop),
            ss: find(Tool::Ss),
        }
    }

    /// A probe that reports every tool as absent.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn path(&self, tool: Tool) -> Option<&Path> {
        match tool {
            Tool::Iostat => self.iostat.as_deref(),
            Tool::Mpstat => self.mpstat.as_deref(),
            Tool::Ifstat => self.ifstat.as_deref(),
            Tool::Iotop => self.iotop.as_deref(),
            Tool::Ss => self.ss.as_deref(),
        }
    }

    pub fn available(&self) -> Vec<Tool> {
        Tool::ALL
            .into_iter()
            .filter(|t| self.path(*t).is_some())
            .collect()
    }
}

/// Runs a probed tool and returns its stdout.
///
/// `window` is the sampling time the tool itself spends; the call is abandoned
/// (and the child killed) if it takes much longer.
pub async fn run_tool(
    probe: &ToolProbe,
    tool: Tool,
    args: &[String],
    window: Duration,
) -> Result<String, CollectError> {
    let tool_name = tool.binary();
    let path = probe
        .path(tool)
        .ok_or(CollectError::ToolUnavailable { tool: tool_name })?;

    debug!("Running {} {}", path.display(), args.join(" "));

    let child = Command::new(path)
        .args(args)
        .env("LC_ALL", "C")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .output();

    let output = match tokio::time::timeout(window + TOOL_TIMEOUT_SLACK, child).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            debug!("Failed to spawn {}: {}", tool_name, e);
            return Err(CollectError::ToolUnavailable { tool: tool_name });
        }
        Err(_) => {
            return Err(CollectError::ToolFailed {
                tool: tool_name,
                status: "timeout".to_string(),
            })
        }
    };

    if !output.status.success() {
        return Err(CollectError::ToolFailed {
            tool: tool_name,
            status: output.status.to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Whole seconds for a tool's interval argument, at least one.
pub(crate) fn window_arg(window: Duration) -> String {
    window.as_secs().max(1).to_string()
}
