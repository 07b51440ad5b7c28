//! Backends for per-device disk I/O figures.
//!
//! The report only talks to [`DiskStatSource`]; which implementation answers
//! is decided once at startup from the tool probe.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::iostat::parse_iostat;
use super::{run_tool, window_arg, Tool, ToolProbe};
use crate::collectors::{read_disk_counters, DiskCounters};
use crate::delta::{disk_deltas, DiskDeviceRate};
use crate::error::CollectError;

/// Per-device rates over one window, plus how they were obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct DiskSample {
    pub source: &'static str,
    pub devices: Vec<DiskDeviceRate>,
    /// True when devices without I/O are listed too.
    pub includes_idle: bool,
    pub counter_reset: bool,
}

#[async_trait]
pub trait DiskStatSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Samples every device over `window`.
    async fn sample(&self, window: Duration) -> Result<DiskSample, CollectError>;
}

/// Uses the external `iostat` tool, which also reports %util.
pub struct IostatSource {
    probe: ToolProbe,
}

impl IostatSource {
    pub fn new(probe: ToolProbe) -> Self {
        Self { probe }
    }
}

#[async_trait]
impl DiskStatSource for IostatSource {
    fn name(&self) -> &'static str {
        "iostat"
    }

    async fn sample(&self, window: Duration) -> Result<DiskSample, CollectError> {
        let args = vec![
            "-d".to_string(),
            "-x".to_string(),
            "-k".to_string(),
            window_arg(window),
            "2".to_string(),
        ];
        let output = run_tool(&self.probe, Tool::Iostat, &args, window).await?;
        let devices = parse_iostat(&output).map_err(|reason| CollectError::ToolOutput {
            tool: "iostat",
            reason,
        })?;

        Ok(DiskSample {
            source: self.name(),
            devices,
            includes_idle: true,
            counter_reset: false,
        })
    }
}

/// Two reads of /proc/diskstats around a sleep.
pub struct ProcDiskSource {
    proc_root: PathBuf,
}

impl ProcDiskSource {
    pub fn new(proc_root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
        }
    }
}

#[async_trait]
impl DiskStatSource for ProcDiskSource {
    fn name(&self) -> &'static str {
        "/proc/diskstats"
    }

    async fn sample(&self, window: Duration) -> Result<DiskSample, CollectError> {
        let before = read_disk_counters(&self.proc_root)?;
        let started = Instant::now();
        tokio::time::sleep(window).await;
        let after = read_disk_counters(&self.proc_root)?;
        Ok(proc_sample(self.name(), &before, &after, started.elapsed()))
    }
}

/// Rates of the devices that did I/O between two snapshots.
///
/// A reset is flagged even when it left the device looking idle.
fn proc_sample(
    source: &'static str,
    before: &BTreeMap<String, DiskCounters>,
    after: &BTreeMap<String, DiskCounters>,
    elapsed: Duration,
) -> DiskSample {
    let deltas = disk_deltas(before, after);
    let counter_reset = deltas.iter().any(|(_, d)| d.counter_reset);
    if counter_reset {
        tracing::warn!("Disk counters went backwards during the sample window");
    }

    DiskSample {
        source,
        devices: deltas
            .iter()
            .filter(|(_, delta)| !delta.is_idle())
            .map(|(device, delta)| delta.to_rate(device, elapsed))
            .collect(),
        includes_idle: false,
        counter_reset,
    }
}

/// Chooses iostat when the probe found it, /proc/diskstats otherwise.
pub fn select_disk_source(probe: &ToolProbe, proc_root: &std::path::Path) -> Box<dyn DiskStatSource> {
    if probe.iostat.is_some() {
        Box::new(IostatSource::new(probe.clone()))
    } else {
        Box::new(ProcDiskSource::new(proc_root))
    }
}
