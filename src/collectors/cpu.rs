//! CPU tick counters from /proc/stat.

use std::collections::BTreeMap;
use std::path::Path;

use super::read_proc_file;
use crate::error::CollectError;

/// Time-in-state tick counters of one `cpu` line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTicks {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
}

impl CpuTicks {
    /// Sum of all seven states.
    pub fn total(&self) -> u64 {
        self.user + self.nice + self.system + self.idle + self.iowait + self.irq + self.softirq
    }
}

/// Parses one `cpu...` line into its name and counters.
///
/// Format: "cpu  user nice system idle iowait irq softirq [steal guest guest_nice]"
pub fn parse_cpu_line(line: &str) -> Option<(String, CpuTicks)> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 8 || !parts[0].starts_with("cpu") {
        return None;
    }

    let field = |i: usize| parts[i].parse::<u64>().ok();

    Some((
        parts[0].to_string(),
        CpuTicks {
            user: field(1)?,
            nice: field(2)?,
            system: field(3)?,
            idle: field(4)?,
            iowait: field(5)?,
            irq: field(6)?,
            softirq: field(7)?,
        },
    ))
}

/// Parses the aggregate `cpu` line of /proc/stat content.
pub fn parse_cpu_ticks(content: &str) -> Option<CpuTicks> {
    content
        .lines()
        .filter_map(parse_cpu_line)
        .find(|(name, _)| name == "cpu")
        .map(|(_, ticks)| ticks)
}

/// Parses the per-core `cpuN` lines of /proc/stat content.
pub fn parse_per_core_ticks(content: &str) -> BTreeMap<String, CpuTicks> {
    content
        .lines()
        .filter_map(parse_cpu_line)
        .filter(|(name, _)| name != "cpu")
        .collect()
}

/// Reads the aggregate CPU counters.
pub fn read_cpu_ticks(proc_root: &Path) -> Result<CpuTicks, CollectError> {
    let (path, content) = read_proc_file(proc_root, "stat")?;
    parse_cpu_ticks(&content).ok_or_else(|| CollectError::malformed(path, "no aggregate cpu line"))
}

/// Reads per-core CPU counters, keyed by `cpu0`, `cpu1`, ...
pub fn read_per_core_ticks(proc_root: &Path) -> Result<BTreeMap<String, CpuTicks>, CollectError> {
    let (path, content) = read_proc_file(proc_root, "stat")?;
    let cores = parse_per_core_ticks(&content);
    if cores.is_empty() {
        return Err(CollectError::malformed(path, "no per-core cpu lines"));
    }
    Ok(cores)
}
