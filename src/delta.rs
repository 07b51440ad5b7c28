//! Rates and percentages computed from pairs of counter snapshots.
//!
//! All functions are pure. A counter that went backwards (reboot, driver
//! reload, 32-bit wrap) yields a zero delta and sets `counter_reset`.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::collectors::{CpuTicks, DiskCounters, MemInfo, NetCounters};

/// Bytes per block-device sector as exposed by /proc/diskstats.
pub const SECTOR_BYTES: u64 = 512;

/// Delta of a monotonic counter, zero if it went backwards.
fn counter_delta(prev: u64, cur: u64, reset: &mut bool) -> u64 {
    if cur < prev {
        *reset = true;
        0
    } else {
        cur - prev
    }
}

/// CPU utilization over one sample window, integer percentages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuUsage {
    pub used_pct: u64,
    /// user + nice
    pub user_pct: u64,
    pub system_pct: u64,
    pub iowait_pct: u64,
    pub idle_pct: u64,
    pub delta_total: u64,
    pub counter_reset: bool,
}

/// Computes CPU usage from two tick snapshots.
///
/// `used = (Δtotal - Δidle) * 100 / Δtotal` with a divisor of 1 when no ticks
/// elapsed. The breakdown shares the same denominator; integer division may
/// leave the parts summing to slightly less than 100.
pub fn cpu_usage(prev: &CpuTicks, cur: &CpuTicks) -> CpuUsage {
    let mut reset = false;
    let user = counter_delta(prev.user, cur.user, &mut reset);
    let nice = counter_delta(prev.nice, cur.nice, &mut reset);
    let system = counter_delta(prev.system, cur.system, &mut reset);
    let idle = counter_delta(prev.idle, cur.idle, &mut reset);
    let iowait = counter_delta(prev.iowait, cur.iowait, &mut reset);
    let irq = counter_delta(prev.irq, cur.irq, &mut reset);
    let softirq = counter_delta(prev.softirq, cur.softirq, &mut reset);

    let delta_total = user + nice + system + idle + iowait + irq + softirq;
    let divisor = delta_total.max(1);

    CpuUsage {
        used_pct: (delta_total - idle) * 100 / divisor,
        user_pct: (user + nice) * 100 / divisor,
        system_pct: system * 100 / divisor,
        iowait_pct: iowait * 100 / divisor,
        idle_pct: idle * 100 / divisor,
        delta_total,
        counter_reset: reset,
    }
}

/// Raw I/O deltas of one device over a sample window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiskDelta {
    pub reads: u64,
    pub writes: u64,
    pub read_kb: u64,
    pub write_kb: u64,
    pub io_ms: Option<u64>,
    pub counter_reset: bool,
}

impl DiskDelta {
    /// True when the device completed no reads and no writes.
    pub fn is_idle(&self) -> bool {
        self.reads + self.writes == 0
    }

    /// Converts the deltas into per-second rates over `elapsed`.
    pub fn to_rate(&self, device: &str, elapsed: Duration) -> DiskDeviceRate {
        let secs = elapsed_secs(elapsed);
        let elapsed_ms = secs * 1000.0;

        DiskDeviceRate {
            device: device.to_string(),
            reads_per_sec: self.reads as f64 / secs,
            writes_per_sec: self.writes as f64 / secs,
            read_kb_per_sec: self.read_kb as f64 / secs,
            write_kb_per_sec: self.write_kb as f64 / secs,
            utilization: self
                .io_ms
                .map(|ms| (ms as f64 / elapsed_ms * 100.0).min(100.0)),
        }
    }
}

/// Per-second I/O figures of one device, whichever backend produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct DiskDeviceRate {
    pub device: String,
    pub reads_per_sec: f64,
    pub writes_per_sec: f64,
    pub read_kb_per_sec: f64,
    pub write_kb_per_sec: f64,
    /// Percent of the window the device was busy, when known.
    pub utilization: Option<f64>,
}

pub fn disk_delta(prev: &DiskCounters, cur: &DiskCounters) -> DiskDelta {
    let mut reset = false;
    let reads = counter_delta(prev.reads, cur.reads, &mut reset);
    let writes = counter_delta(prev.writes, cur.writes, &mut reset);
    let read_sectors = counter_delta(prev.read_sectors, cur.read_sectors, &mut reset);
    let write_sectors = counter_delta(prev.write_sectors, cur.write_sectors, &mut reset);
    let io_ms = match (prev.io_ms, cur.io_ms) {
        (Some(p), Some(c)) => Some(counter_delta(p, c, &mut reset)),
        _ => None,
    };

    DiskDelta {
        reads,
        writes,
        read_kb: sectors_to_kb(read_sectors),
        write_kb: sectors_to_kb(write_sectors),
        io_ms,
        counter_reset: reset,
    }
}

/// 512-byte sectors to KiB.
pub fn sectors_to_kb(sectors: u64) -> u64 {
    sectors / (1024 / SECTOR_BYTES)
}

/// Deltas of every device present in both snapshots.
pub fn disk_deltas(
    prev: &BTreeMap<String, DiskCounters>,
    cur: &BTreeMap<String, DiskCounters>,
) -> Vec<(String, DiskDelta)> {
    cur.iter()
        .filter_map(|(device, now)| Some((device.clone(), disk_delta(prev.get(device)?, now))))
        .collect()
}

/// Deltas of every device present in both snapshots that did any I/O.
pub fn active_disk_deltas(
    prev: &BTreeMap<String, DiskCounters>,
    cur: &BTreeMap<String, DiskCounters>,
) -> Vec<(String, DiskDelta)> {
    disk_deltas(prev, cur)
        .into_iter()
        .filter(|(_, delta)| !delta.is_idle())
        .collect()
}

/// Byte rates of one interface over a sample window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetRate {
    pub rx_bytes_per_sec: f64,
    pub tx_bytes_per_sec: f64,
    pub rx_delta: u64,
    pub tx_delta: u64,
    pub elapsed: Duration,
    pub counter_reset: bool,
}

/// Normalises the byte deltas by the measured elapsed time.
pub fn net_rate(prev: &NetCounters, cur: &NetCounters, elapsed: Duration) -> NetRate {
    let mut reset = false;
    let rx_delta = counter_delta(prev.rx_bytes, cur.rx_bytes, &mut reset);
    let tx_delta = counter_delta(prev.tx_bytes, cur.tx_bytes, &mut reset);
    let secs = elapsed_secs(elapsed);

    NetRate {
        rx_bytes_per_sec: rx_delta as f64 / secs,
        tx_bytes_per_sec: tx_delta as f64 / secs,
        rx_delta,
        tx_delta,
        elapsed,
        counter_reset: reset,
    }
}

/// Load average as a percentage of the online core count.
pub fn load_ratio(load: f64, cores: usize) -> f64 {
    load / cores.max(1) as f64 * 100.0
}

/// Memory usage derived from /proc/meminfo figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryUsage {
    pub total_kb: u64,
    pub used_kb: u64,
    pub available_kb: u64,
    pub buffers_kb: u64,
    pub cached_kb: u64,
    pub used_pct: u64,
}

/// `used = total - available`; reclaimable cache counts as available.
pub fn memory_usage(mem: &MemInfo) -> MemoryUsage {
    let used_kb = mem.total_kb.saturating_sub(mem.available_kb);
    MemoryUsage {
        total_kb: mem.total_kb,
        used_kb,
        available_kb: mem.available_kb,
        buffers_kb: mem.buffers_kb,
        cached_kb: mem.cached_kb,
        used_pct: percent_of(used_kb, mem.total_kb),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapUsage {
    pub total_kb: u64,
    pub used_kb: u64,
    pub used_pct: u64,
}

/// Swap usage, `None` when no swap is configured.
pub fn swap_usage(mem: &MemInfo) -> Option<SwapUsage> {
    if mem.swap_total_kb == 0 {
        return None;
    }
    let used_kb = mem.swap_total_kb.saturating_sub(mem.swap_free_kb);
    Some(SwapUsage {
        total_kb: mem.swap_total_kb,
        used_kb,
        used_pct: percent_of(used_kb, mem.swap_total_kb),
    })
}

fn percent_of(part: u64, whole: u64) -> u64 {
    if whole == 0 {
        0
    } else {
        part * 100 / whole
    }
}

/// Elapsed seconds as a divisor; a zero window counts as one second.
fn elapsed_secs(elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        secs
    } else {
        1.0
    }
}
