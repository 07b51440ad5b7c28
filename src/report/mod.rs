//! One health report cycle and the watch loop around it.
//!
//! A cycle always runs the same fixed sequence: interface detection, host
//! header, CPU, load, disk, bandwidth, memory. Every section carries its own
//! `Result`, so a missing /proc file or a broken tool only blanks that
//! section.

pub mod logfile;
pub mod render;
mod sections;

pub use sections::{sample_bandwidth, sample_cpu, sample_disk, sample_load, sample_memory};

use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::classify::{Severity, MIB};
use crate::collectors::{FilesystemUsage, LoadAvg};
use crate::config::ReportSettings;
use crate::delta::{CpuUsage, DiskDeviceRate, MemoryUsage, NetRate, SwapUsage};
use crate::error::CollectError;
use crate::interface::detect_default_interface;
use crate::system::HostInfo;
use crate::tools::{
    ifstat::IfstatSample, mpstat::CoreUsage, select_disk_source, ss::SocketSummary,
    DiskStatSource, ProcDiskSource, ToolProbe,
};

pub type SectionResult<T> = Result<T, CollectError>;

#[derive(Debug, Clone, PartialEq)]
pub struct CpuSection {
    pub usage: CpuUsage,
    pub severity: Severity,
    /// Per-core usage from mpstat, when installed.
    pub per_core: Option<Vec<CoreUsage>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadSection {
    pub load: LoadAvg,
    pub cores: usize,
    /// 1, 5 and 15 minute averages as percent of the core count.
    pub ratios: [f64; 3],
    pub severities: [Severity; 3],
}

impl LoadSection {
    pub fn severity(&self) -> Severity {
        Severity::worst(self.severities)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceReport {
    pub rate: DiskDeviceRate,
    /// `None` when the backend has no utilization figure.
    pub severity: Option<Severity>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiskIo {
    pub source: &'static str,
    pub devices: Vec<DeviceReport>,
    pub includes_idle: bool,
    pub counter_reset: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilesystemReport {
    pub usage: FilesystemUsage,
    pub severity: Severity,
}

#[derive(Debug)]
pub struct DiskSection {
    pub io: SectionResult<DiskIo>,
    pub filesystems: SectionResult<Vec<FilesystemReport>>,
    /// Top I/O processes from iotop, when installed and permitted.
    pub top_io: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BandwidthSection {
    pub interface: String,
    pub rate: NetRate,
    pub rx_severity: Severity,
    pub tx_severity: Severity,
    pub ifstat: Option<IfstatSample>,
    pub sockets: Option<SocketSummary>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemorySection {
    pub memory: MemoryUsage,
    pub severity: Severity,
    /// `None` when no swap is configured.
    pub swap: Option<(SwapUsage, Severity)>,
}

/// A metric that reached warn or critical, for the footer.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub section: &'static str,
    pub metric: String,
    pub value: String,
    pub severity: Severity,
}

/// Everything one cycle produced.
#[derive(Debug)]
pub struct Report {
    pub generated_at: DateTime<Local>,
    pub cycle_started: Instant,
    pub cycle_duration: Duration,
    pub host: HostInfo,
    pub interface: Option<String>,
    pub cpu: SectionResult<CpuSection>,
    pub load: SectionResult<LoadSection>,
    pub disk: DiskSection,
    pub bandwidth: SectionResult<BandwidthSection>,
    pub memory: SectionResult<MemorySection>,
}

impl Report {
    /// Every warn or critical metric in report order.
    pub fn alerts(&self) -> Vec<Alert> {
        let mut alerts = Vec::new();
        let mut push = |section, metric: String, value: String, severity: Severity| {
            if severity > Severity::Ok {
                alerts.push(Alert {
                    section,
                    metric,
                    value,
                    severity,
                });
            }
        };

        if let Ok(cpu) = &self.cpu {
            push("cpu", "used".into(), format!("{}%", cpu.usage.used_pct), cpu.severity);
        }
        if let Ok(load) = &self.load {
            for (label, (ratio, severity)) in ["1m", "5m", "15m"]
                .iter()
                .zip(load.ratios.iter().zip(load.severities))
            {
                push("load", format!("load {}", label), format!("{:.1}%", ratio), severity);
            }
        }
        if let Ok(io) = &self.disk.io {
            for dev in &io.devices {
                if let (Some(util), Some(severity)) = (dev.rate.utilization, dev.severity) {
                    push("disk", dev.rate.device.clone(), format!("{:.1}% util", util), severity);
                }
            }
        }
        if let Ok(filesystems) = &self.disk.filesystems {
            for fs in filesystems {
                push(
                    "filesystem",
                    fs.usage.mount_point.clone(),
                    format!("{}% used", fs.usage.use_pct),
                    fs.severity,
                );
            }
        }
        if let Ok(bw) = &self.bandwidth {
            push(
                "bandwidth",
                format!("{} rx", bw.interface),
                format!("{:.1} MiB/s", bw.rate.rx_bytes_per_sec / MIB),
                bw.rx_severity,
            );
            push(
                "bandwidth",
                format!("{} tx", bw.interface),
                format!("{:.1} MiB/s", bw.rate.tx_bytes_per_sec / MIB),
                bw.tx_severity,
            );
        }
        if let Ok(mem) = &self.memory {
            push("memory", "ram".into(), format!("{}%", mem.memory.used_pct), mem.severity);
            if let Some((swap, severity)) = &mem.swap {
                push("memory", "swap".into(), format!("{}%", swap.used_pct), *severity);
            }
        }

        alerts
    }

    /// Worst severity across the whole report.
    pub fn overall(&self) -> Severity {
        Severity::worst(self.alerts().into_iter().map(|a| a.severity))
    }
}

/// Data sources chosen once at startup.
pub struct Sources {
    pub probe: ToolProbe,
    pub disk: Box<dyn DiskStatSource>,
    /// Used for a cycle when the selected disk backend fails.
    pub proc_disk: ProcDiskSource,
}

impl Sources {
    /// Probes the external tools unless the settings disable them.
    pub fn from_settings(settings: &ReportSettings) -> Self {
        let probe = if settings.use_external_tools {
            ToolProbe::detect()
        } else {
            debug!("External tools disabled, using /proc only");
            ToolProbe::none()
        };
        Self::with_probe(probe, settings)
    }

    pub fn with_probe(probe: ToolProbe, settings: &ReportSettings) -> Self {
        let disk = select_disk_source(&probe, &settings.proc_root);
        info!("Disk statistics source: {}", disk.name());
        Self {
            probe,
            disk,
            proc_disk: ProcDiskSource::new(&settings.proc_root),
        }
    }
}

/// Collects one full report.
pub async fn collect_report(settings: &ReportSettings, sources: &Sources) -> Report {
    let cycle_started = Instant::now();
    let generated_at = Local::now();

    let interface = match &settings.interface {
        Some(name) => Some(name.clone()),
        None => detect_default_interface(&settings.proc_root),
    };
    let host = HostInfo::gather(&settings.proc_root);

    let (cpu, load, disk, bandwidth, memory) = if settings.parallel_sampling {
        tokio::join!(
            sample_cpu(settings, &sources.probe),
            async { sample_load(settings, host.cores) },
            sample_disk(settings, sources),
            sample_bandwidth(settings, &sources.probe, interface.as_deref()),
            async { sample_memory(settings) },
        )
    } else {
        let cpu = sample_cpu(settings, &sources.probe).await;
        let load = sample_load(settings, host.cores);
        let disk = sample_disk(settings, sources).await;
        let bandwidth = sample_bandwidth(settings, &sources.probe, interface.as_deref()).await;
        let memory = sample_memory(settings);
        (cpu, load, disk, bandwidth, memory)
    };

    let cycle_duration = cycle_started.elapsed();
    debug!("Report cycle took {:?}", cycle_duration);

    Report {
        generated_at,
        cycle_started,
        cycle_duration,
        host,
        interface,
        cpu,
        load,
        disk,
        bandwidth,
        memory,
    }
}

/// Runs report cycles until done.
///
/// With `settings.watch` unset exactly one cycle runs. Otherwise cycles repeat
/// `settings.interval` apart until `on_cycle` breaks or `shutdown` resolves.
/// `shutdown` is observed while sampling and while sleeping; `on_cycle` itself
/// is never interrupted. Returns the number of completed cycles.
pub async fn run<S, F>(settings: &ReportSettings, sources: &Sources, shutdown: S, mut on_cycle: F) -> usize
where
    S: Future<Output = ()>,
    F: FnMut(&Report) -> ControlFlow<()>,
{
    tokio::pin!(shutdown);
    let mut cycles = 0;

    loop {
        let report = tokio::select! {
            report = collect_report(settings, sources) => report,
            _ = &mut shutdown => {
                info!("Shutdown requested while sampling");
                break;
            }
        };

        cycles += 1;
        if on_cycle(&report).is_break() || !settings.watch {
            break;
        }

        tokio::select! {
            _ = tokio::time::sleep(settings.interval) => {}
            _ = &mut shutdown => {
                info!("Shutdown requested, stopping watch mode");
                break;
            }
        }
    }

    cycles
}
