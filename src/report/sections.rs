//! Per-section samplers.

use tokio::time::Instant;
use tracing::{debug, warn};

use super::{
    BandwidthSection, CpuSection, DeviceReport, DiskIo, DiskSection, FilesystemReport,
    LoadSection, MemorySection, SectionResult, Sources,
};
use crate::collectors::{read_cpu_ticks, read_filesystems, read_load_avg, read_mem_info, read_net_counters};
use crate::config::ReportSettings;
use crate::delta::{cpu_usage, load_ratio, memory_usage, net_rate, swap_usage};
use crate::error::CollectError;
use crate::tools::{
    ifstat::parse_ifstat, iotop::parse_iotop, mpstat::parse_mpstat, run_tool, ss::parse_ss_summary,
    window_arg, DiskSample, DiskStatSource, Tool, ToolProbe,
};

/// CPU utilization over one sample window, plus mpstat per-core figures.
pub async fn sample_cpu(settings: &ReportSettings, probe: &ToolProbe) -> SectionResult<CpuSection> {
    let before = read_cpu_ticks(&settings.proc_root)?;
    tokio::time::sleep(settings.sample).await;
    let after = read_cpu_ticks(&settings.proc_root)?;

    let usage = cpu_usage(&before, &after);
    if usage.counter_reset {
        warn!("CPU tick counters went backwards, affected deltas clamped to 0");
    }

    let per_core = if probe.mpstat.is_some() {
        let args = vec![
            "-P".to_string(),
            "ALL".to_string(),
            window_arg(settings.sample),
            "1".to_string(),
        ];
        match run_tool(probe, Tool::Mpstat, &args, settings.sample).await {
            Ok(out) => match parse_mpstat(&out) {
                Ok(cores) => Some(cores),
                Err(reason) => {
                    debug!("Ignoring mpstat output: {}", reason);
                    None
                }
            },
            Err(e) => {
                debug!("Per-core CPU unavailable: {}", e);
                None
            }
        }
    } else {
        None
    };

    Ok(CpuSection {
        severity: settings.thresholds.cpu.classify(usage.used_pct as f64),
        usage,
        per_core,
    })
}

/// Load averages relative to the core count. No sampling window.
pub fn sample_load(settings: &ReportSettings, cores: usize) -> SectionResult<LoadSection> {
    let load = read_load_avg(&settings.proc_root)?;
    let ratios = [
        load_ratio(load.load1, cores),
        load_ratio(load.load5, cores),
        load_ratio(load.load15, cores),
    ];
    let severities = ratios.map(|r| settings.thresholds.load.classify(r));

    Ok(LoadSection {
        load,
        cores,
        ratios,
        severities,
    })
}

/// Device I/O rates, filesystem usage and the top I/O processes.
pub async fn sample_disk(settings: &ReportSettings, sources: &Sources) -> DiskSection {
    let io = sample_disk_io(settings, sources).await.map(|sample| DiskIo {
        source: sample.source,
        devices: sample
            .devices
            .into_iter()
            .map(|rate| DeviceReport {
                severity: rate
                    .utilization
                    .map(|u| settings.thresholds.disk_util.classify(u)),
                rate,
            })
            .collect(),
        includes_idle: sample.includes_idle,
        counter_reset: sample.counter_reset,
    });

    let filesystems = read_filesystems(&settings.proc_root).map(|list| {
        list.into_iter()
            .map(|usage| FilesystemReport {
                severity: settings.thresholds.filesystem.classify(usage.use_pct as f64),
                usage,
            })
            .collect()
    });

    let top_io = if sources.probe.iotop.is_some() {
        let args: Vec<String> = ["-b", "-o", "-n", "1", "-qqq", "-k"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        match run_tool(&sources.probe, Tool::Iotop, &args, settings.sample).await {
            Ok(out) => Some(parse_iotop(&out)),
            Err(e) => {
                debug!("Top I/O processes unavailable: {}", e);
                None
            }
        }
    } else {
        None
    };

    DiskSection {
        io,
        filesystems,
        top_io,
    }
}

async fn sample_disk_io(settings: &ReportSettings, sources: &Sources) -> SectionResult<DiskSample> {
    match sources.disk.sample(settings.sample).await {
        Ok(sample) => Ok(sample),
        Err(e) if e.is_tool_error() => {
            debug!("{} failed ({}), falling back to {}", sources.disk.name(), e, sources.proc_disk.name());
            sources.proc_disk.sample(settings.sample).await
        }
        Err(e) => Err(e),
    }
}

/// Throughput of one interface over one sample window.
///
/// /proc/net/dev is authoritative; ifstat and ss only add detail.
pub async fn sample_bandwidth(
    settings: &ReportSettings,
    probe: &ToolProbe,
    interface: Option<&str>,
) -> SectionResult<BandwidthSection> {
    let name = interface.ok_or_else(|| CollectError::NoSuchInterface {
        name: "(none detected)".to_string(),
    })?;
    let missing = || CollectError::NoSuchInterface {
        name: name.to_string(),
    };

    let before_counters = read_net_counters(&settings.proc_root)?;
    let started = Instant::now();
    let before = *before_counters.get(name).ok_or_else(missing)?;

    tokio::time::sleep(settings.sample).await;

    let after_counters = read_net_counters(&settings.proc_root)?;
    let elapsed = started.elapsed();
    let after = *after_counters.get(name).ok_or_else(missing)?;

    let rate = net_rate(&before, &after, elapsed);
    if rate.counter_reset {
        warn!("Byte counters of {} went backwards, rate clamped to 0", name);
    }

    let ifstat = if probe.ifstat.is_some() {
        let args = vec![
            "-i".to_string(),
            name.to_string(),
            window_arg(settings.sample),
            "1".to_string(),
        ];
        match run_tool(probe, Tool::Ifstat, &args, settings.sample).await {
            Ok(out) => parse_ifstat(&out)
                .map_err(|reason| debug!("Ignoring ifstat output: {}", reason))
                .ok(),
            Err(e) => {
                debug!("ifstat confirmation unavailable: {}", e);
                None
            }
        }
    } else {
        None
    };

    let sockets = if probe.ss.is_some() {
        match run_tool(probe, Tool::Ss, &["-s".to_string()], std::time::Duration::ZERO).await {
            Ok(out) => parse_ss_summary(&out)
                .map_err(|reason| debug!("Ignoring ss output: {}", reason))
                .ok(),
            Err(e) => {
                debug!("Socket summary unavailable: {}", e);
                None
            }
        }
    } else {
        None
    };

    let network = settings.thresholds.network;
    Ok(BandwidthSection {
        interface: name.to_string(),
        rx_severity: network.classify(rate.rx_bytes_per_sec),
        tx_severity: network.classify(rate.tx_bytes_per_sec),
        rate,
        ifstat,
        sockets,
    })
}

/// Memory and swap usage. No sampling window.
pub fn sample_memory(settings: &ReportSettings) -> SectionResult<MemorySection> {
    let info = read_mem_info(&settings.proc_root)?;
    let memory = memory_usage(&info);
    let swap = swap_usage(&info).map(|s| (s, settings.thresholds.swap.classify(s.used_pct as f64)));

    Ok(MemorySection {
        severity: settings.thresholds.memory.classify(memory.used_pct as f64),
        memory,
        swap,
    })
}
