//! Append-only log file of report cycles.
//!
//! One line per section and cycle:
//! `YYYY-MM-DD HH:MM:SS section=<name> key=value ...`

use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

use super::{DiskIo, FilesystemReport, Report};
use crate::classify::Severity;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Builds the log lines for one report, without trailing newlines.
pub fn log_lines(report: &Report) -> Vec<String> {
    let ts = report.generated_at.format(TIMESTAMP_FORMAT).to_string();
    let line = |section: &str, fields: String| format!("{} section={} {}", ts, section, fields);
    let mut lines = Vec::new();

    lines.push(line(
        "header",
        format!(
            "host={} kernel={} cores={} interface={}",
            report.host.hostname,
            report.host.kernel,
            report.host.cores,
            report.interface.as_deref().unwrap_or("none")
        ),
    ));

    lines.push(match &report.cpu {
        Ok(cpu) => line(
            "cpu",
            format!(
                "used_pct={} user_pct={} system_pct={} iowait_pct={} idle_pct={} status={}",
                cpu.usage.used_pct,
                cpu.usage.user_pct,
                cpu.usage.system_pct,
                cpu.usage.iowait_pct,
                cpu.usage.idle_pct,
                cpu.severity.as_str()
            ),
        ),
        Err(_) => line("cpu", "status=unavailable".to_string()),
    });

    lines.push(match &report.load {
        Ok(load) => line(
            "load",
            format!(
                "load1={:.2} load5={:.2} load15={:.2} ratio1={:.1} cores={} status={}",
                load.load.load1,
                load.load.load5,
                load.load.load15,
                load.ratios[0],
                load.cores,
                load.severity().as_str()
            ),
        ),
        Err(_) => line("load", "status=unavailable".to_string()),
    });

    lines.push(match &report.disk.io {
        Ok(io) => line("disk", disk_fields(io)),
        Err(_) => line("disk", "status=unavailable".to_string()),
    });

    lines.push(match &report.disk.filesystems {
        Ok(filesystems) => line("filesystem", filesystem_fields(filesystems)),
        Err(_) => line("filesystem", "status=unavailable".to_string()),
    });

    lines.push(match &report.bandwidth {
        Ok(bw) => line(
            "bandwidth",
            format!(
                "interface={} rx_bytes_per_sec={:.0} tx_bytes_per_sec={:.0} status={}",
                bw.interface,
                bw.rate.rx_bytes_per_sec,
                bw.rate.tx_bytes_per_sec,
                bw.rx_severity.max(bw.tx_severity).as_str()
            ),
        ),
        Err(_) => line("bandwidth", "status=unavailable".to_string()),
    });

    lines.push(match &report.memory {
        Ok(mem) => {
            let swap = match &mem.swap {
                Some((swap, severity)) => {
                    format!("swap_used_pct={} swap_status={}", swap.used_pct, severity.as_str())
                }
                None => "swap=none".to_string(),
            };
            line(
                "memory",
                format!(
                    "used_kb={} total_kb={} used_pct={} status={} {}",
                    mem.memory.used_kb,
                    mem.memory.total_kb,
                    mem.memory.used_pct,
                    mem.severity.as_str(),
                    swap
                ),
            )
        }
        Err(_) => line("memory", "status=unavailable".to_string()),
    });

    lines
}

/// Per-device figures keyed as `<device>:<field>`.
///
/// Devices without a utilization figure carry no status of their own.
fn disk_fields(io: &DiskIo) -> String {
    let mut fields = format!("source={} devices={}", io.source, io.devices.len());
    for dev in &io.devices {
        let r = &dev.rate;
        let _ = write!(
            fields,
            " {d}:reads_per_sec={:.1} {d}:writes_per_sec={:.1} {d}:read_kb_per_sec={:.1} {d}:write_kb_per_sec={:.1}",
            r.reads_per_sec,
            r.writes_per_sec,
            r.read_kb_per_sec,
            r.write_kb_per_sec,
            d = r.device
        );
        if let (Some(util), Some(severity)) = (r.utilization, dev.severity) {
            let _ = write!(fields, " {d}:util_pct={:.1} {d}:status={}", util, severity.as_str(), d = r.device);
        }
    }
    if io.counter_reset {
        fields.push_str(" counter_reset=true");
    }

    let worst = io.devices.iter().filter_map(|dev| dev.severity).max();
    let status = match worst {
        Some(severity) => severity.as_str(),
        None if io.devices.is_empty() => Severity::Ok.as_str(),
        None => "unclassified",
    };
    let _ = write!(fields, " status={}", status);
    fields
}

/// Per-mount usage keyed as `<mount>:<field>`.
fn filesystem_fields(filesystems: &[FilesystemReport]) -> String {
    let mut fields = format!("mounts={}", filesystems.len());
    for fs in filesystems {
        let _ = write!(
            fields,
            " {m}:use_pct={} {m}:status={}",
            fs.usage.use_pct,
            fs.severity.as_str(),
            m = escape_mount_point(&fs.usage.mount_point)
        );
    }
    let worst = Severity::worst(filesystems.iter().map(|fs| fs.severity));
    let _ = write!(fields, " status={}", worst.as_str());
    fields
}

/// Re-applies the octal escapes of /proc/mounts so a mount point stays one token.
fn escape_mount_point(mount_point: &str) -> String {
    let mut escaped = String::with_capacity(mount_point.len());
    for c in mount_point.chars() {
        match c {
            ' ' | '\t' | '\n' | '\\' => {
                let _ = write!(escaped, "\\{:03o}", c as u32);
            }
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Appends lines to `path`, one `write_all` per line.
///
/// The file is opened in append mode for each line, so an interrupted cycle
/// never leaves a partial line behind.
pub fn append_lines(path: &Path, lines: &[String]) -> io::Result<()> {
    for line in lines {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(format!("{}\n", line).as_bytes())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::FilesystemUsage;
    use crate::delta::DiskDeviceRate;
    use crate::report::DeviceReport;
    use std::fs;

    #[test]
    fn test_append_lines_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hc.log");

        append_lines(&path, &["first".to_string()]).unwrap();
        append_lines(&path, &["second".to_string(), "third".to_string()]).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\nthird\n");
    }

    fn device(name: &str, utilization: Option<f64>, severity: Option<Severity>) -> DeviceReport {
        DeviceReport {
            rate: DiskDeviceRate {
                device: name.to_string(),
                reads_per_sec: 10.0,
                writes_per_sec: 5.0,
                read_kb_per_sec: 40.0,
                write_kb_per_sec: 20.0,
                utilization,
            },
            severity,
        }
    }

    #[test]
    fn test_disk_fields_single_line_per_device_keys() {
        let io = DiskIo {
            source: "iostat",
            devices: vec![
                device("sda", Some(85.0), Some(Severity::Warn)),
                device("sdb", Some(3.0), Some(Severity::Ok)),
            ],
            includes_idle: true,
            counter_reset: false,
        };
        let fields = disk_fields(&io);
        assert!(fields.starts_with("source=iostat devices=2 sda:reads_per_sec=10.0"));
        assert!(fields.contains(" sda:util_pct=85.0 sda:status=warn"));
        assert!(fields.contains(" sdb:status=ok"));
        assert!(fields.ends_with(" status=warn"));
    }

    #[test]
    fn test_disk_fields_without_utilization_not_classified() {
        let io = DiskIo {
            source: "/proc/diskstats",
            devices: vec![device("sda1", None, None)],
            includes_idle: false,
            counter_reset: true,
        };
        let fields = disk_fields(&io);
        assert!(!fields.contains("sda1:status"));
        assert!(!fields.contains("util_pct"));
        assert!(fields.ends_with(" counter_reset=true status=unclassified"));
    }

    #[test]
    fn test_filesystem_fields_escape_mount_points() {
        let usage = |mount: &str, use_pct| FilesystemUsage {
            device: "/dev/sdb1".to_string(),
            mount_point: mount.to_string(),
            fstype: "xfs".to_string(),
            size_kb: 1000,
            used_kb: 10 * use_pct,
            available_kb: 1000 - 10 * use_pct,
            use_pct,
        };
        let filesystems = vec![
            FilesystemReport {
                usage: usage("/", 42),
                severity: Severity::Ok,
            },
            FilesystemReport {
                usage: usage("/mnt/my disk", 95),
                severity: Severity::Critical,
            },
        ];

        let fields = filesystem_fields(&filesystems);
        assert_eq!(
            fields,
            "mounts=2 /:use_pct=42 /:status=ok /mnt/my\\040disk:use_pct=95 /mnt/my\\040disk:status=critical status=critical"
        );
    }

    #[test]
    fn test_append_to_unwritable_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("hc.log");
        assert!(append_lines(&path, &["x".to_string()]).is_err());
    }
}
