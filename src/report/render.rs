//! Text rendering of a [`Report`].
//!
//! Uses ANSI escape codes for colors and styling; colors can be disabled.

use std::fmt::Write;

use super::{BandwidthSection, CpuSection, DiskSection, LoadSection, MemorySection, Report, SectionResult};
use crate::classify::Severity;
use crate::system::format_uptime;

// ANSI color codes
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";

/// Clears the terminal and homes the cursor.
pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

const RULE: &str = "────────────────────────────────────────────────────────────";

/// Formats bytes as a human-readable string.
pub fn format_bytes(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB_U: u64 = KIB * 1024;
    const GIB: u64 = MIB_U * 1024;

    if bytes >= GIB {
        format!("{:.2} GiB", bytes as f64 / GIB as f64)
    } else if bytes >= MIB_U {
        format!("{:.2} MiB", bytes as f64 / MIB_U as f64)
    } else if bytes >= KIB {
        format!("{:.2} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Formats a byte rate, e.g. `1.50 MiB/s`.
pub fn format_rate(bytes_per_sec: f64) -> String {
    format!("{}/s", format_bytes(bytes_per_sec.max(0.0) as u64))
}

/// Renders reports as text.
pub struct Renderer {
    use_colors: bool,
}

impl Renderer {
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    fn color(&self, code: &str, text: &str) -> String {
        if self.use_colors {
            format!("{}{}{}", code, text, RESET)
        } else {
            text.to_string()
        }
    }

    fn severity_code(severity: Severity) -> &'static str {
        match severity {
            Severity::Ok => GREEN,
            Severity::Warn => YELLOW,
            Severity::Critical => RED,
        }
    }

    /// `[OK]`, `[WARN]` or `[CRITICAL]` in the severity's color.
    fn badge(&self, severity: Severity) -> String {
        self.color(Self::severity_code(severity), &format!("[{}]", severity))
    }

    fn heading(&self, out: &mut String, title: &str) {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", self.color(BOLD, title));
    }

    fn unavailable(&self, out: &mut String, what: &str, reason: &dyn std::fmt::Display) {
        let _ = writeln!(
            out,
            "  {}",
            self.color(DIM, &format!("{} unavailable ({})", what, reason))
        );
    }

    pub fn render(&self, report: &Report) -> String {
        let mut out = String::new();
        self.header(&mut out, report);

        self.heading(&mut out, "CPU");
        self.section(&mut out, "CPU usage", &report.cpu, |o, s| self.cpu(o, s));

        self.heading(&mut out, "LOAD AVERAGE");
        self.section(&mut out, "Load average", &report.load, |o, s| self.load(o, s));

        self.heading(&mut out, "DISK");
        self.disk(&mut out, &report.disk);

        self.heading(&mut out, "BANDWIDTH");
        self.section(&mut out, "Bandwidth", &report.bandwidth, |o, s| self.bandwidth(o, s));

        self.heading(&mut out, "MEMORY");
        self.section(&mut out, "Memory", &report.memory, |o, s| self.memory(o, s));

        self.footer(&mut out, report);
        out
    }

    fn section<T>(
        &self,
        out: &mut String,
        what: &str,
        result: &SectionResult<T>,
        body: impl FnOnce(&mut String, &T),
    ) {
        match result {
            Ok(section) => body(out, section),
            Err(e) => self.unavailable(out, what, e),
        }
    }

    fn header(&self, out: &mut String, report: &Report) {
        let host = &report.host;
        let _ = writeln!(out, "{}", self.color(CYAN, RULE));
        let _ = writeln!(
            out,
            "{} {}",
            self.color(BOLD, "HEALTH CHECK"),
            report.generated_at.format("%Y-%m-%d %H:%M:%S")
        );
        let _ = writeln!(out, "{}", self.color(CYAN, RULE));
        let _ = writeln!(out, "  Host:    {}", host.hostname);
        let _ = writeln!(out, "  OS:      {}", host.os_name);
        let _ = writeln!(out, "  Kernel:  {} ({})", host.kernel, host.machine);
        let _ = writeln!(
            out,
            "  Uptime:  {}",
            host.uptime_seconds
                .map(format_uptime)
                .unwrap_or_else(|| "unavailable".to_string())
        );
        let _ = writeln!(
            out,
            "  Users:   {}",
            host.logged_in_users
                .map(|u| u.to_string())
                .unwrap_or_else(|| "unavailable".to_string())
        );
        let _ = writeln!(out, "  Cores:   {}", host.cores);
    }

    fn cpu(&self, out: &mut String, cpu: &CpuSection) {
        let u = &cpu.usage;
        let _ = writeln!(out, "  Used:    {:>3}%  {}", u.used_pct, self.badge(cpu.severity));
        let _ = writeln!(
            out,
            "  user {}%  system {}%  iowait {}%  idle {}%",
            u.user_pct, u.system_pct, u.iowait_pct, u.idle_pct
        );
        if u.counter_reset {
            let _ = writeln!(out, "  {}", self.color(DIM, "(counter reset during sample)"));
        }
        if let Some(cores) = &cpu.per_core {
            for core in cores {
                let _ = writeln!(out, "    cpu{:<4} {:>5.1}%", core.cpu, core.used_pct);
            }
        }
    }

    fn load(&self, out: &mut String, load: &LoadSection) {
        let values = [load.load.load1, load.load.load5, load.load.load15];
        for ((label, value), (ratio, severity)) in ["1 min", "5 min", "15 min"]
            .iter()
            .zip(values)
            .zip(load.ratios.iter().zip(load.severities))
        {
            let _ = writeln!(
                out,
                "  {:<7} {:>6.2}  {:>5.1}% of {} cores  {}",
                label,
                value,
                ratio,
                load.cores,
                self.badge(severity)
            );
        }
        let _ = writeln!(
            out,
            "  Tasks:   {} running / {} total",
            load.load.running, load.load.total
        );
    }

    fn disk(&self, out: &mut String, disk: &DiskSection) {
        match &disk.io {
            Ok(io) => {
                let _ = writeln!(out, "  Device I/O (source: {})", io.source);
                if io.devices.is_empty() {
                    let _ = writeln!(out, "  {}", self.color(DIM, "no disk activity"));
                }
                for dev in &io.devices {
                    let r = &dev.rate;
                    let util = match (r.utilization, dev.severity) {
                        (Some(u), Some(s)) => format!("{:>5.1}% util {}", u, self.badge(s)),
                        _ => "util n/a".to_string(),
                    };
                    let _ = writeln!(
                        out,
                        "  {:<10} r/s {:>7.1}  w/s {:>7.1}  read {:>9.1} kB/s  write {:>9.1} kB/s  {}",
                        r.device, r.reads_per_sec, r.writes_per_sec, r.read_kb_per_sec, r.write_kb_per_sec, util
                    );
                }
                if io.counter_reset {
                    let _ = writeln!(out, "  {}", self.color(DIM, "(counter reset during sample)"));
                }
            }
            Err(e) => self.unavailable(out, "Device I/O", e),
        }

        match &disk.filesystems {
            Ok(filesystems) => {
                let _ = writeln!(out, "  Filesystems");
                for fs in filesystems {
                    let u = &fs.usage;
                    let _ = writeln!(
                        out,
                        "  {:<20} {:>10} / {:>10}  {:>3}%  {}  {}",
                        u.mount_point,
                        format_bytes(u.used_kb * 1024),
                        format_bytes(u.size_kb * 1024),
                        u.use_pct,
                        self.badge(fs.severity),
                        self.color(DIM, &format!("{} {}", u.device, u.fstype))
                    );
                }
            }
            Err(e) => self.unavailable(out, "Filesystem usage", e),
        }

        if let Some(lines) = &disk.top_io {
            let _ = writeln!(out, "  Top I/O processes");
            for line in lines {
                let _ = writeln!(out, "    {}", line);
            }
        }
    }

    fn bandwidth(&self, out: &mut String, bw: &BandwidthSection) {
        let rate = &bw.rate;
        let _ = writeln!(out, "  Interface: {}", bw.interface);
        let _ = writeln!(
            out,
            "  RX {:>14}  {}",
            format_rate(rate.rx_bytes_per_sec),
            self.badge(bw.rx_severity)
        );
        let _ = writeln!(
            out,
            "  TX {:>14}  {}",
            format_rate(rate.tx_bytes_per_sec),
            self.badge(bw.tx_severity)
        );
        if rate.counter_reset {
            let _ = writeln!(out, "  {}", self.color(DIM, "(counter reset during sample)"));
        }
        if let Some(ifstat) = &bw.ifstat {
            let _ = writeln!(
                out,
                "  {}",
                self.color(
                    DIM,
                    &format!(
                        "ifstat: in {:.1} KB/s  out {:.1} KB/s",
                        ifstat.rx_kb_per_sec, ifstat.tx_kb_per_sec
                    )
                )
            );
        }
        if let Some(ss) = &bw.sockets {
            let _ = writeln!(
                out,
                "  Sockets: {} total, {} TCP ({} established)",
                ss.total, ss.tcp_total, ss.tcp_established
            );
        }
    }

    fn memory(&self, out: &mut String, mem: &MemorySection) {
        let m = &mem.memory;
        let _ = writeln!(
            out,
            "  RAM:  {} / {}  {:>3}%  {}",
            format_bytes(m.used_kb * 1024),
            format_bytes(m.total_kb * 1024),
            m.used_pct,
            self.badge(mem.severity)
        );
        let _ = writeln!(
            out,
            "  {}",
            self.color(
                DIM,
                &format!(
                    "available {}  buffers {}  cached {}",
                    format_bytes(m.available_kb * 1024),
                    format_bytes(m.buffers_kb * 1024),
                    format_bytes(m.cached_kb * 1024)
                )
            )
        );
        match &mem.swap {
            Some((swap, severity)) => {
                let _ = writeln!(
                    out,
                    "  Swap: {} / {}  {:>3}%  {}",
                    format_bytes(swap.used_kb * 1024),
                    format_bytes(swap.total_kb * 1024),
                    swap.used_pct,
                    self.badge(*severity)
                );
            }
            None => {
                let _ = writeln!(out, "  Swap: {}", self.color(DIM, "not configured"));
            }
        }
    }

    fn footer(&self, out: &mut String, report: &Report) {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", self.color(CYAN, RULE));
        let _ = writeln!(
            out,
            "  Cycle took {:.1}s   Legend: {} {} {}",
            report.cycle_duration.as_secs_f64(),
            self.badge(Severity::Ok),
            self.badge(Severity::Warn),
            self.badge(Severity::Critical)
        );

        let alerts = report.alerts();
        if alerts.is_empty() {
            let _ = writeln!(out, "  {}", self.color(GREEN, "All metrics within thresholds"));
        }
        for alert in alerts {
            let _ = writeln!(
                out,
                "  {} {} {}: {}",
                self.badge(alert.severity),
                alert.section,
                alert.metric,
                alert.value
            );
        }
    }
}
