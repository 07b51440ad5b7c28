//! Default network interface detection.

use std::path::Path;

use crate::collectors::{read_net_counters, read_proc_file};

/// Picks the interface to report when none is configured.
///
/// Prefers the IPv4 default route with the lowest metric; otherwise the first
/// non-loopback interface that has received traffic, then any non-loopback one.
pub fn detect_default_interface(proc_root: &Path) -> Option<String> {
    if let Ok((_, content)) = read_proc_file(proc_root, "net/route") {
        if let Some(iface) = parse_default_route(&content) {
            tracing::debug!("Default route via {}", iface);
            return Some(iface);
        }
    }

    let counters = read_net_counters(proc_root).ok()?;
    let candidates: Vec<_> = counters.iter().filter(|(name, _)| *name != "lo").collect();

    candidates
        .iter()
        .find(|(_, c)| c.rx_bytes > 0)
        .or_else(|| candidates.first())
        .map(|(name, _)| name.to_string())
}

/// Parses /proc/net/route content for the default-route interface.
///
/// Columns: Iface Destination Gateway Flags RefCnt Use Metric Mask ...
pub fn parse_default_route(content: &str) -> Option<String> {
    content
        .lines()
        .skip(1)
        .filter_map(|line| {
            let cols: Vec<&str> = line.split_whitespace().collect();
            if cols.len() < 8 || cols[1] != "00000000" || cols[7] != "00000000" {
                return None;
            }
            let metric = cols[6].parse::<u64>().unwrap_or(u64::MAX);
            Some((metric, cols[0]))
        })
        .min_by_key(|(metric, _)| *metric)
        .map(|(_, iface)| iface.to_string())
}
