//! Network interface byte counters from /proc/net/dev.

use std::collections::BTreeMap;
use std::path::Path;

use super::read_proc_file;
use crate::error::CollectError;

/// Cumulative byte counters of one interface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetCounters {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

/// Parses /proc/net/dev content.
pub fn parse_net_counters(content: &str) -> BTreeMap<String, NetCounters> {
    let mut stats = BTreeMap::new();

    // The first two lines are headers
    for line in content.lines().skip(2) {
        let Some((interface, rest)) = line.split_once(':') else {
            continue;
        };

        let values: Vec<&str> = rest.split_whitespace().collect();
        if values.len() < 16 {
            continue; // Skip malformed lines
        }

        stats.insert(
            interface.trim().to_string(),
            NetCounters {
                rx_bytes: values[0].parse().unwrap_or(0),
                tx_bytes: values[8].parse().unwrap_or(0),
            },
        );
    }

    stats
}

pub fn read_net_counters(proc_root: &Path) -> Result<BTreeMap<String, NetCounters>, CollectError> {
    let (_, content) = read_proc_file(proc_root, "net/dev")?;
    Ok(parse_net_counters(&content))
}
