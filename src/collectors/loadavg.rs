//! Load averages from /proc/loadavg.

use std::path::Path;

use super::read_proc_file;
use crate::error::CollectError;

/// Load averages plus the runnable/total scheduling entity counts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadAvg {
    pub load1: f64,
    pub load5: f64,
    pub load15: f64,
    pub running: u64,
    pub total: u64,
}

/// Parses /proc/loadavg content.
///
/// Format: "0.00 0.01 0.05 1/234 5678"
pub fn parse_load_avg(content: &str) -> Result<LoadAvg, String> {
    let parts: Vec<&str> = content.split_whitespace().collect();
    if parts.len() < 4 {
        return Err(format!("expected at least 4 fields, got {}", parts.len()));
    }

    let load = |i: usize, label: &str| {
        parts[i]
            .parse::<f64>()
            .map_err(|e| format!("failed to parse {} load average: {}", label, e))
    };

    let (running, total) = parts[3]
        .split_once('/')
        .ok_or_else(|| format!("invalid process field '{}'", parts[3]))?;

    Ok(LoadAvg {
        load1: load(0, "1min")?,
        load5: load(1, "5min")?,
        load15: load(2, "15min")?,
        running: running
            .parse()
            .map_err(|e| format!("failed to parse running count: {}", e))?,
        total: total
            .parse()
            .map_err(|e| format!("failed to parse total count: {}", e))?,
    })
}

pub fn read_load_avg(proc_root: &Path) -> Result<LoadAvg, CollectError> {
    let (path, content) = read_proc_file(proc_root, "loadavg")?;
    parse_load_avg(&content).map_err(|reason| CollectError::malformed(path, reason))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_load_average() {
        let load = parse_load_avg("0.52 0.58 0.59 2/1190 12345").unwrap();
        assert!((load.load1 - 0.52).abs() < 0.001);
        assert!((load.load5 - 0.58).abs() < 0.001);
        assert!((load.load15 - 0.59).abs() < 0.001);
        assert_eq!(load.running, 2);
        assert_eq!(load.total, 1190);
    }

    #[test]
    fn test_parse_load_average_invalid() {
        assert!(parse_load_avg("0.52 0.58").is_err());
        assert!(parse_load_avg("abc def ghi 1/2 3").is_err());
        assert!(parse_load_avg("0.1 0.2 0.3 12 3").is_err());
    }
}
