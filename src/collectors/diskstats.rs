//! Block device counters from /proc/diskstats.

use std::collections::BTreeMap;
use std::path::Path;

use super::read_proc_file;
use crate::error::CollectError;

/// Cumulative I/O counters for one block device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiskCounters {
    pub reads: u64,
    pub read_sectors: u64,
    pub writes: u64,
    pub write_sectors: u64,
    /// Milliseconds spent doing I/O (io_ticks). Absent on the short
    /// partition format of old kernels.
    pub io_ms: Option<u64>,
}

/// Devices that never appear in the report.
pub fn is_excluded_device(name: &str) -> bool {
    name.starts_with("loop") || name.starts_with("ram")
}

/// Parses /proc/diskstats content.
///
/// Format: major minor name read_ios read_merges read_sectors read_ticks
/// write_ios write_merges write_sectors write_ticks ios_in_progress io_ticks
/// time_in_queue [discard and flush columns]
///
/// Kernels before 2.6.25 print partitions as
/// `major minor name read_ios read_sectors write_ios write_sectors`.
///
/// Fails when non-blank content holds no device line at all.
pub fn parse_disk_counters(content: &str) -> Result<BTreeMap<String, DiskCounters>, String> {
    let mut stats = BTreeMap::new();
    let mut device_lines = 0;

    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let field = |i: usize| parts[i].parse::<u64>().unwrap_or(0);

        let counters = match parts.len() {
            n if n >= 14 => DiskCounters {
                reads: field(3),
                read_sectors: field(5),
                writes: field(7),
                write_sectors: field(9),
                io_ms: Some(field(12)),
            },
            7 => DiskCounters {
                reads: field(3),
                read_sectors: field(4),
                writes: field(5),
                write_sectors: field(6),
                io_ms: None,
            },
            _ => continue, // Skip malformed lines
        };

        device_lines += 1;
        let device = parts[2];
        if is_excluded_device(device) {
            continue;
        }

        stats.insert(device.to_string(), counters);
    }

    if device_lines == 0 && !content.trim().is_empty() {
        return Err("no device lines".to_string());
    }
    Ok(stats)
}

pub fn read_disk_counters(proc_root: &Path) -> Result<BTreeMap<String, DiskCounters>, CollectError> {
    let (path, content) = read_proc_file(proc_root, "diskstats")?;
    parse_disk_counters(&content).map_err(|reason| CollectError::malformed(path, reason))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DISKSTATS: &str = "   7       0 loop0 58 0 2182 12 0 0 0 0 0 28 12 0 0 0 0\n\
        \x20  1       0 ram0 0 0 0 0 0 0 0 0 0 0 0\n\
        \x20259       0 nvme0n1 1000 10 20000 300 500 5 8000 200 0 400 500 0 0 0 0\n\
        \x20  8       1 sda1 10 200 20 400\n";

    #[test]
    fn test_parse_full_format() {
        let stats = parse_disk_counters(DISKSTATS).unwrap();
        let nvme = stats["nvme0n1"];
        assert_eq!(nvme.reads, 1000);
        assert_eq!(nvme.read_sectors, 20000);
        assert_eq!(nvme.writes, 500);
        assert_eq!(nvme.write_sectors, 8000);
        assert_eq!(nvme.io_ms, Some(400));
    }

    #[test]
    fn test_loop_and_ram_skipped() {
        let stats = parse_disk_counters(DISKSTATS).unwrap();
        assert!(!stats.contains_key("loop0"));
        assert!(!stats.contains_key("ram0"));
    }

    #[test]
    fn test_short_partition_format() {
        let stats = parse_disk_counters(DISKSTATS).unwrap();
        let sda1 = stats["sda1"];
        assert_eq!(sda1.read_sectors, 200);
        assert_eq!(sda1.writes, 20);
        assert_eq!(sda1.io_ms, None);
    }

    #[test]
    fn test_malformed_lines_ignored() {
        let stats = parse_disk_counters("8 0 sda 1 2\n\n8 16 sdb 10 200 20 400\n").unwrap();
        assert_eq!(stats.keys().collect::<Vec<_>>(), ["sdb"]);
    }

    #[test]
    fn test_only_excluded_devices_is_empty_not_error() {
        let stats = parse_disk_counters("7 0 loop0 1 0 2 0 0 0 0 0 0 0 0\n").unwrap();
        assert!(stats.is_empty());
    }

    #[test]
    fn test_no_device_lines_is_error() {
        assert!(parse_disk_counters("this is not diskstats\ngarbage 1 2\n").is_err());
    }

    #[test]
    fn test_read_garbage_file_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("diskstats"), "this is not diskstats\ngarbage 1 2\n").unwrap();
        let err = read_disk_counters(dir.path()).unwrap_err();
        assert!(matches!(err, CollectError::Malformed { .. }));
    }
}
