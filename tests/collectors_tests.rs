//! Integration tests for the snapshot readers.
//!
//! Every reader is pointed at a fixture proc tree instead of /proc.

mod common;

use std::fs;

use herakles_healthcheck::collectors::{
    read_cpu_ticks, read_disk_counters, read_filesystems, read_load_avg, read_mem_info,
    read_net_counters, read_per_core_ticks,
};
use herakles_healthcheck::interface::detect_default_interface;
use herakles_healthcheck::system::{format_uptime, read_uptime};
use herakles_healthcheck::CollectError;

#[test]
fn test_cpu_readers() {
    let proc = common::fixture_proc();

    let ticks = read_cpu_ticks(proc.path()).unwrap();
    assert_eq!(ticks.user, 100);
    assert_eq!(ticks.idle, 800);
    assert_eq!(ticks.total(), 1000);

    let cores = read_per_core_ticks(proc.path()).unwrap();
    assert_eq!(cores.len(), 2);
}

#[test]
fn test_load_reader() {
    let proc = common::fixture_proc();
    let load = read_load_avg(proc.path()).unwrap();

    assert_eq!(load.load1, 0.2);
    assert_eq!(load.load15, 0.1);
    assert_eq!(load.running, 3);
    assert_eq!(load.total, 456);
}

#[test]
fn test_disk_reader_skips_loop_devices() {
    let proc = common::fixture_proc();
    let disks = read_disk_counters(proc.path()).unwrap();

    assert!(!disks.contains_key("loop0"));
    let sda = &disks["sda"];
    assert_eq!(sda.reads, 1000);
    assert_eq!(sda.read_sectors, 20000);
    assert_eq!(sda.writes, 500);
    assert_eq!(sda.write_sectors, 8000);
    assert_eq!(sda.io_ms, Some(400));
    assert!(disks.contains_key("nvme0n1"));
}

#[test]
fn test_net_reader() {
    let proc = common::fixture_proc();
    let net = read_net_counters(proc.path()).unwrap();

    assert_eq!(net["eth0"].rx_bytes, 1_000_000);
    assert_eq!(net["eth0"].tx_bytes, 500_000);
    assert_eq!(net["lo"].rx_bytes, 12345);
}

#[test]
fn test_mem_reader() {
    let proc = common::fixture_proc();
    let mem = read_mem_info(proc.path()).unwrap();

    assert_eq!(mem.total_kb, 8_000_000);
    assert_eq!(mem.available_kb, 6_000_000);
    assert_eq!(mem.swap_free_kb, 1_500_000);
}

#[test]
fn test_empty_mounts_yield_no_filesystems() {
    let proc = common::fixture_proc();
    assert!(read_filesystems(proc.path()).unwrap().is_empty());
}

#[test]
fn test_uptime() {
    let proc = common::fixture_proc();
    let uptime = read_uptime(proc.path()).unwrap();
    assert_eq!(format_uptime(uptime), "3 days, 04:05");
}

#[test]
fn test_interface_detection_prefers_default_route() {
    let proc = common::fixture_proc();
    assert_eq!(detect_default_interface(proc.path()).as_deref(), Some("eth0"));
}

#[test]
fn test_interface_detection_without_route() {
    let proc = common::fixture_proc();
    fs::remove_file(proc.path().join("net").join("route")).unwrap();

    // lo is never picked.
    assert_eq!(detect_default_interface(proc.path()).as_deref(), Some("eth0"));
}

#[test]
fn test_missing_sources() {
    let empty = tempfile::tempdir().unwrap();

    assert!(matches!(
        read_cpu_ticks(empty.path()),
        Err(CollectError::MissingSource { .. })
    ));
    assert!(matches!(
        read_mem_info(empty.path()),
        Err(CollectError::MissingSource { .. })
    ));
    assert!(read_filesystems(empty.path()).is_err());
}

#[test]
fn test_malformed_sources() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("stat"), "intr 1 2 3\n").unwrap();
    fs::write(dir.path().join("meminfo"), "Garbage: 1 kB\n").unwrap();
    fs::write(dir.path().join("loadavg"), "not numbers\n").unwrap();

    assert!(matches!(
        read_cpu_ticks(dir.path()),
        Err(CollectError::Malformed { .. })
    ));
    assert!(matches!(
        read_mem_info(dir.path()),
        Err(CollectError::Malformed { .. })
    ));
    assert!(matches!(
        read_load_avg(dir.path()),
        Err(CollectError::Malformed { .. })
    ));
}
