//! Integration tests for the delta calculator.

use std::collections::BTreeMap;
use std::time::Duration;

use herakles_healthcheck::collectors::{CpuTicks, DiskCounters, MemInfo};
use herakles_healthcheck::delta::{active_disk_deltas, cpu_usage, disk_delta, memory_usage, swap_usage};
use herakles_healthcheck::tools::iostat::parse_iostat;

fn ticks(values: [u64; 7]) -> CpuTicks {
    CpuTicks {
        user: values[0],
        nice: values[1],
        system: values[2],
        idle: values[3],
        iowait: values[4],
        irq: values[5],
        softirq: values[6],
    }
}

#[test]
fn test_cpu_breakdown_bounds() {
    let samples = [
        ([0, 0, 0, 0, 0, 0, 0], [7, 3, 5, 11, 13, 1, 2]),
        ([100, 0, 50, 800, 50, 0, 0], [300, 0, 100, 900, 100, 0, 0]),
        ([5, 5, 5, 5, 5, 5, 5], [5, 5, 5, 1005, 5, 5, 5]),
        ([1, 2, 3, 4, 5, 6, 7], [999, 2, 3, 4, 5, 6, 7]),
    ];

    for (prev, cur) in samples {
        let usage = cpu_usage(&ticks(prev), &ticks(cur));
        assert!(usage.used_pct <= 100);
        assert!(usage.user_pct + usage.system_pct + usage.iowait_pct + usage.idle_pct <= 100);
    }
}

#[test]
fn test_cpu_scenario_seventy_five_percent() {
    let usage = cpu_usage(
        &ticks([100, 0, 50, 800, 50, 0, 0]),
        &ticks([300, 0, 100, 900, 100, 0, 0]),
    );
    assert_eq!(usage.delta_total, 400);
    assert_eq!(usage.used_pct, 75);
}

#[test]
fn test_identical_snapshots() {
    let t = ticks([100, 0, 50, 800, 50, 0, 0]);
    let usage = cpu_usage(&t, &t);
    assert_eq!(usage.used_pct, 0);
    assert_eq!(usage.delta_total, 0);
    assert!(!usage.counter_reset);
}

#[test]
fn test_memory_used_is_total_minus_available() {
    let mem = MemInfo {
        total_kb: 8_000_000,
        available_kb: 6_000_000,
        free_kb: 1_000_000,
        buffers_kb: 200_000,
        cached_kb: 3_000_000,
        swap_total_kb: 2_000_000,
        swap_free_kb: 1_500_000,
    };

    let usage = memory_usage(&mem);
    assert_eq!(usage.used_kb, 2_000_000);
    assert_eq!(usage.used_pct, 25);

    let swap = swap_usage(&mem).unwrap();
    assert_eq!(swap.used_kb, 500_000);
    assert_eq!(swap.used_pct, 25);
}

#[test]
fn test_disk_sectors_are_halved() {
    let prev = DiskCounters {
        reads: 10,
        read_sectors: 1000,
        writes: 5,
        write_sectors: 300,
        io_ms: Some(100),
    };
    let cur = DiskCounters {
        reads: 30,
        read_sectors: 5000,
        writes: 15,
        write_sectors: 2300,
        io_ms: Some(600),
    };

    let delta = disk_delta(&prev, &cur);
    assert_eq!(delta.read_kb, 2000);
    assert_eq!(delta.write_kb, 1000);

    let rate = delta.to_rate("sda", Duration::from_secs(2));
    assert_eq!(rate.reads_per_sec, 10.0);
    assert_eq!(rate.read_kb_per_sec, 1000.0);
    assert_eq!(rate.utilization, Some(25.0));
}

#[test]
fn test_idle_devices_excluded_only_in_fallback() {
    let busy_before = DiskCounters {
        reads: 1,
        ..Default::default()
    };
    let busy_after = DiskCounters {
        reads: 9,
        ..Default::default()
    };
    let idle = DiskCounters {
        reads: 4,
        writes: 4,
        ..Default::default()
    };

    let prev = BTreeMap::from([("sda".to_string(), busy_before), ("sdb".to_string(), idle)]);
    let cur = BTreeMap::from([("sda".to_string(), busy_after), ("sdb".to_string(), idle)]);
    let fallback: Vec<_> = active_disk_deltas(&prev, &cur)
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    assert_eq!(fallback, vec!["sda"]);

    // iostat lists every device, idle ones included.
    let iostat = "Linux 6.1.0 (host) \t01/15/2024 \t_x86_64_\t(4 CPU)\n\n\
Device            r/s     w/s     rkB/s     wkB/s   rrqm/s   wrqm/s  %rrqm  %wrqm r_await w_await aqu-sz rareq-sz wareq-sz  svctm  %util\n\
sda              8.00    0.00     32.00      0.00     0.00     0.00   0.00   0.00    0.50    0.00   0.00     4.00     0.00   0.00   0.40\n\
sdb              0.00    0.00      0.00      0.00     0.00     0.00   0.00   0.00    0.00    0.00   0.00     0.00     0.00   0.00   0.00\n";
    let devices = parse_iostat(iostat).unwrap();
    assert_eq!(devices.len(), 2);
    assert_eq!(devices[1].device, "sdb");
}
