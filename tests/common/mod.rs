//! Fixture proc filesystem shared by the integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use tempfile::TempDir;

pub const STAT: &str = "cpu  100 0 50 800 50 0 0 0 0 0\n\
cpu0 50 0 25 400 25 0 0 0 0 0\n\
cpu1 50 0 25 400 25 0 0 0 0 0\n\
intr 12345\n\
ctxt 67890\n";

pub const LOADAVG: &str = "0.20 0.15 0.10 3/456 7890\n";

pub const DISKSTATS: &str = "   7       0 loop0 5 0 10 0 0 0 0 0 0 4 0\n\
   8       0 sda 1000 10 20000 300 500 5 8000 200 0 400 500 0 0 0 0\n\
   8       1 sda1 900 10 18000 280 480 5 7800 190 0 380 470 0 0 0 0\n\
 259       0 nvme0n1 200 0 4096 30 100 0 2048 10 0 40 40 0 0 0 0\n";

pub const NET_DEV: &str = "Inter-|   Receive                                                |  Transmit\n \
face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed\n    \
lo:   12345      10    0    0    0     0          0         0    12345      10    0    0    0     0       0          0\n  \
eth0: 1000000    900    0    0    0     0          0         0   500000     400    0    0    0     0       0          0\n";

pub const ROUTE: &str = "Iface\tDestination\tGateway \tFlags\tRefCnt\tUse\tMetric\tMask\t\tMTU\tWindow\tIRTT\n\
eth0\t00000000\t0100000A\t0003\t0\t0\t100\t00000000\t0\t0\t0\n";

pub const MEMINFO: &str = "MemTotal:        8000000 kB\n\
MemFree:         1000000 kB\n\
MemAvailable:    6000000 kB\n\
Buffers:          200000 kB\n\
Cached:          3000000 kB\n\
SwapTotal:       2000000 kB\n\
SwapFree:        1500000 kB\n";

pub const UPTIME: &str = "273900.50 500000.00\n";

/// Creates a complete fixture proc tree. `mounts` is left empty so no real
/// filesystem is statted.
pub fn fixture_proc() -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    write_proc(dir.path());
    dir
}

pub fn write_proc(root: &Path) {
    fs::create_dir_all(root.join("net")).expect("net dir");
    fs::write(root.join("stat"), STAT).expect("stat");
    fs::write(root.join("loadavg"), LOADAVG).expect("loadavg");
    fs::write(root.join("diskstats"), DISKSTATS).expect("diskstats");
    fs::write(root.join("net").join("dev"), NET_DEV).expect("net/dev");
    fs::write(root.join("net").join("route"), ROUTE).expect("net/route");
    fs::write(root.join("meminfo"), MEMINFO).expect("meminfo");
    fs::write(root.join("uptime"), UPTIME).expect("uptime");
    fs::write(root.join("mounts"), "").expect("mounts");
}
