//! Snapshot readers for kernel-exposed counters.
//!
//! Each collector reads one pseudo-file below a procfs root (normally `/proc`)
//! and parses it into plain structs. Parsing is kept separate from IO so the
//! text formats can be tested directly.

pub mod cpu;
pub mod diskstats;
pub mod filesystem;
pub mod loadavg;
pub mod meminfo;
pub mod netdev;

pub use cpu::{read_cpu_ticks, read_per_core_ticks, CpuTicks};
pub use diskstats::{read_disk_counters, DiskCounters};
pub use filesystem::{read_filesystems, FilesystemUsage};
pub use loadavg::{read_load_avg, LoadAvg};
pub use meminfo::{read_mem_info, MemInfo};
pub use netdev::{read_net_counters, NetCounters};

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::CollectError;

/// Reads `<proc_root>/<relative>` in one call and returns the path with it.
pub(crate) fn read_proc_file(
    proc_root: &Path,
    relative: &str,
) -> Result<(PathBuf, String), CollectError> {
    let path = proc_root.join(relative);
    match fs::read_to_string(&path) {
        Ok(content) => Ok((path, content)),
        Err(e) => Err(CollectError::missing(path, e)),
    }
}
