//! Memory and swap figures from /proc/meminfo.

use std::path::Path;

use super::read_proc_file;
use crate::error::CollectError;

/// Memory figures in KiB, as reported by the kernel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemInfo {
    pub total_kb: u64,
    pub available_kb: u64,
    pub free_kb: u64,
    pub buffers_kb: u64,
    pub cached_kb: u64,
    pub swap_total_kb: u64,
    pub swap_free_kb: u64,
}

/// Parses /proc/meminfo content.
///
/// Kernels before 3.14 have no `MemAvailable`; free + buffers + cached is used
/// instead.
pub fn parse_mem_info(content: &str) -> Result<MemInfo, String> {
    let mut total = None;
    let mut available = None;
    let mut free = None;
    let mut buffers = None;
    let mut cached = None;
    let mut swap_total = None;
    let mut swap_free = None;

    for line in content.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        let value = rest
            .split_whitespace()
            .next()
            .and_then(|v| v.parse::<u64>().ok());

        match key {
            "MemTotal" => total = value,
            "MemAvailable" => available = value,
            "MemFree" => free = value,
            "Buffers" => buffers = value,
            "Cached" => cached = value,
            "SwapTotal" => swap_total = value,
            "SwapFree" => swap_free = value,
            _ => {}
        }
    }

    let total_kb = total.ok_or("MemTotal missing")?;
    let free_kb = free.ok_or("MemFree missing")?;
    let buffers_kb = buffers.unwrap_or(0);
    let cached_kb = cached.unwrap_or(0);

    Ok(MemInfo {
        total_kb,
        available_kb: available.unwrap_or(free_kb + buffers_kb + cached_kb),
        free_kb,
        buffers_kb,
        cached_kb,
        swap_total_kb: swap_total.unwrap_or(0),
        swap_free_kb: swap_free.unwrap_or(0),
    })
}

pub fn read_mem_info(proc_root: &Path) -> Result<MemInfo, CollectError> {
    let (path, content) = read_proc_file(proc_root, "meminfo")?;
    parse_mem_info(&content).map_err(|reason| CollectError::malformed(path, reason))
}
