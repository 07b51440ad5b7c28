//! Parser for `iostat -d -x -k <secs> 2` output.
//!
//! Columns are located by header name since their order differs between
//! sysstat releases. Only the last report is used: the first one covers the
//! time since boot.

use crate::collectors::diskstats::is_excluded_device;
use crate::delta::DiskDeviceRate;

struct Columns {
    reads: usize,
    writes: usize,
    read_kb: usize,
    write_kb: usize,
    util: usize,
    width: usize,
}

impl Columns {
    fn from_header(tokens: &[&str]) -> Option<Self> {
        let find = |name: &str| tokens.iter().position(|t| *t == name);
        Some(Columns {
            reads: find("r/s")?,
            writes: find("w/s")?,
            read_kb: find("rkB/s")?,
            write_kb: find("wkB/s")?,
            util: find("%util")?,
            width: tokens.len(),
        })
    }
}

fn is_header(tokens: &[&str]) -> bool {
    matches!(tokens.first(), Some(&"Device") | Some(&"Device:"))
}

/// Parses the per-device rows of the last report.
pub fn parse_iostat(output: &str) -> Result<Vec<DiskDeviceRate>, String> {
    let mut columns: Option<Columns> = None;
    let mut rows = Vec::new();

    for line in output.lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }

        if is_header(&tokens) {
            columns = Some(
                Columns::from_header(&tokens)
                    .ok_or_else(|| format!("unrecognised header: {}", line.trim()))?,
            );
            rows.clear();
            continue;
        }

        let Some(cols) = columns.as_ref() else {
            continue; // banner line before the first header
        };
        if tokens.len() != cols.width || is_excluded_device(tokens[0]) {
            continue;
        }

        let value = |i: usize| {
            tokens[i]
                .parse::<f64>()
                .map_err(|e| format!("bad value '{}' for {}: {}", tokens[i], tokens[0], e))
        };

        rows.push(DiskDeviceRate {
            device: tokens[0].to_string(),
            reads_per_sec: value(cols.reads)?,
            writes_per_sec: value(cols.writes)?,
            read_kb_per_sec: value(cols.read_kb)?,
            write_kb_per_sec: value(cols.write_kb)?,
            utilization: Some(value(cols.util)?),
        });
    }

    if columns.is_none() {
        return Err("no device report found".to_string());
    }
    Ok(rows)
}
