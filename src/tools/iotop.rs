//! Top I/O processes from `iotop -b -o -n 1 -qqq -k`.

/// Number of process lines passed through to the report.
pub const TOP_IO_LINES: usize = 5;

/// Keeps the first few process lines, whitespace-collapsed.
pub fn parse_iotop(output: &str) -> Vec<String> {
    output
        .lines()
        .map(|l| l.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|l| !l.is_empty() && !l.starts_with("Total") && !l.starts_with("Actual"))
        .take(TOP_IO_LINES)
        .collect()
}
