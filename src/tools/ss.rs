//! Parser for `ss -s` socket summaries.

use once_cell::sync::Lazy;
use regex::Regex;

static TOTAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^Total:\s+(\d+)").expect("valid regex"));
static TCP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^TCP:\s+(\d+)\s+\(estab\s+(\d+)").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketSummary {
    pub total: u64,
    pub tcp_total: u64,
    pub tcp_established: u64,
}

pub fn parse_ss_summary(output: &str) -> Result<SocketSummary, String> {
    let total = TOTAL_RE
        .captures(output)
        .and_then(|c| c[1].parse().ok())
        .ok_or("no Total line")?;
    let tcp = TCP_RE.captures(output).ok_or("no TCP line")?;

    Ok(SocketSummary {
        total,
        tcp_total: tcp[1].parse().map_err(|_| "bad TCP total")?,
        tcp_established: tcp[2].parse().map_err(|_| "bad estab count")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_summary() {
        let out = "Total: 1234\n\
                   TCP:   56 (estab 12, closed 30, orphaned 0, timewait 28)\n\
                   \n\
                   Transport Total     IP        IPv6\n\
                   RAW\t  1         0         1\n";
        let s = parse_ss_summary(out).unwrap();
        assert_eq!(s.total, 1234);
        assert_eq!(s.tcp_total, 56);
        assert_eq!(s.tcp_established, 12);
    }

    #[test]
    fn test_legacy_total_line() {
        let out = "Total: 180 (kernel 0)\nTCP:   9 (estab 3, closed 0, orphaned 0, synrecv 0, timewait 0/0), ports 0\n";
        let s = parse_ss_summary(out).unwrap();
        assert_eq!(s.total, 180);
        assert_eq!(s.tcp_established, 3);
    }

    #[test]
    fn test_missing_lines() {
        assert!(parse_ss_summary("Usage: ss [ OPTIONS ]\n").is_err());
    }
}
