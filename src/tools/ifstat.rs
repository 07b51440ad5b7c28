//! Parser for `ifstat -i <iface> <secs> 1` output.
//!
//! ```text
//!        eth0
//!  KB/s in  KB/s out
//!     0.12      0.05
//! ```

/// Receive/transmit throughput reported by ifstat, in KiB/s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IfstatSample {
    pub rx_kb_per_sec: f64,
    pub tx_kb_per_sec: f64,
}

pub fn parse_ifstat(output: &str) -> Result<IfstatSample, String> {
    let lines: Vec<&str> = output.lines().filter(|l| !l.trim().is_empty()).collect();

    if !lines.iter().any(|l| l.contains("KB/s")) {
        return Err("no KB/s header".to_string());
    }

    let last = lines.last().ok_or("empty output")?;
    let values: Vec<f64> = last
        .split_whitespace()
        .map(|v| v.parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("bad sample line '{}': {}", last.trim(), e))?;

    match values.as_slice() {
        [rx, tx] => Ok(IfstatSample {
            rx_kb_per_sec: *rx,
            tx_kb_per_sec: *tx,
        }),
        _ => Err(format!("expected 2 columns, got {}", values.len())),
    }
}
