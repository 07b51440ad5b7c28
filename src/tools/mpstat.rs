//! Parser for `mpstat -P ALL <secs> 1` output.

/// Utilization of one core over the sample window.
#[derive(Debug, Clone, PartialEq)]
pub struct CoreUsage {
    pub cpu: String,
    pub used_pct: f64,
}

/// Reads the `Average:` block and returns `100 - %idle` for every core.
/// The `all` row is dropped; the aggregate comes from /proc/stat.
pub fn parse_mpstat(output: &str) -> Result<Vec<CoreUsage>, String> {
    let mut cpu_col = None;
    let mut idle_col = None;
    let mut cores = Vec::new();

    for line in output.lines().filter(|l| l.starts_with("Average:")) {
        let tokens: Vec<&str> = line.split_whitespace().collect();

        if let Some(idle) = tokens.iter().position(|t| *t == "%idle") {
            cpu_col = tokens.iter().position(|t| *t == "CPU");
            idle_col = Some(idle);
            continue;
        }

        let (Some(cpu_i), Some(idle_i)) = (cpu_col, idle_col) else {
            continue;
        };
        if tokens.len() <= cpu_i.max(idle_i) || tokens[cpu_i] == "all" {
            continue;
        }

        let idle: f64 = tokens[idle_i]
            .parse()
            .map_err(|e| format!("bad %idle '{}': {}", tokens[idle_i], e))?;

        cores.push(CoreUsage {
            cpu: tokens[cpu_i].to_string(),
            used_pct: (100.0 - idle).clamp(0.0, 100.0),
        });
    }

    if idle_col.is_none() {
        return Err("no Average header".to_string());
    }
    if cores.is_empty() {
        return Err("no per-core rows".to_string());
    }
    Ok(cores)
}
