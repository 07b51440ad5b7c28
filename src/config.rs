//! Configuration management for herakles-healthcheck.
//!
//! Configuration is merged from CLI arguments, an optional config file and
//! defaults (in that order of precedence) and then frozen into
//! [`ReportSettings`], which every sampler and the renderer receive by
//! reference. Config files may be YAML, JSON or TOML.

use crate::classify::{Threshold, ThresholdPolicy, DEFAULT_CPU_CRITICAL};
use crate::cli::{Args, ConfigFormat, LogLevel};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

// Default configuration constants
pub const DEFAULT_INTERVAL_SECONDS: u64 = 5;
pub const DEFAULT_SAMPLE_SECONDS: u64 = 1;
pub const DEFAULT_LOG_FILE: &str = "/var/log/herakles-healthcheck.log";
pub const DEFAULT_PROC_ROOT: &str = "/proc";
pub const DEFAULT_LOG_LEVEL: &str = "warn";

const DEFAULT_CONFIG_LOCATIONS: [&str; 6] = [
    "/etc/herakles/healthcheck.yaml",
    "/etc/herakles/healthcheck.yml",
    "./herakles-healthcheck.yaml",
    "./herakles-healthcheck.yml",
    "./herakles-healthcheck.json",
    "./herakles-healthcheck.toml",
];

/// Per-metric threshold overrides. Missing entries keep their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThresholdsConfig {
    /// Only `warn` is honoured; the critical level comes from
    /// `cpu_critical_percent`.
    pub cpu: Option<Threshold>,
    pub load: Option<Threshold>,
    #[serde(alias = "disk-util")]
    pub disk_util: Option<Threshold>,
    pub filesystem: Option<Threshold>,
    pub memory: Option<Threshold>,
    pub swap: Option<Threshold>,
    /// MiB per second.
    #[serde(alias = "network-mib")]
    pub network_mib: Option<Threshold>,
}

/// Config file contents; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub watch: Option<bool>,
    #[serde(alias = "interval-seconds")]
    pub interval_seconds: Option<u64>,
    #[serde(alias = "sample-seconds")]
    pub sample_seconds: Option<u64>,

    // Logging
    #[serde(alias = "enable-file-logging")]
    pub enable_file_logging: Option<bool>,
    #[serde(alias = "log-file")]
    pub log_file: Option<PathBuf>,
    #[serde(alias = "log-level")]
    pub log_level: Option<String>,

    #[serde(alias = "cpu-critical-percent")]
    pub cpu_critical_percent: Option<f64>,
    pub interface: Option<String>,
    pub color: Option<bool>,
    #[serde(alias = "use-external-tools")]
    pub use_external_tools: Option<bool>,
    #[serde(alias = "parallel-sampling")]
    pub parallel_sampling: Option<bool>,
    #[serde(alias = "proc-root")]
    pub proc_root: Option<PathBuf>,

    #[serde(default)]
    pub thresholds: ThresholdsConfig,
}

/// Fully resolved, immutable settings for one program run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSettings {
    pub watch: bool,
    pub interval: Duration,
    pub sample: Duration,
    pub enable_file_logging: bool,
    pub log_file: PathBuf,
    pub log_level: String,
    /// `None` means detect from the default route each cycle.
    pub interface: Option<String>,
    pub color: bool,
    pub use_external_tools: bool,
    pub parallel_sampling: bool,
    pub proc_root: PathBuf,
    pub thresholds: ThresholdPolicy,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            watch: false,
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECONDS),
            sample: Duration::from_secs(DEFAULT_SAMPLE_SECONDS),
            enable_file_logging: false,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            interface: None,
            color: true,
            use_external_tools: true,
            parallel_sampling: false,
            proc_root: PathBuf::from(DEFAULT_PROC_ROOT),
            thresholds: ThresholdPolicy::default(),
        }
    }
}

impl Config {
    /// Overlays the flags the user actually passed.
    pub fn apply_args(&mut self, args: &Args) {
        if args.watch {
            self.watch = Some(true);
        }
        if let Some(interval) = args.interval {
            self.interval_seconds = Some(interval);
        }
        if let Some(sample) = args.sample {
            self.sample_seconds = Some(sample);
        }
        if args.log {
            self.enable_file_logging = Some(true);
        }
        if let Some(path) = &args.log_file {
            self.log_file = Some(path.clone());
        }
        if let Some(level) = args.log_level {
            self.log_level = Some(level.as_str().to_string());
        }
        if let Some(threshold) = args.threshold {
            self.cpu_critical_percent = Some(threshold);
        }
        if let Some(iface) = &args.interface {
            self.interface = Some(iface.clone());
        }
        if args.no_color {
            self.color = Some(false);
        }
        if args.no_tools {
            self.use_external_tools = Some(false);
        }
        if args.parallel {
            self.parallel_sampling = Some(true);
        }
        if let Some(root) = &args.proc_root {
            self.proc_root = Some(root.clone());
        }
    }

    /// Applies defaults to every unset field.
    pub fn into_settings(self) -> ReportSettings {
        let defaults = ReportSettings::default();
        let mut thresholds = ThresholdPolicy::with_cpu_critical(
            self.cpu_critical_percent.unwrap_or(DEFAULT_CPU_CRITICAL),
        );

        let t = &self.thresholds;
        if let Some(cpu) = t.cpu {
            thresholds.cpu.warn = cpu.warn;
        }
        if let Some(load) = t.load {
            thresholds.load = load;
        }
        if let Some(disk) = t.disk_util {
            thresholds.disk_util = disk;
        }
        if let Some(fs) = t.filesystem {
            thresholds.filesystem = fs;
        }
        if let Some(memory) = t.memory {
            thresholds.memory = memory;
        }
        if let Some(swap) = t.swap {
            thresholds.swap = swap;
        }
        if let Some(net) = t.network_mib {
            thresholds.network = Threshold::new(
                net.warn * crate::classify::MIB,
                net.critical * crate::classify::MIB,
            );
        }

        ReportSettings {
            watch: self.watch.unwrap_or(defaults.watch),
            interval: self
                .interval_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.interval),
            sample: self
                .sample_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.sample),
            enable_file_logging: self
                .enable_file_logging
                .unwrap_or(defaults.enable_file_logging),
            log_file: self.log_file.unwrap_or(defaults.log_file),
            log_level: self.log_level.unwrap_or(defaults.log_level),
            interface: self.interface.filter(|i| !i.trim().is_empty()),
            color: self.color.unwrap_or(defaults.color),
            use_external_tools: self.use_external_tools.unwrap_or(defaults.use_external_tools),
            parallel_sampling: self.parallel_sampling.unwrap_or(defaults.parallel_sampling),
            proc_root: self.proc_root.unwrap_or(defaults.proc_root),
            thresholds,
        }
    }
}

/// Validate effective config (used at startup and by --show-config)
pub fn validate_effective_config(cfg: &Config) -> anyhow::Result<()> {
    if cfg.interval_seconds == Some(0) {
        bail!("interval_seconds must be greater than 0");
    }
    if cfg.sample_seconds == Some(0) {
        bail!("sample_seconds must be greater than 0");
    }

    if let Some(cpu) = cfg.cpu_critical_percent {
        if !(1.0..=100.0).contains(&cpu) {
            bail!("cpu_critical_percent must be within 1..=100, got {}", cpu);
        }
    }

    if let Some(level) = cfg.log_level.as_deref() {
        if LogLevel::from_str_level(level).is_none() {
            bail!(
                "Invalid log_level '{}', expected off, error, warn, info, debug or trace",
                level
            );
        }
    }

    let t = &cfg.thresholds;
    if let Some(cpu) = t.cpu {
        check_value("thresholds.cpu.warn", cpu.warn)?;
    }
    for (name, threshold) in [
        ("load", t.load),
        ("disk_util", t.disk_util),
        ("filesystem", t.filesystem),
        ("memory", t.memory),
        ("swap", t.swap),
        ("network_mib", t.network_mib),
    ] {
        if let Some(threshold) = threshold {
            check_threshold(name, threshold)?;
        }
    }

    Ok(())
}

fn check_value(name: &str, value: f64) -> anyhow::Result<()> {
    if !value.is_finite() || value < 0.0 {
        bail!("{} must be a non-negative number, got {}", name, value);
    }
    Ok(())
}

fn check_threshold(name: &str, threshold: Threshold) -> anyhow::Result<()> {
    check_value(&format!("thresholds.{}.warn", name), threshold.warn)?;
    check_value(&format!("thresholds.{}.critical", name), threshold.critical)?;
    if threshold.warn > threshold.critical {
        bail!(
            "thresholds.{}: warn ({}) is above critical ({})",
            name,
            threshold.warn,
            threshold.critical
        );
    }
    Ok(())
}

/// Resolves the merged config from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    config.apply_args(args);
    Ok(config)
}

/// Loads a config file, or the first file found in the default locations.
///
/// An explicitly given path must exist; missing default files are not an
/// error.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match path {
        Some(p) => {
            if !p.exists() {
                bail!("Config file not found: {}", p.display());
            }
            p.to_path_buf()
        }
        None => match DEFAULT_CONFIG_LOCATIONS
            .iter()
            .map(Path::new)
            .find(|p| p.exists())
        {
            Some(p) => p.to_path_buf(),
            None => return Ok(Config::default()),
        },
    };

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    let config = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?,
        Some("toml") => toml::from_str(&content)
            .with_context(|| format!("Invalid TOML in {}", path.display()))?,
        // Default to YAML
        _ => serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid YAML in {}", path.display()))?,
    };

    info!("Loaded configuration from: {}", path.display());
    Ok(config)
}

/// Renders the effective configuration in the requested format
pub fn render_config(config: &Config, format: ConfigFormat) -> anyhow::Result<String> {
    Ok(match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    })
}
