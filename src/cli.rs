//! CLI arguments for herakles-healthcheck.
//!
//! This module defines the command-line interface using the clap library.
//! Flags only carry what the user typed; defaults are applied in `config`.

use clap::{error::ErrorKind, Parser, ValueEnum};
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Parses a level name as written in config files.
    pub fn from_str_level(level: &str) -> Option<LogLevel> {
        match level.to_ascii_lowercase().as_str() {
            "off" => Some(LogLevel::Off),
            "error" => Some(LogLevel::Error),
            "warn" | "warning" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" => Some(LogLevel::Trace),
            _ => None,
        }
    }
}

/// Configuration format options for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Main CLI arguments structure
#[derive(Parser, Debug, Clone)]
#[command(
    name = "herakles-healthcheck",
    about = "Color-coded health report for this Linux host",
    long_about = "Color-coded health report for this Linux host.\n\n\
                  Samples CPU, load average, disk I/O, filesystem usage, network bandwidth \
                  and memory from /proc, classifies every value as OK, WARN or CRITICAL and \
                  prints a report. Uses iostat, mpstat, ifstat, iotop and ss when installed.",
    author = "Michael Moll <exporter@herakles.now> - Herakles",
    version,
    after_help = "Exit codes: 0 on success or --help, 1 on invalid arguments or configuration."
)]
pub struct Args {
    /// Continuous mode: refresh the report until interrupted
    #[arg(short = 'w', long)]
    pub watch: bool,

    /// Refresh interval in seconds for continuous mode [default: 5]
    #[arg(short = 'i', long, value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: Option<u64>,

    /// Append one line per section and cycle to the log file
    #[arg(short = 'l', long = "log")]
    pub log: bool,

    /// Log file path [default: /var/log/herakles-healthcheck.log]
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// CPU critical threshold in percent [default: 90]
    #[arg(short = 't', long, value_name = "PERCENT", value_parser = parse_percent)]
    pub threshold: Option<f64>,

    /// Network interface to report [default: interface of the default route]
    #[arg(short = 'n', long, value_name = "IFACE")]
    pub interface: Option<String>,

    /// Sample window in seconds for delta-based metrics [default: 1]
    #[arg(short = 's', long = "sample", value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..))]
    pub sample: Option<u64>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Diagnostic log level (written to stderr) [default: warn]
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Disable ANSI colors
    #[arg(long)]
    pub no_color: bool,

    /// Never run external tools; use /proc only
    #[arg(long)]
    pub no_tools: bool,

    /// Overlap the sample windows of all sections
    #[arg(long)]
    pub parallel: bool,

    /// Root of the proc filesystem
    #[arg(long, value_name = "PATH")]
    pub proc_root: Option<PathBuf>,
}

/// Parses a percentage in 1..=100.
fn parse_percent(value: &str) -> Result<f64, String> {
    let percent: f64 = value
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    if !(1.0..=100.0).contains(&percent) {
        return Err(format!("{} is outside 1..=100", value));
    }
    Ok(percent)
}

/// Outcome of argument parsing for the binary.
pub enum ParseOutcome {
    Run(Args),
    /// Help or version was printed; exit 0.
    Exit(i32),
}

/// Parses arguments, printing usage on error.
///
/// Help and version exit 0; every other parse error exits 1.
pub fn parse_args<I, T>(argv: I) -> ParseOutcome
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    match Args::try_parse_from(argv) {
        Ok(args) => ParseOutcome::Run(args),
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp
                | ErrorKind::DisplayVersion
                | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => 0,
                _ => 1,
            };
            let _ = e.print();
            ParseOutcome::Exit(code)
        }
    }
}
