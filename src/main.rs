//! herakles-healthcheck
//!
//! Terminal health report for a single Linux host. Prints one report, or
//! keeps refreshing it in watch mode until SIGINT/SIGTERM.

use std::io::{IsTerminal, Write};
use std::ops::ControlFlow;

use tokio::signal;
use tracing::{debug, error, info, warn, Level};

use herakles_healthcheck::cli::{parse_args, Args, LogLevel, ParseOutcome};
use herakles_healthcheck::config::{render_config, resolve_config, validate_effective_config, ReportSettings};
use herakles_healthcheck::report::{logfile, render::CLEAR_SCREEN};
use herakles_healthcheck::startup_checks::validate_requirements;
use herakles_healthcheck::{run, Renderer, Report, Sources};

/// Initializes tracing logging subsystem with configured log level.
///
/// Diagnostics go to stderr so stdout only carries the report.
fn setup_logging(settings: &ReportSettings) {
    let level = LogLevel::from_str_level(&settings.log_level).unwrap_or(LogLevel::Warn);
    if level == LogLevel::Off {
        return;
    }

    let log_level = match level {
        LogLevel::Off | LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return;
    }

    info!("Logging initialized with level: {}", level.as_str());
}

/// Helper function to load and validate configuration.
/// Exits the process with error code 1 if validation fails.
fn load_validated_settings(args: &Args) -> ReportSettings {
    let config = match resolve_config(args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("Configuration invalid: {}", e);
        std::process::exit(1);
    }

    if args.show_config {
        match render_config(&config, args.config_format) {
            Ok(rendered) => {
                println!("{}", rendered);
                std::process::exit(0);
            }
            Err(e) => {
                eprintln!("Failed to render configuration: {}", e);
                std::process::exit(1);
            }
        }
    }

    config.into_settings()
}

/// Resolves when SIGINT or SIGTERM arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), stopping...");
        }
        _ = terminate => {
            info!("Received SIGTERM, stopping...");
        }
    }
}

/// Prints one finished report and appends it to the log file when enabled.
fn emit_report(settings: &ReportSettings, renderer: &Renderer, clear: bool, report: &Report) {
    let mut stdout = std::io::stdout().lock();
    let text = renderer.render(report);
    let result = if clear {
        write!(stdout, "{}{}", CLEAR_SCREEN, text)
    } else {
        write!(stdout, "{}", text)
    };
    if let Err(e) = result.and_then(|_| stdout.flush()) {
        debug!("Failed to write report to stdout: {}", e);
    }

    if settings.enable_file_logging {
        let lines = logfile::log_lines(report);
        if let Err(e) = logfile::append_lines(&settings.log_file, &lines) {
            warn!("Cannot write log file {}: {}", settings.log_file.display(), e);
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = match parse_args(std::env::args_os()) {
        ParseOutcome::Run(args) => args,
        ParseOutcome::Exit(code) => std::process::exit(code),
    };

    let settings = load_validated_settings(&args);
    setup_logging(&settings);

    let sources = Sources::from_settings(&settings);
    if let Err(e) = validate_requirements(&settings.proc_root, &sources.probe) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    let interactive = std::io::stdout().is_terminal();
    let renderer = Renderer::new(settings.color && interactive);
    let clear = settings.watch && interactive;

    info!(
        "Starting {} (watch: {}, interval: {}s, sample: {}s)",
        env!("CARGO_PKG_NAME"),
        settings.watch,
        settings.interval.as_secs(),
        settings.sample.as_secs()
    );

    let cycles = run(&settings, &sources, shutdown_signal(), |report| {
        emit_report(&settings, &renderer, clear, report);
        ControlFlow::Continue(())
    })
    .await;

    info!("herakles-healthcheck stopped after {} cycle(s)", cycles);
}
