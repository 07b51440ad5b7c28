//! Herakles Healthcheck Library
//!
//! Samples kernel counters of the local Linux host, turns counter deltas into
//! rates and percentages, classifies them as OK, WARN or CRITICAL and renders
//! a color-coded report.
//!
//! # Features
//!
//! - **Delta Sampling**: CPU, disk and network rates from two reads of
//!   monotonic counters, with counter resets clamped and flagged
//! - **Configurable Thresholds**: Per-metric warn and critical levels
//! - **Optional Tools**: iostat, mpstat, ifstat, iotop and ss are used when
//!   installed and skipped otherwise
//! - **Testable Sources**: Every reader takes the procfs root as a parameter
//!
//! # Usage
//!
//! ```rust,no_run
//! use herakles_healthcheck::{collect_report, config::ReportSettings, Renderer, Sources};
//!
//! # async fn demo() {
//! let settings = ReportSettings::default();
//! let sources = Sources::from_settings(&settings);
//!
//! let report = collect_report(&settings, &sources).await;
//! print!("{}", Renderer::new(settings.color).render(&report));
//! # }
//! ```

pub mod classify;
pub mod cli;
pub mod collectors;
pub mod config;
pub mod delta;
pub mod error;
pub mod interface;
pub mod report;
pub mod startup_checks;
pub mod system;
pub mod tools;

// Re-export main types for convenience
pub use classify::{classify, Severity, Threshold, ThresholdPolicy};
pub use error::CollectError;
pub use report::render::Renderer;
pub use report::{collect_report, run, Report, Sources};
