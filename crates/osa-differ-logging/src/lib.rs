//! # osa-differ-logging
//!
//! Logging for osa-differ.
//!
//! This crate provides structured progress events for a comparison run,
//! plus the `tracing` subscriber setup used by the binary.
//!
//! ## Key Types
//!
//! - [`Logger`] - Structured event logging
//! - [`LogEvent`] - Log event types
//! - [`LogFormat`] - Output formats (Pretty, JSON, Compact)
//!
//! ## Log Formats
//!
//! - `Pretty` - Human-readable colored output
//! - `JSON` - Structured JSON lines
//! - `Compact` - Minimal text output

mod events;

pub use events::{LogEvent, LogFormat, Logger};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing for the application.
///
/// Output goes to stderr so the report on stdout stays clean.
pub fn init_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_target(false)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        LogFormat::Pretty | LogFormat::Compact => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
                .init();
        }
    }
}
