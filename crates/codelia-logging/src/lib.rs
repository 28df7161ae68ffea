//! # codelia-logging
//!
//! Logging for codelia.
//!
//! ## Key Types
//!
//! - [`Logger`] - renders workflow events
//! - [`LogEvent`] - evaluate/improve/history events
//! - [`LogFormat`] - Pretty, JSON or Compact output
//!
//! [`init_tracing`] sets up the `tracing` subscriber used for diagnostics;
//! [`init_tracing_with_dir`] adds a daily-rolling JSON log file.

mod events;

pub use events::{preview, LogEvent, LogFormat, Logger, ScoreTarget};

use std::path::Path;

use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer};

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Initialize tracing for the application
pub fn init_tracing(level: &str, format: LogFormat) {
    let filter = env_filter(level);

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_target(false).with_writer(std::io::stderr))
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

/// Daily-rolling JSON file layer under `log_dir`
fn file_layer<S>(log_dir: &Path) -> (impl Layer<S>, WorkerGuard)
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let appender = tracing_appender::rolling::daily(log_dir, "codelia.log");
    let (file_writer, guard) = tracing_appender::non_blocking(appender);
    let layer = fmt::layer()
        .json()
        .with_ansi(false)
        .with_writer(file_writer);
    (layer, guard)
}

/// Initialize tracing with an additional JSON log file under `log_dir`,
/// rotated daily. Keep the returned guard alive until exit so buffered
/// lines are flushed.
pub fn init_tracing_with_dir(level: &str, format: LogFormat, log_dir: &Path) -> WorkerGuard {
    let filter = env_filter(level);
    match format {
        LogFormat::Json => {
            let (file, guard) = file_layer(log_dir);
            tracing_subscriber::registry()
                .with(filter)
                .with(file)
                .with(fmt::layer().json().with_target(false).with_writer(std::io::stderr))
                .init();
            guard
        }
        LogFormat::Pretty | LogFormat::Compact => {
            let (file, guard) = file_layer(log_dir);
            tracing_subscriber::registry()
                .with(filter)
                .with(file)
                .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
                .init();
            guard
        }
    }
}
