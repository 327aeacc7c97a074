// Logging module
// Subscriber setup for the navgraph tools using the tracing crate
//
// The library crates only emit events through `tracing` macros; a binary
// decides where they go by calling `initialize_logging` once at startup:
// - Console output with ANSI colors
// - Optional daily rolling log file
// - Filtering through RUST_LOG or the configured level

use std::path::Path;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log file name written inside the configured log directory
pub const LOG_FILE_NAME: &str = "navgraph.log";

/// Map a numeric console level (0=Error, 1=Warning, 2=Detail, 3=Debug, 4=Trace)
/// to a tracing filter directive
pub fn map_log_level(level: i32) -> &'static str {
    match level {
        i32::MIN..=0 => "error",
        1 => "warn",
        2 => "info",
        3 => "debug",
        _ => "trace",
    }
}

/// Initialize the logging system
///
/// `log_dir` enables a second, non-colored file layer. `log_level` is used
/// when RUST_LOG is not set.
pub fn initialize_logging(log_dir: Option<&str>, log_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    if let Some(dir) = log_dir {
        let path = Path::new(dir);
        if !path.exists() {
            let _ = std::fs::create_dir_all(path);
        }

        let file_appender = rolling::daily(dir, LOG_FILE_NAME);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        // The guard flushes on drop; it has to outlive every log call
        std::mem::forget(guard);

        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(false)
                    .with_thread_ids(false),
            )
            .with(
                fmt::layer()
                    .with_writer(non_blocking)
                    .with_ansi(false)
                    .with_target(true),
            )
            .try_init();
    } else {
        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(false)
                    .with_thread_ids(false),
            )
            .try_init();
    }
}
