//! glogrotate CLI library module.
//!
//! - `cli/` - argument parsing, configuration resolution and report output
//! - [`init_logging`] - tracing setup for the tool's own diagnostics

pub mod cli;

use cli::LogLevel;

/// Environment variable selecting the log level when no flag does.
pub const LOG_LEVEL_ENV: &str = "GLOGROTATE_LOG_LEVEL";

/// Initialize the global tracing subscriber, writing to stderr.
///
/// `RUST_LOG`, when set, takes precedence over `level`.
pub fn init_logging(level: LogLevel) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::from_default_env()
    } else {
        tracing_subscriber::EnvFilter::new(level.as_filter_str())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
