//! Command-line argument definitions.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use glogrotate_engine::{CompressionMethod, GIB, Level, RotateConfig};

use super::styles::{AFTER_HELP, get_styles};

/// Verbosity of the tool's own diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    /// Directory failures only
    Error,
    /// Also files that could not be compressed or inspected
    Warn,
    /// Also one summary line per directory and every deletion by size
    #[default]
    Info,
    /// Also every compressed, skipped and age-deleted file
    Debug,
}

impl LogLevel {
    /// Directive for `EnvFilter`.
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }

    /// Parse a `GLOGROTATE_LOG_LEVEL` value, ignoring case.
    pub fn from_str_loose(s: &str) -> Option<LogLevel> {
        <LogLevel as clap::ValueEnum>::from_str(s, true)
            .ok()
            .or_else(|| s.eq_ignore_ascii_case("warning").then_some(LogLevel::Warn))
    }
}

/// Gzip and delete log files written by glog.
///
/// Each LOG_NAME is a directory below --base. Retained files are compressed,
/// files past their level's age limit are deleted, and the oldest files are
/// evicted while a directory exceeds its size budget.
#[derive(Debug, Parser)]
#[command(name = "glogrotate", version)]
#[command(styles = get_styles(), after_help = AFTER_HELP)]
pub struct Cli {
    /// Log directories to process, relative to --base
    #[arg(value_name = "LOG_NAME")]
    pub log_names: Vec<String>,

    /// TOML configuration file; flags override its values
    #[arg(long, short = 'c', env = "GLOGROTATE_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory containing the log directories [default: /var/log/]
    #[arg(long, value_name = "DIR")]
    pub base: Option<PathBuf>,

    /// Delete INFO files older than this (e.g. 720h, 30days) [default: 60days]
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    pub max_info_age: Option<Duration>,

    /// Delete WARNING files older than this [default: 180days]
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    pub max_warning_age: Option<Duration>,

    /// Delete ERROR and FATAL files older than this [default: 180days]
    #[arg(long = "max-error-age", alias = "max-err-age", value_name = "DURATION", value_parser = humantime::parse_duration)]
    pub max_error_age: Option<Duration>,

    /// Evict oldest files while a directory holds at least this many bytes (0 = no limit)
    #[arg(long, value_name = "BYTES", conflicts_with = "max_size_gb")]
    pub max_size: Option<u64>,

    /// Same as --max-size, in GiB [default: 2]
    #[arg(long, value_name = "GB")]
    pub max_size_gb: Option<u64>,

    /// Compression method: builtin or external
    #[arg(long, value_name = "METHOD")]
    pub compression: Option<CompressionMethod>,

    /// Gzip level (1-9) for builtin compression
    #[arg(long, value_name = "LEVEL", value_parser = clap::value_parser!(u32).range(1..=9))]
    pub gzip_level: Option<u32>,

    /// Program used for external compression
    #[arg(long, value_name = "PROGRAM")]
    pub gzip_program: Option<String>,

    /// Show what would be done without compressing or deleting anything
    #[arg(long)]
    pub dry_run: bool,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,

    /// Enable verbose output (same as --log-level debug)
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Log verbosity
    #[arg(long, value_enum, default_value_t = LogLevel::Info, value_name = "LEVEL")]
    pub log_level: LogLevel,
}

impl Cli {
    /// Effective log level: --verbose, then the `GLOGROTATE_LOG_LEVEL` value
    /// if given, then --log-level.
    pub fn effective_log_level(&self, env_level: Option<&str>) -> LogLevel {
        if self.verbose {
            LogLevel::Debug
        } else if let Some(level) = env_level.and_then(LogLevel::from_str_loose) {
            level
        } else {
            self.log_level
        }
    }

    /// Build the run configuration from the config file (if any) and flags.
    pub fn resolve_config(&self) -> Result<RotateConfig> {
        let mut config = match &self.config {
            Some(path) => RotateConfig::load(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => RotateConfig::default(),
        };

        if let Some(base) = &self.base {
            config.base_dir = base.clone();
        }
        if !self.log_names.is_empty() {
            config.log_names = self.log_names.clone();
        }
        if let Some(age) = self.max_info_age {
            config = config.retention_for(Level::Info, age);
        }
        if let Some(age) = self.max_warning_age {
            config = config.retention_for(Level::Warning, age);
        }
        if let Some(age) = self.max_error_age {
            config = config.retention_for(Level::Error, age);
        }
        if let Some(bytes) = self.max_size {
            config.max_total_size = bytes;
        }
        if let Some(gb) = self.max_size_gb {
            config.max_total_size = gb
                .checked_mul(GIB)
                .context("--max-size-gb is too large")?;
        }
        if let Some(method) = self.compression {
            config.compression.method = method;
        }
        if let Some(level) = self.gzip_level {
            config.compression.level = level;
        }
        if let Some(program) = &self.gzip_program {
            config.compression.program = program.clone();
        }
        if self.dry_run {
            config.dry_run = true;
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}
