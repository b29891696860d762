//! glogrotate - main entry point.
//!
//! Gzips and deletes log files written by glog, one configured directory at a
//! time. The process exits successfully even when some directories could not
//! be processed; those failures are logged and included in the report.

use anyhow::Result;
use clap::Parser;

use glogrotate_cli::cli::{Cli, run};
use glogrotate_cli::{LOG_LEVEL_ENV, init_logging};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let env_level = std::env::var(LOG_LEVEL_ENV).ok();
    init_logging(cli.effective_log_level(env_level.as_deref()));

    run(&cli)?;
    Ok(())
}
