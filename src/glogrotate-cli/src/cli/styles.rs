//! CLI styling and formatting.
//!
//! Defines ANSI colors and formatting for the CLI help output.

use clap::builder::styling::{AnsiColor, Effects, Styles};

/// Styled help theme.
pub fn get_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Yellow.on_default())
        .error(AnsiColor::Red.on_default() | Effects::BOLD)
        .valid(AnsiColor::Cyan.on_default())
        .invalid(AnsiColor::Yellow.on_default())
}

/// After-help section with usage examples and environment variables.
pub const AFTER_HELP: &str = color_print::cstr!(
    r#"<cyan,bold>EXAMPLES</>
    <green,bold>glogrotate</> <dim>--base /home/app/logs reg</>
        Gzip and prune /home/app/logs/reg with default retention
    <green,bold>glogrotate</> <dim>--max-info-age 720h --max-error-age 1440h --max-size-gb 1 reg api</>
        Keep INFO for 30 days, ERROR/FATAL for 60 days, 1 GiB per directory
    <green,bold>glogrotate</> <dim>--config /etc/glogrotate.toml --dry-run --json</>
        Show what a configured run would do

<cyan,bold>ENVIRONMENT VARIABLES</>
    <yellow>GLOGROTATE_CONFIG</>      Path to a TOML config file (alternative to --config)
    <yellow>GLOGROTATE_LOG_LEVEL</>   Log verbosity (error, warn, info, debug)
    <yellow>RUST_LOG</>               Full tracing filter, overrides the log level"#
);
