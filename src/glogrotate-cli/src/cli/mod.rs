//! CLI argument parsing and command dispatch.
//!
//! - `args` - Command-line argument structures
//! - `styles` - ANSI styling for help output
//! - `handlers` - Run execution and report output

pub mod args;
pub mod handlers;
pub mod styles;

pub use args::{Cli, LogLevel};
pub use handlers::{format_size, run};
pub use styles::{AFTER_HELP, get_styles};
