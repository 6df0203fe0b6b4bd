//! Command-line interface
//!
//! - Argument parsing (`args`)
//! - Runtime setup (`setup`)

pub mod args;
pub mod setup;

pub use args::{parse_args, Cli, Commands, OutputFormat};
pub use setup::{configure_thread_pool, init_logging, log_directive};
