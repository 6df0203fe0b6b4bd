//! CLI command implementations.
//!
//! Available commands:
//! - **migrate**: Rewrite JS/TS sources with synthesized type declarations
//! - **init**: Initialize a new typelift configuration file

pub mod init;
pub mod migrate;

pub use init::init_config;
pub use migrate::{run_migrate, MigrateOptions, RunMode, RunSummary};
