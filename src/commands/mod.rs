//! Command-line interface definitions and handlers for the genohive CLI.

pub mod args;
pub mod hive;

pub use args::{Cli, Commands};
