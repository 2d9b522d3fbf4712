//! CLI argument parsing and command dispatch.

pub mod args;
pub mod balance;
pub mod batch;
pub mod check;
pub mod input;
pub mod models;
pub mod tidy;

pub use args::{Cli, Commands, OutputFormat};
