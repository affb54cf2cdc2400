//! The `calmux` command-line interface.
//!
//! This crate wires the source variants, the aggregation engine and the
//! source manager together from a TOML settings file, and renders their
//! results for the terminal.

pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;
pub mod secret;

pub use app::App;
pub use cli::Cli;
pub use config::Settings;
pub use error::{ClientError, ClientResult};
