//! The `fiscal` command-line front end.
//!
//! Parses amounts the way people type them, loads rate tables and settings,
//! runs a calculator from `fiscal_core` and renders the result as text or
//! JSON.

pub mod amount;
pub mod commands;
pub mod csv_loader;
pub mod logging;
pub mod output;
pub mod settings;

pub use commands::{Cli, execute};
