//! Command-line interface definitions and helpers.
//!
//! This module contains all CLI argument parsing, stdin command parsing,
//! terminal rendering, and subcommand handlers.

mod args;
mod commands;
mod input;
mod surface;

pub use args::{Args, Command};
pub use commands::{
    handle_config_action, list_characters, run_health, run_kiosk, run_status, run_swap,
};
