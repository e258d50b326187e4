//! Command-line interface for stile.
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`commands`] - Command implementations and dispatch

pub mod args;
pub mod commands;

pub use args::{CheckArgs, Cli, Commands, StatusArgs, UnsubscribeArgs};
pub use commands::{CommandDispatcher, CommandResult};
