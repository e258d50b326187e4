//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// stile - Runtime compatibility gate for optional update channels.
#[derive(Debug, Parser)]
#[command(name = "stile")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to config file (overrides default ./stile.yml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the startup gate (default if no command specified)
    Check(CheckArgs),

    /// Show the running version and the guarded channel's state
    Status(StatusArgs),

    /// Deactivate the guarded channel without going through the gate
    Unsubscribe(UnsubscribeArgs),
}

/// Arguments for the `check` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CheckArgs {
    /// Never prompt, even on a terminal
    #[arg(long)]
    pub non_interactive: bool,

    /// Skip the pre-prompt delay
    #[arg(long)]
    pub no_delay: bool,
}

/// Arguments for the `status` command.
#[derive(Debug, Clone, clap::Args)]
pub struct StatusArgs {}

/// Arguments for the `unsubscribe` command.
#[derive(Debug, Clone, clap::Args)]
pub struct UnsubscribeArgs {
    /// Do not ask for confirmation
    #[arg(short, long)]
    pub yes: bool,
}
