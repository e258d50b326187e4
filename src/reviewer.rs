//! Hand-off to the external change reviewer.
//!
//! After a channel is deactivated, an external tool lets the user review and
//! apply the resulting file changes. Launching it is fire-and-forget: a
//! failed launch is reported to the caller, which falls back to showing
//! manual instructions, and is never propagated as an error.

use anyhow::{bail, Context, Result};
use std::process::{Command, Stdio};

/// Launcher for the external review tool.
pub trait ReviewerHandoff {
    /// Start the reviewer and return without waiting for it.
    fn launch(&self) -> Result<()>;
}

/// Spawns a configured command line, detached.
#[derive(Debug, Clone)]
pub struct CommandReviewer {
    command: String,
    args: Vec<String>,
}

impl CommandReviewer {
    /// Create from a full command string, e.g. `"update-reviewer --apply"`.
    pub fn from_string(cmd: &str) -> Self {
        let parts: Vec<&str> = cmd.split_whitespace().collect();
        let (command, args) = if parts.is_empty() {
            (cmd.to_string(), Vec::new())
        } else {
            (
                parts[0].to_string(),
                parts[1..].iter().map(|s| s.to_string()).collect(),
            )
        };
        Self { command, args }
    }
}

impl ReviewerHandoff for CommandReviewer {
    fn launch(&self) -> Result<()> {
        if self.command.is_empty() {
            bail!("no reviewer command configured");
        }
        Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("could not launch reviewer '{}'", self.command))?;
        Ok(())
    }
}
