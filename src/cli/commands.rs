//! Command implementations and dispatch.
//!
//! The dispatcher wires the gate together from configuration: the file
//! catalog provider, the tracing log sink, the configured version source,
//! and the configured reviewer command.
//!
//! Exit codes: `check` exits 0 when the runtime is compatible and 2 when it
//! is not (however the incompatibility was handled); `status` and
//! `unsubscribe` exit 0 unless the catalog or config cannot be used.

use std::path::PathBuf;
use std::sync::Arc;

use crate::catalog::{FileCatalogProvider, TracingSink};
use crate::config::{GateConfig, CONFIG_FILE_NAME};
use crate::error::Result;
use crate::gate::Gate;
use crate::negotiation::{ActivationState, Negotiator};
use crate::reviewer::CommandReviewer;
use crate::ui::{OutputMode, Prompt, PromptType, UserInterface};

use super::args::{CheckArgs, Cli, Commands, StatusArgs, UnsubscribeArgs};

/// Result of running a command.
#[derive(Debug, Clone, Copy)]
pub struct CommandResult {
    pub exit_code: i32,
}

impl CommandResult {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

/// Dispatches parsed CLI commands.
pub struct CommandDispatcher {
    config_path: PathBuf,
}

impl CommandDispatcher {
    /// Create a dispatcher reading config from `config_path`, or from
    /// `./stile.yml` when `None`.
    pub fn new(config_path: Option<PathBuf>) -> Self {
        Self {
            config_path: config_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME)),
        }
    }

    /// Dispatch the parsed command.
    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        match &cli.command {
            None => self.check(&CheckArgs {
                non_interactive: false,
                no_delay: false,
            }, ui),
            Some(Commands::Check(args)) => self.check(args, ui),
            Some(Commands::Status(args)) => self.status(args, ui),
            Some(Commands::Unsubscribe(args)) => self.unsubscribe(args, ui),
        }
    }

    fn load_config(&self) -> Result<GateConfig> {
        GateConfig::load(&self.config_path)
    }

    fn build_gate(&self, config: GateConfig) -> Gate {
        let runtime = config.version_source.runtime();
        let negotiator = Negotiator::new(Box::new(FileCatalogProvider), Arc::new(TracingSink));
        let reviewer = CommandReviewer::from_string(
            config.reviewer_command.as_deref().unwrap_or_default(),
        );
        Gate::new(config, runtime, negotiator, Box::new(reviewer))
    }

    fn check(&self, args: &CheckArgs, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let mut config = self.load_config()?;
        if args.no_delay {
            config.prompt_delay_ms = 0;
        }
        let gate = self.build_gate(config);

        let outcome = gate.run(ui);
        tracing::debug!(?outcome, "gate finished");

        if outcome.is_compliant() {
            Ok(CommandResult::ok())
        } else {
            Ok(CommandResult::code(2))
        }
    }

    fn status(&self, _args: &StatusArgs, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let config = self.load_config()?;
        let gate = self.build_gate(config);

        let current = gate.current_version();
        let required = gate.config().required();
        let state = gate.channel_state();

        ui.message(&format!("Running version:  {current}"));
        ui.message(&format!(
            "Required version: {required} ({})",
            gate.config().component
        ));
        let verdict = if current >= required {
            "compatible"
        } else {
            "too old"
        };
        ui.message(&format!("Compatibility:    {verdict}"));
        let state_text = match &state {
            ActivationState::Active => "active".to_string(),
            ActivationState::Inactive => "inactive".to_string(),
            ActivationState::NotFound => "not present".to_string(),
            ActivationState::Unknown { reason } => format!("unknown ({reason})"),
        };
        ui.message(&format!(
            "Channel '{}':     {state_text}",
            gate.config().channel
        ));
        if ui.output_mode() == OutputMode::Verbose {
            match gate.config().resolve_catalog_dir() {
                Some(dir) => ui.message(&format!("Catalog directory: {}", dir.display())),
                None => ui.message("Catalog directory: not configured"),
            }
        }

        Ok(CommandResult::ok())
    }

    fn unsubscribe(
        &self,
        args: &UnsubscribeArgs,
        ui: &mut dyn UserInterface,
    ) -> Result<CommandResult> {
        let config = self.load_config()?;
        let channel = config.channel.clone();
        let gate = self.build_gate(config);

        if !args.yes {
            let prompt = Prompt {
                key: "confirm_unsubscribe".to_string(),
                question: format!("Deactivate the '{channel}' channel?"),
                prompt_type: PromptType::Confirm,
                default: Some("no".to_string()),
            };
            let confirmed = ui.prompt(&prompt)?.as_bool().unwrap_or(false);
            if !confirmed {
                ui.message("Nothing changed.");
                return Ok(CommandResult::ok());
            }
        }

        let negotiation = gate.deactivate(ui);
        if negotiation.is_applied() {
            Ok(CommandResult::ok())
        } else {
            Ok(CommandResult::code(1))
        }
    }
}
