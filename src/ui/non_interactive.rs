//! Non-interactive UI for CI and headless environments.
//!
//! Prompts are never shown: every prompt resolves to its default, or to a
//! conservative "no" when there is none.

use crate::error::Result;

use super::{OutputMode, Prompt, PromptResult, PromptType, UserInterface};

/// UI that prints to stdout/stderr and answers prompts with defaults.
pub struct NonInteractiveUI {
    mode: OutputMode,
}

impl NonInteractiveUI {
    pub fn new(mode: OutputMode) -> Self {
        Self { mode }
    }
}

impl UserInterface for NonInteractiveUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("{}", msg);
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("{}", msg);
        }
    }

    fn warning(&mut self, msg: &str) {
        if self.mode.shows_status() {
            eprintln!("warning: {}", msg);
        }
    }

    fn error(&mut self, msg: &str) {
        eprintln!("error: {}", msg);
    }

    fn prompt(&mut self, prompt: &Prompt) -> Result<PromptResult> {
        match &prompt.prompt_type {
            PromptType::Confirm => {
                let default = prompt
                    .default
                    .as_ref()
                    .map(|s| s == "true" || s == "y" || s == "yes")
                    .unwrap_or(false);
                Ok(PromptResult::Bool(default))
            }
            PromptType::Select { options } => {
                let value = prompt
                    .default
                    .clone()
                    .or_else(|| options.first().map(|o| o.value.clone()))
                    .unwrap_or_default();
                Ok(PromptResult::String(value))
            }
        }
    }

    fn is_interactive(&self) -> bool {
        false
    }
}
