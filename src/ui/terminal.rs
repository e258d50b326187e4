//! Interactive terminal UI.

use console::{Style, Term};
use std::io::Write;

use crate::error::Result;

use super::{prompt_user, NonInteractiveUI, OutputMode, Prompt, PromptResult, UserInterface};

/// Check if colors should be enabled.
pub fn should_use_colors() -> bool {
    // Check NO_COLOR env var (https://no-color.org/)
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    // Check if stdout is a TTY
    console::Term::stdout().is_term()
}

/// Interactive terminal UI implementation.
pub struct TerminalUI {
    term: Term,
    success: Style,
    warning: Style,
    error: Style,
    mode: OutputMode,
}

impl TerminalUI {
    /// Create a new terminal UI.
    pub fn new(mode: OutputMode) -> Self {
        let (success, warning, error) = if should_use_colors() {
            (
                Style::new().green(),
                Style::new().yellow(),
                Style::new().red().bold(),
            )
        } else {
            (Style::new(), Style::new(), Style::new())
        };

        Self {
            term: Term::stdout(),
            success,
            warning,
            error,
            mode,
        }
    }
}

impl UserInterface for TerminalUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "{}", msg).ok();
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "{}", self.success.apply_to(msg)).ok();
        }
    }

    fn warning(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "{}", self.warning.apply_to(msg)).ok();
        }
    }

    fn error(&mut self, msg: &str) {
        writeln!(self.term, "{}", self.error.apply_to(msg)).ok();
    }

    fn prompt(&mut self, prompt: &Prompt) -> Result<PromptResult> {
        prompt_user(prompt, &self.term)
    }

    fn is_interactive(&self) -> bool {
        true
    }
}

/// Create the appropriate UI for the session.
pub fn create_ui(interactive: bool, mode: OutputMode) -> Box<dyn UserInterface> {
    if interactive {
        Box::new(TerminalUI::new(mode))
    } else {
        Box::new(NonInteractiveUI::new(mode))
    }
}
