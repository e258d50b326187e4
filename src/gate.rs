//! Startup compatibility gate.
//!
//! The gate runs once per process start and walks a small state machine:
//!
//! ```text
//! Unchecked ──▶ Compliant                         (version ok; terminal)
//!     │
//!     ▼
//! NonCompliant ──▶ Silent                         (channel already inactive)
//!     │
//!     ▼
//! Prompting ──▶ Reminded                          (user declined; nothing
//!     │                                            persisted, prompt returns
//!     ▼                                            next start)
//! Unsubscribed ──▶ Applied | AppliedNotPersisted | Failed
//! ```
//!
//! Each terminal state maps to one fixed user-facing message; `Applied` and
//! `AppliedNotPersisted` additionally hand off to the external change
//! reviewer. Nothing in here is fatal to the host process: every failure
//! path degrades to instructions.

use std::thread;
use std::time::Duration;

use crate::config::GateConfig;
use crate::env::RuntimeEnvironment;
use crate::negotiation::{NegotiationOutcome, Negotiator};
use crate::reviewer::ReviewerHandoff;
use crate::ui::{Prompt, PromptOption, PromptType, UserInterface};
use crate::version::MajorVersion;

/// Prompt key for the deactivate-or-remind choice.
const CHOICE_KEY: &str = "gate_choice";
const CHOICE_DEACTIVATE: &str = "deactivate";
const CHOICE_REMIND: &str = "remind";

/// Terminal result of one gate run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// The running environment satisfies the requirement.
    Compliant { current: MajorVersion },
    /// Too old, but the channel was already deactivated in a prior run; no
    /// prompt shown.
    AlreadyInactive { current: MajorVersion },
    /// Too old; the user declined (or the session could not prompt). The
    /// decline is not persisted, so the prompt returns next start.
    Reminded { current: MajorVersion },
    /// Too old and the user chose to deactivate the channel.
    Unsubscribed {
        current: MajorVersion,
        negotiation: NegotiationOutcome,
    },
}

impl GateOutcome {
    /// Whether the environment met the requirement.
    pub fn is_compliant(&self) -> bool {
        matches!(self, GateOutcome::Compliant { .. })
    }
}

/// The startup gate, wired once per process lifetime.
pub struct Gate {
    config: GateConfig,
    runtime: Box<dyn RuntimeEnvironment>,
    negotiator: Negotiator,
    reviewer: Box<dyn ReviewerHandoff>,
}

impl Gate {
    pub fn new(
        config: GateConfig,
        runtime: Box<dyn RuntimeEnvironment>,
        negotiator: Negotiator,
        reviewer: Box<dyn ReviewerHandoff>,
    ) -> Self {
        Self {
            config,
            runtime,
            negotiator,
            reviewer,
        }
    }

    /// The gate's configuration.
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// The running environment's major version, re-read on every call.
    pub fn current_version(&self) -> MajorVersion {
        self.runtime.current_major_version()
    }

    /// The guarded channel's activation state.
    pub fn channel_state(&self) -> crate::negotiation::ActivationState {
        let location = self.config.resolve_catalog_dir();
        self.negotiator
            .query_activation(&self.config.channel, location.as_deref())
    }

    /// Run the gate once.
    pub fn run(&self, ui: &mut dyn UserInterface) -> GateOutcome {
        let current = self.runtime.current_major_version();
        let required = self.config.required();

        if current >= required {
            tracing::debug!(%current, %required, "runtime satisfies requirement");
            return GateOutcome::Compliant { current };
        }

        tracing::warn!(
            %current,
            %required,
            component = %self.config.component,
            "runtime below requirement; {} will not function",
            self.config.component
        );

        let location = self.config.resolve_catalog_dir();
        let state = self
            .negotiator
            .query_activation(&self.config.channel, location.as_deref());

        if !state.treat_as_active() {
            // Deactivated in a prior run. Files remain on disk until the
            // reviewer cleans them up.
            tracing::info!(
                channel = %self.config.channel,
                "channel already deactivated; run the reviewer to remove leftover files"
            );
            return GateOutcome::AlreadyInactive { current };
        }

        if !ui.is_interactive() {
            self.show_warning(ui, current);
            ui.message(&format!(
                "Deactivate the '{}' channel to stop receiving incompatible updates.",
                self.config.channel
            ));
            return GateOutcome::Reminded { current };
        }

        // Delay the prompt so it does not race the host's startup visual
        // transitions. One-shot; no repeat, no cancellation path.
        if self.config.prompt_delay_ms > 0 {
            thread::sleep(Duration::from_millis(self.config.prompt_delay_ms));
        }

        self.show_warning(ui, current);

        match self.prompt_choice(ui) {
            Choice::Remind => GateOutcome::Reminded { current },
            Choice::Deactivate => {
                let negotiation = self.deactivate(ui);
                GateOutcome::Unsubscribed {
                    current,
                    negotiation,
                }
            }
        }
    }

    /// Deactivate the guarded channel, report the outcome, and hand off to
    /// the reviewer where the state change went through. Used by the gate's
    /// prompt path and by the explicit `unsubscribe` command.
    pub fn deactivate(&self, ui: &mut dyn UserInterface) -> NegotiationOutcome {
        let location = self.config.resolve_catalog_dir();
        let negotiation =
            self.negotiator
                .negotiate_activation(&self.config.channel, false, location.as_deref());
        self.report(ui, &negotiation);
        negotiation
    }

    fn show_warning(&self, ui: &mut dyn UserInterface, current: MajorVersion) {
        ui.warning(&format!(
            "{} requires version {} or newer, but this installation is running version {}. \
             {} will not work here.",
            self.config.component,
            self.config.required_version,
            current,
            self.config.component
        ));
        if let Some(notes) = &self.config.links.release_notes {
            ui.message(&format!("Release notes: {}", notes));
        }
        if let Some(downloads) = &self.config.links.downloads {
            ui.message(&format!("Compatible downloads: {}", downloads));
        }
        if let Some(support) = &self.config.links.support {
            ui.message(&format!("Questions? {}", support));
        }
    }

    fn prompt_choice(&self, ui: &mut dyn UserInterface) -> Choice {
        let prompt = Prompt {
            key: CHOICE_KEY.to_string(),
            question: "How do you want to proceed?".to_string(),
            prompt_type: PromptType::Select {
                options: vec![
                    PromptOption::new(
                        &format!("Unsubscribe from the '{}' channel", self.config.channel),
                        CHOICE_DEACTIVATE,
                    ),
                    PromptOption::new("Keep reminding me at startup", CHOICE_REMIND),
                ],
            },
            default: Some(CHOICE_REMIND.to_string()),
        };

        match ui.prompt(&prompt) {
            Ok(result) if result.as_string() == CHOICE_DEACTIVATE => Choice::Deactivate,
            // A closed or failed prompt counts as a decline; it reappears
            // next start.
            _ => Choice::Remind,
        }
    }

    /// Translate the negotiation outcome into one of the three fixed
    /// user-facing messages, handing off to the reviewer where the state
    /// change went through.
    fn report(&self, ui: &mut dyn UserInterface, negotiation: &NegotiationOutcome) {
        match negotiation {
            NegotiationOutcome::Applied { .. } => {
                ui.success(&format!(
                    "The '{}' channel has been deactivated.",
                    self.config.channel
                ));
                self.hand_off(ui);
            }
            NegotiationOutcome::AppliedNotPersisted { reason, .. } => {
                ui.warning(&format!(
                    "The '{}' channel was deactivated, but the change could not be saved \
                     ({}). If this installation sits on a read-only volume, move it \
                     somewhere writable, then deactivate the channel in the channel \
                     manager and apply the pending changes.",
                    self.config.channel, reason
                ));
                self.hand_off(ui);
            }
            NegotiationOutcome::NotFound => {
                ui.error(&format!(
                    "The '{}' channel was not found in this installation. You can check \
                     the channel manager and deactivate it manually if it appears there.",
                    self.config.channel
                ));
            }
            NegotiationOutcome::Failed { reason } => {
                ui.error(&format!(
                    "Automatic deactivation failed: {}. You can deactivate the '{}' \
                     channel manually in the channel manager, then apply the pending \
                     changes.",
                    reason, self.config.channel
                ));
            }
        }
    }

    /// Fire-and-forget reviewer launch. A failed launch degrades to
    /// instructions, never an error.
    fn hand_off(&self, ui: &mut dyn UserInterface) {
        match self.reviewer.launch() {
            Ok(()) => {
                ui.message("The change reviewer is opening so you can review and apply the removal.");
            }
            Err(e) => {
                tracing::debug!("could not launch the reviewer: {e}");
                ui.message(
                    "Run the change reviewer and apply the pending changes to complete the removal.",
                );
            }
        }
    }
}

enum Choice {
    Deactivate,
    Remind,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ChannelEntry, FileCatalog, FileCatalogProvider, TracingSink};
    use crate::config::VersionSource;
    use crate::env::StaticRuntime;
    use crate::ui::MockUI;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingReviewer {
        launches: Arc<AtomicUsize>,
        fail: bool,
    }

    impl ReviewerHandoff for RecordingReviewer {
        fn launch(&self) -> anyhow::Result<()> {
            self.launches.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("reviewer missing")
            }
            Ok(())
        }
    }

    fn seed_catalog(dir: &Path, active: bool) {
        FileCatalog::seed(
            dir,
            vec![ChannelEntry::new("neuro-channel").with_active(active)],
        )
        .unwrap();
    }

    fn config(dir: &Path, required: u32, running: &str) -> GateConfig {
        GateConfig {
            required_version: required,
            component: "neuro-tools".to_string(),
            channel: "neuro-channel".to_string(),
            catalog_dir: Some(dir.to_path_buf()),
            version_source: VersionSource::Literal {
                value: running.to_string(),
            },
            prompt_delay_ms: 0,
            reviewer_command: None,
            links: Default::default(),
        }
    }

    fn gate(config: GateConfig, fail_reviewer: bool) -> (Gate, Arc<AtomicUsize>) {
        let launches = Arc::new(AtomicUsize::new(0));
        let reviewer = RecordingReviewer {
            launches: Arc::clone(&launches),
            fail: fail_reviewer,
        };
        let runtime = config.version_source.runtime();
        let negotiator = Negotiator::new(Box::new(FileCatalogProvider), Arc::new(TracingSink));
        (
            Gate::new(config, runtime, negotiator, Box::new(reviewer)),
            launches,
        )
    }

    #[test]
    fn compliant_runtime_is_terminal_and_silent() {
        let temp = TempDir::new().unwrap();
        seed_catalog(temp.path(), true);
        let (gate, launches) = gate(config(temp.path(), 21, "21.0.2"), false);
        let mut ui = MockUI::new();

        let outcome = gate.run(&mut ui);
        assert!(outcome.is_compliant());
        assert!(ui.prompts_shown().is_empty());
        assert!(ui.warnings().is_empty());
        assert_eq!(launches.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn absent_version_is_oldest_possible() {
        let temp = TempDir::new().unwrap();
        seed_catalog(temp.path(), true);
        let mut cfg = config(temp.path(), 21, "");
        cfg.version_source = VersionSource::EnvVar {
            var: "STILE_TEST_NO_SUCH_VERSION_VAR".to_string(),
        };
        let (gate, _) = gate(cfg, false);
        let mut ui = MockUI::new();
        ui.set_prompt_response(CHOICE_KEY, CHOICE_REMIND);

        let outcome = gate.run(&mut ui);
        assert_eq!(
            outcome,
            GateOutcome::Reminded {
                current: MajorVersion::ZERO
            }
        );
    }

    #[test]
    fn already_inactive_channel_skips_prompt() {
        let temp = TempDir::new().unwrap();
        seed_catalog(temp.path(), false);
        let (gate, launches) = gate(config(temp.path(), 21, "1.8.0_392"), false);
        let mut ui = MockUI::new();

        let outcome = gate.run(&mut ui);
        assert!(matches!(outcome, GateOutcome::AlreadyInactive { .. }));
        assert!(ui.prompts_shown().is_empty());
        assert_eq!(launches.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn non_interactive_session_warns_without_prompting() {
        let temp = TempDir::new().unwrap();
        seed_catalog(temp.path(), true);
        let (gate, _) = gate(config(temp.path(), 21, "1.8.0_392"), false);
        let mut ui = MockUI::new();
        ui.set_interactive(false);

        let outcome = gate.run(&mut ui);
        assert!(matches!(outcome, GateOutcome::Reminded { .. }));
        assert!(ui.has_warning("requires version 21"));
        assert!(ui.prompts_shown().is_empty());
    }

    #[test]
    fn declining_the_prompt_is_reminded() {
        let temp = TempDir::new().unwrap();
        seed_catalog(temp.path(), true);
        let (gate, launches) = gate(config(temp.path(), 21, "1.8.0_392"), false);
        let mut ui = MockUI::new();
        ui.set_prompt_response(CHOICE_KEY, CHOICE_REMIND);

        let outcome = gate.run(&mut ui);
        assert!(matches!(outcome, GateOutcome::Reminded { .. }));
        assert_eq!(ui.prompts_shown(), &[CHOICE_KEY]);
        assert_eq!(launches.load(Ordering::SeqCst), 0);

        // Nothing persisted: the channel is still active on disk.
        let mut catalog = FileCatalog::open(temp.path());
        use crate::catalog::ChannelCatalog;
        catalog.read().unwrap();
        assert!(catalog.find("neuro-channel").hit().unwrap().is_some());
    }

    #[test]
    fn unsubscribing_deactivates_and_hands_off() {
        let temp = TempDir::new().unwrap();
        seed_catalog(temp.path(), true);
        let cfg = config(temp.path(), 21, "1.8.0_392");
        let (gate, launches) = gate(cfg.clone(), false);
        let mut ui = MockUI::new();
        ui.set_prompt_response(CHOICE_KEY, CHOICE_DEACTIVATE);

        let outcome = gate.run(&mut ui);
        match outcome {
            GateOutcome::Unsubscribed { negotiation, .. } => assert!(negotiation.is_applied()),
            other => panic!("expected Unsubscribed, got {other:?}"),
        }
        assert!(ui.has_success("deactivated"));
        assert_eq!(launches.load(Ordering::SeqCst), 1);

        // A later run sees the channel inactive and stays silent.
        let (gate, _) = gate_again(cfg);
        let mut ui = MockUI::new();
        let outcome = gate.run(&mut ui);
        assert!(matches!(outcome, GateOutcome::AlreadyInactive { .. }));
    }

    fn gate_again(cfg: GateConfig) -> (Gate, Arc<AtomicUsize>) {
        gate(cfg, false)
    }

    #[test]
    fn missing_channel_reports_not_found() {
        let temp = TempDir::new().unwrap();
        FileCatalog::seed(temp.path(), vec![ChannelEntry::new("other")]).unwrap();
        let (gate, launches) = gate(config(temp.path(), 21, "1.8.0_392"), false);
        let mut ui = MockUI::new();
        ui.set_prompt_response(CHOICE_KEY, CHOICE_DEACTIVATE);

        let outcome = gate.run(&mut ui);
        match outcome {
            GateOutcome::Unsubscribed { negotiation, .. } => {
                assert_eq!(negotiation, NegotiationOutcome::NotFound)
            }
            other => panic!("expected Unsubscribed, got {other:?}"),
        }
        assert!(ui.has_error("not found"));
        assert_eq!(launches.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn missing_location_prompts_and_fails_gracefully() {
        let temp = TempDir::new().unwrap();
        seed_catalog(temp.path(), true);
        let mut cfg = config(temp.path(), 21, "1.8.0_392");
        cfg.catalog_dir = None;
        let (gate, launches) = gate(cfg, false);
        let mut ui = MockUI::new();
        ui.set_prompt_response(CHOICE_KEY, CHOICE_DEACTIVATE);

        // Location unknown: the state query fails open, so the prompt still
        // shows, and the negotiation reports a failure.
        let outcome = gate.run(&mut ui);
        match outcome {
            GateOutcome::Unsubscribed { negotiation, .. } => {
                assert!(matches!(negotiation, NegotiationOutcome::Failed { .. }))
            }
            other => panic!("expected Unsubscribed, got {other:?}"),
        }
        assert!(ui.has_error("deactivation failed"));
        assert_eq!(launches.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn failed_reviewer_launch_degrades_to_instructions() {
        let temp = TempDir::new().unwrap();
        seed_catalog(temp.path(), true);
        let (gate, launches) = gate(config(temp.path(), 21, "1.8.0_392"), true);
        let mut ui = MockUI::new();
        ui.set_prompt_response(CHOICE_KEY, CHOICE_DEACTIVATE);

        let outcome = gate.run(&mut ui);
        assert!(matches!(outcome, GateOutcome::Unsubscribed { .. }));
        assert_eq!(launches.load(Ordering::SeqCst), 1);
        assert!(ui.has_message("apply the pending changes"));
    }

    #[cfg(unix)]
    #[test]
    fn read_only_store_still_hands_off_with_instructions() {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        seed_catalog(temp.path(), true);
        let (gate, launches) = gate(config(temp.path(), 21, "1.8.0_392"), false);
        let mut ui = MockUI::new();
        ui.set_prompt_response(CHOICE_KEY, CHOICE_DEACTIVATE);

        fs::set_permissions(temp.path(), fs::Permissions::from_mode(0o555)).unwrap();
        let outcome = gate.run(&mut ui);
        fs::set_permissions(temp.path(), fs::Permissions::from_mode(0o755)).unwrap();

        match outcome {
            GateOutcome::Unsubscribed { negotiation, .. } => {
                assert!(matches!(
                    negotiation,
                    NegotiationOutcome::AppliedNotPersisted { .. }
                ))
            }
            other => panic!("expected Unsubscribed, got {other:?}"),
        }
        assert!(ui.has_warning("could not be saved"));
        assert_eq!(launches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn warning_includes_configured_links() {
        let temp = TempDir::new().unwrap();
        seed_catalog(temp.path(), true);
        let mut cfg = config(temp.path(), 21, "1.8.0_392");
        cfg.links.release_notes = Some("https://example.org/releases".to_string());
        cfg.links.downloads = Some("https://example.org/download".to_string());
        let (gate, _) = gate(cfg, false);
        let mut ui = MockUI::new();
        ui.set_prompt_response(CHOICE_KEY, CHOICE_REMIND);

        gate.run(&mut ui);
        assert!(ui.has_message("https://example.org/releases"));
        assert!(ui.has_message("https://example.org/download"));
    }
}
