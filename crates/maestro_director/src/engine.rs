//! The director round state machine.
//!
//! One round is wait -> generate -> (review) -> send. The engine owns the
//! round state, sequences the collaborators, and guarantees at most one
//! in-flight generation across overlapping triggers.

use crate::{
    AssemblyContext, ConversationStore, DirectorSettings, GuidanceReviewer, PresetLibrary,
    ReadinessProbe, RoundState, SettingsStore, TextFilterChain, TurnInjector, assemble,
};
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use maestro_core::GenerateRequest;
use maestro_error::{ConfigError, ErrorCategory, MaestroResult};
use maestro_interface::GuidanceDriver;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Summary of a finished or stopped run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct StopReport {
    /// Rounds that actually ran
    rounds_completed: u32,
    /// Rounds that were configured
    total_rounds: u32,
    /// Whether every configured round ran
    completed: bool,
    /// When the run ended
    ended_at: DateTime<Utc>,
}

/// What one trigger did.
#[derive(Debug, Clone, PartialEq)]
pub enum RoundOutcome {
    /// Guidance was injected into the conversation
    Injected,
    /// The engine is idle; the trigger was a no-op
    NotRunning,
    /// A generation is already in flight; the trigger was a no-op
    AlreadyGenerating,
    /// The vendor returned empty text; nothing was sent, the run continues
    EmptyResponse,
    /// The reviewer skipped this round; nothing was sent, the round counted
    SkippedByReview,
    /// The generation was cancelled mid-flight (superseded or timed out);
    /// not a failure, the run stays up
    Aborted,
    /// The run was stopped before this round could send
    Stopped(StopReport),
    /// The configured rounds are exhausted; the run is over
    Completed(StopReport),
}

/// Cloneable handle for requesting a stop from outside the engine's owner.
///
/// Stop requests land at the engine's checkpoints: before the network call
/// and before the final send.
#[derive(Debug, Clone)]
pub struct StopHandle {
    token: CancellationToken,
}

impl StopHandle {
    /// Request a stop. Cancels any in-flight generation.
    pub fn stop(&self) {
        self.token.cancel();
    }
}

/// The round-based director engine.
///
/// Owns the [`RoundState`] singleton; all mutation happens inside its
/// transition methods. Collaborators are attached with `with_*` builders.
pub struct DirectorEngine {
    settings: DirectorSettings,
    presets: PresetLibrary,
    driver: Arc<dyn GuidanceDriver>,
    conversation: Arc<dyn ConversationStore>,
    injector: Arc<dyn TurnInjector>,
    readiness: Option<Arc<dyn ReadinessProbe>>,
    reviewer: Option<Arc<dyn GuidanceReviewer>>,
    store: Option<Arc<dyn SettingsStore>>,
    state: RoundState,
    stop_token: CancellationToken,
    round_cancel: CancellationToken,
}

impl DirectorEngine {
    /// Create an engine.
    ///
    /// Whatever round state the settings carried is normalized back to idle:
    /// a running session never silently resumes after a restart.
    pub fn new(
        settings: DirectorSettings,
        presets: PresetLibrary,
        driver: Arc<dyn GuidanceDriver>,
        conversation: Arc<dyn ConversationStore>,
        injector: Arc<dyn TurnInjector>,
    ) -> Self {
        let state = settings.round().clone().normalized();
        let stop_token = CancellationToken::new();
        let round_cancel = stop_token.child_token();
        Self {
            settings,
            presets,
            driver,
            conversation,
            injector,
            readiness: None,
            reviewer: None,
            store: None,
            state,
            stop_token,
            round_cancel,
        }
    }

    /// Attach an external-readiness probe.
    pub fn with_readiness(mut self, probe: Arc<dyn ReadinessProbe>) -> Self {
        self.readiness = Some(probe);
        self
    }

    /// Attach a human-review collaborator.
    pub fn with_reviewer(mut self, reviewer: Arc<dyn GuidanceReviewer>) -> Self {
        self.reviewer = Some(reviewer);
        self
    }

    /// Attach a settings store for progress persistence.
    pub fn with_settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Current round state.
    pub fn state(&self) -> &RoundState {
        &self.state
    }

    /// Current settings.
    pub fn settings(&self) -> &DirectorSettings {
        &self.settings
    }

    /// Mutable settings access (between runs).
    pub fn settings_mut(&mut self) -> &mut DirectorSettings {
        &mut self.settings
    }

    /// The preset library.
    pub fn presets(&self) -> &PresetLibrary {
        &self.presets
    }

    /// Mutable preset library access.
    pub fn presets_mut(&mut self) -> &mut PresetLibrary {
        &mut self.presets
    }

    /// A handle that can request a stop from another task.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            token: self.stop_token.clone(),
        }
    }

    /// Start preconditions, checked before any state change.
    fn check_preconditions(&self) -> Result<(), ConfigError> {
        if !self.settings.enabled() {
            return Err(ConfigError::new("director is not enabled"));
        }
        let preset = self
            .presets
            .current()
            .ok_or_else(|| ConfigError::new("no preset is selected"))?;
        if preset.has_blank_system_prompt() {
            return Err(ConfigError::new(format!(
                "preset '{}' has an empty system prompt",
                preset.name()
            )));
        }
        // Endpoint/model/credential requirements per transport.
        self.settings.client().validate()?;
        Ok(())
    }

    /// Start a run and fire round 1 immediately.
    ///
    /// # Errors
    ///
    /// Any unmet precondition aborts the start with a configuration error
    /// and no state change.
    #[instrument(skip(self), fields(total_rounds = self.settings.total_rounds()))]
    pub async fn start(&mut self) -> MaestroResult<RoundOutcome> {
        self.check_preconditions()?;

        self.stop_token = CancellationToken::new();
        self.round_cancel = self.stop_token.child_token();
        self.state = RoundState {
            enabled: true,
            running: true,
            current_round: 0,
            total_rounds: *self.settings.total_rounds(),
            is_generating: false,
        };
        self.persist().await;
        info!(
            total_rounds = self.state.total_rounds,
            "Director run starting"
        );

        self.on_turn_completed().await
    }

    /// External trigger: the upstream turn completed. Runs one round.
    #[instrument(skip(self), fields(round = self.state.current_round + 1, total = self.state.total_rounds))]
    pub async fn on_turn_completed(&mut self) -> MaestroResult<RoundOutcome> {
        // Guards: idle, busy, or exhausted.
        if !self.state.running {
            debug!("Trigger ignored; director is idle");
            return Ok(RoundOutcome::NotRunning);
        }
        if self.state.is_generating {
            debug!("Trigger ignored; a generation is already in flight");
            return Ok(RoundOutcome::AlreadyGenerating);
        }
        if self.state.rounds_exhausted() {
            let report = self.finish_run(true).await;
            return Ok(RoundOutcome::Completed(report));
        }

        // Supersede any previous in-flight generation.
        self.round_cancel.cancel();
        let cancel = self.stop_token.child_token();
        self.round_cancel = cancel.clone();

        self.state.current_round += 1;
        self.persist().await;
        info!(
            round = self.state.current_round,
            total = self.state.total_rounds,
            "Director round starting"
        );

        // Optional external-readiness wait; absence or timeout just proceeds.
        if let (Some(probe), Some(config)) = (&self.readiness, self.settings.readiness()) {
            if probe.wait_started(*config.start_timeout()).await {
                if !probe.wait_finished(*config.finish_timeout()).await {
                    debug!("Readiness indicator did not finish in time; proceeding");
                }
            } else {
                debug!("Readiness indicator never started; proceeding");
            }
        }

        // The run may have been stopped during the wait.
        if self.stop_token.is_cancelled() || !self.state.running {
            return Ok(RoundOutcome::Stopped(self.finish_run(false).await));
        }

        // Generate under the round token. The flag is set before the only
        // suspension point into the network and cleared on every exit path.
        self.state.is_generating = true;
        let result = self.generate_guidance(&cancel).await;
        self.state.is_generating = false;

        let text = match result {
            Ok(text) => text,
            Err(e) if e.is_aborted() => {
                if self.stop_token.is_cancelled() {
                    debug!("Generation aborted by stop request");
                    return Ok(RoundOutcome::Stopped(self.finish_run(false).await));
                }
                debug!(error = %e, "Generation aborted; exiting the round quietly");
                return Ok(RoundOutcome::Aborted);
            }
            Err(e) => {
                let category = ErrorCategory::from_error(&e);
                error!(category = %category, error = %e, "Round failed; stopping director");
                self.finish_run(false).await;
                return Err(e);
            }
        };

        if text.trim().is_empty() {
            warn!("Vendor returned empty guidance; nothing to inject");
            if self.state.rounds_exhausted() {
                return Ok(RoundOutcome::Completed(self.finish_run(true).await));
            }
            return Ok(RoundOutcome::EmptyResponse);
        }

        // Outline prepend while the outgoing window is open.
        let mut outgoing = text;
        if self
            .settings
            .outgoing_outline()
            .allows(self.state.current_round)
            && !self.settings.outline().trim().is_empty()
        {
            outgoing = format!("{}\n\n{}", self.settings.outline(), outgoing);
        }

        // Optional human review; a skip consumes the round without sending.
        if *self.settings.review_enabled() {
            if let Some(reviewer) = &self.reviewer {
                match reviewer.confirm(&outgoing).await {
                    Ok(Some(edited)) => outgoing = edited,
                    Ok(None) => {
                        info!(round = self.state.current_round, "Review skipped this round");
                        if self.state.rounds_exhausted() {
                            return Ok(RoundOutcome::Completed(self.finish_run(true).await));
                        }
                        return Ok(RoundOutcome::SkippedByReview);
                    }
                    Err(e) => {
                        error!(error = %e, "Review collaborator failed; stopping director");
                        self.finish_run(false).await;
                        return Err(e);
                    }
                }
            }
        }

        // The run may have been stopped during review.
        if self.stop_token.is_cancelled() || !self.state.running {
            return Ok(RoundOutcome::Stopped(self.finish_run(false).await));
        }

        // Hand off to the host; fire-and-forget with respect to the
        // upstream's own reply.
        if let Err(e) = self.injector.inject_user_turn_and_generate(&outgoing).await {
            error!(error = %e, "Turn injection failed; stopping director");
            self.finish_run(false).await;
            return Err(e);
        }
        info!(round = self.state.current_round, "Injected director guidance");

        // Stop fully after the last round, before any further trigger could
        // re-enter the loop.
        if self.state.rounds_exhausted() {
            return Ok(RoundOutcome::Completed(self.finish_run(true).await));
        }

        Ok(RoundOutcome::Injected)
    }

    /// Stop the run. Idempotent; stopping an idle engine is a quiet no-op.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> Option<StopReport> {
        if !self.state.running {
            debug!("Stop requested but director is already idle");
            return None;
        }
        self.stop_token.cancel();
        Some(self.finish_run(false).await)
    }

    /// Transition to idle and report how the run ended.
    async fn finish_run(&mut self, completed: bool) -> StopReport {
        self.state.running = false;
        self.state.is_generating = false;
        self.persist().await;
        let report = StopReport {
            rounds_completed: self.state.current_round,
            total_rounds: self.state.total_rounds,
            completed,
            ended_at: Utc::now(),
        };
        info!(
            rounds_completed = report.rounds_completed,
            total_rounds = report.total_rounds,
            completed,
            "Director run ended"
        );
        report
    }

    /// Assemble, filter, and call the vendor for one round's guidance.
    async fn generate_guidance(&self, cancel: &CancellationToken) -> MaestroResult<String> {
        let preset = self
            .presets
            .current()
            .ok_or_else(|| ConfigError::new("no preset is selected"))?;

        let turns = self
            .conversation
            .recent_turns(*self.settings.history_window())
            .await?;

        let context = AssemblyContext {
            turns: &turns,
            outline: Some(self.settings.outline().as_str()),
            prompt_outline: *self.settings.prompt_outline(),
            history_window: *self.settings.history_window(),
            current_round: self.state.current_round,
        };
        let messages = assemble(preset, &context);
        let messages = TextFilterChain::new(self.settings.filters().clone()).apply(&messages);

        let request = GenerateRequest::new(messages);
        let response = self.driver.generate(&request, cancel).await?;
        Ok(response.text().clone())
    }

    /// Persist the settings with the current round snapshot.
    ///
    /// Persistence hiccups are logged, not fatal; losing a progress write
    /// must not kill a healthy round.
    async fn persist(&mut self) {
        self.settings.set_round(self.state.clone());
        if let Some(store) = &self.store {
            if let Err(e) = store.save(&self.settings).await {
                warn!(error = %e, "Failed to persist director settings");
            }
        }
    }
}
