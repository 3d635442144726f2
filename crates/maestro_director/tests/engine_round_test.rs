//! Round state machine tests driven through mock collaborators.

use async_trait::async_trait;
use maestro_core::{GenerateRequest, GenerateResponse, Turn};
use maestro_director::{
    DirectorEngine, DirectorSettings, GuidanceReviewer, InMemoryConversation, OutlinePolicy,
    Preset, PresetLibrary, ReadinessConfig, ReadinessProbe, RoundOutcome, SettingsStore,
    TurnInjector,
};
use maestro_error::{AbortReason, ClientError, ClientErrorKind, MaestroResult};
use maestro_interface::GuidanceDriver;
use maestro_models::{ClientConfig, Transport, Vendor};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// One scripted driver reply.
enum Reply {
    Text(&'static str),
    ApiError(u16),
    /// Resolve as a ceiling-timeout abort.
    Timeout,
    /// Park until the round token fires, then resolve aborted.
    Hang,
}

struct ScriptedDriver {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<u32>,
}

impl ScriptedDriver {
    fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(0),
        })
    }

    fn calls(&self) -> u32 {
        *self.calls.lock().expect("lock")
    }
}

#[async_trait]
impl GuidanceDriver for ScriptedDriver {
    async fn generate(
        &self,
        _req: &GenerateRequest,
        cancel: &CancellationToken,
    ) -> MaestroResult<GenerateResponse> {
        *self.calls.lock().expect("lock") += 1;
        let reply = self.replies.lock().expect("lock").pop_front();
        match reply {
            None => Ok(GenerateResponse::new("Keep the pressure on.")),
            Some(Reply::Text(text)) => Ok(GenerateResponse::new(text)),
            Some(Reply::ApiError(status)) => Err(ClientError::new(ClientErrorKind::Api {
                status,
                body: "scripted failure".to_string(),
            })
            .into()),
            Some(Reply::Timeout) => Err(ClientError::new(ClientErrorKind::Aborted(
                AbortReason::DeadlineElapsed,
            ))
            .into()),
            Some(Reply::Hang) => {
                cancel.cancelled().await;
                Err(
                    ClientError::new(ClientErrorKind::Aborted(AbortReason::Superseded))
                        .into(),
                )
            }
        }
    }

    fn vendor_name(&self) -> &'static str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "test-model"
    }
}

fn conversation() -> Arc<InMemoryConversation> {
    Arc::new(InMemoryConversation::with_turns(vec![
        Turn::new("Alice", true, false, "We should leave."),
        Turn::new("Marlowe", false, false, "Not before midnight."),
    ]))
}

struct RecordingInjector {
    injected: Mutex<Vec<String>>,
}

impl RecordingInjector {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            injected: Mutex::new(Vec::new()),
        })
    }

    fn injected(&self) -> Vec<String> {
        self.injected.lock().expect("lock").clone()
    }
}

#[async_trait]
impl TurnInjector for RecordingInjector {
    async fn inject_user_turn_and_generate(&self, text: &str) -> MaestroResult<()> {
        self.injected.lock().expect("lock").push(text.to_string());
        Ok(())
    }
}

struct SkipReviewer;

#[async_trait]
impl GuidanceReviewer for SkipReviewer {
    async fn confirm(&self, _draft: &str) -> MaestroResult<Option<String>> {
        Ok(None)
    }
}

struct EditReviewer;

#[async_trait]
impl GuidanceReviewer for EditReviewer {
    async fn confirm(&self, draft: &str) -> MaestroResult<Option<String>> {
        Ok(Some(format!("EDITED: {draft}")))
    }
}

struct MemoryStore {
    saved: Mutex<Vec<DirectorSettings>>,
}

impl MemoryStore {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            saved: Mutex::new(Vec::new()),
        })
    }

    fn last(&self) -> Option<DirectorSettings> {
        self.saved.lock().expect("lock").last().cloned()
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn load(&self) -> MaestroResult<Option<DirectorSettings>> {
        Ok(self.last())
    }

    async fn save(&self, settings: &DirectorSettings) -> MaestroResult<()> {
        self.saved.lock().expect("lock").push(settings.clone());
        Ok(())
    }
}

fn test_settings() -> DirectorSettings {
    let client = ClientConfig::new(Transport::Proxy, Vendor::OpenAiCompatible, "test-model")
        .with_proxy_url("http://localhost:1/proxy");
    DirectorSettings::new(client)
        .with_enabled(true)
        .with_total_rounds(3)
        .with_history_window(10)
}

fn test_presets() -> PresetLibrary {
    let mut presets = PresetLibrary::new();
    presets.insert(Preset::standard(
        "noir",
        "You are the director of a noir drama.",
        "Give one paragraph of narrative direction.",
    ));
    presets.select("noir").expect("preset exists");
    presets
}

fn engine_with(
    settings: DirectorSettings,
    driver: Arc<ScriptedDriver>,
    injector: Arc<RecordingInjector>,
) -> DirectorEngine {
    DirectorEngine::new(
        settings,
        test_presets(),
        driver,
        conversation(),
        injector,
    )
}

#[tokio::test]
async fn three_round_run_fires_on_start_then_on_triggers() {
    let driver = ScriptedDriver::new(vec![]);
    let injector = RecordingInjector::new();
    let mut engine = engine_with(test_settings(), Arc::clone(&driver), Arc::clone(&injector));

    // Round 1 fires on start.
    assert_eq!(engine.start().await.expect("start"), RoundOutcome::Injected);
    assert_eq!(injector.injected().len(), 1);
    assert_eq!(*engine.state().current_round(), 1);

    // Rounds 2 and 3 fire only on external triggers.
    assert_eq!(
        engine.on_turn_completed().await.expect("round 2"),
        RoundOutcome::Injected
    );
    let outcome = engine.on_turn_completed().await.expect("round 3");
    let RoundOutcome::Completed(report) = outcome else {
        panic!("expected completion, got {outcome:?}");
    };
    assert_eq!(*report.rounds_completed(), 3);
    assert!(report.completed());
    assert_eq!(injector.injected().len(), 3);

    // A further trigger is a no-op on an idle engine.
    assert_eq!(
        engine.on_turn_completed().await.expect("idle"),
        RoundOutcome::NotRunning
    );
    assert_eq!(*engine.state().current_round(), 3);
    assert!(!engine.state().running());
}

#[tokio::test]
async fn start_preconditions_abort_without_state_change() {
    let driver = ScriptedDriver::new(vec![]);
    let injector = RecordingInjector::new();

    // Not enabled.
    let mut engine = engine_with(
        test_settings().with_enabled(false),
        Arc::clone(&driver),
        Arc::clone(&injector),
    );
    assert!(engine.start().await.is_err());
    assert!(!engine.state().running());

    // Blank system prompt.
    let mut presets = PresetLibrary::new();
    presets.insert(Preset::standard("hollow", "   ", "Direct."));
    presets.select("hollow").expect("preset exists");
    let mut engine = DirectorEngine::new(
        test_settings(),
        presets,
        Arc::clone(&driver) as Arc<dyn GuidanceDriver>,
        conversation(),
        Arc::clone(&injector) as Arc<dyn TurnInjector>,
    );
    assert!(engine.start().await.is_err());
    assert!(!engine.state().running());

    // Direct transport without an endpoint.
    let client = ClientConfig::new(Transport::Direct, Vendor::Claude, "claude-sonnet-4-20250514");
    let mut engine = engine_with(
        DirectorSettings::new(client).with_enabled(true),
        Arc::clone(&driver),
        Arc::clone(&injector),
    );
    assert!(engine.start().await.is_err());
    assert!(!engine.state().running());

    assert_eq!(driver.calls(), 0);
    assert!(injector.injected().is_empty());
}

#[tokio::test]
async fn empty_response_skips_injection_but_keeps_running() {
    let driver = ScriptedDriver::new(vec![Reply::Text("   "), Reply::Text("Now the storm.")]);
    let injector = RecordingInjector::new();
    let mut engine = engine_with(test_settings(), Arc::clone(&driver), Arc::clone(&injector));

    assert_eq!(
        engine.start().await.expect("start"),
        RoundOutcome::EmptyResponse
    );
    assert!(injector.injected().is_empty());
    assert_eq!(*engine.state().current_round(), 1);
    assert!(engine.state().running());
    assert!(!engine.state().is_generating());

    assert_eq!(
        engine.on_turn_completed().await.expect("round 2"),
        RoundOutcome::Injected
    );
    assert_eq!(injector.injected(), vec!["Now the storm.".to_string()]);
}

#[tokio::test]
async fn review_skip_consumes_the_round_without_sending() {
    let driver = ScriptedDriver::new(vec![]);
    let injector = RecordingInjector::new();
    let mut engine = engine_with(
        test_settings().with_review(true),
        Arc::clone(&driver),
        Arc::clone(&injector),
    )
    .with_reviewer(Arc::new(SkipReviewer));

    assert_eq!(
        engine.start().await.expect("start"),
        RoundOutcome::SkippedByReview
    );
    assert!(injector.injected().is_empty());
    assert_eq!(*engine.state().current_round(), 1);
    assert!(engine.state().running());
}

#[tokio::test]
async fn review_edit_replaces_the_draft() {
    let driver = ScriptedDriver::new(vec![Reply::Text("Raise the stakes.")]);
    let injector = RecordingInjector::new();
    let mut engine = engine_with(
        test_settings().with_review(true),
        Arc::clone(&driver),
        Arc::clone(&injector),
    )
    .with_reviewer(Arc::new(EditReviewer));

    engine.start().await.expect("start");
    assert_eq!(
        injector.injected(),
        vec!["EDITED: Raise the stakes.".to_string()]
    );
}

#[tokio::test]
async fn vendor_error_stops_the_whole_run() {
    let driver = ScriptedDriver::new(vec![Reply::ApiError(500)]);
    let injector = RecordingInjector::new();
    let mut engine = engine_with(test_settings(), Arc::clone(&driver), Arc::clone(&injector));

    assert!(engine.start().await.is_err());
    assert!(!engine.state().running());
    assert!(!engine.state().is_generating());
    assert!(injector.injected().is_empty());

    // No automatic retry; the next trigger is a no-op.
    assert_eq!(
        engine.on_turn_completed().await.expect("idle"),
        RoundOutcome::NotRunning
    );
    assert_eq!(driver.calls(), 1);
}

#[tokio::test]
async fn outline_prepends_while_outgoing_window_is_open() {
    let driver = ScriptedDriver::new(vec![Reply::Text("First beat."), Reply::Text("Second beat.")]);
    let injector = RecordingInjector::new();
    let settings = test_settings()
        .with_outline("Reach the docks by dawn.")
        .with_outgoing_outline(OutlinePolicy::UntilRound(2));
    let mut engine = engine_with(settings, Arc::clone(&driver), Arc::clone(&injector));

    engine.start().await.expect("round 1");
    engine.on_turn_completed().await.expect("round 2");

    let injected = injector.injected();
    assert!(injected[0].starts_with("Reach the docks by dawn.\n\nFirst beat."));
    assert_eq!(injected[1], "Second beat.");
}

/// A probe whose indicator never starts.
struct SilentProbe;

#[async_trait]
impl ReadinessProbe for SilentProbe {
    async fn wait_started(&self, _timeout: std::time::Duration) -> bool {
        false
    }

    async fn wait_finished(&self, _timeout: std::time::Duration) -> bool {
        false
    }
}

#[tokio::test]
async fn absent_readiness_indicator_is_non_fatal() {
    let driver = ScriptedDriver::new(vec![]);
    let injector = RecordingInjector::new();
    let settings = test_settings().with_readiness(ReadinessConfig::new(
        std::time::Duration::from_millis(10),
        std::time::Duration::from_millis(10),
    ));
    let mut engine = engine_with(settings, Arc::clone(&driver), Arc::clone(&injector))
        .with_readiness(Arc::new(SilentProbe));

    // The indicator never starting just proceeds into generation.
    assert_eq!(engine.start().await.expect("start"), RoundOutcome::Injected);
    assert_eq!(injector.injected().len(), 1);
}

#[tokio::test]
async fn timeout_abort_exits_quietly_and_keeps_the_run_alive() {
    let driver = ScriptedDriver::new(vec![Reply::Timeout, Reply::Text("Recovered.")]);
    let injector = RecordingInjector::new();
    let mut engine = engine_with(test_settings(), Arc::clone(&driver), Arc::clone(&injector));

    assert_eq!(engine.start().await.expect("start"), RoundOutcome::Aborted);
    assert!(engine.state().running());
    assert!(!engine.state().is_generating());
    assert!(injector.injected().is_empty());

    assert_eq!(
        engine.on_turn_completed().await.expect("next round"),
        RoundOutcome::Injected
    );
    assert_eq!(injector.injected(), vec!["Recovered.".to_string()]);
}

#[tokio::test]
async fn stop_reports_progress_and_is_idempotent() {
    let driver = ScriptedDriver::new(vec![]);
    let injector = RecordingInjector::new();
    let mut engine = engine_with(test_settings(), Arc::clone(&driver), Arc::clone(&injector));

    engine.start().await.expect("start");
    let report = engine.stop().await.expect("first stop reports");
    assert_eq!(*report.rounds_completed(), 1);
    assert_eq!(*report.total_rounds(), 3);
    assert!(!report.completed());

    // Stopping an already-stopped engine is a quiet no-op.
    assert!(engine.stop().await.is_none());
}

#[tokio::test]
async fn stop_handle_cancels_an_in_flight_generation() {
    let driver = ScriptedDriver::new(vec![Reply::Hang]);
    let injector = RecordingInjector::new();
    let mut engine = engine_with(test_settings(), Arc::clone(&driver), Arc::clone(&injector));
    let handle = engine.stop_handle();

    let run = tokio::spawn(async move {
        let outcome = engine.start().await;
        (engine, outcome)
    });

    // Give the round time to park inside the driver, then stop it.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    handle.stop();

    let (engine, outcome) = run.await.expect("task");
    match outcome.expect("stop is not an error") {
        RoundOutcome::Stopped(report) => {
            assert!(!report.completed());
        }
        other => panic!("expected Stopped, got {other:?}"),
    }
    assert!(!engine.state().running());
    assert!(!engine.state().is_generating());
    assert!(injector.injected().is_empty());
}

#[tokio::test]
async fn progress_is_persisted_through_the_store() {
    let driver = ScriptedDriver::new(vec![]);
    let injector = RecordingInjector::new();
    let store = MemoryStore::new();
    let mut engine = engine_with(test_settings(), Arc::clone(&driver), Arc::clone(&injector))
        .with_settings_store(Arc::clone(&store) as Arc<dyn SettingsStore>);

    engine.start().await.expect("round 1");
    engine.on_turn_completed().await.expect("round 2");
    engine.on_turn_completed().await.expect("round 3");

    let last = store.last().expect("snapshots saved");
    assert_eq!(*last.round().current_round(), 3);
    assert!(!last.round().running());
}

#[tokio::test]
async fn current_round_never_exceeds_total_rounds() {
    let driver = ScriptedDriver::new(vec![]);
    let injector = RecordingInjector::new();
    let mut engine = engine_with(
        test_settings().with_total_rounds(2),
        Arc::clone(&driver),
        Arc::clone(&injector),
    );

    engine.start().await.expect("round 1");
    engine.on_turn_completed().await.expect("round 2");
    for _ in 0..3 {
        engine.on_turn_completed().await.expect("idle");
        assert!(engine.state().current_round() <= engine.state().total_rounds());
    }
    assert_eq!(*engine.state().current_round(), 2);
}
