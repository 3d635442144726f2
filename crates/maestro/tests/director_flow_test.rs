//! End-to-end flow through the facade: preset -> assembly -> filters ->
//! driver -> injection, driven by the round engine.

use async_trait::async_trait;
use maestro::{
    ClientConfig, ConversationStore, DirectorEngine, DirectorSettings, FilterRule,
    GenerateRequest, GenerateResponse, GuidanceDriver, MaestroResult, OutlinePolicy, Preset,
    PresetLibrary, Role, RoundOutcome, Transport, Turn, TurnInjector, Vendor,
};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// Records every request and answers with a canned line.
struct RecordingDriver {
    requests: Mutex<Vec<GenerateRequest>>,
}

impl RecordingDriver {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().expect("lock").clone()
    }
}

#[async_trait]
impl GuidanceDriver for RecordingDriver {
    async fn generate(
        &self,
        req: &GenerateRequest,
        _cancel: &CancellationToken,
    ) -> MaestroResult<GenerateResponse> {
        self.requests.lock().expect("lock").push(req.clone());
        Ok(GenerateResponse::new("Tighten the pacing and cut to the chase."))
    }

    fn vendor_name(&self) -> &'static str {
        "recording"
    }

    fn model_name(&self) -> &str {
        "test-model"
    }
}

struct FixedConversation;

#[async_trait]
impl ConversationStore for FixedConversation {
    async fn recent_turns(&self, _limit: usize) -> MaestroResult<Vec<Turn>> {
        Ok(vec![
            Turn::new("Alice", true, false, "We should leave."),
            Turn::new("System", false, true, "Connection restored."),
            Turn::new("Marlowe", false, false, "Not before midnight."),
        ])
    }

    async fn append(&self, _turn: Turn) -> MaestroResult<()> {
        Ok(())
    }
}

struct CapturingInjector {
    injected: Mutex<Vec<String>>,
}

impl CapturingInjector {
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
impl TurnInjector for CapturingInjector {
    async fn inject_user_turn_and_generate(&self, text: &str) -> MaestroResult<()> {
        self.injected.lock().expect("lock").push(text.to_string());
        Ok(())
    }
}

#[tokio::test]
async fn one_round_carries_blocks_and_filters_end_to_end() {
    let driver = RecordingDriver::new();
    let injector = CapturingInjector::new();

    let client = ClientConfig::new(Transport::Proxy, Vendor::OpenAiCompatible, "test-model")
        .with_proxy_url("http://localhost:1/proxy");
    let settings = DirectorSettings::new(client)
        .with_enabled(true)
        .with_total_rounds(1)
        .with_history_window(10)
        .with_outline("Reach the docks by dawn.")
        .with_prompt_outline(OutlinePolicy::Always)
        .with_filters(vec![FilterRule::new("midnight", "gi", "the last ferry", "soften times")]);

    let mut presets = PresetLibrary::new();
    presets.insert(Preset::standard(
        "noir",
        "You are the director of a noir radio drama.",
        "Give one paragraph of narrative direction.",
    ));
    presets.select("noir").expect("preset exists");

    let mut engine = DirectorEngine::new(
        settings,
        presets,
        Arc::clone(&driver) as Arc<dyn GuidanceDriver>,
        Arc::new(FixedConversation),
        Arc::clone(&injector) as Arc<dyn TurnInjector>,
    );

    let outcome = engine.start().await.expect("run");
    assert!(matches!(outcome, RoundOutcome::Completed(_)));

    // The driver saw one merged user message with the preset's blocks in order.
    let requests = driver.requests();
    assert_eq!(requests.len(), 1);
    let messages = requests[0].messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(*messages[0].role(), Role::User);
    let prompt = messages[0].content();
    assert!(prompt.contains("You are the director of a noir radio drama."));
    assert!(prompt.contains("<outline>\nReach the docks by dawn.\n</outline>"));
    assert!(prompt.contains("Alice: We should leave."));
    assert!(!prompt.contains("Connection restored."));
    assert!(prompt.contains("Give one paragraph of narrative direction."));

    // The filter chain rewrote the assembled prompt before transmission.
    assert!(prompt.contains("Marlowe: Not before the last ferry."));
    assert!(!prompt.contains("midnight"));

    // The vendor reply is injected as-is.
    assert_eq!(
        injector.injected(),
        vec!["Tighten the pacing and cut to the chase.".to_string()]
    );
    assert!(!engine.state().running());
}
