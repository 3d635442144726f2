//! Persisted director configuration and its JSON-file store.

use crate::{FilterRule, RoundState};
use derive_getters::Getters;
use maestro_error::{DirectorError, DirectorErrorKind, MaestroResult};
use maestro_models::ClientConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// When outline text may be injected, keyed off the current round number.
///
/// The prompt-injection window and the outgoing-text window are configured
/// independently; they are not assumed to share a cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutlinePolicy {
    /// Inject unconditionally
    Always,
    /// Inject only while the current round is below the cutoff
    UntilRound(u32),
}

impl OutlinePolicy {
    /// Whether injection is allowed for the given round number.
    pub fn allows(&self, round: u32) -> bool {
        match self {
            Self::Always => true,
            Self::UntilRound(cutoff) => round < *cutoff,
        }
    }
}

/// Timeouts for the optional external-readiness wait.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Getters, derive_new::new)]
pub struct ReadinessConfig {
    /// How long to wait for the indicator to start
    start_timeout: Duration,
    /// How long to wait for the indicator to finish
    finish_timeout: Duration,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            start_timeout: Duration::from_secs(4),
            finish_timeout: Duration::from_secs(90),
        }
    }
}

/// The full persisted configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct DirectorSettings {
    /// Whether directing is enabled
    enabled: bool,
    /// Rounds per run
    total_rounds: u32,
    /// How many recent turns the chat-history block renders
    history_window: usize,
    /// Standing narrative target text
    outline: String,
    /// When the outline joins the LLM prompt
    prompt_outline: OutlinePolicy,
    /// When the outline is prepended to outgoing guidance
    outgoing_outline: OutlinePolicy,
    /// Whether drafts route through human review before sending
    review_enabled: bool,
    /// Optional external-readiness wait configuration
    readiness: Option<ReadinessConfig>,
    /// Vendor client configuration
    client: ClientConfig,
    /// Ordered post-processing filter rules
    filters: Vec<FilterRule>,
    /// Name of the selected preset, if any
    current_preset: Option<String>,
    /// Last persisted round state snapshot
    round: RoundState,
}

impl DirectorSettings {
    /// Create settings with defaults around a client configuration.
    pub fn new(client: ClientConfig) -> Self {
        Self {
            enabled: false,
            total_rounds: 4,
            history_window: 20,
            outline: String::new(),
            prompt_outline: OutlinePolicy::Always,
            outgoing_outline: OutlinePolicy::UntilRound(0),
            review_enabled: false,
            readiness: None,
            client,
            filters: Vec::new(),
            current_preset: None,
            round: RoundState::default(),
        }
    }

    /// Enable or disable directing.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the number of rounds per run.
    pub fn with_total_rounds(mut self, total_rounds: u32) -> Self {
        self.total_rounds = total_rounds;
        self
    }

    /// Set the chat-history window length.
    pub fn with_history_window(mut self, history_window: usize) -> Self {
        self.history_window = history_window;
        self
    }

    /// Set the outline text.
    pub fn with_outline(mut self, outline: impl Into<String>) -> Self {
        self.outline = outline.into();
        self
    }

    /// Set the prompt-injection outline window.
    pub fn with_prompt_outline(mut self, policy: OutlinePolicy) -> Self {
        self.prompt_outline = policy;
        self
    }

    /// Set the outgoing-text outline window.
    pub fn with_outgoing_outline(mut self, policy: OutlinePolicy) -> Self {
        self.outgoing_outline = policy;
        self
    }

    /// Route drafts through human review.
    pub fn with_review(mut self, review_enabled: bool) -> Self {
        self.review_enabled = review_enabled;
        self
    }

    /// Configure the external-readiness wait.
    pub fn with_readiness(mut self, readiness: ReadinessConfig) -> Self {
        self.readiness = Some(readiness);
        self
    }

    /// Set the post-processing filter rules.
    pub fn with_filters(mut self, filters: Vec<FilterRule>) -> Self {
        self.filters = filters;
        self
    }

    /// Select a preset by name.
    pub fn with_current_preset(mut self, name: impl Into<String>) -> Self {
        self.current_preset = Some(name.into());
        self
    }

    /// Record a round state snapshot for persistence.
    pub(crate) fn set_round(&mut self, round: RoundState) {
        self.round = round;
    }
}

/// Abstract settings persistence.
///
/// Debounced writes on the host side are acceptable; the engine only
/// requires that the latest snapshot eventually lands.
#[async_trait::async_trait]
pub trait SettingsStore: Send + Sync {
    /// Load the persisted settings, if any exist.
    async fn load(&self) -> MaestroResult<Option<DirectorSettings>>;
    /// Persist the full settings structure.
    async fn save(&self, settings: &DirectorSettings) -> MaestroResult<()>;
}

/// JSON-file settings store.
#[derive(Debug, Clone, Getters)]
pub struct SettingsManager {
    /// Base directory for settings files
    settings_dir: PathBuf,
}

impl SettingsManager {
    /// Creates a new settings manager rooted at the given directory.
    pub fn new(settings_dir: impl AsRef<Path>) -> MaestroResult<Self> {
        let settings_dir = settings_dir.as_ref().to_path_buf();

        if !settings_dir.exists() {
            std::fs::create_dir_all(&settings_dir).map_err(|e| {
                DirectorError::new(DirectorErrorKind::SettingsSave(format!(
                    "Failed to create settings directory: {}",
                    e
                )))
            })?;
        }

        debug!(path = %settings_dir.display(), "Initialized settings manager");
        Ok(Self { settings_dir })
    }

    /// Creates a settings manager under the platform config directory.
    pub fn default_location() -> MaestroResult<Self> {
        let base = dirs::config_dir().ok_or_else(|| {
            DirectorError::new(DirectorErrorKind::SettingsLoad(
                "No platform config directory available".to_string(),
            ))
        })?;
        Self::new(base.join("maestro"))
    }

    fn settings_path(&self) -> PathBuf {
        self.settings_dir.join("director.json")
    }
}

#[async_trait::async_trait]
impl SettingsStore for SettingsManager {
    async fn load(&self) -> MaestroResult<Option<DirectorSettings>> {
        let path = self.settings_path();

        if !path.exists() {
            debug!("No existing settings file");
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path).map_err(|e| {
            DirectorError::new(DirectorErrorKind::SettingsLoad(format!(
                "Failed to read settings file: {}",
                e
            )))
        })?;

        let settings: DirectorSettings = serde_json::from_str(&contents).map_err(|e| {
            DirectorError::new(DirectorErrorKind::SettingsLoad(format!(
                "Failed to parse settings file: {}",
                e
            )))
        })?;

        debug!("Loaded settings");
        Ok(Some(settings))
    }

    async fn save(&self, settings: &DirectorSettings) -> MaestroResult<()> {
        let path = self.settings_path();

        let contents = serde_json::to_string_pretty(settings).map_err(|e| {
            DirectorError::new(DirectorErrorKind::SettingsSave(format!(
                "Failed to serialize settings: {}",
                e
            )))
        })?;

        std::fs::write(&path, contents).map_err(|e| {
            DirectorError::new(DirectorErrorKind::SettingsSave(format!(
                "Failed to write settings file: {}",
                e
            )))
        })?;

        debug!(path = %path.display(), "Saved settings");
        Ok(())
    }
}
