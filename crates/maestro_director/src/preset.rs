//! Presets: ordered, configurable units of the outbound prompt.

use derive_getters::Getters;
use maestro_core::Role;
use maestro_error::{DirectorError, DirectorErrorKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// What a block renders from.
///
/// The fixed kinds derive their body from live state; `Instruction` and
/// `Custom` carry author-supplied static text.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "kebab-case")]
pub enum BlockKind {
    /// The preset's system prompt
    #[display("system-prompt")]
    SystemPrompt,
    /// The running chat history window
    #[display("chat-history")]
    ChatHistory,
    /// The standing outline text, gated by the prompt-outline window
    #[display("plot-outline")]
    PlotOutline,
    /// Author-supplied directive text
    #[display("instruction")]
    Instruction,
    /// Arbitrary author-supplied text
    #[display("custom")]
    Custom,
}

/// How the chat-history block renders turns.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display, Default,
)]
#[serde(rename_all = "kebab-case")]
pub enum ChatHistoryMode {
    /// Flattened "Speaker: text" lines with no role metadata
    #[display("merged-text")]
    #[default]
    MergedText,
    /// Role-tagged lines
    #[display("role-tagged")]
    RoleTagged,
}

fn default_enabled() -> bool {
    true
}

/// One configurable unit of the outbound prompt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Getters)]
pub struct ContentBlock {
    /// Stable identifier within the preset
    id: String,
    /// What the block renders from
    kind: BlockKind,
    /// Role the block contributes under
    role: Role,
    /// Editor-facing label
    label: String,
    /// Whether the block participates in assembly
    #[serde(default = "default_enabled")]
    enabled: bool,
    /// Author-supplied text; `None` on fixed kinds means "derived from live state"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    /// Wrap the rendered body in `<tag>...</tag>` when non-empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    wrap_tag: Option<String>,
}

impl ContentBlock {
    /// Create an enabled block with no static content.
    pub fn new(
        id: impl Into<String>,
        kind: BlockKind,
        role: Role,
        label: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            role,
            label: label.into(),
            enabled: true,
            content: None,
            wrap_tag: None,
        }
    }

    /// Set the static content.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Set the wrap tag.
    pub fn with_wrap_tag(mut self, tag: impl Into<String>) -> Self {
        self.wrap_tag = Some(tag.into());
        self
    }

    /// Enable or disable the block.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Toggle participation in assembly.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Replace the static content.
    pub fn set_content(&mut self, content: Option<String>) {
        self.content = content;
    }
}

/// A named prompt layout: system prompt plus an ordered block sequence.
///
/// # Example TOML structure
///
/// ```toml
/// name = "noir"
/// system_prompt = "You are the director of a noir radio drama."
/// chat_history_mode = "merged-text"
///
/// [[blocks]]
/// id = "system"
/// kind = "system-prompt"
/// role = "system"
/// label = "System Prompt"
///
/// [[blocks]]
/// id = "history"
/// kind = "chat-history"
/// role = "user"
/// label = "Chat History"
/// wrap_tag = "chat_history"
///
/// [[blocks]]
/// id = "directive"
/// kind = "instruction"
/// role = "user"
/// label = "Directive"
/// content = "Give one paragraph of narrative direction."
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct Preset {
    /// Unique name
    name: String,
    /// System prompt text
    system_prompt: String,
    /// How the chat-history block renders turns
    #[serde(default)]
    chat_history_mode: ChatHistoryMode,
    /// Ordered block sequence; order is part of persisted state
    #[serde(default)]
    blocks: Vec<ContentBlock>,
}

impl Preset {
    /// Create an empty preset.
    pub fn new(name: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            system_prompt: system_prompt.into(),
            chat_history_mode: ChatHistoryMode::default(),
            blocks: Vec::new(),
        }
    }

    /// Create a preset with the canonical block order: system prompt,
    /// outline, chat history, instruction.
    pub fn standard(
        name: impl Into<String>,
        system_prompt: impl Into<String>,
        instruction: impl Into<String>,
    ) -> Self {
        let mut preset = Self::new(name, system_prompt);
        preset.blocks = vec![
            ContentBlock::new("system", BlockKind::SystemPrompt, Role::System, "System Prompt"),
            ContentBlock::new("outline", BlockKind::PlotOutline, Role::User, "Plot Outline")
                .with_wrap_tag("outline"),
            ContentBlock::new("history", BlockKind::ChatHistory, Role::User, "Chat History")
                .with_wrap_tag("chat_history"),
            ContentBlock::new("directive", BlockKind::Instruction, Role::User, "Directive")
                .with_content(instruction),
        ];
        preset
    }

    /// Set the chat-history rendering mode.
    pub fn with_chat_history_mode(mut self, mode: ChatHistoryMode) -> Self {
        self.chat_history_mode = mode;
        self
    }

    /// Set the block sequence.
    pub fn with_blocks(mut self, blocks: Vec<ContentBlock>) -> Self {
        self.blocks = blocks;
        self
    }

    /// Loads a preset from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML is invalid, or
    /// validation fails.
    #[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DirectorError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| DirectorError::new(DirectorErrorKind::FileRead(e.to_string())))?;
        content.parse()
    }

    /// Validates the preset structure.
    ///
    /// Ensures the name is non-empty and block identifiers are unique.
    /// An empty system prompt is allowed here; it only blocks a director
    /// start, not authoring.
    pub fn validate(&self) -> Result<(), DirectorError> {
        if self.name.trim().is_empty() {
            return Err(DirectorError::new(DirectorErrorKind::TomlParse(
                "preset name cannot be empty".to_string(),
            )));
        }

        let mut seen = std::collections::HashSet::new();
        for block in &self.blocks {
            if !seen.insert(block.id()) {
                return Err(DirectorError::new(DirectorErrorKind::TomlParse(format!(
                    "duplicate block id '{}'",
                    block.id()
                ))));
            }
        }

        Ok(())
    }

    /// True when the system prompt is empty or whitespace-only.
    pub fn has_blank_system_prompt(&self) -> bool {
        self.system_prompt.trim().is_empty()
    }

    /// Mutable access to a block by id.
    pub fn block_mut(&mut self, id: &str) -> Option<&mut ContentBlock> {
        self.blocks.iter_mut().find(|b| b.id() == id)
    }

    /// Move the block at `from` to position `to`, shifting the others.
    ///
    /// Out-of-range indices are a no-op; ordering is presentation-driven
    /// and the editor may race a deletion.
    pub fn move_block(&mut self, from: usize, to: usize) {
        if from >= self.blocks.len() || to >= self.blocks.len() {
            return;
        }
        let block = self.blocks.remove(from);
        self.blocks.insert(to, block);
    }

    /// Insert a block at the given position (clamped to the end).
    pub fn insert_block(&mut self, index: usize, block: ContentBlock) {
        let index = index.min(self.blocks.len());
        self.blocks.insert(index, block);
    }

    /// Remove a block by id, returning it when present.
    pub fn remove_block(&mut self, id: &str) -> Option<ContentBlock> {
        let index = self.blocks.iter().position(|b| b.id() == id)?;
        Some(self.blocks.remove(index))
    }
}

impl FromStr for Preset {
    type Err = DirectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let preset: Self = toml::from_str(s)
            .map_err(|e| DirectorError::new(DirectorErrorKind::TomlParse(e.to_string())))?;
        preset.validate()?;
        Ok(preset)
    }
}

/// Name-keyed preset collection with a current selection.
///
/// Deleting the selected preset falls back to an empty selection, which
/// disables directing until another preset is chosen.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PresetLibrary {
    presets: HashMap<String, Preset>,
    current: Option<String>,
}

impl PresetLibrary {
    /// Create an empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a preset, keyed by its name.
    pub fn insert(&mut self, preset: Preset) {
        debug!(name = %preset.name(), "Storing preset");
        self.presets.insert(preset.name().clone(), preset);
    }

    /// Remove a preset by name. Clears the selection when it pointed here.
    pub fn remove(&mut self, name: &str) -> Option<Preset> {
        if self.current.as_deref() == Some(name) {
            debug!(name = %name, "Removing selected preset; selection falls back to empty");
            self.current = None;
        }
        self.presets.remove(name)
    }

    /// Select a preset by name.
    ///
    /// # Errors
    ///
    /// Returns an error when no preset with that name exists.
    pub fn select(&mut self, name: &str) -> Result<(), DirectorError> {
        if !self.presets.contains_key(name) {
            return Err(DirectorError::new(DirectorErrorKind::UnknownPreset(
                name.to_string(),
            )));
        }
        self.current = Some(name.to_string());
        Ok(())
    }

    /// The currently selected preset, if any.
    pub fn current(&self) -> Option<&Preset> {
        self.current.as_deref().and_then(|name| self.presets.get(name))
    }

    /// The currently selected name, if any.
    pub fn current_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Mutable access to a preset by name.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Preset> {
        self.presets.get_mut(name)
    }

    /// Iterate preset names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.presets.keys().map(|s| s.as_str())
    }
}
