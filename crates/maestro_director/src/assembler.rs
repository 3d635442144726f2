//! Block assembly: preset + live state -> one normalized request payload.

use crate::{BlockKind, ChatHistoryMode, OutlinePolicy, Preset};
use maestro_core::{Message, Turn};
use tracing::debug;

/// Ambient state a render pass draws fixed block bodies from.
#[derive(Debug, Clone, Copy)]
pub struct AssemblyContext<'a> {
    /// Recent conversation turns, oldest first
    pub turns: &'a [Turn],
    /// Standing outline text, if any
    pub outline: Option<&'a str>,
    /// When the outline may join the prompt
    pub prompt_outline: OutlinePolicy,
    /// Chat-history window length
    pub history_window: usize,
    /// Current round number (1-based once a run starts)
    pub current_round: u32,
}

/// Render the preset's enabled blocks, in order, into a single `user`-role
/// message.
///
/// A single merged user turn sidesteps vendor role-ordering constraints
/// (first-message-must-be-user, no consecutive same-role turns) without
/// special-casing them here. Blank bodies are skipped; surviving bodies are
/// optionally wrapped in their block's tag and joined with blank lines.
///
/// An empty preset yields a message with empty content; the caller decides
/// whether a bare request is still worth sending (it is: a lone instruction
/// is a valid directive).
pub fn assemble(preset: &Preset, ctx: &AssemblyContext<'_>) -> Vec<Message> {
    let mut parts: Vec<String> = Vec::new();

    for block in preset.blocks() {
        if !block.enabled() {
            continue;
        }

        let body = match block.kind() {
            BlockKind::SystemPrompt => preset.system_prompt().clone(),
            BlockKind::PlotOutline => {
                if ctx.prompt_outline.allows(ctx.current_round) {
                    ctx.outline.unwrap_or_default().to_string()
                } else {
                    debug!(
                        round = ctx.current_round,
                        "Outline window closed; skipping outline block"
                    );
                    String::new()
                }
            }
            BlockKind::ChatHistory => {
                render_history(ctx.turns, ctx.history_window, preset.chat_history_mode())
            }
            BlockKind::Instruction | BlockKind::Custom => {
                block.content().clone().unwrap_or_default()
            }
        };

        if body.trim().is_empty() {
            continue;
        }

        let rendered = match block.wrap_tag().as_deref() {
            Some(tag) if !tag.is_empty() => wrap(tag, body.trim_end()),
            _ => body.trim_end().to_string(),
        };
        parts.push(rendered);
    }

    vec![Message::user(parts.join("\n\n"))]
}

/// Wrap a body in `<tag>\n{body}\n</tag>`.
fn wrap(tag: &str, body: &str) -> String {
    format!("<{tag}>\n{body}\n</{tag}>")
}

/// Render the most recent `window` turns, excluding system notices.
fn render_history(turns: &[Turn], window: usize, mode: &ChatHistoryMode) -> String {
    let visible: Vec<&Turn> = turns.iter().filter(|t| !t.is_system_notice()).collect();
    let start = visible.len().saturating_sub(window);

    visible[start..]
        .iter()
        .map(|turn| match mode {
            ChatHistoryMode::MergedText => format!("{}: {}", turn.author(), turn.text()),
            ChatHistoryMode::RoleTagged => {
                let role = if *turn.is_user_authored() {
                    "user"
                } else {
                    "assistant"
                };
                format!("[{}] {}: {}", role, turn.author(), turn.text())
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
