//! Ordered post-processing text filters.

use derive_getters::Getters;
use maestro_core::Message;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

fn default_enabled() -> bool {
    true
}

/// One pattern/replacement rule.
///
/// Rules are ordered; order determines application sequence. A rule whose
/// pattern fails to compile is skipped with a warning, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Getters, derive_new::new)]
pub struct FilterRule {
    /// The pattern text
    #[new(into)]
    pattern: String,
    /// Flag characters: `i`, `m`, `s` map to inline regex flags, `g` means
    /// replace every match instead of the first
    #[new(into)]
    flags: String,
    /// Replacement text; `$1`-style capture references apply
    #[new(into)]
    replacement: String,
    /// Whether the rule participates in the chain
    #[new(value = "true")]
    #[serde(default = "default_enabled")]
    enabled: bool,
    /// Editor-facing label
    #[new(into)]
    label: String,
}

impl FilterRule {
    /// Enable or disable the rule.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

struct CompiledRule {
    regex: Regex,
    replacement: String,
    global: bool,
}

fn compile(rule: &FilterRule) -> Option<CompiledRule> {
    let mut inline = String::new();
    for flag in ['i', 'm', 's'] {
        if rule.flags.contains(flag) {
            inline.push(flag);
        }
    }
    let pattern = if inline.is_empty() {
        rule.pattern.clone()
    } else {
        format!("(?{}){}", inline, rule.pattern)
    };

    match Regex::new(&pattern) {
        Ok(regex) => Some(CompiledRule {
            regex,
            replacement: rule.replacement.clone(),
            global: rule.flags.contains('g'),
        }),
        Err(e) => {
            warn!(label = %rule.label, error = %e, "Filter rule failed to compile; skipping");
            None
        }
    }
}

/// An ordered chain of filter rules applied across message contents.
///
/// Rules compose: each operates on the output of the previous, so a rule can
/// match text introduced or left behind by an earlier one.
#[derive(Debug, Clone, Default)]
pub struct TextFilterChain {
    rules: Vec<FilterRule>,
}

impl TextFilterChain {
    /// Create a chain over an ordered rule list.
    pub fn new(rules: Vec<FilterRule>) -> Self {
        Self { rules }
    }

    /// The configured rules.
    pub fn rules(&self) -> &[FilterRule] {
        &self.rules
    }

    /// Apply the chain to every message, in rule order.
    ///
    /// Compilation happens once per invocation. A message no rule touches is
    /// returned unchanged, so callers can detect no-ops by equality.
    pub fn apply(&self, messages: &[Message]) -> Vec<Message> {
        let compiled: Vec<CompiledRule> = self
            .rules
            .iter()
            .filter(|rule| *rule.enabled())
            .filter_map(compile)
            .collect();

        if compiled.is_empty() {
            return messages.to_vec();
        }

        messages
            .iter()
            .map(|message| {
                let mut text = message.content().clone();
                let mut changed = false;
                for rule in &compiled {
                    let replaced = if rule.global {
                        rule.regex.replace_all(&text, rule.replacement.as_str())
                    } else {
                        rule.regex.replace(&text, rule.replacement.as_str())
                    };
                    if let std::borrow::Cow::Owned(owned) = replaced {
                        text = owned;
                        changed = true;
                    }
                }
                if changed {
                    debug!("Filter chain rewrote a message");
                    message.with_content(text)
                } else {
                    message.clone()
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rules_apply_in_listed_order() {
        // Rule 2 matches text introduced by rule 1.
        let chain = TextFilterChain::new(vec![
            FilterRule::new("foo", "g", "bar", "first"),
            FilterRule::new("bar", "g", "baz", "second"),
        ]);
        let out = chain.apply(&[Message::user("foo and bar")]);
        assert_eq!(out[0].content(), "baz and baz");
    }

    #[test]
    fn bad_pattern_is_skipped_not_fatal() {
        let chain = TextFilterChain::new(vec![
            FilterRule::new("(unclosed", "g", "x", "broken"),
            FilterRule::new("fine", "g", "ok", "working"),
        ]);
        let out = chain.apply(&[Message::user("this is fine")]);
        assert_eq!(out[0].content(), "this is ok");
    }

    #[test]
    fn untouched_message_is_returned_unchanged() {
        let chain = TextFilterChain::new(vec![FilterRule::new("absent", "g", "x", "rule")]);
        let input = Message::user("nothing to match");
        let out = chain.apply(std::slice::from_ref(&input));
        assert_eq!(out[0], input);
    }

    #[test]
    fn disabled_rules_do_not_run() {
        let chain = TextFilterChain::new(vec![
            FilterRule::new("secret", "g", "[redacted]", "off").with_enabled(false),
        ]);
        let out = chain.apply(&[Message::user("a secret")]);
        assert_eq!(out[0].content(), "a secret");
    }

    #[test]
    fn case_insensitive_flag_translates() {
        let chain = TextFilterChain::new(vec![FilterRule::new("ooc:", "gi", "", "strip ooc")]);
        let out = chain.apply(&[Message::user("OOC: note ooc: again")]);
        assert_eq!(out[0].content(), " note  again");
    }

    #[test]
    fn non_global_rule_replaces_first_match_only() {
        let chain = TextFilterChain::new(vec![FilterRule::new("x", "", "y", "once")]);
        let out = chain.apply(&[Message::user("x x x")]);
        assert_eq!(out[0].content(), "y x x");
    }

    #[test]
    fn replacement_stable_rules_are_idempotent() {
        let chain = TextFilterChain::new(vec![FilterRule::new("\\*giggles\\*", "g", "", "strip")]);
        let once = chain.apply(&[Message::user("well *giggles* then")]);
        let twice = chain.apply(&once);
        assert_eq!(once, twice);
    }
}
