//! Prompt assembly
//!
//! Renders the tail of the conversation log into a single prompt string
//! for the inference engine, bounded by message count and character count.

use crate::memory::store::ConversationLog;
use tracing::debug;

/// Persona line placed ahead of the conversation
pub const DEFAULT_PREAMBLE: &str = "You are OctoBlank v1.2, an AI created with Python scripts and a JSON database. Previous conversation:\n";

/// Cue appended after the conversation to invite the next assistant turn
pub const ASSISTANT_CUE: &str = "\nAssistant:";

/// Marker stripped from generated replies
const REPLY_MARKER: &str = "Assistant:";

/// Bounds applied when building a prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptLimits {
    /// Most recent messages to include
    pub max_recent_messages: usize,
    /// Hard character cutoff for the whole prompt
    pub max_chars: usize,
}

impl Default for PromptLimits {
    fn default() -> Self {
        Self {
            max_recent_messages: 20,
            max_chars: 2048,
        }
    }
}

/// Builds bounded prompts from conversation history
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    preamble: String,
}

impl PromptBuilder {
    pub fn new(preamble: impl Into<String>) -> Self {
        Self {
            preamble: preamble.into(),
        }
    }

    /// Render the last `max_recent_messages` entries of `log` as
    /// `"<Role>: <content>\n"` lines between the preamble and the assistant
    /// cue, then cut the result to its first `max_chars` characters.
    ///
    /// The cutoff is not word-aware. A long preamble or window can push the
    /// trailing cue out of the prompt entirely.
    pub fn build(&self, log: &ConversationLog, max_recent_messages: usize, max_chars: usize) -> String {
        let window = log.recent(max_recent_messages);

        let mut prompt = String::with_capacity(self.preamble.len() + ASSISTANT_CUE.len());
        prompt.push_str(&self.preamble);
        for msg in window {
            prompt.push_str(msg.role.label());
            prompt.push_str(": ");
            prompt.push_str(&msg.content);
            prompt.push('\n');
        }
        prompt.push_str(ASSISTANT_CUE);

        let full_chars = prompt.chars().count();
        if let Some((cut, _)) = prompt.char_indices().nth(max_chars) {
            prompt.truncate(cut);
        }

        debug!(
            "Built prompt from {} messages ({} chars, {} before cutoff)",
            window.len(),
            prompt.chars().count(),
            full_chars
        );

        prompt
    }

    /// Build with limits taken from configuration
    pub fn build_with_limits(&self, log: &ConversationLog, limits: PromptLimits) -> String {
        self.build(log, limits.max_recent_messages, limits.max_chars)
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_PREAMBLE)
    }
}

/// Clean a raw generation before it goes into history.
///
/// Trims whitespace and, if the model echoed the `Assistant:` cue, keeps
/// only what follows its last occurrence.
pub fn extract_reply(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.rfind(REPLY_MARKER) {
        Some(pos) => trimmed[pos + REPLY_MARKER.len()..].trim().to_string(),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::store::{Message, MessageRole};

    fn log_of(entries: &[(MessageRole, &str)]) -> ConversationLog {
        ConversationLog::from(
            entries
                .iter()
                .map(|(role, content)| Message::new(*role, *content))
                .collect::<Vec<_>>(),
        )
    }

    #[test]
    fn test_build_renders_turns_in_order() {
        let log = log_of(&[
            (MessageRole::User, "hi"),
            (MessageRole::Assistant, "hello"),
        ]);

        let prompt = PromptBuilder::default().build(&log, 20, 2048);

        assert!(prompt.starts_with(DEFAULT_PREAMBLE));
        let user_at = prompt.find("User: hi\n").unwrap();
        let assistant_at = prompt.find("Assistant: hello\n").unwrap();
        assert!(user_at < assistant_at);
        assert!(prompt.ends_with("Assistant: hello\n\nAssistant:"));
        assert!(prompt.chars().count() <= 2048);
    }

    #[test]
    fn test_build_keeps_only_recent_window() {
        let entries: Vec<_> = (0..30)
            .map(|i| format!("message {:02}", i))
            .collect();
        let log = ConversationLog::from(
            entries
                .iter()
                .map(|c| Message::new(MessageRole::User, c.as_str()))
                .collect::<Vec<_>>(),
        );

        let prompt = PromptBuilder::new("").build(&log, 5, 10_000);

        assert!(!prompt.contains("message 24"));
        let positions: Vec<_> = (25..30)
            .map(|i| prompt.find(&format!("User: message {:02}\n", i)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_build_with_short_log() {
        let log = log_of(&[(MessageRole::User, "only one")]);

        let prompt = PromptBuilder::new("P\n").build(&log, 20, 2048);

        assert_eq!(prompt, "P\nUser: only one\n\nAssistant:");
    }

    #[test]
    fn test_build_with_zero_window() {
        let log = log_of(&[(MessageRole::User, "hidden")]);

        let prompt = PromptBuilder::new("P\n").build(&log, 0, 2048);

        assert_eq!(prompt, "P\n\nAssistant:");
    }

    #[test]
    fn test_build_never_exceeds_max_chars() {
        let long = "x".repeat(500);
        let log = log_of(&[
            (MessageRole::User, long.as_str()),
            (MessageRole::Assistant, long.as_str()),
            (MessageRole::User, long.as_str()),
        ]);
        let builder = PromptBuilder::default();

        for max_chars in [0, 1, 10, 100, 1000, 2048] {
            let prompt = builder.build(&log, 20, max_chars);
            assert!(prompt.chars().count() <= max_chars);
        }
    }

    #[test]
    fn test_cutoff_can_drop_trailing_cue() {
        let long = "y".repeat(300);
        let log = log_of(&[(MessageRole::User, long.as_str())]);

        let prompt = PromptBuilder::default().build(&log, 20, 200);

        assert_eq!(prompt.chars().count(), 200);
        assert!(!prompt.ends_with(ASSISTANT_CUE));
    }

    #[test]
    fn test_cutoff_counts_characters_not_bytes() {
        let log = log_of(&[(MessageRole::User, "héllo wörld ✓")]);
        let builder = PromptBuilder::new("");

        let prompt = builder.build(&log, 20, 9);

        assert_eq!(prompt, "User: hél");
    }

    #[test]
    fn test_build_with_limits() {
        let log = log_of(&[
            (MessageRole::User, "a"),
            (MessageRole::Assistant, "b"),
        ]);
        let builder = PromptBuilder::new("");
        let limits = PromptLimits {
            max_recent_messages: 1,
            max_chars: 2048,
        };

        assert_eq!(builder.build_with_limits(&log, limits), "Assistant: b\n\nAssistant:");
    }

    #[test]
    fn test_extract_reply_trims() {
        assert_eq!(extract_reply("  Sure thing.\n\n"), "Sure thing.");
    }

    #[test]
    fn test_extract_reply_keeps_text_after_last_marker() {
        let raw = "User: hi\nAssistant: hello\nUser: again\nAssistant:  Hi again! ";
        assert_eq!(extract_reply(raw), "Hi again!");
    }

    #[test]
    fn test_extract_reply_with_trailing_marker_is_empty() {
        assert_eq!(extract_reply("Something\nAssistant:"), "");
    }
}
