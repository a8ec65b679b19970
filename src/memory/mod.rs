//! Conversation memory
//!
//! Holds the persisted conversation log and turns its tail into bounded
//! prompts for the inference engine.

pub mod prompt;
pub mod store;

pub use prompt::{extract_reply, PromptBuilder, PromptLimits, ASSISTANT_CUE, DEFAULT_PREAMBLE};
pub use store::{ConversationLog, HistoryStore, Message, MessageRole};
