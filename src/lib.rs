//! OctoBlank chat
//!
//! A chat front-end over a local language model that:
//! - Keeps every turn in a JSON-backed conversation log
//! - Rewrites the whole log after each append or delete
//! - Builds prompts from a bounded tail of the log
//! - Records generation failures as assistant turns
//!
//! TURN LOOP:
//! USER APPEND → BUILD PROMPT → GENERATE → CLEAN → ASSISTANT APPEND

pub mod commands;
pub mod config;
pub mod conversational;
pub mod error;
pub mod inference;
pub mod memory;
pub mod ollama;
pub mod storage;

pub use error::Result;

// Re-export common types
pub use conversational::ChatSession;
pub use inference::{GenerationParams, InferenceEngine};
pub use memory::{ConversationLog, HistoryStore, Message, MessageRole, PromptBuilder, PromptLimits};
