//! Conversational turn handling
//!
//! One turn runs: append the user message, build a prompt from recent
//! history, ask the inference engine, clean the reply and append it as the
//! assistant message. Engine failures become assistant messages too, so the
//! log records every attempt.

use crate::inference::{GenerationParams, InferenceEngine};
use crate::memory::{extract_reply, ConversationLog, HistoryStore, MessageRole, PromptBuilder, PromptLimits};
use std::sync::Arc;
use tracing::{info, warn};

/// A chat session over one history store and one inference engine
pub struct ChatSession {
    store: HistoryStore,
    builder: PromptBuilder,
    engine: Arc<dyn InferenceEngine>,
    limits: PromptLimits,
    params: GenerationParams,
}

impl ChatSession {
    pub fn new(
        store: HistoryStore,
        builder: PromptBuilder,
        engine: Arc<dyn InferenceEngine>,
        limits: PromptLimits,
        params: GenerationParams,
    ) -> Self {
        Self {
            store,
            builder,
            engine,
            limits,
            params,
        }
    }

    /// Run one turn for `input` and return the text recorded as the
    /// assistant's reply.
    ///
    /// The input is stored as given; rejecting empty sends is up to the
    /// caller. If generation fails the user message stays in history and
    /// an error description is stored and returned as the reply.
    pub async fn respond(&mut self, input: &str) -> String {
        self.store.append(MessageRole::User, input);

        let prompt = self.builder.build_with_limits(self.store.log(), self.limits);

        let reply = match self.engine.generate(&prompt, &self.params).await {
            Ok(raw) => {
                info!("Reply generated by {}", self.engine.name());
                extract_reply(&raw)
            }
            Err(e) => {
                warn!("Generation with {} failed: {}", self.engine.name(), e);
                format!("Error generating response: {}", e)
            }
        };

        self.store.append(MessageRole::Assistant, reply.clone());
        reply
    }

    pub fn delete_all(&mut self) -> usize {
        self.store.delete_all()
    }

    pub fn delete_matching(&mut self, keyword: &str) -> usize {
        self.store.delete_matching(keyword)
    }

    pub fn history(&self) -> &ConversationLog {
        self.store.log()
    }
}
