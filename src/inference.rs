//! Inference capability
//!
//! The chat pipeline only needs to hand a prompt to a language model and
//! get one complete reply back.

use crate::Result;

/// Sampling parameters passed along with every prompt
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    /// Sampling temperature
    pub temperature: f32,
    /// Top-k diversity cutoff
    pub top_k: u32,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Ask the engine for incremental output
    pub streaming: bool,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_k: 40,
            max_tokens: 500,
            streaming: false,
        }
    }
}

/// Trait for language model backends
#[async_trait::async_trait]
pub trait InferenceEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Generate one complete reply for `prompt`
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String>;
}
