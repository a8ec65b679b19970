//! Runtime configuration
//!
//! Read from environment variables, with an optional `.env` file loaded
//! first. Unset variables fall back to defaults.

use crate::error::ChatError;
use crate::inference::GenerationParams;
use crate::memory::{PromptLimits, DEFAULT_PREAMBLE};
use crate::Result;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_HISTORY_PATH: &str = "dtb.json";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "orca-mini";

#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub history_path: PathBuf,
    pub ollama_url: String,
    pub model: String,
    pub persona: String,
    pub limits: PromptLimits,
    pub generation: GenerationParams,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_path: PathBuf::from(DEFAULT_HISTORY_PATH),
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            persona: DEFAULT_PREAMBLE.to_string(),
            limits: PromptLimits::default(),
            generation: GenerationParams::default(),
        }
    }
}

impl ChatConfig {
    /// Load `.env` if present, then read the process environment
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let limits = PromptLimits {
            max_recent_messages: parse_or(
                &lookup,
                "OCTOCHAT_MAX_RECENT_MESSAGES",
                defaults.limits.max_recent_messages,
            )?,
            max_chars: parse_or(&lookup, "OCTOCHAT_MAX_PROMPT_CHARS", defaults.limits.max_chars)?,
        };

        let generation = GenerationParams {
            temperature: parse_or(&lookup, "OCTOCHAT_TEMPERATURE", defaults.generation.temperature)?,
            top_k: parse_or(&lookup, "OCTOCHAT_TOP_K", defaults.generation.top_k)?,
            max_tokens: parse_or(&lookup, "OCTOCHAT_MAX_TOKENS", defaults.generation.max_tokens)?,
            streaming: false,
        };

        Ok(Self {
            history_path: lookup("OCTOCHAT_HISTORY_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.history_path),
            ollama_url: lookup("OLLAMA_URL").unwrap_or(defaults.ollama_url),
            model: lookup("OCTOCHAT_MODEL").unwrap_or(defaults.model),
            persona: lookup("OCTOCHAT_PERSONA").unwrap_or(defaults.persona),
            limits,
            generation,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw.trim().parse().map_err(|e| {
            ChatError::ConfigError(format!("Invalid value '{}' for {}: {}", raw, key, e))
        }),
        _ => Ok(default),
    }
}
