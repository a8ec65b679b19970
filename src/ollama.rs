//! Ollama client
//!
//! Talks to a local Ollama server's `/api/generate` endpoint.
//! Uses a long-lived reqwest::Client for connection pooling.

use crate::error::ChatError;
use crate::inference::{GenerationParams, InferenceEngine};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info};

/// Reusable Ollama client (connection-pooled)
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> crate::Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(2)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }

    fn build_request<'a>(&'a self, prompt: &'a str, params: &GenerationParams) -> GenerateRequest<'a> {
        GenerateRequest {
            model: &self.model,
            prompt,
            stream: params.streaming,
            options: GenerateOptions {
                temperature: params.temperature,
                top_k: params.top_k,
                num_predict: params.max_tokens,
            },
        }
    }
}

#[async_trait::async_trait]
impl InferenceEngine for OllamaClient {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate(&self, prompt: &str, params: &GenerationParams) -> crate::Result<String> {
        let request = self.build_request(prompt, params);

        info!("Calling Ollama model {}", self.model);

        let response = self
            .client
            .post(self.endpoint())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Ollama request failed: {}", e);
                ChatError::LlmError(format!("Ollama request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Ollama error response {}: {}", status, error_text);
            return Err(ChatError::LlmError(format!(
                "Ollama error {}: {}",
                status, error_text
            )));
        }

        let body: GenerateResponse = response.json().await.map_err(|e| {
            error!("Failed to parse Ollama response: {}", e);
            ChatError::LlmError(format!("Ollama parse error: {}", e))
        })?;

        parse_generation(body)
    }
}

fn parse_generation(body: GenerateResponse) -> crate::Result<String> {
    if let Some(message) = body.error {
        return Err(ChatError::LlmError(format!("Ollama error: {}", message)));
    }

    match body.response {
        Some(text) if !text.trim().is_empty() => {
            info!(
                "Ollama response received ({} chars, done: {})",
                text.len(),
                body.done
            );
            Ok(text)
        }
        _ => Err(ChatError::LlmError(
            "Empty response from Ollama".to_string(),
        )),
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    top_k: u32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let client = OllamaClient::new("http://localhost:11434/", "orca-mini").unwrap();
        let params = GenerationParams::default();

        let json = serde_json::to_value(client.build_request("User: hi\n\nAssistant:", &params)).unwrap();

        assert_eq!(json["model"], "orca-mini");
        assert_eq!(json["prompt"], "User: hi\n\nAssistant:");
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["top_k"], 40);
        assert_eq!(json["options"]["num_predict"], 500);
        assert!((json["options"]["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let client = OllamaClient::new("http://localhost:11434/", "orca-mini").unwrap();
        assert_eq!(client.endpoint(), "http://localhost:11434/api/generate");
    }

    #[test]
    fn test_parse_generation() {
        let body: GenerateResponse = serde_json::from_str(
            r#"{"model": "orca-mini", "response": " Hello there!", "done": true}"#,
        )
        .unwrap();
        assert_eq!(parse_generation(body).unwrap(), " Hello there!");
    }

    #[test]
    fn test_parse_generation_errors() {
        let failed: GenerateResponse =
            serde_json::from_str(r#"{"error": "model 'nope' not found"}"#).unwrap();
        let err = parse_generation(failed).unwrap_err();
        assert!(err.to_string().contains("not found"));

        let blank: GenerateResponse =
            serde_json::from_str(r#"{"response": "   ", "done": true}"#).unwrap();
        assert!(matches!(parse_generation(blank), Err(ChatError::LlmError(_))));
    }
}
