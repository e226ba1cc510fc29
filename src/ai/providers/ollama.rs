use crate::ai::http::shared_client;
use crate::ai::provider::{AIProvider, ProviderConfig};
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Ollama 请求结构
#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    format: &'a str,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

/// Ollama 响应结构
#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
}

/// Ollama 本地提供商，不需要 API key
pub struct OllamaProvider {
    client: &'static Client,
}

impl Default for OllamaProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl OllamaProvider {
    pub fn new() -> Self {
        Self {
            client: shared_client(),
        }
    }
}

#[async_trait]
impl AIProvider for OllamaProvider {
    async fn generate(&self, prompt: &str, config: &ProviderConfig) -> Result<String> {
        let request = OllamaRequest {
            model: &config.model,
            prompt,
            stream: false,
            format: "json",
            options: OllamaOptions {
                temperature: 0.2,
                num_predict: config.max_tokens,
            },
        };

        let response = self
            .client
            .post(&config.api_url)
            .json(&request)
            .timeout(Duration::from_secs(config.timeout_secs))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama request failed: {} - {}", status, text);
        }

        let ollama_response: OllamaResponse = response.json().await?;
        Ok(ollama_response.response)
    }
}
