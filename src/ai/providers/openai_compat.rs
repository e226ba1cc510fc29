use crate::ai::http::shared_client;
use crate::ai::provider::ProviderConfig;
use anyhow::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// OpenAI 兼容 Chat Completion 请求
#[derive(Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub stream: bool,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Chat 消息
#[derive(Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

/// OpenAI 兼容 Chat Completion 响应
#[derive(Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
pub struct ChatChoice {
    pub message: Option<ChatMessageResponse>,
}

#[derive(Deserialize)]
pub struct ChatMessageResponse {
    #[serde(default)]
    pub content: Option<String>,
}

/// 系统提示：要求模型只输出 JSON
const SYSTEM_PROMPT: &str =
    "You are a senior code reviewer. Answer only with the JSON object requested by the user.";

/// OpenAI 兼容 Provider 基类
///
/// OpenAI / Deepseek 等兼容 API 共用请求发送与响应解析。
pub struct OpenAICompatibleBase {
    client: &'static Client,
}

impl Default for OpenAICompatibleBase {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenAICompatibleBase {
    pub fn new() -> Self {
        Self {
            client: shared_client(),
        }
    }

    /// 发送 Chat Completion 请求并返回第一条回复
    pub async fn generate_chat(
        &self,
        prompt: &str,
        config: &ProviderConfig,
        provider_name: &str,
    ) -> Result<String> {
        let api_key = config
            .api_key
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("{} API key is required", provider_name))?;

        let request = ChatCompletionRequest {
            model: &config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            stream: false,
            temperature: 0.2,
            max_tokens: config.max_tokens,
        };

        let response = self
            .client
            .post(&config.api_url)
            .bearer_auth(api_key)
            .json(&request)
            .timeout(Duration::from_secs(config.timeout_secs))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("{} request failed: {} - {}", provider_name, status, text);
        }

        let chat_response: ChatCompletionResponse = response.json().await?;
        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .unwrap_or_default();

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> ProviderConfig {
        ProviderConfig {
            model: "test-model".to_string(),
            api_key: Some("sk-test".to_string()),
            api_url: format!("{}/v1/chat/completions", server.uri()),
            timeout_secs: 5,
            max_tokens: 256,
        }
    }

    #[test]
    fn test_chat_request_serialization() {
        let request = ChatCompletionRequest {
            model: "gpt-4o-mini",
            messages: vec![ChatMessage {
                role: "user",
                content: "test",
            }],
            stream: false,
            temperature: 0.2,
            max_tokens: 500,
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("gpt-4o-mini"));
        assert!(json.contains("\"stream\":false"));
    }

    #[test]
    fn test_chat_response_deserialization() {
        let json = r#"{"choices": [{"message": {"role": "assistant", "content": "world"}}]}"#;
        let response: ChatCompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            response.choices[0].message.as_ref().unwrap().content.as_deref(),
            Some("world")
        );
    }

    #[tokio::test]
    async fn test_generate_chat_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "{\"explanation\": \"ok\"}"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let base = OpenAICompatibleBase::new();
        let content = base
            .generate_chat("prompt", &config_for(&server), "OpenAI")
            .await
            .unwrap();
        assert_eq!(content, "{\"explanation\": \"ok\"}");
    }

    #[tokio::test]
    async fn test_generate_chat_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let base = OpenAICompatibleBase::new();
        let error = base
            .generate_chat("prompt", &config_for(&server), "OpenAI")
            .await
            .unwrap_err();
        assert!(error.to_string().contains("401"));
    }

    #[tokio::test]
    async fn test_generate_chat_requires_key() {
        let server = MockServer::start().await;
        let mut config = config_for(&server);
        config.api_key = None;

        let error = OpenAICompatibleBase::new()
            .generate_chat("prompt", &config, "Deepseek")
            .await
            .unwrap_err();
        assert!(error.to_string().contains("Deepseek API key is required"));
    }
}
