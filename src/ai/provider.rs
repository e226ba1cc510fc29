use anyhow::Result;
use async_trait::async_trait;

/// AI 提供商配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub api_url: String,
    pub timeout_secs: u64,
    pub max_tokens: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::for_provider("openai")
    }
}

impl ProviderConfig {
    /// 按提供商填入默认 URL 与模型，未知名称回退到 OpenAI 的默认值
    pub fn for_provider(name: &str) -> Self {
        let (api_url, model) = ProviderFactory::defaults(name)
            .unwrap_or(("https://api.openai.com/v1/chat/completions", "gpt-4o-mini"));
        Self {
            model: model.to_string(),
            api_key: None,
            api_url: api_url.to_string(),
            timeout_secs: 60,
            max_tokens: 1024,
        }
    }
}

/// AI 提供商接口
#[async_trait]
pub trait AIProvider: Send + Sync {
    /// 生成完整响应（非流式）
    async fn generate(&self, prompt: &str, config: &ProviderConfig) -> Result<String>;
}

/// AI 提供商工厂
pub struct ProviderFactory;

impl ProviderFactory {
    /// 根据名称创建提供商
    pub fn create(name: &str) -> Result<Box<dyn AIProvider>> {
        use crate::ai::providers::{
            ClaudeProvider, DeepseekProvider, GeminiProvider, OllamaProvider, OpenAIProvider,
        };

        match name.to_lowercase().as_str() {
            "openai" => Ok(Box::new(OpenAIProvider::new())),
            "deepseek" => Ok(Box::new(DeepseekProvider::new())),
            "claude" => Ok(Box::new(ClaudeProvider::new())),
            "gemini" => Ok(Box::new(GeminiProvider::new())),
            "ollama" => Ok(Box::new(OllamaProvider::new())),
            _ => anyhow::bail!("Unknown AI provider: {}", name),
        }
    }

    /// 获取所有支持的提供商列表
    pub fn list_providers() -> Vec<&'static str> {
        vec!["openai", "deepseek", "claude", "gemini", "ollama"]
    }

    /// 是否需要 API key（本地 Ollama 不需要）
    pub fn requires_api_key(name: &str) -> bool {
        !name.eq_ignore_ascii_case("ollama")
    }

    /// 默认的 (URL, model)
    pub fn defaults(name: &str) -> Option<(&'static str, &'static str)> {
        match name.to_lowercase().as_str() {
            "openai" => Some(("https://api.openai.com/v1/chat/completions", "gpt-4o-mini")),
            "deepseek" => Some(("https://api.deepseek.com/v1/chat/completions", "deepseek-chat")),
            "claude" => Some(("https://api.anthropic.com/v1/messages", "claude-sonnet-4-20250514")),
            "gemini" => Some((
                "https://generativelanguage.googleapis.com/v1beta",
                "gemini-2.0-flash",
            )),
            "ollama" => Some(("http://localhost:11434/api/generate", "qwen2.5-coder")),
            _ => None,
        }
    }
}
