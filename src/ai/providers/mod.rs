/// 声明基于 `OpenAICompatibleBase` 的提供商
macro_rules! impl_openai_provider {
    ($(#[$meta:meta])* $name:ident, $display:expr) => {
        use crate::ai::provider::{AIProvider, ProviderConfig};
        use crate::ai::providers::openai_compat::OpenAICompatibleBase;
        use anyhow::Result;
        use async_trait::async_trait;

        $(#[$meta])*
        pub struct $name {
            base: OpenAICompatibleBase,
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl $name {
            pub fn new() -> Self {
                Self {
                    base: OpenAICompatibleBase::new(),
                }
            }
        }

        #[async_trait]
        impl AIProvider for $name {
            async fn generate(&self, prompt: &str, config: &ProviderConfig) -> Result<String> {
                self.base.generate_chat(prompt, config, $display).await
            }
        }
    };
}

pub mod claude;
pub mod deepseek;
pub mod gemini;
pub mod ollama;
pub mod openai;
pub mod openai_compat;

pub use claude::ClaudeProvider;
pub use deepseek::DeepseekProvider;
pub use gemini::GeminiProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAIProvider;
