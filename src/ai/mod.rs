//! 解释增强：把诊断交给大模型，换取根因解释、修改建议和修复后的代码。
//!
//! 这一步永远是尽力而为：未配置、调用失败或返回无法解析时都只让三个
//! AI 字段为空，不影响已经算出的诊断与 `success`。

pub mod http;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod response;

use std::sync::Arc;

use crate::analysis::result::{AiInsight, Diagnostic};
use crate::config::Config;
use crate::languages::Language;

pub use provider::{AIProvider, ProviderConfig, ProviderFactory};

/// 一次解释请求
#[derive(Debug, Clone, Copy)]
pub struct ExplanationRequest<'a> {
    pub code: &'a str,
    pub language: Language,
    pub diagnostics: &'a [Diagnostic],
}

struct Backend {
    name: String,
    provider: Arc<dyn AIProvider>,
    config: ProviderConfig,
}

/// 解释增强器，启用与否在构造时一次确定
pub struct ExplanationAugmenter {
    backend: Option<Backend>,
}

impl std::fmt::Debug for ExplanationAugmenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExplanationAugmenter")
            .field("provider", &self.backend.as_ref().map(|b| b.name.as_str()))
            .finish()
    }
}

impl ExplanationAugmenter {
    /// 关闭状态：`augment` 直接返回全空
    pub fn disabled() -> Self {
        Self { backend: None }
    }

    pub fn new(name: impl Into<String>, provider: Arc<dyn AIProvider>, config: ProviderConfig) -> Self {
        Self {
            backend: Some(Backend {
                name: name.into(),
                provider,
                config,
            }),
        }
    }

    /// 按进程配置构造；缺少凭据时降级为关闭状态并记录一次警告
    pub fn from_config(config: &Config) -> Self {
        if !config.ai_enabled {
            tracing::info!("AI explanations disabled by configuration");
            return Self::disabled();
        }

        if ProviderFactory::requires_api_key(&config.provider) && config.api_key.is_none() {
            tracing::warn!(
                "No API key configured for provider '{}', AI explanations are disabled. \
                 Set AI_LINT_API_KEY to enable them.",
                config.provider
            );
            return Self::disabled();
        }

        match ProviderFactory::create(&config.provider) {
            Ok(provider) => {
                tracing::info!("AI explanations enabled via {}", config.provider);
                Self::new(
                    config.provider.clone(),
                    Arc::from(provider),
                    config.provider_config(),
                )
            }
            Err(e) => {
                tracing::warn!("AI explanations disabled: {}", e);
                Self::disabled()
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// 请求解释；任何失败都降级为全空结果
    pub async fn augment(&self, request: ExplanationRequest<'_>) -> AiInsight {
        let Some(backend) = &self.backend else {
            return AiInsight::default();
        };

        let prompt = prompt::build_prompt(&request);
        tracing::debug!(
            "Requesting explanation from {} for {} diagnostic(s)",
            backend.name,
            request.diagnostics.len()
        );

        match backend.provider.generate(&prompt, &backend.config).await {
            Ok(text) => response::parse_insight(&text),
            Err(e) => {
                tracing::warn!("Explanation request to {} failed: {:#}", backend.name, e);
                AiInsight::default()
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use anyhow::Result;
    use async_trait::async_trait;

    use super::{AIProvider, ProviderConfig};

    /// 记录调用次数的假提供商
    pub struct CountingProvider {
        calls: AtomicUsize,
        reply: Option<String>,
    }

    impl CountingProvider {
        pub fn replying(reply: impl Into<String>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                reply: Some(reply.into()),
            }
        }

        pub fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                reply: None,
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AIProvider for CountingProvider {
        async fn generate(&self, _prompt: &str, _config: &ProviderConfig) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Some(reply) => Ok(reply.clone()),
                None => anyhow::bail!("connection refused"),
            }
        }
    }
}
