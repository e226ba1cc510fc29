use std::collections::HashMap;
use std::sync::Arc;

use tracing::Instrument;

use crate::ai::ExplanationAugmenter;
use crate::config::Config;
use crate::infrastructure::error::AnalysisError;
use crate::languages::Language;
use crate::linter::{JsLinter, LintConfig};

use super::result::AnalysisResult;
use super::strategies::{CFamilyStrategy, JavaScriptStrategy, PythonStrategy};
use super::AnalysisStrategy;

/// 分发器：语言 → 策略的查找表，启动时构建
pub struct Analyzer {
    strategies: HashMap<Language, Arc<dyn AnalysisStrategy>>,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer {
    /// 创建空的分发器
    pub fn new() -> Self {
        Self {
            strategies: HashMap::new(),
        }
    }

    /// 按配置注册全部内置策略
    pub fn from_config(config: &Config) -> Result<Self, AnalysisError> {
        let augmenter = Arc::new(ExplanationAugmenter::from_config(config));
        Self::with_augmenter(config, augmenter)
    }

    /// 与 `from_config` 相同，但使用给定的解释增强器
    pub fn with_augmenter(config: &Config, augmenter: Arc<ExplanationAugmenter>) -> Result<Self, AnalysisError> {
        let lint_config = match &config.js_rules {
            Some(path) => {
                tracing::debug!("Loading JavaScript rules from {}", path.display());
                LintConfig::from_file(path)?
            }
            None => LintConfig::default(),
        };
        let timeout = config.tool_timeout();

        let mut analyzer = Self::new();
        analyzer.register(Arc::new(JavaScriptStrategy::new(
            JsLinter::new(lint_config),
            augmenter.clone(),
        )));
        analyzer.register(Arc::new(
            PythonStrategy::new(
                &config.python,
                config.pylintrc.clone(),
                config.temp_dir.clone(),
                augmenter.clone(),
            )
            .with_timeout(timeout),
        ));
        analyzer.register(Arc::new(
            CFamilyStrategy::new(&config.cxx, &config.cxx_std, config.temp_dir.clone(), augmenter)
                .with_timeout(timeout),
        ));

        Ok(analyzer)
    }

    /// 注册策略，同一语言后注册的覆盖先注册的
    pub fn register(&mut self, strategy: Arc<dyn AnalysisStrategy>) {
        if let Some(previous) = self.strategies.insert(strategy.language(), strategy.clone()) {
            tracing::debug!(
                "Strategy {} replaced {} for {}",
                strategy.name(),
                previous.name(),
                strategy.language()
            );
        }
    }

    pub fn supported_languages(&self) -> Vec<Language> {
        let mut languages: Vec<Language> = self.strategies.keys().copied().collect();
        languages.sort_by_key(|l| l.as_str());
        languages
    }

    /// 按语言标签分发；不支持的语言直接返回失败结果，不触碰任何资源
    pub async fn analyze(&self, code: &str, language: &str) -> Result<AnalysisResult, AnalysisError> {
        let strategy = Language::from_tag(language).and_then(|lang| self.strategies.get(&lang));

        let Some(strategy) = strategy else {
            let error = AnalysisError::unsupported_language(language.trim());
            tracing::warn!("{}", error);
            return Ok(AnalysisResult::from_error(&error));
        };

        tracing::debug!("Analyzing {} bytes with {}", code.len(), strategy.name());
        let span = tracing::debug_span!(
            "analyze",
            language = strategy.language().as_str(),
            tool = strategy.name()
        );
        let result = strategy.analyze(code).instrument(span).await;
        match &result {
            Ok(r) => tracing::debug!(
                "{} finished: success={}, {} diagnostic(s)",
                strategy.name(),
                r.success,
                r.diagnostic_count()
            ),
            Err(e) => tracing::error!("{} failed: {}", strategy.name(), e),
        }
        result
    }
}
