//! 进程内 JavaScript 检查器。
//!
//! 基于 tree-sitter 解析，规则集合固定，启动时配置一次。`lint` 对原始代码
//! 报告问题，同时给出应用全部自动修复后的代码。

pub mod fixer;
pub mod rules;

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tree_sitter::{Parser, Tree};

use crate::analysis::result::Severity;
use crate::infrastructure::error::AnalysisError;

pub use fixer::{apply_fixes, Fix};
pub use rules::RuleId;

/// 自动修复的最大轮数
const MAX_FIX_PASSES: usize = 10;

/// 规则级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleLevel {
    Off,
    Warn,
    Error,
}

impl RuleLevel {
    pub fn severity(&self) -> Option<Severity> {
        match self {
            RuleLevel::Off => None,
            RuleLevel::Warn => Some(Severity::Warning),
            RuleLevel::Error => Some(Severity::Error),
        }
    }
}

/// 规则配置，进程内共享且不可变
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintConfig {
    levels: BTreeMap<RuleId, RuleLevel>,
}

impl Default for LintConfig {
    fn default() -> Self {
        let levels = RuleId::all()
            .into_iter()
            .map(|rule| (rule, rule.default_level()))
            .collect();
        Self { levels }
    }
}

#[derive(Debug, Deserialize)]
struct RulesFile {
    #[serde(default)]
    rules: BTreeMap<String, RuleLevel>,
}

impl LintConfig {
    /// 从 TOML 规则文件加载，未列出的规则保持默认级别
    ///
    /// ```toml
    /// [rules]
    /// semi = "error"
    /// no-console = "off"
    /// ```
    pub fn from_toml_str(content: &str) -> Result<Self, AnalysisError> {
        let file: RulesFile = toml::from_str(content)
            .map_err(|e| AnalysisError::config(format!("invalid lint rules: {}", e)))?;

        let mut config = Self::default();
        for (name, level) in file.rules {
            let rule = RuleId::from_name(&name)
                .ok_or_else(|| AnalysisError::config(format!("unknown lint rule: {}", name)))?;
            config.levels.insert(rule, level);
        }
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, AnalysisError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AnalysisError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn with_level(mut self, rule: RuleId, level: RuleLevel) -> Self {
        self.levels.insert(rule, level);
        self
    }

    pub fn level(&self, rule: RuleId) -> RuleLevel {
        self.levels.get(&rule).copied().unwrap_or(RuleLevel::Off)
    }

    pub fn severity(&self, rule: RuleId) -> Option<Severity> {
        self.level(rule).severity()
    }
}

/// 检查器报告的一条问题（1 起始的行列号）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintMessage {
    /// 语法错误没有规则 ID
    pub rule_id: Option<RuleId>,
    pub severity: Severity,
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub end_line: usize,
    pub end_column: usize,
    pub fatal: bool,
    pub fix: Option<Fix>,
}

/// 一次检查的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintReport {
    /// 针对原始代码的问题
    pub messages: Vec<LintMessage>,
    /// 应用自动修复后的代码，无可修复问题时与输入相同
    pub output: String,
}

/// JavaScript 检查器
#[derive(Debug, Clone, Default)]
pub struct JsLinter {
    config: LintConfig,
}

impl JsLinter {
    pub fn new(config: LintConfig) -> Self {
        Self { config }
    }

    /// 检查代码并生成修复后的版本
    pub fn lint(&self, code: &str) -> Result<LintReport, AnalysisError> {
        let messages = self.verify(code)?;

        let mut output = code.to_string();
        let mut pending: Vec<Fix> = messages.iter().filter_map(|m| m.fix.clone()).collect();
        let mut passes = 0;

        while !pending.is_empty() && passes < MAX_FIX_PASSES {
            let (fixed, applied) = apply_fixes(&output, &pending);
            if applied == 0 {
                break;
            }
            output = fixed;
            passes += 1;

            pending = self
                .verify(&output)?
                .into_iter()
                .filter_map(|m| m.fix)
                .collect();
        }

        if passes > 0 {
            tracing::debug!("Applied lint fixes in {} pass(es)", passes);
        }

        Ok(LintReport { messages, output })
    }

    /// 只返回修复后的代码
    pub fn fix(&self, code: &str) -> Result<String, AnalysisError> {
        Ok(self.lint(code)?.output)
    }

    /// 只检查不修复
    pub fn verify(&self, code: &str) -> Result<Vec<LintMessage>, AnalysisError> {
        let tree = parse(code)?;
        let mut messages = rules::run(&tree, code.as_bytes(), &self.config);
        messages.sort_by_key(|m| (m.line, m.column));
        Ok(messages)
    }
}

fn parse(code: &str) -> Result<Tree, AnalysisError> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_javascript::LANGUAGE.into())
        .map_err(|e| AnalysisError::linter(format!("failed to load JavaScript grammar: {}", e)))?;
    parser
        .parse(code, None)
        .ok_or_else(|| AnalysisError::linter("failed to parse source"))
}
