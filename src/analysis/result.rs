use serde::{Deserialize, Serialize};

use super::knowledge::{self, Explanation};
use crate::infrastructure::error::{AnalysisError, ErrorCategory};

/// 诊断严重程度
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// 工具报告的一条问题（归一化后）
///
/// `line` / `column` 为 0 表示工具没有给出结构化位置。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub rule_id: Option<String>,
    pub severity: Severity,
    pub message: String,
    pub line: usize,
    pub column: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_column: Option<usize>,
    pub explanation: String,
    pub suggestion: String,
}

impl Diagnostic {
    /// 创建一条未定位的诊断，解释与建议先填入通用兜底文案
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        let fallback = knowledge::fallback();
        Self {
            rule_id: None,
            severity,
            message: message.into(),
            line: 0,
            column: 0,
            end_line: None,
            end_column: None,
            explanation: fallback.explanation,
            suggestion: fallback.suggestion,
        }
    }

    pub fn with_location(mut self, line: usize, column: usize) -> Self {
        self.line = line;
        self.column = column;
        self
    }

    pub fn with_end_location(mut self, end_line: Option<usize>, end_column: Option<usize>) -> Self {
        self.end_line = end_line;
        self.end_column = end_column;
        self
    }

    pub fn with_rule_id(mut self, rule_id: impl Into<String>) -> Self {
        self.rule_id = Some(rule_id.into());
        self
    }

    /// 覆盖解释与建议；空字符串会被忽略以保持兜底文案
    pub fn with_explanation(mut self, explanation: Explanation) -> Self {
        if !explanation.explanation.trim().is_empty() {
            self.explanation = explanation.explanation;
        }
        if !explanation.suggestion.trim().is_empty() {
            self.suggestion = explanation.suggestion;
        }
        self
    }

    /// 通过共享查找表补全解释：先按规则 ID 精确匹配，再按消息子串匹配
    pub fn explained(self) -> Self {
        match knowledge::lookup(self.rule_id.as_deref(), &self.message) {
            Some(explanation) => self.with_explanation(explanation),
            None => self,
        }
    }

    pub fn is_located(&self) -> bool {
        self.line > 0
    }
}

/// 单个源单元的诊断分组
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileDiagnostics {
    /// 输入总是单个内存中的代码片段，路径为空占位
    pub file_path: String,
    pub messages: Vec<Diagnostic>,
}

impl FileDiagnostics {
    pub fn new(messages: Vec<Diagnostic>) -> Self {
        Self {
            file_path: String::new(),
            messages,
        }
    }
}

/// AI 解释服务返回的三项内容，均可缺失
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AiInsight {
    pub explanation: Option<String>,
    pub suggestion: Option<String>,
    pub fixed_code: Option<String>,
}

impl AiInsight {
    pub fn is_empty(&self) -> bool {
        self.explanation.is_none() && self.suggestion.is_none() && self.fixed_code.is_none()
    }
}

/// 一次分析请求的结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub success: bool,
    pub results: Vec<FileDiagnostics>,
    /// 本地确定性自动修复后的代码；没有修复工具时与输入相同
    pub fixed_code: Option<String>,
    pub ai_explanation: Option<String>,
    pub ai_suggestion: Option<String>,
    pub ai_fixed_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AnalysisResult {
    pub fn completed(diagnostics: Vec<Diagnostic>, fixed_code: impl Into<String>) -> Self {
        Self {
            success: true,
            results: vec![FileDiagnostics::new(diagnostics)],
            fixed_code: Some(fixed_code.into()),
            ai_explanation: None,
            ai_suggestion: None,
            ai_fixed_code: None,
            error: None,
            error_kind: None,
            details: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            results: Vec::new(),
            fixed_code: None,
            ai_explanation: None,
            ai_suggestion: None,
            ai_fixed_code: None,
            error: Some(error.into()),
            error_kind: None,
            details: None,
        }
    }

    /// 把输入 / 工具 / 资源类错误转换为 `success=false` 的结果
    pub fn from_error(error: &AnalysisError) -> Self {
        let result = Self::failure(error.to_string()).with_error_kind(error.category());
        match error.details() {
            Some(details) => result.with_details(details),
            None => result,
        }
    }

    pub fn with_error_kind(mut self, kind: ErrorCategory) -> Self {
        self.error_kind = Some(kind);
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// 合并 AI 解释结果，不触碰已计算好的诊断
    pub fn with_insight(mut self, insight: AiInsight) -> Self {
        self.ai_explanation = insight.explanation;
        self.ai_suggestion = insight.suggestion;
        self.ai_fixed_code = insight.fixed_code;
        self
    }

    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.results.iter().flat_map(|group| group.messages.iter())
    }

    pub fn diagnostic_count(&self) -> usize {
        self.diagnostics().count()
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }
}
