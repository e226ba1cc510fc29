//! 把 `AnalysisResult` 渲染为命令行输出（JSON 或文本）。

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analysis::result::{AnalysisResult, Diagnostic, Severity};

/// 输出格式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    #[default]
    Json,
    Text,
}

/// 一次分析的完整报告：结果字段原样展开，附带语言信息
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report<'a> {
    #[serde(flatten)]
    pub result: &'a AnalysisResult,
    pub language: &'a str,
    pub language_fallback: bool,
    pub generated_at: DateTime<Utc>,
}

impl<'a> Report<'a> {
    pub fn new(result: &'a AnalysisResult, language: &'a str, language_fallback: bool) -> Self {
        Self {
            result,
            language,
            language_fallback,
            generated_at: Utc::now(),
        }
    }

    pub fn render(&self, format: ReportFormat) -> anyhow::Result<String> {
        match format {
            ReportFormat::Json => Ok(serde_json::to_string_pretty(self)?),
            ReportFormat::Text => Ok(TextFormatter::new(false).format(self)),
        }
    }
}

/// 文本格式化器
pub struct TextFormatter {
    use_colors: bool,
}

impl TextFormatter {
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    fn separator(&self, length: usize) -> String {
        "=".repeat(length)
    }

    fn sub_separator(&self, length: usize) -> String {
        "-".repeat(length)
    }

    fn format_severity(&self, severity: Severity) -> String {
        if self.use_colors {
            match severity {
                Severity::Error => format!("\x1b[91m{}\x1b[0m", severity), // 红色
                Severity::Warning => format!("\x1b[93m{}\x1b[0m", severity), // 黄色
            }
        } else {
            severity.to_string()
        }
    }

    fn format_location(diagnostic: &Diagnostic) -> String {
        if diagnostic.is_located() {
            format!("{}:{}", diagnostic.line, diagnostic.column)
        } else {
            "-".to_string()
        }
    }

    pub fn format(&self, report: &Report<'_>) -> String {
        let result = report.result;
        let mut content = String::new();

        content.push_str("CODE ANALYSIS REPORT\n");
        content.push_str(&self.separator(80));
        content.push('\n');
        content.push_str(&format!("Language: {}", report.language));
        if report.language_fallback {
            content.push_str(" (default)");
        }
        content.push('\n');
        content.push_str(&format!(
            "Generated: {}\n",
            report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));

        if !result.success {
            content.push_str("Status: FAILED");
            if let Some(kind) = result.error_kind {
                content.push_str(&format!(" ({})", kind.label()));
            }
            content.push_str(&format!(
                "\nError: {}\n",
                result.error.as_deref().unwrap_or("unknown error")
            ));
            if let Some(details) = &result.details {
                content.push_str(&format!("Details:\n{}\n", details.trim_end()));
            }
            return content;
        }

        content.push_str(&format!(
            "Status: OK ({} error(s), {} warning(s))\n",
            result.error_count(),
            result.warning_count()
        ));
        if let Some(details) = &result.details {
            content.push_str(&format!("Details:\n{}\n", details.trim_end()));
        }
        content.push('\n');

        if result.diagnostic_count() > 0 {
            content.push_str("DIAGNOSTICS\n");
            content.push_str(&self.sub_separator(11));
            content.push('\n');
            for (index, diagnostic) in result.diagnostics().enumerate() {
                content.push_str(&format!(
                    "{}. [{}] {} {}",
                    index + 1,
                    self.format_severity(diagnostic.severity),
                    Self::format_location(diagnostic),
                    diagnostic.message
                ));
                if let Some(rule) = &diagnostic.rule_id {
                    content.push_str(&format!(" ({})", rule));
                }
                content.push('\n');
                content.push_str(&format!("   Why: {}\n", diagnostic.explanation));
                content.push_str(&format!("   Fix: {}\n", diagnostic.suggestion));
            }
            content.push('\n');
        }

        if let Some(fixed) = &result.fixed_code {
            content.push_str("FIXED CODE\n");
            content.push_str(&self.sub_separator(10));
            content.push('\n');
            content.push_str(fixed.trim_end());
            content.push_str("\n\n");
        }

        if let Some(explanation) = &result.ai_explanation {
            content.push_str("AI EXPLANATION\n");
            content.push_str(&self.sub_separator(14));
            content.push('\n');
            content.push_str(explanation.trim_end());
            content.push('\n');
            if let Some(suggestion) = &result.ai_suggestion {
                content.push_str(&format!("Suggestion: {}\n", suggestion.trim_end()));
            }
            if let Some(fixed) = &result.ai_fixed_code {
                content.push_str("Suggested code:\n");
                content.push_str(fixed.trim_end());
                content.push('\n');
            }
        }

        content
    }
}
