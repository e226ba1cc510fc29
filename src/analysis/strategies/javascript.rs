use std::sync::Arc;

use async_trait::async_trait;

use crate::ai::{ExplanationAugmenter, ExplanationRequest};
use crate::analysis::result::{AnalysisResult, Diagnostic};
use crate::analysis::AnalysisStrategy;
use crate::infrastructure::error::AnalysisError;
use crate::languages::Language;
use crate::linter::{JsLinter, LintMessage};

/// 进程内 JavaScript 检查，带自动修复
pub struct JavaScriptStrategy {
    linter: JsLinter,
    augmenter: Arc<ExplanationAugmenter>,
}

impl JavaScriptStrategy {
    pub fn new(linter: JsLinter, augmenter: Arc<ExplanationAugmenter>) -> Self {
        Self { linter, augmenter }
    }
}

fn to_diagnostic(message: LintMessage) -> Diagnostic {
    let mut diagnostic = Diagnostic::new(message.severity, message.message)
        .with_location(message.line, message.column)
        .with_end_location(Some(message.end_line), Some(message.end_column));
    if let Some(rule) = message.rule_id {
        diagnostic = diagnostic.with_rule_id(rule.as_str());
    }
    diagnostic.explained()
}

#[async_trait]
impl AnalysisStrategy for JavaScriptStrategy {
    fn name(&self) -> &str {
        "javascript-linter"
    }

    fn language(&self) -> Language {
        Language::JavaScript
    }

    async fn analyze(&self, code: &str) -> Result<AnalysisResult, AnalysisError> {
        let report = match self.linter.lint(code) {
            Ok(report) => report,
            Err(e) => {
                tracing::error!("JavaScript linter failed: {}", e);
                return Ok(AnalysisResult::failure("JavaScript linter failed")
                    .with_error_kind(e.category())
                    .with_details(e.to_string()));
            }
        };

        let diagnostics: Vec<Diagnostic> = report.messages.into_iter().map(to_diagnostic).collect();
        tracing::debug!("JavaScript linter reported {} diagnostic(s)", diagnostics.len());

        let insight = if diagnostics.is_empty() {
            None
        } else {
            Some(
                self.augmenter
                    .augment(ExplanationRequest {
                        code,
                        language: Language::JavaScript,
                        diagnostics: &diagnostics,
                    })
                    .await,
            )
        };

        let result = AnalysisResult::completed(diagnostics, report.output);
        Ok(match insight {
            Some(insight) => result.with_insight(insight),
            None => result,
        })
    }
}
