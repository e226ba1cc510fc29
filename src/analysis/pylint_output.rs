use serde::Deserialize;

use super::knowledge::Explanation;
use super::result::{Diagnostic, Severity};

/// pylint `--output-format=json` 输出的单条记录
#[derive(Debug, Clone, Deserialize)]
pub struct PylintMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub line: Option<usize>,
    #[serde(default)]
    pub column: Option<usize>,
    #[serde(rename = "endLine", default)]
    pub end_line: Option<usize>,
    #[serde(rename = "endColumn", default)]
    pub end_column: Option<usize>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(rename = "message-id", default)]
    pub message_id: Option<String>,
}

impl PylintMessage {
    fn severity(&self) -> Severity {
        match self.kind.as_str() {
            "error" | "fatal" => Severity::Error,
            _ => Severity::Warning,
        }
    }

    fn rule_id(&self) -> Option<&str> {
        self.symbol
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.message_id.as_deref())
    }

    /// pylint 的规则不在共享查找表里，按消息类别生成通用解释
    fn explanation(&self) -> Explanation {
        let rule = self.rule_id().unwrap_or("unknown");
        let explanation = match self.message_id.as_deref() {
            Some(id) if Some(id) != self.rule_id() => {
                format!("Pylint reported `{}` ({}), a {} message.", rule, id, self.kind)
            }
            _ => format!("Pylint reported `{}`, a {} message.", rule, self.kind),
        };

        let suggestion = match self.kind.as_str() {
            "error" | "fatal" => "This is likely a bug: fix the code at the reported line before running it.",
            "warning" => "Check the reported line; the code runs but may not behave as intended.",
            "convention" => "Adjust the code to follow PEP 8 naming and style conventions.",
            "refactor" => "Consider restructuring this code to make it simpler.",
            _ => "Review the message and update the code accordingly.",
        };

        Explanation {
            explanation,
            suggestion: suggestion.to_string(),
        }
    }

    pub fn into_diagnostic(self) -> Diagnostic {
        let explanation = self.explanation();
        let mut diagnostic = Diagnostic::new(self.severity(), self.message.clone())
            .with_location(self.line.unwrap_or(0), self.column.unwrap_or(0))
            .with_end_location(self.end_line, self.end_column)
            .with_explanation(explanation);

        if let Some(rule_id) = self.rule_id() {
            diagnostic = diagnostic.with_rule_id(rule_id);
        }
        diagnostic
    }
}

/// 解析 pylint JSON 数组；空输出视为没有问题
pub fn parse_pylint_json(stdout: &str) -> Result<Vec<Diagnostic>, serde_json::Error> {
    if stdout.trim().is_empty() {
        return Ok(Vec::new());
    }

    let messages: Vec<PylintMessage> = serde_json::from_str(stdout.trim())?;
    Ok(messages
        .into_iter()
        .map(PylintMessage::into_diagnostic)
        .collect())
}
