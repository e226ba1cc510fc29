//! g++ / gcc stderr 解析。
//!
//! 匹配 `path:line:col: severity: message` 的行生成带位置的诊断；只包含
//! `error:` / `warning:` 但不符合该格式的行生成 line=0、column=0 的诊断，
//! 不丢弃任何报错行。

use once_cell::sync::Lazy;
use regex::Regex;

use super::result::{Diagnostic, Severity};

static LOCATED_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<path>.+?):(?P<line>\d+):(?P<column>\d+):\s+(?:fatal\s+)?(?P<severity>error|warning):\s*(?P<message>.*)$",
    )
    .unwrap()
});

/// 警告末尾的 `[-Wxxx]` 开关名，作为规则 ID
static WARNING_FLAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[(-W[A-Za-z0-9=_+-]+)\]\s*$").unwrap());

/// 解析编译器 stderr，返回的诊断已通过共享查找表补全解释
pub fn parse_compiler_output(stderr: &str) -> Vec<Diagnostic> {
    stderr.lines().filter_map(parse_line).collect()
}

fn parse_line(raw: &str) -> Option<Diagnostic> {
    let line = raw.trim_end_matches('\r');

    if let Some(captures) = LOCATED_LINE.captures(line) {
        let line_number: usize = captures["line"].parse().unwrap_or(0);
        let column: usize = captures["column"].parse().unwrap_or(0);
        let severity = match &captures["severity"] {
            "warning" => Severity::Warning,
            _ => Severity::Error,
        };
        let message = captures["message"].trim();

        let mut diagnostic = Diagnostic::new(severity, message).with_location(line_number, column);
        if let Some(flag) = WARNING_FLAG.captures(message) {
            diagnostic = diagnostic.with_rule_id(&flag[1]);
        }
        return Some(diagnostic.explained());
    }

    let severity = if line.contains("error:") {
        Severity::Error
    } else if line.contains("warning:") {
        Severity::Warning
    } else {
        return None;
    };

    Some(Diagnostic::new(severity, line.trim()).explained())
}
