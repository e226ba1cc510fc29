//! 解释服务返回文本的容错解析。
//!
//! 依次尝试：围栏代码块中的 JSON、文本中第一个完整的 `{...}`、原始文本。

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::analysis::result::AiInsight;

/// 无法提取 JSON 时使用的固定建议
pub const RAW_TEXT_SUGGESTION: &str =
    "See the explanation above; the response could not be parsed into structured fields.";

static FENCED_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n(.*?)```").unwrap());

pub fn parse_insight(text: &str) -> AiInsight {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return AiInsight::default();
    }

    if let Some(insight) = fenced_json(trimmed).or_else(|| balanced_json(trimmed)) {
        return insight;
    }

    AiInsight {
        explanation: Some(trimmed.to_string()),
        suggestion: Some(RAW_TEXT_SUGGESTION.to_string()),
        fixed_code: None,
    }
}

fn fenced_json(text: &str) -> Option<AiInsight> {
    FENCED_BLOCK
        .captures_iter(text)
        .filter_map(|captures| captures.get(1))
        .find_map(|body| insight_from_json(body.as_str().trim()))
}

fn balanced_json(text: &str) -> Option<AiInsight> {
    let mut search_from = 0;
    while let Some(offset) = text[search_from..].find('{') {
        let start = search_from + offset;
        if let Some(end) = matching_brace(&text[start..]) {
            if let Some(insight) = insight_from_json(&text[start..start + end]) {
                return Some(insight);
            }
        }
        search_from = start + 1;
    }
    None
}

/// 返回与开头 `{` 匹配的 `}` 之后的字节偏移，忽略字符串中的括号
fn matching_brace(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (index, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(index + 1);
                }
            }
            _ => {}
        }
    }
    None
}

fn insight_from_json(candidate: &str) -> Option<AiInsight> {
    let value: Value = serde_json::from_str(candidate).ok()?;
    let object = value.as_object()?;

    let field = |names: &[&str]| {
        names
            .iter()
            .filter_map(|name| object.get(*name))
            .find_map(string_value)
    };

    let insight = AiInsight {
        explanation: field(&["explanation"]),
        suggestion: field(&["suggestion"]),
        fixed_code: field(&["fixedCode", "fixed_code"]),
    };

    // 一个字段都没有的对象不是我们要的结构
    if insight.is_empty()
        && !["explanation", "suggestion", "fixedCode", "fixed_code"]
            .iter()
            .any(|key| object.contains_key(*key))
    {
        return None;
    }
    Some(insight)
}

fn string_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Null | Value::String(_) => None,
        Value::Array(items) => {
            let joined = items
                .iter()
                .filter_map(string_value)
                .collect::<Vec<_>>()
                .join("\n");
            (!joined.is_empty()).then_some(joined)
        }
        other => Some(other.to_string()),
    }
}
