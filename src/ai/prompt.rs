use std::fmt::Write;

use super::ExplanationRequest;

/// 输出格式要求
const OUTPUT_INSTRUCTION: &str = r#"Respond with a single JSON object and nothing else, using exactly these fields:
{
  "explanation": "root cause of the problems, in plain language",
  "suggestion": "what the author should change",
  "fixedCode": "the complete corrected source code"
}"#;

/// 构造发给解释服务的提示词：语言、代码、逐条诊断与输出格式要求
pub fn build_prompt(request: &ExplanationRequest<'_>) -> String {
    let language = request.language.as_str();
    let mut prompt = String::with_capacity(request.code.len() + 512);

    let _ = writeln!(
        prompt,
        "You are reviewing {} code that a static analysis tool flagged.",
        language
    );
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "Code:");
    let _ = writeln!(prompt, "```{}", language);
    let _ = writeln!(prompt, "{}", request.code.trim_end());
    let _ = writeln!(prompt, "```");
    let _ = writeln!(prompt);

    if request.diagnostics.is_empty() {
        let _ = writeln!(
            prompt,
            "The tool failed without reporting structured diagnostics."
        );
    } else {
        let _ = writeln!(prompt, "Diagnostics:");
        for (index, diagnostic) in request.diagnostics.iter().enumerate() {
            let rule = diagnostic.rule_id.as_deref().unwrap_or("-");
            let _ = writeln!(
                prompt,
                "{}. line {}, column {} [{}] {} (rule: {})",
                index + 1,
                diagnostic.line,
                diagnostic.column,
                diagnostic.severity,
                diagnostic.message,
                rule
            );
        }
    }

    let _ = writeln!(prompt);
    prompt.push_str(OUTPUT_INSTRUCTION);
    prompt
}
