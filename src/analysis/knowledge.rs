//! 规则 ID / 消息片段 → 人类可读解释的静态查找表。

/// 一条诊断的解释与修复建议
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explanation {
    pub explanation: String,
    pub suggestion: String,
}

struct KnowledgeEntry {
    rule_id: Option<&'static str>,
    pattern: &'static str,
    explanation: &'static str,
    suggestion: &'static str,
}

const FALLBACK_EXPLANATION: &str =
    "The analysis tool reported a problem in this part of the code.";
const FALLBACK_SUGGESTION: &str =
    "Review the message and the surrounding code, then adjust it to satisfy the tool.";

static ENTRIES: &[KnowledgeEntry] = &[
    // JavaScript 规则
    KnowledgeEntry {
        rule_id: Some("semi"),
        pattern: "Missing semicolon",
        explanation: "A statement is missing its terminating semicolon. Relying on automatic semicolon insertion can change how consecutive lines are parsed.",
        suggestion: "Add a semicolon at the end of the statement.",
    },
    KnowledgeEntry {
        rule_id: Some("no-var"),
        pattern: "Unexpected var",
        explanation: "`var` declarations are function-scoped and hoisted, which makes accidental reuse and shadowing easy.",
        suggestion: "Declare the variable with `let`, or with `const` if it is never reassigned.",
    },
    KnowledgeEntry {
        rule_id: Some("eqeqeq"),
        pattern: "Expected '==='",
        explanation: "Loose equality performs type coercion before comparing, so values of different types can compare equal unexpectedly.",
        suggestion: "Use `===` / `!==` so that both value and type are compared.",
    },
    KnowledgeEntry {
        rule_id: Some("no-debugger"),
        pattern: "Unexpected 'debugger'",
        explanation: "A `debugger` statement pauses execution whenever developer tools are open and should not ship.",
        suggestion: "Remove the `debugger` statement.",
    },
    KnowledgeEntry {
        rule_id: Some("no-empty"),
        pattern: "Empty block statement",
        explanation: "An empty block usually means unfinished code or a silently swallowed error.",
        suggestion: "Implement the block, or add a comment explaining why it is intentionally empty.",
    },
    KnowledgeEntry {
        rule_id: Some("no-console"),
        pattern: "Unexpected console statement",
        explanation: "Console output left in code is noisy and can leak internal details.",
        suggestion: "Remove the console call or route it through a proper logger.",
    },
    KnowledgeEntry {
        rule_id: Some("no-unused-vars"),
        pattern: "is defined but never used",
        explanation: "A declared binding is never read, which usually points to dead code or a typo elsewhere.",
        suggestion: "Remove the unused declaration or use it where it was intended.",
    },
    KnowledgeEntry {
        rule_id: None,
        pattern: "Parsing error",
        explanation: "The code could not be parsed, so no other checks could run.",
        suggestion: "Fix the syntax near the reported location (unbalanced brackets, quotes or a stray token are common causes).",
    },
    // C / C++ 编译器消息
    KnowledgeEntry {
        rule_id: None,
        pattern: "expected ';'",
        explanation: "The compiler reached a token where it required a semicolon to end the previous statement or declaration.",
        suggestion: "Add the missing `;` at the end of the preceding statement or class definition.",
    },
    KnowledgeEntry {
        rule_id: None,
        pattern: "was not declared in this scope",
        explanation: "A name is used before it is declared, is misspelled, or its header was not included.",
        suggestion: "Declare the name, fix its spelling, or include the header that provides it.",
    },
    KnowledgeEntry {
        rule_id: None,
        pattern: "unused variable",
        explanation: "A local variable is declared but never used.",
        suggestion: "Remove the variable or use it.",
    },
    KnowledgeEntry {
        rule_id: None,
        pattern: "no return statement",
        explanation: "A function with a non-void return type can finish without returning a value, which is undefined behaviour.",
        suggestion: "Return a value on every path through the function.",
    },
    KnowledgeEntry {
        rule_id: None,
        pattern: "control reaches end of non-void function",
        explanation: "Some path through a non-void function ends without a return statement, which is undefined behaviour.",
        suggestion: "Add a return statement to every path of the function.",
    },
    KnowledgeEntry {
        rule_id: None,
        pattern: "undefined reference",
        explanation: "The linker could not find a definition for a declared function or variable.",
        suggestion: "Provide the definition, or link the library or object file that contains it.",
    },
];

/// 查表：先按规则 ID 精确匹配，再按消息子串匹配（不区分大小写），取第一个命中项
pub fn lookup(rule_id: Option<&str>, message: &str) -> Option<Explanation> {
    if let Some(rule_id) = rule_id {
        if let Some(entry) = ENTRIES.iter().find(|e| e.rule_id == Some(rule_id)) {
            return Some(entry.to_explanation());
        }
    }

    let message_lower = message.to_lowercase();
    ENTRIES
        .iter()
        .find(|e| message_lower.contains(&e.pattern.to_lowercase()))
        .map(KnowledgeEntry::to_explanation)
}

/// 查不到时使用的通用解释
pub fn fallback() -> Explanation {
    Explanation {
        explanation: FALLBACK_EXPLANATION.to_string(),
        suggestion: FALLBACK_SUGGESTION.to_string(),
    }
}

/// 查表，查不到时返回通用解释
pub fn explain(rule_id: Option<&str>, message: &str) -> Explanation {
    lookup(rule_id, message).unwrap_or_else(fallback)
}

impl KnowledgeEntry {
    fn to_explanation(&self) -> Explanation {
        Explanation {
            explanation: self.explanation.to_string(),
            suggestion: self.suggestion.to_string(),
        }
    }
}
