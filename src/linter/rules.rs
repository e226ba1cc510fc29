use std::collections::HashMap;

use tree_sitter::{Node, Point, Tree};

use super::fixer::Fix;
use super::{LintConfig, LintMessage, RuleLevel};
use crate::analysis::result::Severity;

/// 内置规则
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RuleId {
    Semi,
    NoVar,
    Eqeqeq,
    NoDebugger,
    NoEmpty,
    NoConsole,
    NoUnusedVars,
}

impl RuleId {
    pub fn all() -> [RuleId; 7] {
        [
            RuleId::Semi,
            RuleId::NoVar,
            RuleId::Eqeqeq,
            RuleId::NoDebugger,
            RuleId::NoEmpty,
            RuleId::NoConsole,
            RuleId::NoUnusedVars,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleId::Semi => "semi",
            RuleId::NoVar => "no-var",
            RuleId::Eqeqeq => "eqeqeq",
            RuleId::NoDebugger => "no-debugger",
            RuleId::NoEmpty => "no-empty",
            RuleId::NoConsole => "no-console",
            RuleId::NoUnusedVars => "no-unused-vars",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        RuleId::all().into_iter().find(|rule| rule.as_str() == name)
    }

    pub fn default_level(&self) -> RuleLevel {
        match self {
            RuleId::Semi | RuleId::NoDebugger | RuleId::NoEmpty => RuleLevel::Error,
            RuleId::NoVar | RuleId::Eqeqeq | RuleId::NoConsole => RuleLevel::Warn,
            RuleId::NoUnusedVars => RuleLevel::Off,
        }
    }
}

/// 需要以分号结尾的语句
const SEMICOLON_STATEMENTS: &[&str] = &[
    "expression_statement",
    "lexical_declaration",
    "variable_declaration",
    "return_statement",
    "throw_statement",
    "break_statement",
    "continue_statement",
    "debugger_statement",
    "do_statement",
    "import_statement",
    "export_statement",
];

/// 函数体的空块不算 no-empty
const FUNCTION_KINDS: &[&str] = &[
    "function_declaration",
    "function_expression",
    "function",
    "arrow_function",
    "method_definition",
    "generator_function_declaration",
    "generator_function",
    "class_static_block",
];

const DECLARATION_VALUE_KINDS: &[&str] = &["function_expression", "function", "class", "arrow_function"];

struct RuleContext<'a> {
    source: &'a [u8],
    config: &'a LintConfig,
    messages: Vec<LintMessage>,
}

impl<'a> RuleContext<'a> {
    fn text(&self, node: Node) -> &'a str {
        node.utf8_text(self.source).unwrap_or("")
    }

    fn report(&mut self, rule: RuleId, node: Node, message: String, fix: Option<Fix>) {
        self.report_at(rule, node.start_byte(), node.start_position(), node, message, fix);
    }

    fn report_at(
        &mut self,
        rule: RuleId,
        byte: usize,
        point: Point,
        node: Node,
        message: String,
        fix: Option<Fix>,
    ) {
        let Some(severity) = self.config.severity(rule) else {
            return;
        };
        let (line, column) = position(self.source, byte, point);
        let (end_line, end_column) = position(self.source, node.end_byte(), node.end_position());

        self.messages.push(LintMessage {
            rule_id: Some(rule),
            severity,
            message,
            line,
            column,
            end_line,
            end_column,
            fatal: false,
            fix,
        });
    }

    fn enabled(&self, rule: RuleId) -> bool {
        self.config.level(rule) != RuleLevel::Off
    }
}

/// 运行所有启用的规则；存在语法错误时只报告该错误
pub(super) fn run(tree: &Tree, source: &[u8], config: &LintConfig) -> Vec<LintMessage> {
    let root = tree.root_node();

    if root.has_error() {
        return parse_error(root, source).into_iter().collect();
    }

    let mut ctx = RuleContext {
        source,
        config,
        messages: Vec::new(),
    };

    walk(root, |node| check_node(node, &mut ctx));

    if ctx.enabled(RuleId::NoUnusedVars) {
        check_unused_vars(root, &mut ctx);
    }

    ctx.messages
}

fn check_node(node: Node, ctx: &mut RuleContext) {
    match node.kind() {
        "variable_declaration" => check_no_var(node, ctx),
        "binary_expression" => check_eqeqeq(node, ctx),
        "debugger_statement" => {
            ctx.report(
                RuleId::NoDebugger,
                node,
                "Unexpected 'debugger' statement.".to_string(),
                None,
            );
        }
        "statement_block" => check_no_empty(node, ctx),
        "call_expression" => check_no_console(node, ctx),
        _ => {}
    }

    if SEMICOLON_STATEMENTS.contains(&node.kind()) {
        check_semi(node, ctx);
    }
}

fn check_semi(node: Node, ctx: &mut RuleContext) {
    if node.kind() == "export_statement" {
        // export 声明由内部声明自己负责
        if node.child_by_field_name("declaration").is_some() {
            return;
        }
        if let Some(value) = node.child_by_field_name("value") {
            if DECLARATION_VALUE_KINDS.contains(&value.kind()) {
                return;
            }
        }
    }

    let Some(last) = node.child(node.child_count().saturating_sub(1)) else {
        return;
    };
    if last.kind() == ";" {
        return;
    }

    let end = node.end_byte();
    ctx.report_at(
        RuleId::Semi,
        end,
        node.end_position(),
        node,
        "Missing semicolon.".to_string(),
        Some(Fix::insert(end, ";")),
    );
}

fn check_no_var(node: Node, ctx: &mut RuleContext) {
    let Some(keyword) = node.child(0).filter(|c| c.kind() == "var") else {
        return;
    };

    // 只在块级/顶层作用域修复，避免改变循环等位置的作用域语义
    let fixable = node
        .parent()
        .filter(|p| matches!(p.kind(), "program" | "statement_block"))
        .map(|block| let_binding_is_equivalent(node, block, ctx))
        .unwrap_or(false);
    let fix = fixable.then(|| Fix::replace(keyword.start_byte(), keyword.end_byte(), "let"));

    ctx.report(
        RuleId::NoVar,
        node,
        "Unexpected var, use let or const instead.".to_string(),
        fix,
    );
}

/// 把 var 换成 let 后行为不变：每个名字在函数作用域内只声明一次，
/// 所有引用都在声明之后且在同一个块内
fn let_binding_is_equivalent(declaration: Node, block: Node, ctx: &RuleContext) -> bool {
    let mut names = Vec::new();
    let mut cursor = declaration.walk();
    for declarator in declaration.named_children(&mut cursor) {
        if declarator.kind() != "variable_declarator" {
            continue;
        }
        match declarator.child_by_field_name("name") {
            Some(name) if name.kind() == "identifier" => names.push((declarator, ctx.text(name))),
            // 解构声明不修复
            _ => return false,
        }
    }

    let mut equivalent = true;
    walk(function_scope(declaration), |other| {
        if !equivalent || !is_identifier_like(other) {
            return;
        }
        let text = ctx.text(other);
        for &(declarator, name) in &names {
            if text != name || other.start_byte() == declarator.start_byte() {
                continue;
            }
            let outside_block =
                other.start_byte() < block.start_byte() || other.end_byte() > block.end_byte();
            // 初始化表达式里的自引用同样落在暂时性死区
            let before_declaration = other.start_byte() < declarator.end_byte();
            if outside_block || before_declaration || is_declared_name(other) {
                equivalent = false;
            }
        }
    });
    equivalent
}

/// var 绑定所在的函数作用域（最近的函数节点或整个程序）
fn function_scope(node: Node) -> Node {
    let mut scope = node;
    while let Some(parent) = scope.parent() {
        scope = parent;
        if FUNCTION_KINDS.contains(&parent.kind()) {
            break;
        }
    }
    scope
}

fn is_identifier_like(node: Node) -> bool {
    matches!(
        node.kind(),
        "identifier" | "shorthand_property_identifier" | "shorthand_property_identifier_pattern"
    )
}

/// 节点是否是某个声明引入的名字
fn is_declared_name(node: Node) -> bool {
    let Some(parent) = node.parent() else {
        return false;
    };
    match parent.kind() {
        "variable_declarator"
        | "function_declaration"
        | "generator_function_declaration"
        | "class_declaration" => parent
            .child_by_field_name("name")
            .map(|name| name.id() == node.id())
            .unwrap_or(false),
        _ => false,
    }
}

fn check_eqeqeq(node: Node, ctx: &mut RuleContext) {
    let Some(operator) = node.child_by_field_name("operator") else {
        return;
    };
    let expected = match operator.kind() {
        "==" => "===",
        "!=" => "!==",
        _ => return,
    };

    let left = node.child_by_field_name("left");
    let right = node.child_by_field_name("right");
    let fixable = match (left, right) {
        (Some(l), Some(r)) => {
            is_typeof(l, ctx) || is_typeof(r, ctx) || same_literal_kind(l, r)
        }
        _ => false,
    };
    let fix = fixable.then(|| Fix::replace(operator.start_byte(), operator.end_byte(), expected));

    ctx.report_at(
        RuleId::Eqeqeq,
        operator.start_byte(),
        operator.start_position(),
        node,
        format!(
            "Expected '{}' and instead saw '{}'.",
            expected,
            operator.kind()
        ),
        fix,
    );
}

fn is_typeof(node: Node, ctx: &RuleContext) -> bool {
    node.kind() == "unary_expression"
        && node
            .child_by_field_name("operator")
            .map(|op| ctx.text(op) == "typeof")
            .unwrap_or(false)
}

fn same_literal_kind(left: Node, right: Node) -> bool {
    matches!(left.kind(), "string" | "number") && left.kind() == right.kind()
}

fn check_no_empty(node: Node, ctx: &mut RuleContext) {
    // 注释也是具名子节点，有注释的空块视为有意为之
    if node.named_child_count() > 0 {
        return;
    }
    let in_function = node
        .parent()
        .map(|p| FUNCTION_KINDS.contains(&p.kind()))
        .unwrap_or(false);
    if in_function {
        return;
    }

    ctx.report(
        RuleId::NoEmpty,
        node,
        "Empty block statement.".to_string(),
        None,
    );
}

fn check_no_console(node: Node, ctx: &mut RuleContext) {
    let Some(callee) = node
        .child_by_field_name("function")
        .filter(|f| f.kind() == "member_expression")
    else {
        return;
    };
    let is_console = callee
        .child_by_field_name("object")
        .map(|object| object.kind() == "identifier" && ctx.text(object) == "console")
        .unwrap_or(false);

    if is_console {
        ctx.report(
            RuleId::NoConsole,
            callee,
            "Unexpected console statement.".to_string(),
            None,
        );
    }
}

/// 只出现一次（即只有声明处）的名字视为未使用
fn check_unused_vars(root: Node, ctx: &mut RuleContext) {
    let mut occurrences: HashMap<&str, usize> = HashMap::new();
    let mut declarations: Vec<(Node, bool)> = Vec::new();

    walk(root, |node| match node.kind() {
        "identifier" | "shorthand_property_identifier" | "shorthand_property_identifier_pattern" => {
            *occurrences.entry(ctx.text(node)).or_insert(0) += 1;
        }
        "variable_declarator" => {
            if let Some(name) = node.child_by_field_name("name").filter(|n| n.kind() == "identifier") {
                declarations.push((name, node.child_by_field_name("value").is_some()));
            }
        }
        "function_declaration" => {
            if let Some(name) = node.child_by_field_name("name") {
                declarations.push((name, false));
            }
        }
        _ => {}
    });

    for (name, assigned) in declarations {
        if is_exported(name) {
            continue;
        }
        let text = ctx.text(name);
        if occurrences.get(text).copied().unwrap_or(0) > 1 {
            continue;
        }
        let message = if assigned {
            format!("'{}' is assigned a value but never used.", text)
        } else {
            format!("'{}' is defined but never used.", text)
        };
        ctx.report(RuleId::NoUnusedVars, name, message, None);
    }
}

fn is_exported(node: Node) -> bool {
    let mut current = node.parent();
    while let Some(parent) = current {
        if parent.kind() == "export_statement" {
            return true;
        }
        current = parent.parent();
    }
    false
}

/// 语法错误：报告第一个 ERROR 或 MISSING 节点
fn parse_error(root: Node, source: &[u8]) -> Option<LintMessage> {
    let mut found: Option<Node> = None;
    walk(root, |node| {
        if found.is_none() && (node.is_error() || node.is_missing()) {
            found = Some(node);
        }
    });
    let node = found?;

    let message = if node.is_missing() {
        format!("Parsing error: '{}' expected", node.kind())
    } else {
        let token = first_leaf(node)
            .and_then(|leaf| leaf.utf8_text(source).ok())
            .map(str::trim)
            .filter(|t| !t.is_empty());
        match token {
            Some(token) => format!("Parsing error: Unexpected token {}", token),
            None => "Parsing error: Unexpected end of input".to_string(),
        }
    };

    let (line, column) = position(source, node.start_byte(), node.start_position());
    let (end_line, end_column) = position(source, node.end_byte(), node.end_position());

    Some(LintMessage {
        rule_id: None,
        severity: Severity::Error,
        message,
        line,
        column,
        end_line,
        end_column,
        fatal: true,
        fix: None,
    })
}

fn first_leaf(node: Node) -> Option<Node> {
    let mut current = node;
    while current.child_count() > 0 {
        current = current.child(0)?;
    }
    (current.end_byte() > current.start_byte()).then_some(current)
}

/// 前序遍历整棵树
fn walk<'t, F>(root: Node<'t>, mut visit: F)
where
    F: FnMut(Node<'t>),
{
    let mut cursor = root.walk();
    loop {
        visit(cursor.node());

        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

/// 字节偏移 → 1 起始的行号与字符列号
fn position(source: &[u8], byte: usize, point: Point) -> (usize, usize) {
    let line_start = byte.saturating_sub(point.column);
    let column = std::str::from_utf8(&source[line_start..byte.min(source.len())])
        .map(|prefix| prefix.chars().count())
        .unwrap_or(point.column);
    (point.row + 1, column + 1)
}
