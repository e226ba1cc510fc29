/// 集成测试：从配置构建分发器，完整跑通三种语言的分析流程
///
/// 外部工具用可执行的 sh 脚本代替，解释服务用 wiremock 模拟 Ollama。

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ai_lint::analysis::{Analyzer, Severity};
use ai_lint::config::Config;
use ai_lint::infrastructure::ErrorCategory;

/// 写入一个可执行脚本，返回其路径
fn fake_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    let mut permissions = std::fs::metadata(&path).unwrap().permissions();
    permissions.set_mode(0o755);
    std::fs::set_permissions(&path, permissions).unwrap();
    path
}

/// 工具目录与临时文件目录分开，便于检查残留
struct Workspace {
    tools: tempfile::TempDir,
    scratch: tempfile::TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            tools: tempfile::tempdir().unwrap(),
            scratch: tempfile::tempdir().unwrap(),
        }
    }

    fn config(&self) -> Config {
        Config {
            temp_dir: self.scratch.path().to_path_buf(),
            ai_enabled: false,
            ..Config::default()
        }
    }

    fn leftovers(&self) -> usize {
        std::fs::read_dir(self.scratch.path()).unwrap().count()
    }
}

async fn ollama_replying(body: serde_json::Value) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;
    server
}

fn with_ollama(mut config: Config, server: &MockServer) -> Config {
    config.ai_enabled = true;
    config.provider = "ollama".to_string();
    config.api_url = Some(format!("{}/api/generate", server.uri()));
    config
}

#[tokio::test]
async fn test_javascript_missing_semicolon_end_to_end() {
    let workspace = Workspace::new();
    let analyzer = Analyzer::from_config(&workspace.config()).unwrap();

    let result = analyzer.analyze("let x = 5", "javascript").await.unwrap();

    assert!(result.success);
    let diagnostics: Vec<_> = result.diagnostics().collect();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].rule_id.as_deref(), Some("semi"));
    assert_eq!(diagnostics[0].severity, Severity::Error);
    assert_eq!(diagnostics[0].line, 1);
    assert!(!diagnostics[0].explanation.is_empty());
    assert_eq!(result.fixed_code.as_deref(), Some("let x = 5;"));
    assert!(result.ai_explanation.is_none());
    assert!(result.ai_suggestion.is_none());
    assert!(result.ai_fixed_code.is_none());
}

#[tokio::test]
async fn test_explanations_are_merged_from_provider() {
    let workspace = Workspace::new();
    let reply = r#"Here you go:
```json
{"explanation": "The statement is not terminated.", "suggestion": "Add a semicolon.", "fixedCode": "let x = 5;"}
```"#;
    let server = ollama_replying(json!({ "response": reply })).await;
    let analyzer = Analyzer::from_config(&with_ollama(workspace.config(), &server)).unwrap();

    let result = analyzer.analyze("let x = 5", "js").await.unwrap();

    assert!(result.success);
    assert_eq!(result.ai_explanation.as_deref(), Some("The statement is not terminated."));
    assert_eq!(result.ai_suggestion.as_deref(), Some("Add a semicolon."));
    assert_eq!(result.ai_fixed_code.as_deref(), Some("let x = 5;"));
}

#[tokio::test]
async fn test_provider_failure_does_not_change_diagnostics() {
    let workspace = Workspace::new();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let without_ai = Analyzer::from_config(&workspace.config()).unwrap();
    let with_broken_ai = Analyzer::from_config(&with_ollama(workspace.config(), &server)).unwrap();

    let code = "var a = 1\nif (a == 2) { debugger }\n";
    let expected = without_ai.analyze(code, "javascript").await.unwrap();
    let actual = with_broken_ai.analyze(code, "javascript").await.unwrap();

    assert_eq!(actual, expected);
    assert!(actual.success);
    assert!(actual.diagnostic_count() >= 3);
    assert!(!server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_clean_code_skips_provider() {
    let workspace = Workspace::new();
    let server = ollama_replying(json!({ "response": "{}" })).await;
    let analyzer = Analyzer::from_config(&with_ollama(workspace.config(), &server)).unwrap();

    let result = analyzer.analyze("const y = 1;\n", "javascript").await.unwrap();

    assert!(result.success);
    assert_eq!(result.diagnostic_count(), 0);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_python_through_configured_interpreter() {
    let workspace = Workspace::new();
    // 参数：-m pylint --output-format=json <file>
    let python = fake_tool(
        workspace.tools.path(),
        "python",
        r#"for last; do :; done
test "$2" = pylint || exit 3
test -f "$last" || exit 4
cat <<'JSON'
[{"type": "error", "line": 2, "column": 6, "endLine": 2, "endColumn": 7,
  "symbol": "undefined-variable", "message": "Undefined variable y",
  "message-id": "E0602"}]
JSON
exit 2"#,
    );
    let config = Config {
        python: python.display().to_string(),
        ..workspace.config()
    };
    let analyzer = Analyzer::from_config(&config).unwrap();

    let code = "x = 1\nprint(y)\n";
    let result = analyzer.analyze(code, "python").await.unwrap();

    assert!(result.success, "{:?}", result.error);
    let diagnostics: Vec<_> = result.diagnostics().collect();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].rule_id.as_deref(), Some("undefined-variable"));
    assert_eq!((diagnostics[0].line, diagnostics[0].column), (2, 6));
    assert_eq!(diagnostics[0].end_line, Some(2));
    assert_eq!(result.fixed_code.as_deref(), Some(code));
    assert_eq!(workspace.leftovers(), 0);
}

#[tokio::test]
async fn test_missing_pylint_module_is_reported_as_unavailable() {
    let workspace = Workspace::new();
    let python = fake_tool(
        workspace.tools.path(),
        "python",
        "echo '/usr/bin/python3: No module named pylint' >&2; exit 1",
    );
    let config = Config {
        python: python.display().to_string(),
        ..workspace.config()
    };
    let analyzer = Analyzer::from_config(&config).unwrap();

    let result = analyzer.analyze("print(1)\n", "py").await.unwrap();

    assert!(!result.success);
    assert_eq!(result.error_kind, Some(ErrorCategory::ToolUnavailable));
    assert!(result.error.as_ref().unwrap().contains("pip install pylint"));
    assert_eq!(result.diagnostic_count(), 0);
    assert_eq!(workspace.leftovers(), 0);
}

#[tokio::test]
async fn test_cpp_through_configured_compiler() {
    let workspace = Workspace::new();
    // 参数：-std=c++17 -Wall -Wextra <src> -o <out>
    let cxx = fake_tool(
        workspace.tools.path(),
        "cxx",
        r#"test "$1" = -std=c++17 || exit 3
echo "$4: In function 'int main()':" >&2
echo "$4:3:1: error: expected ';' before '}' token" >&2
echo "$4:2:7: warning: unused variable 'y' [-Wunused-variable]" >&2
exit 1"#,
    );
    let config = Config {
        cxx: cxx.display().to_string(),
        ..workspace.config()
    };
    let analyzer = Analyzer::from_config(&config).unwrap();

    let code = "int main() {\n  int y = 1\n}\n";
    let result = analyzer.analyze(code, "cpp").await.unwrap();

    assert!(result.success);
    let diagnostics: Vec<_> = result.diagnostics().collect();
    assert_eq!(diagnostics.len(), 2);
    assert_eq!(diagnostics[0].severity, Severity::Error);
    assert_eq!((diagnostics[0].line, diagnostics[0].column), (3, 1));
    assert_eq!(diagnostics[1].severity, Severity::Warning);
    assert_eq!(diagnostics[1].rule_id.as_deref(), Some("-Wunused-variable"));
    assert_eq!(result.fixed_code.as_deref(), Some(code));
    assert_eq!(workspace.leftovers(), 0);
}

#[tokio::test]
async fn test_cpp_binary_is_removed_after_clean_compile() {
    let workspace = Workspace::new();
    let cxx = fake_tool(workspace.tools.path(), "cxx", r#"echo binary > "$6""#);
    let config = Config {
        cxx: cxx.display().to_string(),
        ..workspace.config()
    };
    let analyzer = Analyzer::from_config(&config).unwrap();

    for _ in 0..3 {
        let result = analyzer.analyze("int main() { return 0; }\n", "c++").await.unwrap();
        assert!(result.success);
        assert_eq!(result.diagnostic_count(), 0);
    }
    assert_eq!(workspace.leftovers(), 0);
}

#[tokio::test]
async fn test_missing_compiler_binary_is_rejected() {
    let workspace = Workspace::new();
    let config = Config {
        cxx: workspace.tools.path().join("no-such-compiler").display().to_string(),
        ..workspace.config()
    };
    let analyzer = Analyzer::from_config(&config).unwrap();

    let error = analyzer.analyze("int main() {}", "cpp").await.unwrap_err();
    assert!(error.is_tool_missing());
    assert_eq!(workspace.leftovers(), 0);
}

#[tokio::test]
async fn test_unsupported_language_is_reported() {
    let workspace = Workspace::new();
    let analyzer = Analyzer::from_config(&workspace.config()).unwrap();

    let result = analyzer.analyze("puts 'hi'", "ruby").await.unwrap();

    assert!(!result.success);
    assert!(result.error.unwrap().contains("ruby"));
    assert_eq!(workspace.leftovers(), 0);
}

#[tokio::test]
async fn test_javascript_rule_levels_from_file() {
    let workspace = Workspace::new();
    let rules = workspace.tools.path().join("rules.toml");
    std::fs::write(&rules, "[rules]\nsemi = \"off\"\nno-console = \"error\"\n").unwrap();
    let config = Config {
        js_rules: Some(rules),
        ..workspace.config()
    };
    let analyzer = Analyzer::from_config(&config).unwrap();

    let result = analyzer.analyze("console.log(1)", "javascript").await.unwrap();

    let diagnostics: Vec<_> = result.diagnostics().collect();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].rule_id.as_deref(), Some("no-console"));
    assert_eq!(diagnostics[0].severity, Severity::Error);
    assert_eq!(result.fixed_code.as_deref(), Some("console.log(1)"));
}
