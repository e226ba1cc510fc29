use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::ai::{ExplanationAugmenter, ExplanationRequest};
use crate::analysis::process::{run_tool, ToolCommand};
use crate::analysis::pylint_output::parse_pylint_json;
use crate::analysis::result::AnalysisResult;
use crate::analysis::temp::TempArtifact;
use crate::analysis::AnalysisStrategy;
use crate::infrastructure::error::{AnalysisError, ErrorCategory};
use crate::languages::Language;

const TOOL: &str = "pylint";
const INSTALL_HINT: &str = "Install it with `pip install pylint` and try again.";

/// 通过 pylint 子进程分析 Python，解析其 JSON 输出
pub struct PythonStrategy {
    command: ToolCommand,
    temp_dir: PathBuf,
    timeout: Option<Duration>,
    augmenter: Arc<ExplanationAugmenter>,
}

impl PythonStrategy {
    /// `python -m pylint --output-format=json [--rcfile <rc>]`
    pub fn new(
        python: &str,
        rcfile: Option<PathBuf>,
        temp_dir: PathBuf,
        augmenter: Arc<ExplanationAugmenter>,
    ) -> Self {
        let mut command = ToolCommand::new(python).with_args(["-m", "pylint", "--output-format=json"]);
        if let Some(rc) = rcfile {
            command = command.with_args([format!("--rcfile={}", rc.display())]);
        }
        Self::with_command(command, temp_dir, augmenter)
    }

    /// 使用自定义启动命令，文件路径作为最后一个参数追加
    pub fn with_command(
        command: ToolCommand,
        temp_dir: PathBuf,
        augmenter: Arc<ExplanationAugmenter>,
    ) -> Self {
        Self {
            command,
            temp_dir,
            timeout: None,
            augmenter,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl AnalysisStrategy for PythonStrategy {
    fn name(&self) -> &str {
        TOOL
    }

    fn language(&self) -> Language {
        Language::Python
    }

    async fn analyze(&self, code: &str) -> Result<AnalysisResult, AnalysisError> {
        let extension = Language::Python.source_extension();
        let source = match TempArtifact::create(&self.temp_dir, "code", extension, code).await {
            Ok(source) => source,
            Err(e) => {
                tracing::error!("{}", e);
                return Ok(AnalysisResult::from_error(&e));
            }
        };

        let run = run_tool(TOOL, &self.command, &[source.path_str()], self.timeout).await;
        // 先清理再解释输出
        drop(source);

        let output = match run {
            Ok(output) => output,
            Err(e @ AnalysisError::Spawn { .. }) => return Err(e),
            Err(e) => return Ok(AnalysisResult::from_error(&e)),
        };

        if output.indicates_missing_tool() {
            let error = AnalysisError::tool_unavailable(TOOL, INSTALL_HINT);
            tracing::warn!("{}", error);
            return Ok(AnalysisResult::from_error(&error));
        }

        if !output.stderr.trim().is_empty() && output.stdout.trim().is_empty() {
            tracing::warn!("pylint exited with {:?} and only wrote to stderr", output.exit_code);
            return Ok(AnalysisResult::failure(output.stderr.trim())
                .with_error_kind(ErrorCategory::ToolExecution));
        }

        let diagnostics = match parse_pylint_json(&output.stdout) {
            Ok(diagnostics) => diagnostics,
            Err(e) => {
                let error = AnalysisError::tool_execution(TOOL, e.to_string(), output.stdout, output.stderr);
                tracing::error!("{}", error);
                return Ok(AnalysisResult::from_error(&error));
            }
        };
        tracing::debug!("pylint reported {} diagnostic(s)", diagnostics.len());

        let insight = if diagnostics.is_empty() {
            None
        } else {
            Some(
                self.augmenter
                    .augment(ExplanationRequest {
                        code,
                        language: Language::Python,
                        diagnostics: &diagnostics,
                    })
                    .await,
            )
        };

        let result = AnalysisResult::completed(diagnostics, code);
        Ok(match insight {
            Some(insight) => result.with_insight(insight),
            None => result,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::testing::CountingProvider;
    use crate::ai::ProviderConfig;
    use crate::analysis::result::Severity;

    const PYLINT_JSON: &str = r#"[{"type": "error", "line": 2, "column": 4, "symbol": "undefined-variable", "message": "Undefined variable y", "message-id": "E0602"}]"#;

    fn fake_tool(script: &str) -> ToolCommand {
        ToolCommand::new("sh").with_args(["-c".to_string(), script.to_string(), "sh".to_string()])
    }

    fn entries(dir: &std::path::Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    fn strategy(script: &str, dir: &std::path::Path, provider: Arc<CountingProvider>) -> PythonStrategy {
        let augmenter = ExplanationAugmenter::new("mock", provider, ProviderConfig::default());
        PythonStrategy::with_command(fake_tool(script), dir.to_path_buf(), Arc::new(augmenter))
    }

    #[tokio::test]
    async fn test_json_output_is_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(CountingProvider::replying("plain words"));
        let script = format!("test -f \"$1\" || exit 9; printf '%s' '{}'; exit 2", PYLINT_JSON);
        let strategy = strategy(&script, dir.path(), provider.clone());

        let result = strategy.analyze("print(1)\nprint(y)\n").await.unwrap();
        assert!(result.success);
        let diagnostics: Vec<_> = result.diagnostics().collect();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Error);
        assert_eq!(diagnostics[0].rule_id.as_deref(), Some("undefined-variable"));
        assert_eq!(result.fixed_code.as_deref(), Some("print(1)\nprint(y)\n"));
        assert_eq!(result.ai_explanation.as_deref(), Some("plain words"));
        assert_eq!(provider.calls(), 1);
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_temp_file_contains_code() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(CountingProvider::failing());
        let strategy = strategy("grep -q 'marker' \"$1\" && printf '[]'", dir.path(), provider.clone());

        let result = strategy.analyze("marker = 1\n").await.unwrap();
        assert!(result.success);
        assert_eq!(result.diagnostic_count(), 0);
        assert_eq!(provider.calls(), 0);
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_missing_pylint_short_circuits() {
        let dir = tempfile::tempdir().unwrap();
        let strategy = strategy(
            "echo '/usr/bin/python3: No module named pylint' >&2; exit 1",
            dir.path(),
            Arc::new(CountingProvider::failing()),
        );

        let result = strategy.analyze("x = 1").await.unwrap();
        assert!(!result.success);
        let error = result.error.unwrap();
        assert!(error.contains("pylint is not installed"));
        assert!(error.contains("pip install pylint"));
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_stderr_only_is_failure() {
        let dir = tempfile::tempdir().unwrap();
        let strategy = strategy(
            "echo 'usage error: bad option' >&2; exit 32",
            dir.path(),
            Arc::new(CountingProvider::failing()),
        );

        let result = strategy.analyze("x = 1").await.unwrap();
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("usage error: bad option"));
        assert_eq!(result.error_kind, Some(ErrorCategory::ToolExecution));
    }

    #[tokio::test]
    async fn test_malformed_json_attaches_raw_output() {
        let dir = tempfile::tempdir().unwrap();
        let strategy = strategy(
            "echo '************* Module code'; echo 'warn' >&2",
            dir.path(),
            Arc::new(CountingProvider::failing()),
        );

        let result = strategy.analyze("x = 1").await.unwrap();
        assert!(!result.success);
        let details = result.details.unwrap();
        assert!(details.contains("************* Module code"));
        assert!(details.contains("warn"));
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_spawn_failure_is_rejected_after_cleanup() {
        let dir = tempfile::tempdir().unwrap();
        let augmenter = Arc::new(ExplanationAugmenter::disabled());
        let strategy = PythonStrategy::new(
            "ai-lint-no-such-python",
            None,
            dir.path().to_path_buf(),
            augmenter,
        );

        let error = strategy.analyze("x = 1").await.unwrap_err();
        assert!(matches!(error, AnalysisError::Spawn { .. }));
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_unwritable_temp_dir_is_resource_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let strategy = strategy("printf '[]'", &missing, Arc::new(CountingProvider::failing()));

        let result = strategy.analyze("x = 1").await.unwrap();
        assert!(!result.success);
        assert!(result.error.unwrap().contains("temporary file"));
    }

    #[test]
    fn test_command_line() {
        let strategy = PythonStrategy::new(
            "python3",
            Some(PathBuf::from("/etc/pylintrc")),
            PathBuf::from("/tmp"),
            Arc::new(ExplanationAugmenter::disabled()),
        );
        assert_eq!(
            strategy.command.display_with(&[]),
            "python3 -m pylint --output-format=json --rcfile=/etc/pylintrc"
        );
    }
}
