use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::ai::{ExplanationAugmenter, ExplanationRequest};
use crate::analysis::gcc_output::parse_compiler_output;
use crate::analysis::process::{run_tool, ToolCommand};
use crate::analysis::result::AnalysisResult;
use crate::analysis::temp::TempArtifact;
use crate::analysis::AnalysisStrategy;
use crate::infrastructure::error::AnalysisError;
use crate::languages::Language;

const TOOL: &str = "g++";
const INSTALL_HINT: &str = "Install a C++ compiler (for example `apt install g++`) and try again.";

/// 通过编译器子进程分析 C/C++，从 stderr 中提取诊断
///
/// 只编译不运行，编译产物随即删除；从不自动修复。
pub struct CFamilyStrategy {
    command: ToolCommand,
    temp_dir: PathBuf,
    timeout: Option<Duration>,
    augmenter: Arc<ExplanationAugmenter>,
}

impl CFamilyStrategy {
    /// `<cxx> -std=<standard> -Wall -Wextra <src> -o <out>`
    pub fn new(
        cxx: &str,
        standard: &str,
        temp_dir: PathBuf,
        augmenter: Arc<ExplanationAugmenter>,
    ) -> Self {
        let command = ToolCommand::new(cxx).with_args([
            format!("-std={}", standard),
            "-Wall".to_string(),
            "-Wextra".to_string(),
        ]);
        Self::with_command(command, temp_dir, augmenter)
    }

    /// 使用自定义启动命令，追加 `<src> -o <out>`
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
impl AnalysisStrategy for CFamilyStrategy {
    fn name(&self) -> &str {
        TOOL
    }

    fn language(&self) -> Language {
        Language::CFamily
    }

    async fn analyze(&self, code: &str) -> Result<AnalysisResult, AnalysisError> {
        let extension = Language::CFamily.source_extension();
        let source = match TempArtifact::create(&self.temp_dir, "code", extension, code).await {
            Ok(source) => source,
            Err(e) => {
                tracing::error!("{}", e);
                return Ok(AnalysisResult::from_error(&e));
            }
        };
        // 编译产物由编译器写入，编译失败时不存在
        let binary = TempArtifact::reserve(&self.temp_dir, "code", None);

        let args = [source.path_str(), "-o".to_string(), binary.path_str()];
        let run = run_tool(TOOL, &self.command, &args, self.timeout).await;
        drop(source);
        drop(binary);

        let output = match run {
            Ok(output) => output,
            Err(e @ AnalysisError::Spawn { .. }) => return Err(e),
            Err(e) => return Ok(AnalysisResult::from_error(&e)),
        };

        let diagnostics = parse_compiler_output(&output.stderr);
        // 已经解析出诊断说明编译器确实运行过
        if diagnostics.is_empty() && output.indicates_missing_tool() {
            let error = AnalysisError::tool_unavailable(TOOL, INSTALL_HINT);
            tracing::warn!("{}", error);
            return Ok(AnalysisResult::from_error(&error));
        }

        let failed = !output.success();
        tracing::debug!(
            "g++ exited with {:?}, {} diagnostic(s)",
            output.exit_code,
            diagnostics.len()
        );

        let insight = if diagnostics.is_empty() && !failed {
            None
        } else {
            Some(
                self.augmenter
                    .augment(ExplanationRequest {
                        code,
                        language: Language::CFamily,
                        diagnostics: &diagnostics,
                    })
                    .await,
            )
        };

        let unexplained_failure = failed && diagnostics.is_empty();
        let mut result = AnalysisResult::completed(diagnostics, code);
        if unexplained_failure {
            // 编译失败却没有可识别的诊断，保留原始输出便于排查
            tracing::warn!("g++ failed without recognizable diagnostics");
            result = result.with_details(format!(
                "exit code: {:?}\nstderr:\n{}",
                output.exit_code, output.stderr
            ));
        }

        Ok(match insight {
            Some(insight) => result.with_insight(insight),
            None => result,
        })
    }
}
