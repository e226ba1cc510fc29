use std::process::Stdio;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::infrastructure::error::AnalysisError;

/// shell / 解释器 / 加载器报告“工具未安装”的整行特征
///
/// 每个分支都锚定到行首和行尾。编译器回显的源码行以空白或 `|` 开头，
/// 源码里出现的同样字句不会被误判。
static MISSING_TOOL_SIGNATURE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?mi)^(?:[^\s|][^|]*: (?:command )?not found|\S+: command not found: \S+|\S*: no module named \S+|'[^']+' is not recognized as an internal or external command.*|[^\s|][^|]*: executable file not found in .*)\s*$",
    )
    .unwrap()
});

/// 外部工具的启动命令（程序 + 固定前置参数）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// 用于日志的命令行展示
    pub fn display_with(&self, extra_args: &[String]) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .chain(extra_args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// 子进程运行结束后收集到的完整输出
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// stderr 是否显示工具本身未安装
    pub fn indicates_missing_tool(&self) -> bool {
        looks_like_missing_tool(&self.stderr)
    }
}

pub fn looks_like_missing_tool(stderr: &str) -> bool {
    !stderr.trim().is_empty() && MISSING_TOOL_SIGNATURE.is_match(stderr)
}

/// 启动外部工具并等待其退出，完整收集 stdout / stderr
///
/// 进程无法启动时返回 `AnalysisError::Spawn`；配置了超时且超时时子进程被杀死，
/// 返回 `AnalysisError::Timeout`。
pub async fn run_tool(
    tool: &str,
    command: &ToolCommand,
    extra_args: &[String],
    timeout: Option<Duration>,
) -> Result<ToolOutput, AnalysisError> {
    tracing::debug!("Spawning {}: {}", tool, command.display_with(extra_args));

    let child = tokio::process::Command::new(&command.program)
        .args(&command.args)
        .args(extra_args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| AnalysisError::spawn(tool, e))?;

    let output = match timeout {
        Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!("{} timed out after {:?}", tool, limit);
                return Err(AnalysisError::Timeout {
                    tool: tool.to_string(),
                    seconds: limit.as_secs(),
                });
            }
        },
        None => child.wait_with_output().await,
    }
    .map_err(|e| AnalysisError::spawn(tool, e))?;

    let result = ToolOutput {
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };

    tracing::debug!(
        "{} exited with {:?} ({} bytes stdout, {} bytes stderr)",
        tool,
        result.exit_code,
        result.stdout.len(),
        result.stderr.len()
    );

    Ok(result)
}
