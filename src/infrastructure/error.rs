use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 分析流水线错误类型
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("unsupported language: {tag}")]
    UnsupportedLanguage { tag: String },

    #[error("{tool} is not installed. {hint}")]
    ToolUnavailable { tool: String, hint: String },

    #[error("{tool} output could not be interpreted: {message}")]
    ToolExecution {
        tool: String,
        message: String,
        stdout: String,
        stderr: String,
    },

    #[error("failed to prepare temporary file: {message}")]
    ResourceSetup { message: String, path: Option<String> },

    #[error("failed to start {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} did not finish within {seconds}s")]
    Timeout { tool: String, seconds: u64 },

    #[error("linter failed: {message}")]
    Linter { message: String },

    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("invalid input: {message}")]
    Input { message: String },
}

/// 错误类别，对应分析流程中的失败种类
///
/// 随失败结果一起输出（`errorKind`），调用方据此区分“需要安装工具”与“工具运行出错”。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCategory {
    Input,
    ToolUnavailable,
    ToolExecution,
    ResourceSetup,
    Configuration,
}

impl ErrorCategory {
    pub fn label(&self) -> &'static str {
        match self {
            ErrorCategory::Input => "invalid input",
            ErrorCategory::ToolUnavailable => "tool unavailable",
            ErrorCategory::ToolExecution => "tool execution failed",
            ErrorCategory::ResourceSetup => "resource setup failed",
            ErrorCategory::Configuration => "configuration",
        }
    }
}

impl AnalysisError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AnalysisError::UnsupportedLanguage { .. } => ErrorCategory::Input,
            AnalysisError::Input { .. } => ErrorCategory::Input,
            AnalysisError::ToolUnavailable { .. } => ErrorCategory::ToolUnavailable,
            AnalysisError::Spawn { .. } => ErrorCategory::ToolUnavailable,
            AnalysisError::ToolExecution { .. } => ErrorCategory::ToolExecution,
            AnalysisError::Timeout { .. } => ErrorCategory::ToolExecution,
            AnalysisError::Linter { .. } => ErrorCategory::ToolExecution,
            AnalysisError::ResourceSetup { .. } => ErrorCategory::ResourceSetup,
            AnalysisError::Configuration { .. } => ErrorCategory::Configuration,
        }
    }

    /// 外部工具缺失（二进制不存在或 stderr 显示未安装）
    pub fn is_tool_missing(&self) -> bool {
        match self {
            AnalysisError::ToolUnavailable { .. } => true,
            AnalysisError::Spawn { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }

    pub fn unsupported_language(tag: impl Into<String>) -> Self {
        AnalysisError::UnsupportedLanguage { tag: tag.into() }
    }

    pub fn tool_unavailable(tool: impl Into<String>, hint: impl Into<String>) -> Self {
        AnalysisError::ToolUnavailable {
            tool: tool.into(),
            hint: hint.into(),
        }
    }

    pub fn tool_execution(
        tool: impl Into<String>,
        message: impl Into<String>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        AnalysisError::ToolExecution {
            tool: tool.into(),
            message: message.into(),
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    pub fn resource_setup(message: impl Into<String>, path: Option<String>) -> Self {
        AnalysisError::ResourceSetup {
            message: message.into(),
            path,
        }
    }

    pub fn spawn(tool: impl Into<String>, source: std::io::Error) -> Self {
        AnalysisError::Spawn {
            tool: tool.into(),
            source,
        }
    }

    pub fn linter(message: impl Into<String>) -> Self {
        AnalysisError::Linter {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        AnalysisError::Configuration {
            message: message.into(),
        }
    }

    pub fn input(message: impl Into<String>) -> Self {
        AnalysisError::Input {
            message: message.into(),
        }
    }

    /// 附带给调用方用于排查的原始工具输出
    pub fn details(&self) -> Option<String> {
        match self {
            AnalysisError::ToolExecution { stdout, stderr, .. } => {
                Some(format!("stdout:\n{}\nstderr:\n{}", stdout, stderr))
            }
            AnalysisError::ResourceSetup { path: Some(path), .. } => Some(path.clone()),
            _ => None,
        }
    }
}
