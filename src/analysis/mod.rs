//! 多语言分析流水线：按语言选择策略，驱动进程内检查器或外部工具，
//! 把各自的输出归一化为同一种诊断结构。

pub mod dispatcher;
pub mod gcc_output;
pub mod knowledge;
pub mod process;
pub mod pylint_output;
pub mod result;
pub mod strategies;
pub mod temp;

use async_trait::async_trait;

use crate::infrastructure::error::AnalysisError;
use crate::languages::Language;

pub use dispatcher::Analyzer;
pub use result::{AiInsight, AnalysisResult, Diagnostic, FileDiagnostics, Severity};
pub use strategies::{CFamilyStrategy, JavaScriptStrategy, PythonStrategy};

/// 单一语言的分析策略
///
/// 分析完成（即使代码有错误）返回 `Ok`，`success` 只表示分析是否跑完。
/// 外部工具无法启动时返回 `Err`。
#[async_trait]
pub trait AnalysisStrategy: Send + Sync {
    fn name(&self) -> &str;
    fn language(&self) -> Language;
    async fn analyze(&self, code: &str) -> Result<AnalysisResult, AnalysisError>;
}
