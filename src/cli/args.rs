use std::path::PathBuf;

use clap::Parser;

use crate::report::ReportFormat;

#[derive(Parser, Debug, Default)]
#[command(
    name = "ai-lint",
    version,
    about = "多语言代码分析 - JavaScript / Python / C++ 诊断、自动修复与 AI 解释",
    long_about = "ai-lint 对一段代码运行对应语言的分析工具（内置 JavaScript 检查器、pylint、g++），输出统一格式的诊断、自动修复后的代码以及可选的 AI 解释。未提供 --file / --code 时从标准输入读取代码。"
)]
pub struct Args {
    /// 要分析的文件（按扩展名识别语言，图片走 OCR）
    #[arg(short = 'f', long, value_name = "PATH", conflicts_with = "code")]
    pub file: Option<PathBuf>,

    /// 直接传入代码文本
    #[arg(short = 'c', long, value_name = "TEXT")]
    pub code: Option<String>,

    /// 语言标签（javascript, python, cpp），默认 javascript
    #[arg(short = 'l', long, value_name = "TAG")]
    pub language: Option<String>,

    /// 输出格式
    #[arg(long, value_enum, default_value_t = ReportFormat::Json)]
    pub format: ReportFormat,

    /// 关闭 AI 解释
    #[arg(long = "no-ai", default_value_t = false)]
    pub no_ai: bool,

    /// AI provider to use (openai, deepseek, claude, gemini, ollama)
    #[arg(short = 'P', long, default_value = "")] // 空字符串表示未指定
    pub provider: String,

    /// Model to use (默认取提供商的默认模型)
    #[arg(short, long, default_value = "")] // 空字符串表示未指定
    pub model: String,

    /// 输出调试日志
    #[arg(short, long, default_value_t = false)]
    pub debug: bool,
}
