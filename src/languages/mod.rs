use serde::{Deserialize, Serialize};
use std::fmt;

/// 支持分析的编程语言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    JavaScript,
    Python,
    /// C / C++，统一交给 C++ 编译器处理
    #[serde(rename = "cpp")]
    CFamily,
}

impl Language {
    /// 未指定或无法识别扩展名时使用的默认语言标签
    pub const DEFAULT_TAG: &'static str = "javascript";

    /// 解析语言标签（不区分大小写）
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_lowercase().as_str() {
            "javascript" | "js" | "node" => Some(Language::JavaScript),
            "python" | "py" | "python3" => Some(Language::Python),
            "cpp" | "c++" | "cxx" | "cc" | "c" | "c-family" => Some(Language::CFamily),
            _ => None,
        }
    }

    /// 根据文件扩展名识别语言
    pub fn from_file_path(path: &str) -> Option<Self> {
        let extension = std::path::Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "js" | "mjs" | "cjs" => Some(Language::JavaScript),
            "py" => Some(Language::Python),
            "cpp" | "cxx" | "cc" | "c" | "h" | "hpp" => Some(Language::CFamily),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::JavaScript => "javascript",
            Language::Python => "python",
            Language::CFamily => "cpp",
        }
    }

    /// 写入临时文件时使用的扩展名
    pub fn source_extension(&self) -> &'static str {
        match self {
            Language::JavaScript => "js",
            Language::Python => "py",
            Language::CFamily => "cpp",
        }
    }

    pub fn all() -> [Language; 3] {
        [Language::JavaScript, Language::Python, Language::CFamily]
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
