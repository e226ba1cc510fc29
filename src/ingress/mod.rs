//! 入口适配：把上传文件或粘贴的代码解析为 (代码, 语言标签)。

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::analysis::process::{run_tool, ToolCommand};
use crate::analysis::temp::TempArtifact;
use crate::config::Config;
use crate::infrastructure::error::AnalysisError;
use crate::languages::Language;

/// 上传的文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// 按声明的 Content-Type 或文件名判断是否为图片
    pub fn is_image(&self) -> bool {
        if let Some(content_type) = &self.content_type {
            if let Ok(mime) = content_type.parse::<mime_guess::mime::Mime>() {
                return mime.type_() == mime_guess::mime::IMAGE;
            }
        }
        mime_guess::from_path(&self.file_name)
            .first()
            .map(|mime| mime.type_() == mime_guess::mime::IMAGE)
            .unwrap_or(false)
    }

    fn extension(&self) -> String {
        std::path::Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .unwrap_or_else(|| "img".to_string())
    }
}

/// 一次请求的原始输入
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceInput {
    pub uploaded: Option<UploadedFile>,
    pub code: Option<String>,
    pub language: Option<String>,
}

/// 交给分发器的 (代码, 语言标签)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSource {
    pub code: String,
    pub language: String,
    /// 语言标签是默认值而不是识别或声明得到的
    pub language_fallback: bool,
}

/// 从图片中提取文本的能力
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_text(&self, image: &UploadedFile) -> Result<String, AnalysisError>;
}

/// 调用 `tesseract <image> stdout` 的 OCR 实现
pub struct TesseractExtractor {
    command: ToolCommand,
    temp_dir: PathBuf,
    timeout: Option<Duration>,
}

impl TesseractExtractor {
    pub fn new(command: ToolCommand, temp_dir: PathBuf) -> Self {
        Self {
            command,
            temp_dir,
            timeout: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(ToolCommand::new(&config.tesseract), config.temp_dir.clone())
            .with_timeout(config.tool_timeout())
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl TextExtractor for TesseractExtractor {
    async fn extract_text(&self, image: &UploadedFile) -> Result<String, AnalysisError> {
        let artifact = TempArtifact::create(&self.temp_dir, "ocr", &image.extension(), &image.bytes).await?;
        let args = [artifact.path_str(), "stdout".to_string()];
        let run = run_tool("tesseract", &self.command, &args, self.timeout).await;
        drop(artifact);

        let output = run?;
        if output.indicates_missing_tool() {
            return Err(AnalysisError::tool_unavailable(
                "tesseract",
                "Install tesseract-ocr to analyze images of code.",
            ));
        }
        if !output.success() {
            return Err(AnalysisError::tool_execution(
                "tesseract",
                format!("exited with {:?}", output.exit_code),
                output.stdout,
                output.stderr,
            ));
        }
        Ok(output.stdout)
    }
}

/// 入口适配器
#[derive(Default)]
pub struct IngressAdapter {
    extractor: Option<Arc<dyn TextExtractor>>,
}

impl IngressAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// 有上传文件时按扩展名识别语言（图片走 OCR，语言取声明值）；
    /// 否则使用粘贴的代码和声明的语言。未声明时默认 javascript。
    pub async fn resolve(&self, input: SourceInput) -> Result<ResolvedSource, AnalysisError> {
        let declared = input
            .language
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty());

        let resolved = match input.uploaded {
            Some(file) if file.is_image() => {
                let extractor = self.extractor.as_ref().ok_or_else(|| {
                    AnalysisError::input(format!(
                        "{} is an image but no text extractor is configured",
                        file.file_name
                    ))
                })?;
                tracing::debug!("Extracting code from image {}", file.file_name);
                let code = extractor.extract_text(&file).await?;
                with_declared_language(code, declared)
            }
            Some(file) => {
                let code = String::from_utf8(file.bytes).map_err(|_| {
                    AnalysisError::input(format!("{} is not valid UTF-8 text", file.file_name))
                })?;
                match Language::from_file_path(&file.file_name) {
                    Some(language) => ResolvedSource {
                        code,
                        language: language.as_str().to_string(),
                        language_fallback: false,
                    },
                    None => {
                        tracing::warn!(
                            "Unrecognized extension for {}, falling back to {}",
                            file.file_name,
                            Language::DEFAULT_TAG
                        );
                        ResolvedSource {
                            code,
                            language: Language::DEFAULT_TAG.to_string(),
                            language_fallback: true,
                        }
                    }
                }
            }
            None => with_declared_language(input.code.unwrap_or_default(), declared),
        };

        if resolved.code.trim().is_empty() {
            return Err(AnalysisError::input("no code provided"));
        }
        Ok(resolved)
    }
}

fn with_declared_language(code: String, declared: Option<String>) -> ResolvedSource {
    match declared {
        Some(language) => ResolvedSource {
            code,
            language,
            language_fallback: false,
        },
        None => ResolvedSource {
            code,
            language: Language::DEFAULT_TAG.to_string(),
            language_fallback: true,
        },
    }
}
