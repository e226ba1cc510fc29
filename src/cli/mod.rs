pub mod args;

use std::path::Path;

use tokio::io::AsyncReadExt;

use crate::ingress::{SourceInput, UploadedFile};

use args::Args;

/// 按 `--file` / `--code` / 标准输入 的顺序收集原始输入
pub async fn read_input(args: &Args) -> anyhow::Result<SourceInput> {
    let mut input = SourceInput {
        language: args.language.clone(),
        ..SourceInput::default()
    };

    if let Some(path) = &args.file {
        input.uploaded = Some(read_upload(path).await?);
    } else if let Some(code) = &args.code {
        input.code = Some(code.clone());
    } else {
        let mut code = String::new();
        tokio::io::stdin().read_to_string(&mut code).await?;
        input.code = Some(code);
    }

    Ok(input)
}

async fn read_upload(path: &Path) -> anyhow::Result<UploadedFile> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(UploadedFile::new(file_name, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_input_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.py");
        std::fs::write(&path, "print(1)\n").unwrap();

        let args = Args {
            file: Some(path),
            language: Some("cpp".to_string()),
            ..Default::default()
        };
        let input = read_input(&args).await.unwrap();
        let uploaded = input.uploaded.unwrap();
        assert_eq!(uploaded.file_name, "main.py");
        assert_eq!(uploaded.bytes, b"print(1)\n");
        assert_eq!(input.language.as_deref(), Some("cpp"));
        assert!(input.code.is_none());
    }

    #[tokio::test]
    async fn test_read_input_from_code_flag() {
        let args = Args {
            code: Some("let x = 5".to_string()),
            ..Default::default()
        };
        let input = read_input(&args).await.unwrap();
        assert_eq!(input.code.as_deref(), Some("let x = 5"));
        assert!(input.uploaded.is_none());
    }

    #[tokio::test]
    async fn test_missing_file_is_error() {
        let args = Args {
            file: Some("/definitely/not/here.js".into()),
            ..Default::default()
        };
        assert!(read_input(&args).await.is_err());
    }
}
