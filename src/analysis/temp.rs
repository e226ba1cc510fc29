use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::infrastructure::error::AnalysisError;

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// 为外部工具准备的临时文件
///
/// 由创建它的分析调用独占，离开作用域时无条件删除。删除失败只记录日志，
/// 不会覆盖分析结果。
#[derive(Debug)]
pub struct TempArtifact {
    path: PathBuf,
    /// 产物可能不存在（例如编译失败时的输出文件），不存在时静默忽略
    optional: bool,
}

impl TempArtifact {
    /// 生成一个唯一路径但不创建文件，用于编译器输出等由工具自行写入的产物
    pub fn reserve(dir: &Path, prefix: &str, extension: Option<&str>) -> Self {
        Self {
            path: unique_path(dir, prefix, extension),
            optional: true,
        }
    }

    /// 创建临时文件并写入内容
    pub async fn create(
        dir: &Path,
        prefix: &str,
        extension: &str,
        contents: impl AsRef<[u8]>,
    ) -> Result<Self, AnalysisError> {
        let path = unique_path(dir, prefix, Some(extension));

        // 先持有守卫，写入中途失败时也能清理残留
        let mut artifact = Self {
            path,
            optional: true,
        };

        tokio::fs::write(&artifact.path, contents.as_ref())
            .await
            .map_err(|e| {
                AnalysisError::resource_setup(
                    e.to_string(),
                    Some(artifact.path.display().to_string()),
                )
            })?;

        artifact.optional = false;
        Ok(artifact)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn path_str(&self) -> String {
        self.path.display().to_string()
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        release(&self.path, self.optional);
    }
}

/// 集中处理清理策略：删除失败只记录日志
pub fn release(path: &Path, optional: bool) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::trace!("Removed temporary file {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && optional => {}
        Err(e) => tracing::warn!("Failed to remove temporary file {}: {}", path.display(), e),
    }
}

/// 基于高精度时间戳与进程内序号生成唯一文件名
fn unique_path(dir: &Path, prefix: &str, extension: Option<&str>) -> PathBuf {
    let nanos = chrono::Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_default();
    let sequence = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let stem = format!("{}_{}_{}_{}", prefix, std::process::id(), nanos, sequence);

    match extension {
        Some(ext) => dir.join(format!("{}.{}", stem, ext)),
        None => dir.join(stem),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn test_create_writes_and_drop_removes() {
        let dir = tempfile::tempdir().unwrap();
        let path = {
            let artifact = TempArtifact::create(dir.path(), "code", "py", "print(1)\n")
                .await
                .unwrap();
            assert!(artifact.exists());
            assert_eq!(std::fs::read_to_string(artifact.path()).unwrap(), "print(1)\n");
            artifact.path().to_path_buf()
        };
        assert!(!path.exists());
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_reserved_path_missing_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = TempArtifact::reserve(dir.path(), "out", None);
        assert!(!artifact.exists());
        drop(artifact);
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_reserved_path_is_removed_when_written() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = TempArtifact::reserve(dir.path(), "out", Some("bin"));
        std::fs::write(artifact.path(), b"binary").unwrap();
        drop(artifact);
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_paths_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let a = TempArtifact::create(dir.path(), "code", "cpp", "").await.unwrap();
        let b = TempArtifact::create(dir.path(), "code", "cpp", "").await.unwrap();
        assert_ne!(a.path(), b.path());
        assert!(a.path_str().ends_with(".cpp"));
    }

    #[tokio::test]
    async fn test_create_in_missing_directory_is_resource_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        let error = TempArtifact::create(&missing, "code", "py", "x = 1")
            .await
            .unwrap_err();
        assert!(matches!(error, AnalysisError::ResourceSetup { .. }));
        assert_eq!(entries(dir.path()), 0);
    }
}
