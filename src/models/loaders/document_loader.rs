use crate::error::{AppResult, InputError};
use crate::models::document::Document;
use serde_json::{Map, Value};
use std::path::Path;
use tokio::fs;

/// 从文件加载文档
///
/// 标题取文件名（不含扩展名），来源为文件路径。
pub async fn load_document_from_file(file_path: &Path) -> AppResult<Document> {
    let content = fs::read_to_string(file_path)
        .await
        .map_err(|source| InputError::FileReadFailed {
            path: file_path.display().to_string(),
            source,
        })?;

    let title = file_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "未命名文档".to_string());

    let mut metadata = Map::new();
    metadata.insert(
        "file_path".to_string(),
        Value::from(file_path.display().to_string()),
    );
    metadata.insert(
        "file_size".to_string(),
        Value::from(content.chars().count()),
    );

    tracing::info!(
        "正在加载: {}",
        file_path.file_name().unwrap_or_default().to_string_lossy()
    );

    Ok(Document {
        title,
        content,
        source: file_path.display().to_string(),
        metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[tokio::test]
    async fn test_load_document_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("光合作用.md");
        std::fs::write(&path, "# 光合作用\n\n植物利用光能合成有机物。").unwrap();

        let doc = load_document_from_file(&path).await.unwrap();
        assert_eq!(doc.title, "光合作用");
        assert!(doc.content.contains("植物利用光能"));
        assert_eq!(doc.source, path.display().to_string());
        assert!(doc.metadata.contains_key("file_path"));
        assert!(doc.metadata.contains_key("file_size"));
    }

    #[tokio::test]
    async fn test_missing_file_is_input_error() {
        let result = load_document_from_file(Path::new("/definitely/not/here.md")).await;
        assert!(matches!(
            result,
            Err(AppError::Input(InputError::FileReadFailed { .. }))
        ));
    }
}
