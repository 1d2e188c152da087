//! 输出写入服务 - 业务能力层
//!
//! 只负责把格式化结果写成 JSON 文件，不关心流程

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{AppError, AppResult, FileError};
use crate::services::output_formatter::FormattedOutput;

/// 输出写入服务
pub struct OutputWriter {
    output_path: PathBuf,
}

impl OutputWriter {
    /// 使用带时间戳的默认文件名 `generated_questions_{YYYYmmdd_HHMMSS}.json`
    pub fn new() -> Self {
        Self {
            output_path: PathBuf::from(default_output_file_name()),
        }
    }

    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: path.into(),
        }
    }

    /// 根据可选配置创建：未配置时使用默认文件名
    pub fn from_option(path: Option<&str>) -> Self {
        match path {
            Some(p) if !p.trim().is_empty() => Self::with_path(p),
            _ => Self::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.output_path
    }

    /// 写入格式化结果（缩进 2 格，保留中文字符）
    pub async fn write(&self, output: &FormattedOutput) -> AppResult<()> {
        let json = serde_json::to_string_pretty(output).map_err(FileError::from)?;
        debug!("写入输出文件: {} ({} 字节)", self.output_path.display(), json.len());

        tokio::fs::write(&self.output_path, json)
            .await
            .map_err(|e| AppError::file_write_failed(self.output_path.display().to_string(), e))?;

        info!("💾 结果已保存到文件: {}", self.output_path.display());
        Ok(())
    }
}

impl Default for OutputWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// 默认输出文件名
pub fn default_output_file_name() -> String {
    format!(
        "generated_questions_{}.json",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QuestionSet;
    use crate::services::output_formatter::format_output;
    use crate::services::question_generator::GenerationReport;

    #[test]
    fn test_default_file_name() {
        let name = default_output_file_name();
        assert!(name.starts_with("generated_questions_"));
        assert!(name.ends_with(".json"));
        assert_eq!(name.len(), "generated_questions_20240101_120000.json".len());
    }

    #[test]
    fn test_from_option() {
        assert_eq!(
            OutputWriter::from_option(Some("out.json")).path(),
            Path::new("out.json")
        );
        assert!(OutputWriter::from_option(Some("  "))
            .path()
            .to_string_lossy()
            .starts_with("generated_questions_"));
    }

    #[tokio::test]
    async fn test_write_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("questions.json");
        let output = format_output(
            Some(&QuestionSet::new("文档")),
            &["主题".to_string()],
            &["知识点".to_string()],
            &GenerationReport::default(),
        )
        .unwrap();

        let writer = OutputWriter::with_path(&path);
        writer.write(&output).await.unwrap();

        let written = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(written.contains("\n  \"metadata\""));
        assert!(written.contains("\"document_title\": \"文档\""));

        let parsed: FormattedOutput = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, output);
    }
}
