/// 日志工具模块
///
/// 提供日志初始化、运行日志文件以及格式化输出的辅助函数
use std::io::Write;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::QuestionType;
use crate::services::output_formatter::FormattedOutput;
use crate::services::question_generator::GenerationStatus;

/// 初始化 tracing
///
/// 优先使用 `RUST_LOG`，否则默认 `info`（详细模式下为 `debug`）。重复调用不会报错。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> AppResult<()> {
    let log_header = format!(
        "{}\n题目生成日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    std::fs::write(log_file_path, log_header)
        .map_err(|e| AppError::file_write_failed(log_file_path, e))?;
    Ok(())
}

/// 向日志文件追加内容
pub fn append_log(log_file_path: &str, content: &str) -> AppResult<()> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)
        .map_err(|e| AppError::file_write_failed(log_file_path, e))?;
    writeln!(file, "{}", content).map_err(|e| AppError::file_write_failed(log_file_path, e))?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 题目生成模式");
    info!("🤖 主模型: {}", config.primary_model);
    info!("🤖 备选模型: {}", config.backup_model);
    info!("📊 每种题型最多知识点数: {}", config.max_questions_per_type);
    if config.placeholder_on_failure {
        info!("💡 已开启占位题兜底");
    }
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `output`: 格式化结果
/// - `output_file`: 输出文件路径
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(output: &FormattedOutput, output_file: &str, log_file_path: &str) {
    let stats = &output.metadata.statistics;
    let validation = &output.metadata.validation;

    info!("\n{}", "=".repeat(60));
    info!("📊 题目生成完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("📄 文档: {}", output.metadata.document_title);
    info!("✅ 题目总数: {}", stats.total_questions);
    for question_type in QuestionType::ALL {
        info!(
            "   {}: {}",
            question_type.label(),
            describe_status(output.metadata.generation.get(question_type))
        );
    }
    info!(
        "🔎 质量分数: {:.2} ({})",
        validation.quality_score,
        if validation.valid { "通过" } else { "未通过" }
    );
    for issue in &validation.issues {
        info!("   ⚠️  {}", issue);
    }
    info!("{}", "=".repeat(60));
    info!("\n结果已保存至: {}", output_file);
    info!("日志已保存至: {}", log_file_path);
}

/// 单个题型生成状态的简短描述
pub fn describe_status(status: &GenerationStatus) -> String {
    match status {
        GenerationStatus::Pending => "未运行".to_string(),
        GenerationStatus::Generated { count, dropped: 0 } => format!("{} 道", count),
        GenerationStatus::Generated { count, dropped } => {
            format!("{} 道（丢弃 {} 条）", count, dropped)
        }
        GenerationStatus::Fallback { reason } => format!("占位题（{}）", reason),
        GenerationStatus::Failed { reason } => format!("失败（{}）", reason),
        GenerationStatus::Skipped => "已跳过".to_string(),
    }
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_status() {
        assert_eq!(
            describe_status(&GenerationStatus::Generated { count: 3, dropped: 0 }),
            "3 道"
        );
        assert_eq!(
            describe_status(&GenerationStatus::Generated { count: 2, dropped: 1 }),
            "2 道（丢弃 1 条）"
        );
        assert_eq!(describe_status(&GenerationStatus::Skipped), "已跳过");
        assert_eq!(describe_status(&GenerationStatus::default()), "未运行");
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("机器学习基础", 4), "机器学习...");
        assert_eq!(truncate_text("短", 4), "短");
    }

    #[test]
    fn test_log_file_header_and_append() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("generation.log");
        let path = path.to_string_lossy().to_string();

        init_log_file(&path).unwrap();
        append_log(&path, "状态: completed").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(&"=".repeat(60)));
        assert!(content.contains("题目生成日志"));
        assert!(content.ends_with("状态: completed\n"));
    }
}
