//! 应用 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：运行日志、启动信息、创建并探测 LLM 网关
//! 2. **选择输入**：输入文件 → 直接给出的标题与内容 → 内置示例文档
//! 3. **运行工作流**：委托 `QuestionGraph` 处理单个文档
//! 4. **输出**：写 JSON 文件、追加运行日志、打印统计
//!
//! 网关由 `App` 持有，以引用传给工作流。

use std::path::Path;

use tracing::{info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, InputError};
use crate::models::{load_document_from_file, Document};
use crate::orchestrator::question_graph::{node_status, QuestionGraph};
use crate::services::{FormattedOutput, LlmGateway, OutputWriter};
use crate::utils::logging::{append_log, init_log_file, log_startup, print_final_stats};
use crate::workflow::{PipelineData, PipelineState};

/// 应用主结构
pub struct App {
    config: Config,
    gateway: LlmGateway,
    graph: QuestionGraph,
}

impl App {
    /// 初始化应用
    ///
    /// 没有任何可用的 LLM 后端时返回错误。
    pub async fn initialize(config: Config) -> AppResult<Self> {
        // 初始化日志文件
        init_log_file(&config.output_log_file)?;

        log_startup(&config);

        let gateway = LlmGateway::connect(&config).await?;
        info!("✓ 可用模型: {}", gateway.usable_backends().join(" → "));

        Self::with_gateway(config, gateway)
    }

    /// 使用已创建好的网关构建应用（不做连通性探测）
    pub fn with_gateway(config: Config, gateway: LlmGateway) -> AppResult<Self> {
        let graph = QuestionGraph::new(&config)?;
        Ok(Self {
            config,
            gateway,
            graph,
        })
    }

    /// 从文件生成题目
    pub async fn generate_from_file(&self, path: &Path) -> AppResult<PipelineState> {
        let document = load_document_from_file(path).await?;
        Ok(self.generate(document).await)
    }

    /// 从文本生成题目
    pub async fn generate_from_text(&self, title: &str, content: &str) -> PipelineState {
        self.generate(Document::from_text(title, content, None)).await
    }

    /// 对单个文档运行工作流，返回终态
    pub async fn generate(&self, document: Document) -> PipelineState {
        self.graph.generate(&self.gateway, document).await
    }

    /// 运行应用主逻辑
    ///
    /// 工作流失败时返回 [`AppError::Pipeline`]。
    pub async fn run(&self) -> AppResult<FormattedOutput> {
        let document = self.load_input().await?;
        let final_state = self.generate(document).await;

        if self.config.verbose_logging {
            for (node, status) in node_status(&final_state) {
                info!("   {:<26} {}", node.name(), status.as_str());
            }
        }

        match final_state {
            PipelineState::Completed {
                data: PipelineData {
                    output: Some(output),
                    ..
                },
            } => {
                let writer = OutputWriter::from_option(self.config.output_file.as_deref());
                writer.write(&output).await?;
                let output_file = writer.path().display().to_string();

                self.append_summary(&format!(
                    "状态: completed\n文档: {}\n题目总数: {}\n质量分数: {:.2}\n输出文件: {}",
                    output.metadata.document_title,
                    output.metadata.statistics.total_questions,
                    output.metadata.validation.quality_score,
                    output_file
                ));
                print_final_stats(&output, &output_file, &self.config.output_log_file);

                Ok(output)
            }
            other => {
                let message = other
                    .error_message()
                    .unwrap_or("工作流未生成输出")
                    .to_string();
                self.append_summary(&format!(
                    "状态: {}\n错误: {}",
                    other.current_step(),
                    message
                ));
                Err(AppError::Pipeline(message))
            }
        }
    }

    /// 选择输入：输入文件 → 标题与内容 → 示例文档
    async fn load_input(&self) -> AppResult<Document> {
        if let Some(path) = self.config.input_file.as_deref() {
            info!("📁 从文件读取文档: {}", path);
            return load_document_from_file(Path::new(path)).await;
        }

        if let (Some(title), Some(content)) = (
            self.config.input_title.as_deref(),
            self.config.input_content.as_deref(),
        ) {
            info!("📝 使用直接输入的文档: {}", title);
            return Ok(Document::from_text(title, content, None));
        }

        if self.config.use_sample_document {
            info!("📚 使用内置示例文档");
            return Ok(Document::sample());
        }

        Err(InputError::MissingInput.into())
    }

    fn append_summary(&self, summary: &str) {
        let entry = format!(
            "[{}]\n{}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            summary
        );
        if let Err(e) = append_log(&self.config.output_log_file, &entry) {
            warn!("⚠️  写入运行日志失败: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::testing::FakeBackend;
    use crate::services::BackendRole;
    use std::sync::Arc;

    fn app_with(config: Config) -> App {
        let gateway = LlmGateway::new()
            .with_backend(BackendRole::Primary, Arc::new(FakeBackend::new("fake")));
        App::with_gateway(config, gateway).unwrap()
    }

    #[tokio::test]
    async fn test_missing_input() {
        let app = app_with(Config::default());
        let result = app.load_input().await;
        assert!(matches!(
            result,
            Err(AppError::Input(InputError::MissingInput))
        ));
    }

    #[tokio::test]
    async fn test_input_priority() {
        let app = app_with(Config {
            input_title: Some("标题".to_string()),
            input_content: Some("内容".to_string()),
            use_sample_document: true,
            ..Config::default()
        });
        let document = app.load_input().await.unwrap();
        assert_eq!(document.title, "标题");

        let app = app_with(Config {
            use_sample_document: true,
            ..Config::default()
        });
        assert_eq!(app.load_input().await.unwrap().title, "机器学习基础");
    }

    #[tokio::test]
    async fn test_generate_from_missing_file() {
        let app = app_with(Config::default());
        let result = app
            .generate_from_file(Path::new("/nonexistent/doc.md"))
            .await;
        assert!(matches!(
            result,
            Err(AppError::Input(InputError::FileReadFailed { .. }))
        ));
    }
}
