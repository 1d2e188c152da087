//! 题目生成流程 - 流程层
//!
//! 核心职责：定义每个节点"拿到状态后做什么"
//!
//! 节点顺序：
//! 1. 文档规范化 → 2. 文档分析 → 3. 选择题 → 4. 填空题 → 5. 连线题 → 6. 格式化输出
//!
//! 失败时由错误处理节点收尾。每个节点只处理 `Processing` 状态，其他状态原样返回。

use tracing::error;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{
    FillInTheBlankQuestion, MatchingQuestion, MultipleChoiceQuestion, QuestionSet, QuestionType,
};
use crate::services::output_formatter;
use crate::services::{
    DocumentAnalyzer, DocumentProcessor, GeneratedQuestion, GenerationOutcome, LlmGateway,
    QuestionGenerator,
};
use crate::workflow::pipeline_state::{PipelineData, PipelineState, Step};

/// 题目生成流程
///
/// - 不持有 LLM 网关，调用时以引用传入
/// - 只依赖业务能力（services）
pub struct QuestionFlow {
    processor: DocumentProcessor,
    analyzer: DocumentAnalyzer,
    generator: QuestionGenerator,
}

impl QuestionFlow {
    pub fn new(config: &Config) -> AppResult<Self> {
        Ok(Self {
            processor: DocumentProcessor::new()?,
            analyzer: DocumentAnalyzer::new()?,
            generator: QuestionGenerator::new(config),
        })
    }

    /// 节点 1：文档规范化
    pub fn process_document(&self, state: PipelineState) -> PipelineState {
        let (step, mut data) = match state {
            PipelineState::Processing { step, data } => (step, data),
            other => return other,
        };

        match self.processor.process(data.document.clone()) {
            Ok(document) => {
                data.document = document;
                PipelineState::Processing {
                    step: Step::DocumentProcessed,
                    data,
                }
            }
            Err(e) => fail(step, format!("文档处理失败: {}", e), data),
        }
    }

    /// 节点 2：文档分析
    pub async fn analyze_document(
        &self,
        gateway: &LlmGateway,
        state: PipelineState,
    ) -> PipelineState {
        let (step, mut data) = match state {
            PipelineState::Processing { step, data } => (step, data),
            other => return other,
        };

        match self.analyzer.analyze(gateway, &data.document).await {
            Ok(analysis) => {
                data.topics = analysis.topics;
                data.key_points = analysis.key_points;
                PipelineState::Processing {
                    step: Step::DocumentAnalyzed,
                    data,
                }
            }
            Err(e) => fail(step, format!("文档分析失败: {}", e), data),
        }
    }

    /// 节点 3：选择题
    pub async fn generate_multiple_choice(
        &self,
        gateway: &LlmGateway,
        state: PipelineState,
    ) -> PipelineState {
        self.generate_questions::<MultipleChoiceQuestion>(gateway, state)
            .await
    }

    /// 节点 4：填空题
    pub async fn generate_fill_blank(
        &self,
        gateway: &LlmGateway,
        state: PipelineState,
    ) -> PipelineState {
        self.generate_questions::<FillInTheBlankQuestion>(gateway, state)
            .await
    }

    /// 节点 5：连线题
    pub async fn generate_matching(
        &self,
        gateway: &LlmGateway,
        state: PipelineState,
    ) -> PipelineState {
        self.generate_questions::<MatchingQuestion>(gateway, state)
            .await
    }

    async fn generate_questions<Q: GeneratedQuestion>(
        &self,
        gateway: &LlmGateway,
        state: PipelineState,
    ) -> PipelineState {
        let (step, mut data) = match state {
            PipelineState::Processing { step, data } => (step, data),
            other => return other,
        };

        let topic = data
            .topics
            .first()
            .cloned()
            .unwrap_or_else(|| data.document.title.clone());

        let outcome = match self
            .generator
            .generate::<Q>(gateway, &topic, &data.key_points)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => return fail(step, format!("{}生成失败: {}", Q::KIND.label(), e), data),
        };

        data.generation.record(Q::KIND, outcome.status());

        if !matches!(outcome, GenerationOutcome::Skipped) {
            let title = data.document.title.clone();
            let set = data
                .question_set
                .get_or_insert_with(|| QuestionSet::new(title));
            *Q::slot(set) = outcome.into_questions();
        }

        PipelineState::Processing {
            step: generated_step(Q::KIND),
            data,
        }
    }

    /// 节点 6：格式化输出
    pub fn format_output(&self, state: PipelineState) -> PipelineState {
        let (step, mut data) = match state {
            PipelineState::Processing { step, data } => (step, data),
            other => return other,
        };

        match output_formatter::format_output(
            data.question_set.as_ref(),
            &data.topics,
            &data.key_points,
            &data.generation,
        ) {
            Ok(output) => {
                data.output = Some(output);
                PipelineState::Completed { data }
            }
            Err(AppError::Pipeline(message)) => fail(step, message, data),
            Err(e) => fail(step, format!("输出格式化失败: {}", e), data),
        }
    }

    /// 错误处理节点：记录错误并结束
    pub fn handle_error(&self, state: PipelineState) -> PipelineState {
        match state {
            PipelineState::Error {
                failed_at,
                message,
                data,
            } => {
                error!("❌ 工作流在 {} 之后出错: {}", failed_at, message);
                PipelineState::ErrorHandled {
                    failed_at,
                    message,
                    data,
                }
            }
            other => other,
        }
    }
}

fn fail(step: Step, message: String, data: PipelineData) -> PipelineState {
    error!("{}", message);
    PipelineState::Error {
        failed_at: step,
        message,
        data,
    }
}

fn generated_step(question_type: QuestionType) -> Step {
    match question_type {
        QuestionType::MultipleChoice => Step::MultipleChoiceGenerated,
        QuestionType::FillInTheBlank => Step::FillInTheBlankGenerated,
        QuestionType::Matching => Step::MatchingGenerated,
    }
}
