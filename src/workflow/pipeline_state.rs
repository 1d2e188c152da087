//! 工作流状态
//!
//! 状态在节点之间按值传递：节点拿走状态、返回新状态。
//! 一旦进入 `Error`，后续节点只会原样传递，不再修改业务字段。

use std::fmt;

use crate::models::{Document, QuestionSet};
use crate::services::output_formatter::FormattedOutput;
use crate::services::question_generator::GenerationReport;

/// 处理中已到达的步骤
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Step {
    Start,
    DocumentProcessed,
    DocumentAnalyzed,
    MultipleChoiceGenerated,
    FillInTheBlankGenerated,
    MatchingGenerated,
}

impl Step {
    pub fn as_str(self) -> &'static str {
        match self {
            Step::Start => "start",
            Step::DocumentProcessed => "document_processed",
            Step::DocumentAnalyzed => "document_analyzed",
            Step::MultipleChoiceGenerated => "multiple_choice_generated",
            Step::FillInTheBlankGenerated => "fill_in_the_blank_generated",
            Step::MatchingGenerated => "matching_generated",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 各节点累积的业务数据
#[derive(Debug, Clone)]
pub struct PipelineData {
    pub document: Document,
    pub topics: Vec<String>,
    pub key_points: Vec<String>,
    /// 由第一个实际生成题目的节点创建
    pub question_set: Option<QuestionSet>,
    pub generation: GenerationReport,
    /// 格式化后的输出
    pub output: Option<FormattedOutput>,
}

impl PipelineData {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            topics: Vec::new(),
            key_points: Vec::new(),
            question_set: None,
            generation: GenerationReport::default(),
            output: None,
        }
    }
}

/// 工作流状态
#[derive(Debug, Clone)]
pub enum PipelineState {
    /// 正常处理中
    Processing { step: Step, data: PipelineData },
    /// 某个节点失败；`failed_at` 是失败前最后到达的步骤
    Error {
        failed_at: Step,
        message: String,
        data: PipelineData,
    },
    /// 错误处理节点已处理（终态）
    ErrorHandled {
        failed_at: Step,
        message: String,
        data: PipelineData,
    },
    /// 输出已生成（终态）
    Completed { data: PipelineData },
}

impl PipelineState {
    /// 初始状态
    pub fn new(document: Document) -> Self {
        PipelineState::Processing {
            step: Step::Start,
            data: PipelineData::new(document),
        }
    }

    /// 当前步骤名
    pub fn current_step(&self) -> &'static str {
        match self {
            PipelineState::Processing { step, .. } => step.as_str(),
            PipelineState::Error { .. } => "error",
            PipelineState::ErrorHandled { .. } => "error_handled",
            PipelineState::Completed { .. } => "completed",
        }
    }

    pub fn data(&self) -> &PipelineData {
        match self {
            PipelineState::Processing { data, .. }
            | PipelineState::Error { data, .. }
            | PipelineState::ErrorHandled { data, .. }
            | PipelineState::Completed { data } => data,
        }
    }

    pub fn into_data(self) -> PipelineData {
        match self {
            PipelineState::Processing { data, .. }
            | PipelineState::Error { data, .. }
            | PipelineState::ErrorHandled { data, .. }
            | PipelineState::Completed { data } => data,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            PipelineState::Error { message, .. } | PipelineState::ErrorHandled { message, .. } => {
                Some(message)
            }
            _ => None,
        }
    }

    /// 格式化输出（仅 `Completed` 时存在）
    pub fn output(&self) -> Option<&FormattedOutput> {
        match self {
            PipelineState::Completed { data } => data.output.as_ref(),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineState::Completed { .. } | PipelineState::ErrorHandled { .. }
        )
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, PipelineState::Completed { .. })
    }
}
