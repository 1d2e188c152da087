//! 题目生成图 - 编排层
//!
//! 固定的七个节点，按路由规则依次执行：
//!
//! ```text
//! document_processor ──ok──▶ document_analyzer ──ok──▶ generate_multiple_choice
//!        │                          │                          │
//!        └──────err──────┐ ┌──err────┘                          ▼
//!                        ▼ ▼                          generate_fill_blank
//!                   error_handler ◀──err── format_output ◀── generate_matching
//!                        │                     │
//!                        ▼                     ▼
//!                       END                   END
//! ```

use std::fmt;

use tracing::{debug, info};

use crate::config::Config;
use crate::error::AppResult;
use crate::models::Document;
use crate::services::LlmGateway;
use crate::workflow::{PipelineState, QuestionFlow, Step};

/// 图中的节点
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    DocumentProcessor,
    DocumentAnalyzer,
    GenerateMultipleChoice,
    GenerateFillBlank,
    GenerateMatching,
    FormatOutput,
    ErrorHandler,
}

impl Node {
    pub const ALL: [Node; 7] = [
        Node::DocumentProcessor,
        Node::DocumentAnalyzer,
        Node::GenerateMultipleChoice,
        Node::GenerateFillBlank,
        Node::GenerateMatching,
        Node::FormatOutput,
        Node::ErrorHandler,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Node::DocumentProcessor => "document_processor",
            Node::DocumentAnalyzer => "document_analyzer",
            Node::GenerateMultipleChoice => "generate_multiple_choice",
            Node::GenerateFillBlank => "generate_fill_blank",
            Node::GenerateMatching => "generate_matching",
            Node::FormatOutput => "format_output",
            Node::ErrorHandler => "error_handler",
        }
    }

    /// 主链路上的位置；错误处理节点不在主链路上
    fn position(self) -> Option<usize> {
        Node::ALL[..6].iter().position(|n| *n == self)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 节点执行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    Pending,
    Completed,
    Error,
}

impl NodeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeStatus::Pending => "pending",
            NodeStatus::Completed => "completed",
            NodeStatus::Error => "error",
        }
    }
}

/// 节点执行后的下一跳；`None` 表示结束
pub fn route(node: Node, state: &PipelineState) -> Option<Node> {
    let step = state.current_step();
    match node {
        Node::DocumentProcessor if step == Step::DocumentProcessed.as_str() => {
            Some(Node::DocumentAnalyzer)
        }
        Node::DocumentAnalyzer if step == Step::DocumentAnalyzed.as_str() => {
            Some(Node::GenerateMultipleChoice)
        }
        Node::DocumentProcessor | Node::DocumentAnalyzer => Some(Node::ErrorHandler),
        // 生成节点无条件串联，出错的状态会原样流过
        Node::GenerateMultipleChoice => Some(Node::GenerateFillBlank),
        Node::GenerateFillBlank => Some(Node::GenerateMatching),
        Node::GenerateMatching => Some(Node::FormatOutput),
        Node::FormatOutput if state.is_completed() => None,
        Node::FormatOutput => Some(Node::ErrorHandler),
        Node::ErrorHandler => None,
    }
}

/// 根据状态推断每个节点的执行情况
pub fn node_status(state: &PipelineState) -> Vec<(Node, NodeStatus)> {
    // 主链路上已完成的节点数，以及（如有）出错的节点位置
    let (completed, failed, handled) = match state {
        PipelineState::Processing { step, .. } => (completed_nodes(*step), None, false),
        PipelineState::Completed { .. } => (6, None, false),
        PipelineState::Error { failed_at, .. } => {
            let done = completed_nodes(*failed_at);
            (done, Some(done), false)
        }
        PipelineState::ErrorHandled { failed_at, .. } => {
            let done = completed_nodes(*failed_at);
            (done, Some(done), true)
        }
    };

    Node::ALL
        .iter()
        .map(|&node| {
            let status = match node.position() {
                None if handled => NodeStatus::Completed,
                None => NodeStatus::Pending,
                Some(pos) if pos < completed => NodeStatus::Completed,
                Some(pos) if Some(pos) == failed => NodeStatus::Error,
                Some(_) => NodeStatus::Pending,
            };
            (node, status)
        })
        .collect()
}

fn completed_nodes(step: Step) -> usize {
    match step {
        Step::Start => 0,
        Step::DocumentProcessed => 1,
        Step::DocumentAnalyzed => 2,
        Step::MultipleChoiceGenerated => 3,
        Step::FillInTheBlankGenerated => 4,
        Step::MatchingGenerated => 5,
    }
}

/// 题目生成图
pub struct QuestionGraph {
    flow: QuestionFlow,
}

impl QuestionGraph {
    pub fn new(config: &Config) -> AppResult<Self> {
        Ok(Self {
            flow: QuestionFlow::new(config)?,
        })
    }

    /// 从文档开始运行整张图，返回终态
    pub async fn generate(&self, gateway: &LlmGateway, document: Document) -> PipelineState {
        info!("🚀 开始生成题目: {}", document.title);
        self.run(gateway, PipelineState::new(document)).await
    }

    /// 从给定状态开始运行，直到到达终态
    pub async fn run(&self, gateway: &LlmGateway, initial: PipelineState) -> PipelineState {
        let mut state = initial;
        let mut node = Node::DocumentProcessor;

        loop {
            debug!("▶ 执行节点: {}", node);
            state = self.execute(node, gateway, state).await;
            debug!("  节点 {} 完成，当前步骤: {}", node, state.current_step());

            match route(node, &state) {
                Some(next) => node = next,
                None => break,
            }
        }

        info!("📊 工作流结束，最终状态: {}", state.current_step());
        state
    }

    async fn execute(
        &self,
        node: Node,
        gateway: &LlmGateway,
        state: PipelineState,
    ) -> PipelineState {
        match node {
            Node::DocumentProcessor => self.flow.process_document(state),
            Node::DocumentAnalyzer => self.flow.analyze_document(gateway, state).await,
            Node::GenerateMultipleChoice => self.flow.generate_multiple_choice(gateway, state).await,
            Node::GenerateFillBlank => self.flow.generate_fill_blank(gateway, state).await,
            Node::GenerateMatching => self.flow.generate_matching(gateway, state).await,
            Node::FormatOutput => self.flow.format_output(state),
            Node::ErrorHandler => self.flow.handle_error(state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::PipelineData;

    fn data() -> PipelineData {
        PipelineData::new(Document::from_text("t", "c", None))
    }

    fn processing(step: Step) -> PipelineState {
        PipelineState::Processing { step, data: data() }
    }

    fn error(failed_at: Step) -> PipelineState {
        PipelineState::Error {
            failed_at,
            message: "boom".to_string(),
            data: data(),
        }
    }

    #[test]
    fn test_routing_success_path() {
        assert_eq!(
            route(Node::DocumentProcessor, &processing(Step::DocumentProcessed)),
            Some(Node::DocumentAnalyzer)
        );
        assert_eq!(
            route(Node::DocumentAnalyzer, &processing(Step::DocumentAnalyzed)),
            Some(Node::GenerateMultipleChoice)
        );
        assert_eq!(
            route(Node::FormatOutput, &PipelineState::Completed { data: data() }),
            None
        );
    }

    #[test]
    fn test_routing_error_path() {
        assert_eq!(
            route(Node::DocumentProcessor, &error(Step::Start)),
            Some(Node::ErrorHandler)
        );
        assert_eq!(
            route(Node::DocumentAnalyzer, &error(Step::DocumentProcessed)),
            Some(Node::ErrorHandler)
        );
        // 步骤不符合预期同样进入错误处理
        assert_eq!(
            route(Node::DocumentAnalyzer, &processing(Step::DocumentProcessed)),
            Some(Node::ErrorHandler)
        );
        // 生成节点无条件串联
        assert_eq!(
            route(Node::GenerateMultipleChoice, &error(Step::DocumentAnalyzed)),
            Some(Node::GenerateFillBlank)
        );
        assert_eq!(
            route(Node::FormatOutput, &error(Step::MatchingGenerated)),
            Some(Node::ErrorHandler)
        );
        assert_eq!(route(Node::ErrorHandler, &error(Step::Start)), None);
    }

    fn statuses(state: &PipelineState) -> Vec<&'static str> {
        node_status(state).into_iter().map(|(_, s)| s.as_str()).collect()
    }

    #[test]
    fn test_node_status() {
        assert_eq!(
            statuses(&processing(Step::DocumentAnalyzed)),
            vec!["completed", "completed", "pending", "pending", "pending", "pending", "pending"]
        );
        assert_eq!(
            statuses(&PipelineState::Completed { data: data() }),
            vec!["completed", "completed", "completed", "completed", "completed", "completed", "pending"]
        );
        assert_eq!(
            statuses(&error(Step::DocumentAnalyzed)),
            vec!["completed", "completed", "error", "pending", "pending", "pending", "pending"]
        );
        assert_eq!(
            statuses(&PipelineState::ErrorHandled {
                failed_at: Step::Start,
                message: "boom".to_string(),
                data: data(),
            }),
            vec!["error", "pending", "pending", "pending", "pending", "pending", "completed"]
        );
    }

    #[tokio::test]
    async fn test_empty_document_ends_in_error_handled() {
        let graph = QuestionGraph::new(&Config::default()).unwrap();
        let gateway = LlmGateway::new();

        let state = graph
            .generate(&gateway, Document::from_text("空文档", "", None))
            .await;
        assert_eq!(state.current_step(), "error_handled");
        assert!(state.error_message().unwrap().contains("文档内容为空"));
    }
}
