//! # Question Generator
//!
//! 基于 LLM 的题目生成工具：读入一篇教学文档，生成选择题、填空题和连线题
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 与外部 LLM 服务通信
//! - `LlmBackend` - 后端抽象
//! - `OpenAiCompatibleClient` - OpenAI 兼容接口实现
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，每个服务只做一件事
//! - `LlmGateway` - 主/备模型切换、JSON 提取
//! - `DocumentProcessor` - 文档规范化
//! - `DocumentAnalyzer` - 主题与知识点提取
//! - `QuestionGenerator` - 三种题型的生成
//! - `output_formatter` / `OutputWriter` - 校验、格式化与写出
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一篇文档"的完整处理流程
//! - `PipelineState` - 按值传递的工作流状态
//! - `QuestionFlow` - 各节点实现
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/question_graph` - 节点路由
//! - `orchestrator/app` - 应用生命周期、输入选择、结果写出
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{LlmBackend, OpenAiCompatibleClient};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{
    Document, FillInTheBlankQuestion, MatchingQuestion, MultipleChoiceQuestion, QuestionSet,
};
pub use orchestrator::{App, QuestionGraph};
pub use services::{BackendRole, FormattedOutput, GenerationStatus, LlmGateway};
pub use workflow::{PipelineState, QuestionFlow};
