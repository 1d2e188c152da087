//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 应用
//! - 管理应用生命周期（初始化、运行）
//! - 创建并探测 LLM 网关
//! - 选择输入文档
//! - 写出结果文件、运行日志，输出统计信息
//!
//! ### `question_graph` - 题目生成图
//! - 固定的七个节点与路由规则
//! - 驱动单个文档走完整条工作流
//! - 推断每个节点的执行状态
//!
//! ## 层次关系
//!
//! ```text
//! app (选择输入、写出结果)
//!     ↓
//! question_graph (节点路由)
//!     ↓
//! workflow::QuestionFlow (节点实现)
//!     ↓
//! services (能力层：processor / analyzer / generator / formatter / gateway)
//!     ↓
//! clients (LLM 客户端)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：app 管输入输出，question_graph 管路由
//! 2. **资源隔离**：只有编排层持有 LLM 网关，向下以引用传递
//! 3. **向下依赖**：编排层 → workflow → services → clients
//! 4. **无业务逻辑**：只做调度和统计，不做具体业务判断

pub mod app;
pub mod question_graph;

// 重新导出主要类型
pub use app::App;
pub use question_graph::{node_status, route, Node, NodeStatus, QuestionGraph};
