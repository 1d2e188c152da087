pub mod pipeline_state;
pub mod question_flow;

pub use pipeline_state::{PipelineData, PipelineState, Step};
pub use question_flow::QuestionFlow;
