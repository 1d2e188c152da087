pub mod document_analyzer;
pub mod document_processor;
pub mod llm_gateway;
pub mod output_formatter;
pub mod output_writer;
pub mod prompt_builder;
pub mod question_generator;

pub use document_analyzer::{DocumentAnalysis, DocumentAnalyzer};
pub use document_processor::DocumentProcessor;
pub use llm_gateway::{parse_json_response, BackendRole, LlmGateway};
pub use output_formatter::{format_output, validate_question_set, FormattedOutput, ValidationReport};
pub use output_writer::OutputWriter;
pub use question_generator::{
    GeneratedQuestion, GenerationOutcome, GenerationReport, GenerationStatus, QuestionGenerator,
};
