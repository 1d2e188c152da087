pub mod llm_client;

#[cfg(test)]
pub(crate) mod testing;

pub use llm_client::{LlmBackend, OpenAiCompatibleClient};
