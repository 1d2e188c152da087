//! LLM API 客户端
//!
//! 使用 `async-openai` 调用 OpenAI 兼容接口（通义千问兼容模式、OpenAI、各类代理服务）

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{AppError, AppResult, LlmError};

/// LLM 后端
///
/// 网关只依赖这个 trait，测试中可以替换为脚本化的假后端。
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// 后端名称（用于日志）
    fn name(&self) -> &str;

    /// 发送一条提示词，返回模型的文本回复
    async fn invoke(&self, prompt: &str) -> AppResult<String>;
}

/// OpenAI 兼容的聊天补全客户端
pub struct OpenAiCompatibleClient {
    name: String,
    client: Client<OpenAIConfig>,
    model_name: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiCompatibleClient {
    pub fn new(
        name: impl Into<String>,
        api_key: &str,
        api_base_url: &str,
        model_name: impl Into<String>,
    ) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(api_base_url);

        Self {
            name: name.into(),
            client: Client::with_config(openai_config),
            model_name: model_name.into(),
            temperature: 0.7,
            max_tokens: 10000,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[async_trait]
impl LlmBackend for OpenAiCompatibleClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, prompt: &str) -> AppResult<String> {
        debug!("调用 LLM API，后端: {}，模型: {}", self.name, self.model_name);
        debug!("提示词长度: {} 字符", prompt.chars().count());

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| AppError::llm_api_failed(&self.name, e))?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(vec![ChatCompletionRequestMessage::User(user_msg)])
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build()
            .map_err(|e| AppError::llm_api_failed(&self.name, e))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败 ({}): {}", self.name, e);
            AppError::llm_api_failed(&self.name, e)
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| LlmError::EmptyContent {
                backend: self.name.clone(),
            })?;

        Ok(content.trim().to_string())
    }
}
