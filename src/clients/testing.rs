//! 单元测试用的脚本化 LLM 后端

use std::sync::Mutex;

use async_trait::async_trait;

use super::LlmBackend;
use crate::error::{AppError, AppResult};

/// 按提示词内容返回预设回复的假后端，并记录收到的每条提示词
pub(crate) struct FakeBackend {
    name: String,
    rules: Vec<(String, String)>,
    default_reply: String,
    failing: bool,
    prompts: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            rules: Vec::new(),
            default_reply: "收到收到".to_string(),
            failing: false,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// 每次调用都返回错误
    pub fn failing(name: &str) -> Self {
        Self {
            failing: true,
            ..Self::new(name)
        }
    }

    /// 提示词包含 `marker` 时返回 `reply`；按注册顺序匹配
    pub fn respond_when(mut self, marker: &str, reply: &str) -> Self {
        self.rules.push((marker.to_string(), reply.to_string()));
        self
    }

    pub fn with_default(mut self, reply: &str) -> Self {
        self.default_reply = reply.to_string();
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LlmBackend for FakeBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, prompt: &str) -> AppResult<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        if self.failing {
            return Err(AppError::llm_api_failed(
                &self.name,
                std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused"),
            ));
        }

        let reply = self
            .rules
            .iter()
            .find(|(marker, _)| prompt.contains(marker.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| self.default_reply.clone());
        Ok(reply)
    }
}
