//! LLM 网关 - 业务能力层
//!
//! 把一个或多个 LLM 后端包装成统一的"带降级的调用"：
//! 先调用主后端，失败时降级到备选后端；两者都不可用时才返回错误。
//! 不做重试，也不重新探测被标记为不可用的后端。

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::clients::{LlmBackend, OpenAiCompatibleClient};
use crate::config::Config;
use crate::error::{AppError, AppResult, LlmError};
use crate::utils::logging::truncate_text;

/// 连通性探测使用的提示词
const PROBE_PROMPT: &str = "滴滴滴，请问能收到我这边的信息吗？收到的话请回复收到收到。";

/// 后端角色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendRole {
    Primary,
    Backup,
}

impl fmt::Display for BackendRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendRole::Primary => write!(f, "主模型"),
            BackendRole::Backup => write!(f, "备选模型"),
        }
    }
}

struct BackendSlot {
    role: BackendRole,
    backend: Arc<dyn LlmBackend>,
    usable: bool,
}

/// LLM 网关
///
/// 由调用方显式创建并以引用传入各个节点，没有全局单例。
pub struct LlmGateway {
    slots: Vec<BackendSlot>,
}

impl LlmGateway {
    /// 创建空网关
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// 注册一个后端；主后端总是排在备选后端之前
    pub fn with_backend(mut self, role: BackendRole, backend: Arc<dyn LlmBackend>) -> Self {
        self.slots.push(BackendSlot {
            role,
            backend,
            usable: true,
        });
        self.slots.sort_by_key(|slot| slot.role != BackendRole::Primary);
        self
    }

    /// 根据配置创建网关：每个非空 API 密钥对应一个后端
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let mut gateway = Self::new();

        if !config.primary_api_key.trim().is_empty() {
            let client = OpenAiCompatibleClient::new(
                "通义千问",
                &config.primary_api_key,
                &config.primary_base_url,
                &config.primary_model,
            )
            .with_temperature(config.temperature)
            .with_max_tokens(config.max_tokens);
            gateway = gateway.with_backend(BackendRole::Primary, Arc::new(client));
        } else {
            warn!("⚠️  未设置ALI_API_KEY环境变量");
        }

        if !config.backup_api_key.trim().is_empty() {
            let client = OpenAiCompatibleClient::new(
                "OpenAI",
                &config.backup_api_key,
                &config.backup_base_url,
                &config.backup_model,
            )
            .with_temperature(config.temperature)
            .with_max_tokens(config.max_tokens);
            gateway = gateway.with_backend(BackendRole::Backup, Arc::new(client));
        } else {
            warn!("⚠️  未设置OPENAI_API_KEY环境变量");
        }

        if gateway.slots.is_empty() {
            return Err(LlmError::Unavailable.into());
        }

        Ok(gateway)
    }

    /// 根据配置创建网关并探测连通性
    pub async fn connect(config: &Config) -> AppResult<Self> {
        let mut gateway = Self::from_config(config)?;
        gateway.probe().await?;
        Ok(gateway)
    }

    /// 对每个已配置的后端做一次连通性探测
    ///
    /// 探测失败（报错或返回空内容）的后端在本进程内不再使用。
    pub async fn probe(&mut self) -> AppResult<()> {
        info!("🔍 测试API连接...");

        for slot in self.slots.iter_mut() {
            let name = slot.backend.name().to_string();
            match slot.backend.invoke(PROBE_PROMPT).await {
                Ok(reply) if !reply.trim().is_empty() => {
                    info!("✅ {} ({}) API连接正常", name, slot.role);
                    debug!("📥 回复: {}", truncate_text(&reply, 60));
                }
                Ok(_) => {
                    warn!("⚠️  {} 返回空响应，标记为不可用", name);
                    slot.usable = false;
                }
                Err(e) => {
                    error!("❌ {} API连接失败: {}", name, e);
                    slot.usable = false;
                }
            }
        }

        if !self.has_usable_backend() {
            error!("❌ 所有API连接测试失败！请检查API密钥、额度和网络连接");
            return Err(LlmError::Unavailable.into());
        }

        Ok(())
    }

    /// 是否还有可用后端
    pub fn has_usable_backend(&self) -> bool {
        self.slots.iter().any(|slot| slot.usable)
    }

    /// 可用后端名称（按调用顺序）
    pub fn usable_backends(&self) -> Vec<&str> {
        self.slots
            .iter()
            .filter(|slot| slot.usable)
            .map(|slot| slot.backend.name())
            .collect()
    }

    /// 带降级的 LLM 调用
    pub async fn invoke(&self, prompt: &str) -> AppResult<String> {
        let mut last_error: Option<AppError> = None;

        for slot in self.slots.iter().filter(|slot| slot.usable) {
            match slot.backend.invoke(prompt).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    warn!("⚠️  {} ({}) 调用失败: {}", slot.backend.name(), slot.role, e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(LlmError::AllBackendsFailed {
                last_error: e.to_string(),
            }
            .into()),
            None => Err(LlmError::Unavailable.into()),
        }
    }
}

impl Default for LlmGateway {
    fn default() -> Self {
        Self::new()
    }
}

/// 从 LLM 响应中提取 JSON
///
/// 优先取 ```json 代码块，其次任意 ``` 代码块，否则把整段文本当作 JSON。
/// 失败时错误中带上原始响应。
pub fn parse_json_response(response: &str) -> AppResult<Value> {
    let json_str = extract_fenced_block(response, "```json")
        .or_else(|| extract_fenced_block(response, "```"))
        .unwrap_or_else(|| response.trim());

    serde_json::from_str(json_str).map_err(|e| {
        error!("JSON解析失败: {}", e);
        debug!("原始响应: {}", response);
        AppError::json_parse_failed(response, e.to_string())
    })
}

/// 取出 `marker` 之后到下一个 ``` 之间的内容；没有闭合标记时取到末尾
fn extract_fenced_block<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    let start = text.find(marker)? + marker.len();
    let rest = &text[start..];
    let end = rest.find("```").unwrap_or(rest.len());
    Some(rest[..end].trim())
}
