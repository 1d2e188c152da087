use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 输入文档错误
    #[error("输入错误: {0}")]
    Input(#[from] InputError),
    /// LLM 服务错误
    #[error("LLM错误: {0}")]
    Llm(#[from] LlmError),
    /// LLM 响应解析错误
    #[error("解析错误: {0}")]
    Parse(#[from] ParseError),
    /// 题目结构校验错误
    #[error("题目错误: {0}")]
    Question(#[from] QuestionError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 正则表达式编译错误
    #[error("正则表达式错误: {0}")]
    Regex(#[from] regex::Error),
    /// 工作流以错误状态结束
    #[error("工作流失败: {0}")]
    Pipeline(String),
}

/// 输入文档错误（致命，进入错误处理节点）
#[derive(Debug, Error)]
pub enum InputError {
    /// 文档内容为空
    #[error("文档内容为空")]
    EmptyContent,
    /// 没有提供任何输入
    #[error("未提供输入：请设置 INPUT_FILE，或同时设置 INPUT_TITLE 与 INPUT_CONTENT")]
    MissingInput,
    /// 读取输入文件失败
    #[error("读取文档失败 ({path}): {source}")]
    FileReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// LLM 服务错误
#[derive(Debug, Error)]
pub enum LlmError {
    /// 没有任何可用的 LLM 后端
    #[error("没有可用的LLM实例，请设置ALI_API_KEY或OPENAI_API_KEY环境变量并检查网络连接")]
    Unavailable,
    /// 单个后端调用失败
    #[error("LLM API调用失败 (后端: {backend}): {source}")]
    ApiCallFailed {
        backend: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 后端返回内容为空
    #[error("LLM返回内容为空 (后端: {backend})")]
    EmptyContent { backend: String },
    /// 所有后端都调用失败
    #[error("所有LLM都不可用: {last_error}")]
    AllBackendsFailed { last_error: String },
}

/// LLM 响应解析错误（本地恢复，不会上报到编排层）
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON 解析失败，保留原始响应便于排查
    #[error("无法解析LLM返回的JSON: {message}")]
    Json { raw: String, message: String },
}

impl ParseError {
    /// 原始响应文本
    pub fn raw(&self) -> &str {
        match self {
            ParseError::Json { raw, .. } => raw,
        }
    }
}

/// 题目记录结构错误（单条记录被丢弃）
#[derive(Debug, Error)]
pub enum QuestionError {
    /// 缺少必填字段或字段类型不符
    #[error("题目记录格式错误: {0}")]
    MalformedRecord(String),
    /// 字段齐全但违反题型约束
    #[error("题目记录无效: {0}")]
    InvalidRecord(String),
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 输出序列化失败
    #[error("JSON序列化失败: {0}")]
    SerializeFailed(#[from] serde_json::Error),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建LLM API调用错误
    pub fn llm_api_failed(
        backend: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Llm(LlmError::ApiCallFailed {
            backend: backend.into(),
            source: Box::new(source),
        })
    }

    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建JSON解析错误
    pub fn json_parse_failed(raw: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Parse(ParseError::Json {
            raw: raw.into(),
            message: message.into(),
        })
    }

    /// 是否为致命错误（输入错误或 LLM 不可用）
    pub fn is_fatal(&self) -> bool {
        !matches!(self, AppError::Parse(_) | AppError::Question(_))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_keeps_raw_text() {
        let err = ParseError::Json {
            raw: "not json".to_string(),
            message: "expected value".to_string(),
        };
        assert_eq!(err.raw(), "not json");
        assert!(err.to_string().contains("expected value"));
    }

    #[test]
    fn test_fatal_classification() {
        assert!(AppError::from(InputError::EmptyContent).is_fatal());
        assert!(AppError::from(LlmError::Unavailable).is_fatal());
        assert!(!AppError::json_parse_failed("x", "bad").is_fatal());
        assert!(!AppError::from(QuestionError::InvalidRecord("x".into())).is_fatal());
    }

    #[test]
    fn test_nested_display() {
        let err = AppError::from(LlmError::AllBackendsFailed {
            last_error: "timeout".to_string(),
        });
        assert_eq!(err.to_string(), "LLM错误: 所有LLM都不可用: timeout");
    }
}
