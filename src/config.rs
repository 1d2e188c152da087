use crate::error::{AppError, AppResult, ConfigError, FileError};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

/// 程序配置
///
/// 默认值 → 可选的 TOML 文件（`CONFIG_FILE`）→ 环境变量，后者覆盖前者。
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 主 LLM（通义千问，OpenAI 兼容模式）---
    pub primary_api_key: String,
    pub primary_base_url: String,
    pub primary_model: String,
    // --- 备选 LLM（OpenAI 或兼容服务）---
    pub backup_api_key: String,
    pub backup_base_url: String,
    pub backup_model: String,
    // --- 生成参数 ---
    pub temperature: f32,
    pub max_tokens: u32,
    /// 每种题型选取的知识点数量
    pub max_questions_per_type: usize,
    /// 整批解析失败时是否用占位题兜底（显式开启）
    pub placeholder_on_failure: bool,
    // --- 输入输出 ---
    pub input_file: Option<String>,
    pub input_title: Option<String>,
    pub input_content: Option<String>,
    /// 没有其他输入时使用内置示例文档
    pub use_sample_document: bool,
    pub output_file: Option<String>,
    /// 运行日志文件
    pub output_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            primary_api_key: String::new(),
            primary_base_url: "https://dashscope.aliyuncs.com/compatible-mode/v1".to_string(),
            primary_model: "qwen-plus".to_string(),
            backup_api_key: String::new(),
            backup_base_url: "https://api.openai.com/v1".to_string(),
            backup_model: "gpt-3.5-turbo".to_string(),
            temperature: 0.7,
            max_tokens: 10000,
            max_questions_per_type: 5,
            placeholder_on_failure: false,
            input_file: None,
            input_title: None,
            input_content: None,
            use_sample_document: false,
            output_file: None,
            output_log_file: "question_generation.log".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 从环境变量加载配置（若设置了 `CONFIG_FILE` 则先读取该 TOML 文件）
    pub fn from_env() -> AppResult<Self> {
        let base = match std::env::var("CONFIG_FILE") {
            Ok(path) if !path.trim().is_empty() => Self::from_toml_file(Path::new(&path))?,
            _ => Self::default(),
        };
        base.apply_env()
    }

    /// 从 TOML 文件加载配置，缺省字段使用默认值
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
        Self::from_toml_str(&content).map_err(|source| {
            AppError::File(FileError::TomlParseFailed {
                path: path.display().to_string(),
                source,
            })
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// 用环境变量覆盖当前配置
    fn apply_env(self) -> AppResult<Self> {
        Ok(Self {
            primary_api_key: env_string("ALI_API_KEY").unwrap_or(self.primary_api_key),
            primary_base_url: env_string("DASHSCOPE_BASE_URL").unwrap_or(self.primary_base_url),
            primary_model: env_string("DEFAULT_MODEL").unwrap_or(self.primary_model),
            backup_api_key: env_string("OPENAI_API_KEY").unwrap_or(self.backup_api_key),
            backup_base_url: env_string("OPENAI_BASE_URL").unwrap_or(self.backup_base_url),
            backup_model: env_string("BACKUP_MODEL").unwrap_or(self.backup_model),
            temperature: env_parse("TEMPERATURE", "f32")?.unwrap_or(self.temperature),
            max_tokens: env_parse("MAX_TOKENS", "u32")?.unwrap_or(self.max_tokens),
            max_questions_per_type: env_parse("MAX_QUESTIONS_PER_TYPE", "usize")?
                .unwrap_or(self.max_questions_per_type),
            placeholder_on_failure: env_parse("PLACEHOLDER_ON_FAILURE", "bool")?
                .unwrap_or(self.placeholder_on_failure),
            input_file: env_string("INPUT_FILE").or(self.input_file),
            input_title: env_string("INPUT_TITLE").or(self.input_title),
            input_content: env_string("INPUT_CONTENT").or(self.input_content),
            use_sample_document: env_parse("USE_SAMPLE_DOCUMENT", "bool")?
                .unwrap_or(self.use_sample_document),
            output_file: env_string("OUTPUT_FILE").or(self.output_file),
            output_log_file: env_string("OUTPUT_LOG_FILE").unwrap_or(self.output_log_file),
            verbose_logging: env_parse("VERBOSE_LOGGING", "bool")?.unwrap_or(self.verbose_logging),
        })
    }

    /// 是否至少配置了一个 API 密钥
    pub fn has_any_api_key(&self) -> bool {
        !self.primary_api_key.trim().is_empty() || !self.backup_api_key.trim().is_empty()
    }
}

fn env_string(var_name: &str) -> Option<String> {
    std::env::var(var_name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: FromStr>(var_name: &str, expected_type: &str) -> AppResult<Option<T>> {
    match env_string(var_name) {
        Some(value) => parse_value(var_name, &value, expected_type).map(Some),
        None => Ok(None),
    }
}

fn parse_value<T: FromStr>(var_name: &str, value: &str, expected_type: &str) -> AppResult<T> {
    value.parse::<T>().map_err(|_| {
        AppError::Config(ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value: value.to_string(),
            expected_type: expected_type.to_string(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.primary_model, "qwen-plus");
        assert_eq!(config.backup_model, "gpt-3.5-turbo");
        assert_eq!(config.max_questions_per_type, 5);
        assert_eq!(config.max_tokens, 10000);
        assert!(!config.placeholder_on_failure);
        assert!(!config.has_any_api_key());
    }

    #[test]
    fn test_toml_partial_override() {
        let config = Config::from_toml_str(
            r#"
            backup_api_key = "sk-test"
            temperature = 0.2
            placeholder_on_failure = true
            "#,
        )
        .unwrap();
        assert_eq!(config.backup_api_key, "sk-test");
        assert_eq!(config.temperature, 0.2);
        assert!(config.placeholder_on_failure);
        // 未出现的字段保持默认
        assert_eq!(config.primary_model, "qwen-plus");
        assert!(config.has_any_api_key());
    }

    #[test]
    fn test_parse_value_error() {
        let err = parse_value::<u32>("MAX_TOKENS", "many", "u32").unwrap_err();
        assert!(matches!(
            err,
            AppError::Config(ConfigError::EnvVarParseFailed { .. })
        ));
        assert!(err.to_string().contains("MAX_TOKENS"));
    }
}
