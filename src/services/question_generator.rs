//! 题目生成 - 业务能力层
//!
//! 三种题型共用同一套流程：选取知识点 → 构建提示词 → 调用 LLM → 解析 JSON → 逐条构造题目。
//! 题型之间的差异由 [`GeneratedQuestion`] 描述。
//!
//! 错误分级：
//! - LLM 调用失败：致命，直接返回错误
//! - 整个回复无法解析：本地恢复，结果为 `Failed`（或显式开启后的 `Fallback` 占位题）
//! - 单条记录不合法：丢弃该条并计数

use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{AppResult, QuestionError};
use crate::models::question::generate_question_id;
use crate::models::{
    Blank, Difficulty, FillInTheBlankQuestion, MatchingPair, MatchingQuestion,
    MultipleChoiceQuestion, QuestionMeta, QuestionSet, QuestionType,
};
use crate::services::llm_gateway::{parse_json_response, LlmGateway};
use crate::services::prompt_builder;

/// 连线题选取的知识点数量（取最后若干个）
const MATCHING_KEY_POINTS: usize = 6;
/// 填空题起始偏移的上限
const FILL_BLANK_MAX_OFFSET: usize = 3;

// ========== 生成结果 ==========

/// 单个题型的生成结果
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome<Q> {
    /// 正常生成，`dropped` 为被丢弃的记录数
    Generated { questions: Vec<Q>, dropped: usize },
    /// 回复无法解析，使用了占位题
    Fallback { questions: Vec<Q>, reason: String },
    /// 回复无法解析，没有题目
    Failed { reason: String },
    /// 没有可用的知识点，未调用 LLM
    Skipped,
}

impl<Q> GenerationOutcome<Q> {
    /// 本次生成得到的题目
    pub fn into_questions(self) -> Vec<Q> {
        match self {
            GenerationOutcome::Generated { questions, .. }
            | GenerationOutcome::Fallback { questions, .. } => questions,
            GenerationOutcome::Failed { .. } | GenerationOutcome::Skipped => Vec::new(),
        }
    }

    /// 用于输出报告的状态
    pub fn status(&self) -> GenerationStatus {
        match self {
            GenerationOutcome::Generated { questions, dropped } => GenerationStatus::Generated {
                count: questions.len(),
                dropped: *dropped,
            },
            GenerationOutcome::Fallback { reason, .. } => GenerationStatus::Fallback {
                reason: reason.clone(),
            },
            GenerationOutcome::Failed { reason } => GenerationStatus::Failed {
                reason: reason.clone(),
            },
            GenerationOutcome::Skipped => GenerationStatus::Skipped,
        }
    }
}

/// 生成状态（写入输出 JSON 的 `metadata.generation`）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GenerationStatus {
    /// 对应节点尚未运行
    #[default]
    Pending,
    Generated { count: usize, dropped: usize },
    Fallback { reason: String },
    Failed { reason: String },
    Skipped,
}

/// 三个题型的生成状态
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub multiple_choice: GenerationStatus,
    pub fill_in_the_blank: GenerationStatus,
    pub matching: GenerationStatus,
}

impl GenerationReport {
    pub fn get(&self, question_type: QuestionType) -> &GenerationStatus {
        match question_type {
            QuestionType::MultipleChoice => &self.multiple_choice,
            QuestionType::FillInTheBlank => &self.fill_in_the_blank,
            QuestionType::Matching => &self.matching,
        }
    }

    pub fn record(&mut self, question_type: QuestionType, status: GenerationStatus) {
        match question_type {
            QuestionType::MultipleChoice => self.multiple_choice = status,
            QuestionType::FillInTheBlank => self.fill_in_the_blank = status,
            QuestionType::Matching => self.matching = status,
        }
    }
}

// ========== 题型描述 ==========

/// 一种可由 LLM 生成的题型
pub trait GeneratedQuestion: Sized {
    const KIND: QuestionType;

    /// LLM 返回的单条记录
    type Record: DeserializeOwned;

    fn build_prompt(topic: &str, key_points: &[String]) -> String;

    /// 从记录构造题目；缺少的可选字段用默认值补齐
    fn from_record(record: Self::Record, topic: &str) -> Result<Self, QuestionError>;

    /// 占位题（仅在显式开启时使用）
    fn placeholder(topic: &str) -> Self;

    /// 该题型在题目集合中对应的列表
    fn slot(set: &mut QuestionSet) -> &mut Vec<Self>;
}

/// 按题型选取知识点
///
/// - 选择题：前 `limit` 个
/// - 填空题：从 `min(3, len / 3)` 开始的 `limit` 个
/// - 连线题：最后 6 个
pub fn select_key_points(
    question_type: QuestionType,
    key_points: &[String],
    limit: usize,
) -> &[String] {
    let len = key_points.len();
    match question_type {
        QuestionType::MultipleChoice => &key_points[..limit.min(len)],
        QuestionType::FillInTheBlank => {
            let start = FILL_BLANK_MAX_OFFSET.min(len / 3);
            let end = start.saturating_add(limit).min(len);
            &key_points[start..end]
        }
        QuestionType::Matching => &key_points[len.saturating_sub(MATCHING_KEY_POINTS)..],
    }
}

#[allow(clippy::too_many_arguments)]
fn build_meta(
    kind: QuestionType,
    question_id: Option<String>,
    question_text: String,
    topic: Option<String>,
    default_topic: &str,
    difficulty: Option<String>,
    default_difficulty: Difficulty,
    explanation: Option<String>,
) -> QuestionMeta {
    QuestionMeta {
        question_id: question_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| generate_question_id(kind.id_prefix())),
        question_type: kind,
        question_text,
        topic: topic
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| default_topic.to_string()),
        difficulty: difficulty
            .as_deref()
            .and_then(Difficulty::parse_lenient)
            .unwrap_or(default_difficulty),
        explanation: explanation.unwrap_or_default(),
    }
}

/// LLM 常把数字写成字符串或反过来，记录里的标量按两种写法都接受
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Scalar::Text(text) => text,
            Scalar::Integer(n) => n.to_string(),
            Scalar::Float(n) => n.to_string(),
        }
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(Scalar::into_text))
}

fn lenient_position<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    match Scalar::deserialize(deserializer)? {
        Scalar::Integer(n) => u32::try_from(n).map_err(de::Error::custom),
        Scalar::Text(text) => text.trim().parse().map_err(de::Error::custom),
        Scalar::Float(n) => Err(de::Error::custom(format!("空白位置不是整数: {}", n))),
    }
}

/// 选择题记录
#[derive(Debug, Deserialize)]
pub struct MultipleChoiceRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    question_id: Option<String>,
    question_text: String,
    options: Vec<String>,
    correct_answer: String,
    #[serde(default, deserialize_with = "lenient_string")]
    topic: Option<String>,
    difficulty: Option<String>,
    explanation: Option<String>,
}

impl GeneratedQuestion for MultipleChoiceQuestion {
    const KIND: QuestionType = QuestionType::MultipleChoice;
    type Record = MultipleChoiceRecord;

    fn build_prompt(topic: &str, key_points: &[String]) -> String {
        prompt_builder::multiple_choice_prompt(topic, key_points)
    }

    fn from_record(record: Self::Record, topic: &str) -> Result<Self, QuestionError> {
        if !(2..=6).contains(&record.options.len()) {
            return Err(QuestionError::InvalidRecord(format!(
                "选项数量为 {}，应为 2-6 个",
                record.options.len()
            )));
        }
        if !record.options.contains(&record.correct_answer) {
            return Err(QuestionError::InvalidRecord(format!(
                "正确答案 '{}' 不在选项列表中",
                record.correct_answer
            )));
        }

        Ok(Self {
            meta: build_meta(
                Self::KIND,
                record.question_id,
                record.question_text,
                record.topic,
                topic,
                record.difficulty,
                Difficulty::Medium,
                record.explanation,
            ),
            options: record.options,
            correct_answer: record.correct_answer,
        })
    }

    fn placeholder(topic: &str) -> Self {
        Self {
            meta: QuestionMeta {
                question_id: generate_question_id(Self::KIND.id_prefix()),
                question_type: Self::KIND,
                question_text: format!("关于{}的以下说法，哪一个是正确的？", topic),
                topic: topic.to_string(),
                difficulty: Difficulty::Medium,
                explanation: "这是一道示例题目".to_string(),
            },
            options: ["A. 选项1", "B. 选项2", "C. 选项3", "D. 选项4"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            correct_answer: "A. 选项1".to_string(),
        }
    }

    fn slot(set: &mut QuestionSet) -> &mut Vec<Self> {
        &mut set.multiple_choice
    }
}

/// 填空题中单个空的记录
#[derive(Debug, Deserialize)]
pub struct BlankRecord {
    #[serde(deserialize_with = "lenient_position")]
    position: u32,
    correct_answer: String,
    hint: Option<String>,
}

/// 填空题记录
#[derive(Debug, Deserialize)]
pub struct FillInTheBlankRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    question_id: Option<String>,
    question_text: String,
    blanks: Vec<BlankRecord>,
    #[serde(default, deserialize_with = "lenient_string")]
    topic: Option<String>,
    difficulty: Option<String>,
    explanation: Option<String>,
}

impl GeneratedQuestion for FillInTheBlankQuestion {
    const KIND: QuestionType = QuestionType::FillInTheBlank;
    type Record = FillInTheBlankRecord;

    fn build_prompt(topic: &str, key_points: &[String]) -> String {
        prompt_builder::fill_in_the_blank_prompt(topic, key_points)
    }

    fn from_record(record: Self::Record, topic: &str) -> Result<Self, QuestionError> {
        let blanks = record
            .blanks
            .into_iter()
            .map(|b| Blank {
                position: b.position,
                correct_answer: b.correct_answer,
                hint: b.hint.filter(|h| !h.trim().is_empty()),
            })
            .collect();

        Ok(Self {
            meta: build_meta(
                Self::KIND,
                record.question_id,
                record.question_text,
                record.topic,
                topic,
                record.difficulty,
                Difficulty::Medium,
                record.explanation,
            ),
            blanks,
        })
    }

    fn placeholder(topic: &str) -> Self {
        Self {
            meta: QuestionMeta {
                question_id: generate_question_id(Self::KIND.id_prefix()),
                question_type: Self::KIND,
                question_text: format!("{}的核心概念是____，它的主要特点包括____。", topic),
                topic: topic.to_string(),
                difficulty: Difficulty::Medium,
                explanation: "这是一道示例填空题".to_string(),
            },
            blanks: vec![
                Blank {
                    position: 1,
                    correct_answer: "核心概念".to_string(),
                    hint: Some("主要概念".to_string()),
                },
                Blank {
                    position: 2,
                    correct_answer: "特点".to_string(),
                    hint: Some("主要特征".to_string()),
                },
            ],
        }
    }

    fn slot(set: &mut QuestionSet) -> &mut Vec<Self> {
        &mut set.fill_in_the_blank
    }
}

/// 连线题记录
#[derive(Debug, Deserialize)]
pub struct MatchingRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    question_id: Option<String>,
    question_text: String,
    left_items: Vec<String>,
    right_items: Vec<String>,
    correct_pairs: Vec<MatchingPair>,
    #[serde(default, deserialize_with = "lenient_string")]
    topic: Option<String>,
    difficulty: Option<String>,
    explanation: Option<String>,
}

impl GeneratedQuestion for MatchingQuestion {
    const KIND: QuestionType = QuestionType::Matching;
    type Record = MatchingRecord;

    fn build_prompt(topic: &str, key_points: &[String]) -> String {
        prompt_builder::matching_prompt(topic, key_points)
    }

    fn from_record(record: Self::Record, topic: &str) -> Result<Self, QuestionError> {
        if record.left_items.len() < 3 || record.right_items.len() < 3 {
            return Err(QuestionError::InvalidRecord(format!(
                "左右两侧至少各需 3 项（当前 {} / {}）",
                record.left_items.len(),
                record.right_items.len()
            )));
        }
        for pair in &record.correct_pairs {
            if !record.left_items.contains(&pair.left_item) {
                return Err(QuestionError::InvalidRecord(format!(
                    "左侧项目 '{}' 不在左侧列表中",
                    pair.left_item
                )));
            }
            if !record.right_items.contains(&pair.right_item) {
                return Err(QuestionError::InvalidRecord(format!(
                    "右侧项目 '{}' 不在右侧列表中",
                    pair.right_item
                )));
            }
        }

        Ok(Self {
            meta: build_meta(
                Self::KIND,
                record.question_id,
                record.question_text,
                record.topic,
                topic,
                record.difficulty,
                Difficulty::Hard,
                record.explanation,
            ),
            left_items: record.left_items,
            right_items: record.right_items,
            correct_pairs: record.correct_pairs,
        })
    }

    fn placeholder(topic: &str) -> Self {
        let left_items: Vec<String> = ["概念A", "概念B", "概念C", "概念D"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let right_items: Vec<String> = ["定义1", "定义2", "定义3", "定义4"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let correct_pairs = left_items
            .iter()
            .zip(right_items.iter())
            .map(|(l, r)| MatchingPair::new(l.as_str(), r.as_str()))
            .collect();

        Self {
            meta: QuestionMeta {
                question_id: generate_question_id(Self::KIND.id_prefix()),
                question_type: Self::KIND,
                question_text: format!("请将下列关于{}的概念与其定义进行匹配：", topic),
                topic: topic.to_string(),
                difficulty: Difficulty::Hard,
                explanation: "这是一道示例连线题".to_string(),
            },
            left_items,
            right_items,
            correct_pairs,
        }
    }

    fn slot(set: &mut QuestionSet) -> &mut Vec<Self> {
        &mut set.matching
    }
}

// ========== 生成服务 ==========

/// 题目生成服务
#[derive(Debug, Clone)]
pub struct QuestionGenerator {
    max_questions_per_type: usize,
    placeholder_on_failure: bool,
}

impl QuestionGenerator {
    pub fn new(config: &Config) -> Self {
        Self::with_options(config.max_questions_per_type, config.placeholder_on_failure)
    }

    pub fn with_options(max_questions_per_type: usize, placeholder_on_failure: bool) -> Self {
        Self {
            max_questions_per_type,
            placeholder_on_failure,
        }
    }

    /// 生成一种题型的题目
    ///
    /// 返回 `Err` 仅当 LLM 调用失败。
    pub async fn generate<Q: GeneratedQuestion>(
        &self,
        gateway: &LlmGateway,
        topic: &str,
        key_points: &[String],
    ) -> AppResult<GenerationOutcome<Q>> {
        let label = Q::KIND.label();
        info!("📝 开始生成{}...", label);

        let selected = select_key_points(Q::KIND, key_points, self.max_questions_per_type);
        if selected.is_empty() {
            warn!("⚠️  没有可用的知识点，跳过{}", label);
            return Ok(GenerationOutcome::Skipped);
        }

        let prompt = Q::build_prompt(topic, selected);
        info!("调用LLM生成{}（知识点 {} 个）...", label, selected.len());
        let response = gateway.invoke(&prompt).await?;

        let outcome = self.parse_questions::<Q>(&response, topic);
        match &outcome {
            GenerationOutcome::Generated { questions, dropped } => {
                info!("✓ 成功生成 {} 道{}", questions.len(), label);
                if *dropped > 0 {
                    warn!("⚠️  {} 条{}记录不合法，已丢弃", dropped, label);
                }
            }
            GenerationOutcome::Fallback { reason, .. } => {
                warn!("⚠️  {}解析失败，使用占位题: {}", label, reason)
            }
            GenerationOutcome::Failed { reason } => warn!("❌ {}解析失败: {}", label, reason),
            GenerationOutcome::Skipped => {}
        }

        Ok(outcome)
    }

    /// 解析 LLM 回复（JSON 数组或单个对象）
    pub fn parse_questions<Q: GeneratedQuestion>(
        &self,
        response: &str,
        topic: &str,
    ) -> GenerationOutcome<Q> {
        let value = match parse_json_response(response) {
            Ok(value) => value,
            Err(e) => {
                let reason = e.to_string();
                return if self.placeholder_on_failure {
                    GenerationOutcome::Fallback {
                        questions: vec![Q::placeholder(topic)],
                        reason,
                    }
                } else {
                    GenerationOutcome::Failed { reason }
                };
            }
        };

        let records = match value {
            Value::Array(items) => items,
            other => vec![other],
        };

        let mut questions = Vec::with_capacity(records.len());
        let mut dropped = 0;

        for (idx, record) in records.into_iter().enumerate() {
            let built = serde_json::from_value::<Q::Record>(record)
                .map_err(|e| QuestionError::MalformedRecord(e.to_string()))
                .and_then(|record| Q::from_record(record, topic));

            match built {
                Ok(question) => questions.push(question),
                Err(e) => {
                    warn!("{} 第 {} 条记录被丢弃: {}", Q::KIND.label(), idx + 1, e);
                    dropped += 1;
                }
            }
        }

        GenerationOutcome::Generated { questions, dropped }
    }
}
