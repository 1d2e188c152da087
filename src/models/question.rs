use serde::{Deserialize, Serialize};
use std::fmt;

/// 题目类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    /// 选择题
    MultipleChoice,
    /// 填空题
    FillInTheBlank,
    /// 连线题
    Matching,
}

impl QuestionType {
    pub const ALL: [QuestionType; 3] = [
        QuestionType::MultipleChoice,
        QuestionType::FillInTheBlank,
        QuestionType::Matching,
    ];

    /// 中文名称
    pub fn label(self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "选择题",
            QuestionType::FillInTheBlank => "填空题",
            QuestionType::Matching => "连线题",
        }
    }

    /// 题目 ID 前缀
    pub fn id_prefix(self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "mc",
            QuestionType::FillInTheBlank => "fb",
            QuestionType::Matching => "mt",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 难度等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// 宽松解析 LLM 给出的难度，无法识别时返回 None
    pub fn parse_lenient(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" | "简单" | "易" | "基础" => Some(Difficulty::Easy),
            "medium" | "中等" | "中" | "应用" => Some(Difficulty::Medium),
            "hard" | "困难" | "难" | "综合" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

/// 三种题型共有的字段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionMeta {
    pub question_id: String,
    pub question_type: QuestionType,
    pub question_text: String,
    pub topic: String,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub explanation: String,
}

/// 选择题
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultipleChoiceQuestion {
    #[serde(flatten)]
    pub meta: QuestionMeta,
    pub options: Vec<String>,
    pub correct_answer: String,
}

/// 填空题中的一个空
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blank {
    /// 从 1 开始的位置
    pub position: u32,
    pub correct_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// 填空题
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillInTheBlankQuestion {
    #[serde(flatten)]
    pub meta: QuestionMeta,
    pub blanks: Vec<Blank>,
}

/// 连线对
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingPair {
    pub left_item: String,
    pub right_item: String,
}

impl MatchingPair {
    pub fn new(left_item: impl Into<String>, right_item: impl Into<String>) -> Self {
        Self {
            left_item: left_item.into(),
            right_item: right_item.into(),
        }
    }
}

/// 连线题
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingQuestion {
    #[serde(flatten)]
    pub meta: QuestionMeta,
    pub left_items: Vec<String>,
    pub right_items: Vec<String>,
    pub correct_pairs: Vec<MatchingPair>,
}

/// 题目集合
///
/// 由第一个生成节点创建，之后每个生成节点只写自己负责的列表。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSet {
    pub document_title: String,
    #[serde(default)]
    pub multiple_choice: Vec<MultipleChoiceQuestion>,
    #[serde(default)]
    pub fill_in_the_blank: Vec<FillInTheBlankQuestion>,
    #[serde(default)]
    pub matching: Vec<MatchingQuestion>,
    pub generated_at: String,
}

impl QuestionSet {
    pub fn new(document_title: impl Into<String>) -> Self {
        Self {
            document_title: document_title.into(),
            multiple_choice: Vec::new(),
            fill_in_the_blank: Vec::new(),
            matching: Vec::new(),
            generated_at: chrono::Local::now()
                .format("%Y-%m-%dT%H:%M:%S%.6f")
                .to_string(),
        }
    }

    /// 题目总数
    pub fn total_questions(&self) -> usize {
        self.multiple_choice.len() + self.fill_in_the_blank.len() + self.matching.len()
    }

    /// 某一题型的题目数量
    pub fn count(&self, question_type: QuestionType) -> usize {
        match question_type {
            QuestionType::MultipleChoice => self.multiple_choice.len(),
            QuestionType::FillInTheBlank => self.fill_in_the_blank.len(),
            QuestionType::Matching => self.matching.len(),
        }
    }
}

/// 生成题目 ID：`{前缀}_{时间戳}_{8位随机串}`
pub fn generate_question_id(prefix: &str) -> String {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let short_uuid: String = uuid::Uuid::new_v4().simple().to_string().chars().take(8).collect();
    format!("{}_{}_{}", prefix, timestamp, short_uuid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_question_id_format() {
        let id = generate_question_id("mc");
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "mc");
        assert_eq!(parts[1].len(), 8);
        assert_eq!(parts[2].len(), 6);
        assert_eq!(parts[3].len(), 8);
        assert_ne!(id, generate_question_id("mc"));
    }

    #[test]
    fn test_difficulty_lenient() {
        assert_eq!(Difficulty::parse_lenient("EASY"), Some(Difficulty::Easy));
        assert_eq!(Difficulty::parse_lenient("困难"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::parse_lenient("extreme"), None);
    }

    #[test]
    fn test_flattened_serialization() {
        let q = MultipleChoiceQuestion {
            meta: QuestionMeta {
                question_id: "mc_001".to_string(),
                question_type: QuestionType::MultipleChoice,
                question_text: "1+1=?".to_string(),
                topic: "算术".to_string(),
                difficulty: Difficulty::Easy,
                explanation: String::new(),
            },
            options: vec!["A. 1".to_string(), "B. 2".to_string()],
            correct_answer: "B. 2".to_string(),
        };
        let value = serde_json::to_value(&q).unwrap();
        assert_eq!(value["question_id"], "mc_001");
        assert_eq!(value["question_type"], "multiple_choice");
        assert_eq!(value["difficulty"], "easy");
        assert_eq!(value["correct_answer"], "B. 2");
    }

    #[test]
    fn test_question_set_counts() {
        let set = QuestionSet::new("T");
        assert_eq!(set.total_questions(), 0);
        assert_eq!(set.count(QuestionType::Matching), 0);
        assert!(!set.generated_at.is_empty());
    }
}
