//! 输出格式化与题目校验
//!
//! 把题目集合、分析结果和生成报告组装成最终的 JSON 结构，并对每道题做结构检查。

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{
    FillInTheBlankQuestion, MatchingQuestion, MultipleChoiceQuestion, QuestionSet, QuestionType,
};
use crate::services::question_generator::GenerationReport;

/// 质量分数达到该值视为整体有效
pub const QUALITY_THRESHOLD: f64 = 0.8;

/// 填空题中的空白标记
pub const BLANK_MARKER: &str = "____";

/// 最终输出
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedOutput {
    pub metadata: OutputMetadata,
    pub questions: OutputQuestions,
    pub document_analysis: DocumentAnalysisOutput,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputMetadata {
    pub document_title: String,
    pub generated_at: String,
    pub statistics: Statistics,
    pub validation: ValidationReport,
    pub generation: GenerationReport,
}

/// 题目数量统计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_questions: usize,
    pub multiple_choice_count: usize,
    pub fill_in_the_blank_count: usize,
    pub matching_count: usize,
    pub generation_timestamp: String,
}

/// 校验结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub issues: Vec<String>,
    pub quality_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputQuestions {
    pub multiple_choice: Vec<MultipleChoiceQuestion>,
    pub fill_in_the_blank: Vec<FillInTheBlankQuestion>,
    pub matching: Vec<MatchingQuestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentAnalysisOutput {
    pub topics: Vec<String>,
    pub key_points: Vec<String>,
}

/// 组装最终输出
///
/// 题目集合不存在时返回错误（工作流进入错误处理）。
pub fn format_output(
    question_set: Option<&QuestionSet>,
    topics: &[String],
    key_points: &[String],
    generation: &GenerationReport,
) -> AppResult<FormattedOutput> {
    info!("📦 开始格式化输出...");

    let question_set =
        question_set.ok_or_else(|| AppError::Pipeline("没有生成任何题目".to_string()))?;

    let statistics = Statistics {
        total_questions: question_set.total_questions(),
        multiple_choice_count: question_set.count(QuestionType::MultipleChoice),
        fill_in_the_blank_count: question_set.count(QuestionType::FillInTheBlank),
        matching_count: question_set.count(QuestionType::Matching),
        generation_timestamp: question_set.generated_at.clone(),
    };

    let validation = validate_question_set(question_set);
    if !validation.valid {
        warn!(
            "⚠️  题目质量未达标: 质量分数 {:.2}，问题 {} 个",
            validation.quality_score,
            validation.issues.len()
        );
    }

    info!(
        "✓ 输出格式化完成，共生成 {} 道题目",
        statistics.total_questions
    );

    Ok(FormattedOutput {
        metadata: OutputMetadata {
            document_title: question_set.document_title.clone(),
            generated_at: question_set.generated_at.clone(),
            statistics,
            validation,
            generation: generation.clone(),
        },
        questions: OutputQuestions {
            multiple_choice: question_set.multiple_choice.clone(),
            fill_in_the_blank: question_set.fill_in_the_blank.clone(),
            matching: question_set.matching.clone(),
        },
        document_analysis: DocumentAnalysisOutput {
            topics: topics.to_vec(),
            key_points: key_points.to_vec(),
        },
    })
}

/// 校验整个题目集合
///
/// 质量分数 = 有效题数 / 总题数（没有题目时为 0）；分数不低于 0.8 视为有效。
pub fn validate_question_set(question_set: &QuestionSet) -> ValidationReport {
    let mut issues = Vec::new();
    let mut total = 0usize;
    let mut valid = 0usize;

    let mut tally = |label: &str, id: &str, found: Vec<String>| {
        total += 1;
        if found.is_empty() {
            valid += 1;
        } else {
            issues.extend(found.into_iter().map(|issue| format!("{} {}: {}", label, id, issue)));
        }
    };

    for q in &question_set.multiple_choice {
        tally(
            QuestionType::MultipleChoice.label(),
            &q.meta.question_id,
            validate_multiple_choice(q),
        );
    }
    for q in &question_set.fill_in_the_blank {
        tally(
            QuestionType::FillInTheBlank.label(),
            &q.meta.question_id,
            validate_fill_in_the_blank(q),
        );
    }
    for q in &question_set.matching {
        tally(
            QuestionType::Matching.label(),
            &q.meta.question_id,
            validate_matching(q),
        );
    }

    let quality_score = if total > 0 {
        valid as f64 / total as f64
    } else {
        0.0
    };

    ValidationReport {
        valid: quality_score >= QUALITY_THRESHOLD,
        issues,
        quality_score,
    }
}

pub fn validate_multiple_choice(question: &MultipleChoiceQuestion) -> Vec<String> {
    let mut issues = Vec::new();

    if question.meta.question_text.trim().is_empty() {
        issues.push("题目描述为空".to_string());
    }
    if question.options.len() < 2 {
        issues.push("选项数量少于2个".to_string());
    }
    if !question.options.contains(&question.correct_answer) {
        issues.push("正确答案不在选项列表中".to_string());
    }
    let unique: HashSet<&String> = question.options.iter().collect();
    if unique.len() != question.options.len() {
        issues.push("存在重复选项".to_string());
    }

    issues
}

pub fn validate_fill_in_the_blank(question: &FillInTheBlankQuestion) -> Vec<String> {
    let mut issues = Vec::new();

    if question.meta.question_text.trim().is_empty() {
        issues.push("题目描述为空".to_string());
    }
    if question.blanks.is_empty() {
        issues.push("没有空白信息".to_string());
    }

    let marker_count = question.meta.question_text.matches(BLANK_MARKER).count();
    if marker_count != question.blanks.len() {
        issues.push(format!(
            "空白标记数量({})与空白信息数量({})不匹配",
            marker_count,
            question.blanks.len()
        ));
    }

    for (idx, blank) in question.blanks.iter().enumerate() {
        if blank.correct_answer.trim().is_empty() {
            issues.push(format!("第{}个空白答案为空", idx + 1));
        }
    }

    issues
}

pub fn validate_matching(question: &MatchingQuestion) -> Vec<String> {
    let mut issues = Vec::new();

    if question.meta.question_text.trim().is_empty() {
        issues.push("题目描述为空".to_string());
    }
    if question.left_items.len() < 3 {
        issues.push("左侧项目少于3个".to_string());
    }
    if question.right_items.len() < 3 {
        issues.push("右侧项目少于3个".to_string());
    }
    if question.left_items.len() != question.right_items.len() {
        issues.push("左右两侧项目数量不相等".to_string());
    }
    if question.correct_pairs.is_empty() {
        issues.push("没有正确匹配对".to_string());
    }

    let mut left_matched = HashSet::new();
    let mut right_matched = HashSet::new();
    for pair in &question.correct_pairs {
        if !question.left_items.contains(&pair.left_item) {
            issues.push(format!("匹配对中的左侧项目'{}'不在左侧列表中", pair.left_item));
        }
        if !question.right_items.contains(&pair.right_item) {
            issues.push(format!("匹配对中的右侧项目'{}'不在右侧列表中", pair.right_item));
        }
        left_matched.insert(pair.left_item.as_str());
        right_matched.insert(pair.right_item.as_str());
    }

    if question
        .left_items
        .iter()
        .any(|item| !left_matched.contains(item.as_str()))
    {
        issues.push("不是所有左侧项目都有匹配".to_string());
    }
    if question
        .right_items
        .iter()
        .any(|item| !right_matched.contains(item.as_str()))
    {
        issues.push("不是所有右侧项目都有匹配".to_string());
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Blank, Difficulty, MatchingPair, QuestionMeta};
    use crate::services::question_generator::GenerationStatus;

    fn meta(kind: QuestionType, id: &str, text: &str) -> QuestionMeta {
        QuestionMeta {
            question_id: id.to_string(),
            question_type: kind,
            question_text: text.to_string(),
            topic: "测试".to_string(),
            difficulty: Difficulty::Medium,
            explanation: String::new(),
        }
    }

    fn mc(id: &str, options: &[&str], answer: &str) -> MultipleChoiceQuestion {
        MultipleChoiceQuestion {
            meta: meta(QuestionType::MultipleChoice, id, "哪个正确？"),
            options: options.iter().map(|s| s.to_string()).collect(),
            correct_answer: answer.to_string(),
        }
    }

    fn fb(text: &str, answers: &[&str]) -> FillInTheBlankQuestion {
        FillInTheBlankQuestion {
            meta: meta(QuestionType::FillInTheBlank, "fb_1", text),
            blanks: answers
                .iter()
                .enumerate()
                .map(|(i, a)| Blank {
                    position: i as u32 + 1,
                    correct_answer: a.to_string(),
                    hint: None,
                })
                .collect(),
        }
    }

    fn mt(left: &[&str], right: &[&str], pairs: &[(&str, &str)]) -> MatchingQuestion {
        MatchingQuestion {
            meta: meta(QuestionType::Matching, "mt_1", "请匹配"),
            left_items: left.iter().map(|s| s.to_string()).collect(),
            right_items: right.iter().map(|s| s.to_string()).collect(),
            correct_pairs: pairs.iter().map(|(l, r)| MatchingPair::new(*l, *r)).collect(),
        }
    }

    #[test]
    fn test_multiple_choice_rules() {
        assert!(validate_multiple_choice(&mc("a", &["A", "B"], "A")).is_empty());
        assert_eq!(
            validate_multiple_choice(&mc("a", &["A", "B"], "C")),
            vec!["正确答案不在选项列表中"]
        );
        assert_eq!(
            validate_multiple_choice(&mc("a", &["A", "A"], "A")),
            vec!["存在重复选项"]
        );
        assert_eq!(
            validate_multiple_choice(&mc("a", &["A"], "A")),
            vec!["选项数量少于2个"]
        );
    }

    #[test]
    fn test_fill_in_the_blank_rules() {
        assert!(validate_fill_in_the_blank(&fb("____是____", &["a", "b"])).is_empty());
        assert_eq!(
            validate_fill_in_the_blank(&fb("____是什么", &["a", "b"])),
            vec!["空白标记数量(1)与空白信息数量(2)不匹配"]
        );
        assert_eq!(
            validate_fill_in_the_blank(&fb("____是____", &["a", " "])),
            vec!["第2个空白答案为空"]
        );
    }

    #[test]
    fn test_matching_rules() {
        let full = [("a", "1"), ("b", "2"), ("c", "3")];
        assert!(validate_matching(&mt(&["a", "b", "c"], &["1", "2", "3"], &full)).is_empty());

        let issues = validate_matching(&mt(&["a", "b", "c"], &["1", "2", "3", "4"], &full));
        assert_eq!(
            issues,
            vec!["左右两侧项目数量不相等", "不是所有右侧项目都有匹配"]
        );

        let issues = validate_matching(&mt(
            &["a", "b", "c"],
            &["1", "2", "3"],
            &[("a", "1"), ("b", "2"), ("x", "3")],
        ));
        assert_eq!(
            issues,
            vec!["匹配对中的左侧项目'x'不在左侧列表中", "不是所有左侧项目都有匹配"]
        );
    }

    #[test]
    fn test_quality_score_threshold() {
        let mut set = QuestionSet::new("文档");
        set.multiple_choice = (0..4)
            .map(|i| mc(&format!("mc_{}", i), &["A", "B"], "A"))
            .collect();
        set.multiple_choice.push(mc("mc_bad", &["A", "B"], "C"));

        let report = validate_question_set(&set);
        assert!((report.quality_score - 0.8).abs() < f64::EPSILON);
        assert!(report.valid);
        assert_eq!(report.issues, vec!["选择题 mc_bad: 正确答案不在选项列表中"]);

        set.fill_in_the_blank.push(fb("没有标记", &["a"]));
        let report = validate_question_set(&set);
        assert!(!report.valid);
        assert_eq!(report.issues.len(), 2);
    }

    #[test]
    fn test_empty_set_scores_zero() {
        let report = validate_question_set(&QuestionSet::new("空"));
        assert_eq!(report.quality_score, 0.0);
        assert!(!report.valid);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_format_output_shape() {
        let mut set = QuestionSet::new("机器学习");
        set.multiple_choice.push(mc("mc_1", &["A", "B"], "A"));
        let mut generation = GenerationReport::default();
        generation.record(
            QuestionType::MultipleChoice,
            GenerationStatus::Generated { count: 1, dropped: 0 },
        );

        let output = format_output(
            Some(&set),
            &["主题".to_string()],
            &["知识点".to_string()],
            &generation,
        )
        .unwrap();

        let value = serde_json::to_value(&output).unwrap();
        assert_eq!(value["metadata"]["document_title"], "机器学习");
        assert_eq!(value["metadata"]["statistics"]["total_questions"], 1);
        assert_eq!(value["metadata"]["statistics"]["matching_count"], 0);
        assert_eq!(value["metadata"]["validation"]["valid"], true);
        assert_eq!(value["metadata"]["generation"]["multiple_choice"]["status"], "generated");
        assert_eq!(value["metadata"]["generation"]["matching"]["status"], "pending");
        assert_eq!(value["questions"]["multiple_choice"][0]["question_id"], "mc_1");
        assert_eq!(value["document_analysis"]["topics"][0], "主题");
    }

    #[test]
    fn test_format_output_without_questions_is_error() {
        let result = format_output(None, &[], &[], &GenerationReport::default());
        assert!(matches!(result, Err(AppError::Pipeline(msg)) if msg == "没有生成任何题目"));
    }
}
