//! 文档分析
//!
//! 调用 LLM 分析文档，从自由文本回复中提取主题和关键知识点。
//! 解析本身不会失败：无论回复是什么，结果中的主题和知识点都不为空。

use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::AppResult;
use crate::models::Document;
use crate::services::llm_gateway::LlmGateway;
use crate::services::prompt_builder;
use crate::utils::logging::truncate_text;

/// 每个小节最多保留的条目数
const MAX_SECTION_ITEMS: usize = 12;
/// 条目最短长度（字符数，不含）
const MIN_ITEM_CHARS: usize = 3;

/// 分析结果
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocumentAnalysis {
    pub topics: Vec<String>,
    pub key_points: Vec<String>,
}

/// 文档分析服务
pub struct DocumentAnalyzer {
    bullet: Regex,
    numbered: Regex,
}

impl DocumentAnalyzer {
    pub fn new() -> AppResult<Self> {
        Ok(Self {
            bullet: Regex::new(r"^[-*+]\s*(.+)$")?,
            numbered: Regex::new(r"^\d+[.)]\s*(.+)$")?,
        })
    }

    /// 分析文档
    ///
    /// LLM 调用失败时返回错误（致命）；回复内容无法识别时使用兜底规则。
    pub async fn analyze(
        &self,
        gateway: &LlmGateway,
        document: &Document,
    ) -> AppResult<DocumentAnalysis> {
        info!("🔍 开始分析文档...");

        let prompt = prompt_builder::analysis_prompt(&document.title, &document.content);
        info!("调用LLM进行文档分析...");
        let response = gateway.invoke(&prompt).await?;
        debug!("📥 分析结果: {}", truncate_text(&response, 200));

        let analysis = self.parse_analysis(&response, document);
        info!(
            "✓ 文档分析完成，识别主题: {}个，关键点: {}个",
            analysis.topics.len(),
            analysis.key_points.len()
        );

        Ok(analysis)
    }

    /// 解析分析回复
    ///
    /// 按 `##` 切分小节，只根据小节标题行判断归属；都没识别到时退回到段落/行的启发式规则，
    /// 仍为空时再用文档标题和文档句子补齐。
    pub fn parse_analysis(&self, response: &str, document: &Document) -> DocumentAnalysis {
        let mut topics: Vec<String> = Vec::new();
        let mut key_points: Vec<String> = Vec::new();

        for section in response.split("##") {
            let section = section.trim();
            if section.is_empty() {
                continue;
            }

            let (header, body) = section.split_once('\n').unwrap_or((section, ""));
            let header = header.trim_start_matches('#').trim();
            let header_lower = header.to_lowercase();

            if header.starts_with("主要主题") || header_lower.contains("topic") {
                if topics.is_empty() {
                    topics = self.extract_list_items(body);
                }
            } else if header.starts_with("关键知识点")
                || header_lower.contains("key")
                || header.contains("知识点")
            {
                if key_points.is_empty() {
                    key_points = self.extract_list_items(body);
                }
            }
        }

        if topics.is_empty() && key_points.is_empty() {
            warn!("⚠️  未识别到分析小节，使用备用解析");
            let (fallback_topics, fallback_points) = fallback_parse(response);
            topics = fallback_topics;
            key_points = fallback_points;
        }

        if topics.is_empty() {
            let title = document.title.trim();
            topics.push(if title.is_empty() {
                "文档主题".to_string()
            } else {
                title.to_string()
            });
        }

        if key_points.is_empty() {
            key_points = fallback_key_points(&document.content);
        }

        DocumentAnalysis { topics, key_points }
    }

    /// 提取列表条目：项目符号、编号或普通行
    fn extract_list_items(&self, text: &str) -> Vec<String> {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|line| {
                self.bullet
                    .captures(line)
                    .or_else(|| self.numbered.captures(line))
                    .and_then(|caps| caps.get(1))
                    .map_or(line, |m| m.as_str())
                    .trim()
                    .to_string()
            })
            .filter(|item| item.chars().count() > MIN_ITEM_CHARS)
            .take(MAX_SECTION_ITEMS)
            .collect()
    }
}

/// 备用解析：长段落取前 3 句，否则取前 5 个非空行
fn fallback_parse(response: &str) -> (Vec<String>, Vec<String>) {
    let mut key_points: Vec<String> = response
        .split("\n\n")
        .map(str::trim)
        .filter(|p| p.chars().count() > 100)
        .flat_map(|p| {
            p.split('。')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .take(3)
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect();

    if key_points.is_empty() {
        key_points = response
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .take(5)
            .map(str::to_string)
            .collect();
    }

    (vec!["提取的主题".to_string()], key_points)
}

/// 从文档内容中取长度合适的句子作为知识点
fn fallback_key_points(content: &str) -> Vec<String> {
    let sentences: Vec<String> = content
        .split('。')
        .map(str::trim)
        .filter(|s| {
            let len = s.chars().count();
            len > 10 && len < 200
        })
        .take(8)
        .map(str::to_string)
        .collect();

    if sentences.is_empty() {
        vec!["文档内容概述".to_string()]
    } else {
        sentences
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::testing::FakeBackend;
    use crate::services::llm_gateway::BackendRole;
    use std::sync::Arc;

    const WELL_FORMED: &str = "## 主要主题\n- 机器学习概述\n- 监督学习方法\n\n## 关键知识点\n1. 监督学习使用标注数据\n2. 无监督学习发现隐藏结构\n- 过拟合\n* 强化学习通过奖励学习策略\n\n## 难度分层\n- 基础层（易）：监督学习的定义";

    fn doc(title: &str, content: &str) -> Document {
        Document::from_text(title, content, None)
    }

    #[test]
    fn test_parse_well_formed_reply() {
        let analyzer = DocumentAnalyzer::new().unwrap();
        let analysis = analyzer.parse_analysis(WELL_FORMED, &doc("机器学习", "正文"));

        assert_eq!(analysis.topics, vec!["机器学习概述", "监督学习方法"]);
        // "过拟合" 只有 3 个字符，被过滤
        assert_eq!(
            analysis.key_points,
            vec![
                "监督学习使用标注数据",
                "无监督学习发现隐藏结构",
                "强化学习通过奖励学习策略",
            ]
        );
    }

    #[test]
    fn test_header_line_is_not_an_item() {
        let analyzer = DocumentAnalyzer::new().unwrap();
        let analysis = analyzer.parse_analysis(
            "## Key Topics\n- Neural networks\n## Key points\n- Backpropagation",
            &doc("t", ""),
        );
        assert_eq!(analysis.topics, vec!["Neural networks"]);
        assert_eq!(analysis.key_points, vec!["Backpropagation"]);
    }

    #[test]
    fn test_items_capped_at_twelve() {
        let analyzer = DocumentAnalyzer::new().unwrap();
        let body: String = (1..=20).map(|i| format!("- 知识点编号{}\n", i)).collect();
        let reply = format!("## 关键知识点\n{}", body);
        let analysis = analyzer.parse_analysis(&reply, &doc("标题", ""));
        assert_eq!(analysis.key_points.len(), 12);
        assert_eq!(analysis.topics, vec!["标题"]);
    }

    #[test]
    fn test_fallback_uses_first_lines() {
        let analyzer = DocumentAnalyzer::new().unwrap();
        let reply = "第一行内容\n\n第二行内容\n第三行\n第四行\n第五行\n第六行";
        let analysis = analyzer.parse_analysis(reply, &doc("标题", ""));
        assert_eq!(analysis.topics, vec!["提取的主题"]);
        assert_eq!(
            analysis.key_points,
            vec!["第一行内容", "第二行内容", "第三行", "第四行", "第五行"]
        );
    }

    #[test]
    fn test_fallback_long_paragraph_sentences() {
        let analyzer = DocumentAnalyzer::new().unwrap();
        let sentence = "机器学习是一门研究计算机如何从数据中学习规律的学科";
        let paragraph = std::iter::repeat(sentence).take(5).collect::<Vec<_>>().join("。");
        let analysis = analyzer.parse_analysis(&paragraph, &doc("标题", ""));
        assert_eq!(analysis.key_points.len(), 3);
        assert!(analysis.key_points.iter().all(|p| p == sentence));
    }

    #[test]
    fn test_empty_reply_never_yields_empty_lists() {
        let analyzer = DocumentAnalyzer::new().unwrap();

        let analysis = analyzer.parse_analysis("", &doc("", ""));
        assert_eq!(analysis.topics, vec!["提取的主题"]);
        assert_eq!(analysis.key_points, vec!["文档内容概述"]);

        let content = "监督学习使用带标签的数据进行训练。短句。无监督学习从未标注数据中发现结构。";
        let analysis = analyzer.parse_analysis("   ", &doc("", content));
        assert_eq!(
            analysis.key_points,
            vec!["监督学习使用带标签的数据进行训练", "无监督学习从未标注数据中发现结构"]
        );
    }

    #[tokio::test]
    async fn test_analyze_sends_document_to_llm() {
        let backend = Arc::new(FakeBackend::new("fake").with_default(WELL_FORMED));
        let gateway = LlmGateway::new().with_backend(BackendRole::Primary, backend.clone());
        let analyzer = DocumentAnalyzer::new().unwrap();

        let analysis = analyzer
            .analyze(&gateway, &doc("机器学习", "监督学习使用标注数据。"))
            .await
            .unwrap();

        assert_eq!(analysis.topics.len(), 2);
        let prompts = backend.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("文档标题: 机器学习"));
    }

    #[tokio::test]
    async fn test_analyze_llm_failure_is_fatal() {
        let gateway = LlmGateway::new()
            .with_backend(BackendRole::Primary, Arc::new(FakeBackend::failing("fake")));
        let analyzer = DocumentAnalyzer::new().unwrap();

        let result = analyzer.analyze(&gateway, &doc("t", "内容")).await;
        assert!(result.unwrap_err().is_fatal());
    }
}
