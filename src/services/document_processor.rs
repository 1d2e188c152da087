//! 文档规范化
//!
//! 把轻量标记（Markdown 风格的标题、强调、代码、链接、引用、列表、表格以及 HTML 标签）
//! 转成纯文本，再整理空白。

use regex::{Captures, Regex};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{AppResult, InputError};
use crate::models::Document;

/// 文档规范化服务
pub struct DocumentProcessor {
    /// 按顺序执行的 (模式, 替换) 规则
    rules: Vec<(Regex, &'static str)>,
    table_row: Regex,
    inline_space: Regex,
}

impl DocumentProcessor {
    pub fn new() -> AppResult<Self> {
        let specs: [(&str, &'static str); 14] = [
            // 代码围栏行，保留代码内容
            (r"(?m)^[ \t]*(```|~~~).*$", ""),
            // 只去掉形如标签的片段，`x < 5 且 y > 3` 这类比较保留
            (r"</?[A-Za-z][A-Za-z0-9-]*(?:\s+[A-Za-z_:][^<>]*)?\s*/?>", ""),
            (r"!\[([^\]]*)\]\([^)]*\)", "${1}"),
            (r"\[([^\]]+)\]\([^)]*\)", "${1}"),
            // 表格分隔行 |---|:---:|
            (r"(?m)^[ \t]*\|?[ \t]*:?-{3,}:?[ \t]*(\|[ \t]*:?-{3,}:?[ \t]*)*\|?[ \t]*$", ""),
            // 水平线
            (r"(?m)^[ \t]*([-*_][ \t]*){3,}$", ""),
            (r"(?m)^[ \t]{0,3}#{1,6}[ \t]+", ""),
            (r"(?m)^[ \t]*>[ \t]?", ""),
            (r"(?m)^([ \t]*)([-*+]|\d+[.)])[ \t]+", "${1}"),
            (r"\*\*([^*\n]+)\*\*", "${1}"),
            (r"__([^_\n]+)__", "${1}"),
            (r"\*([^*\n]+)\*", "${1}"),
            (r"~~([^~\n]+)~~", "${1}"),
            (r"`([^`\n]+)`", "${1}"),
        ];

        let rules = specs
            .iter()
            .map(|(pattern, replacement)| -> AppResult<(Regex, &'static str)> {
                Ok((Regex::new(pattern)?, *replacement))
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Self {
            rules,
            table_row: Regex::new(r"(?m)^[ \t]*\|(.*?)\|?[ \t]*$")?,
            inline_space: Regex::new(r"[ \t]+")?,
        })
    }

    /// 规范化文档
    ///
    /// 内容为空（或清理后为空）时返回 [`InputError::EmptyContent`]。
    pub fn process(&self, document: Document) -> AppResult<Document> {
        info!("📄 开始处理文档: {}", document.title);

        if document.content.trim().is_empty() {
            return Err(InputError::EmptyContent.into());
        }

        let processed = self.clean_markup(&document.content);
        if processed.is_empty() {
            return Err(InputError::EmptyContent.into());
        }

        let original_length = document.content.chars().count();
        let content_length = processed.chars().count();

        let mut metadata = document.metadata;
        metadata.insert("processed".to_string(), Value::Bool(true));
        metadata.insert("content_length".to_string(), Value::from(content_length));
        metadata.insert("original_length".to_string(), Value::from(original_length));

        info!("✓ 文档处理完成，内容长度: {}", content_length);
        debug!("原始长度: {}，处理后长度: {}", original_length, content_length);

        Ok(Document {
            title: document.title,
            content: processed,
            source: document.source,
            metadata,
        })
    }

    /// 去掉标记并整理空白：行内空白压缩为一个空格，每行去首尾空白，
    /// 连续空行最多保留一个，最后整体去首尾空白
    pub fn clean_markup(&self, content: &str) -> String {
        let normalized = content.replace("\r\n", "\n");

        let mut text = self
            .rules
            .iter()
            .fold(normalized, |acc, (re, replacement)| {
                re.replace_all(&acc, *replacement).into_owned()
            });

        text = self
            .table_row
            .replace_all(&text, |caps: &Captures| caps[1].replace('|', " "))
            .into_owned();
        text = self.inline_space.replace_all(&text, " ").into_owned();

        let mut lines: Vec<&str> = Vec::new();
        let mut blank_run = 0;
        for line in text.lines().map(str::trim) {
            if line.is_empty() {
                blank_run += 1;
                if blank_run <= 1 {
                    lines.push("");
                }
            } else {
                blank_run = 0;
                lines.push(line);
            }
        }

        lines.join("\n").trim().to_string()
    }
}
