use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 源文档
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// 文档标题
    pub title: String,
    /// 文档内容（规范化后为纯文本）
    pub content: String,
    /// 文档来源
    pub source: String,
    /// 文档元数据
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Document {
    /// 从文本创建文档
    pub fn from_text(
        title: impl Into<String>,
        content: impl Into<String>,
        source: Option<String>,
    ) -> Self {
        let content = content.into();
        let mut metadata = Map::new();
        metadata.insert(
            "content_length".to_string(),
            Value::from(content.chars().count()),
        );
        metadata.insert("created_from".to_string(), Value::from("text"));

        Self {
            title: title.into(),
            content,
            source: source.unwrap_or_else(|| "直接输入".to_string()),
            metadata,
        }
    }

    /// 内置示例文档
    pub fn sample() -> Self {
        Self::from_text("机器学习基础", SAMPLE_CONTENT, Some("示例文档".to_string()))
    }
}

const SAMPLE_CONTENT: &str = r#"# 机器学习基础

## 什么是机器学习

机器学习是人工智能的一个重要分支，它使计算机能够在不被明确编程的情况下进行学习。机器学习算法通过分析数据来识别模式，并基于这些模式做出预测或决策。

## 主要类型

### 监督学习
监督学习使用标记的训练数据来学习从输入到输出的映射。常见的监督学习任务包括：
- **分类**：预测离散的类别标签
- **回归**：预测连续的数值

### 无监督学习
无监督学习从未标记的数据中发现隐藏的模式。主要包括：
- **聚类**：将相似的数据点分组
- **降维**：减少数据的特征数量

### 强化学习
强化学习通过与环境的交互来学习最优策略。智能体通过试错来学习如何在特定环境中采取行动以最大化累积奖励。

## 常用算法

1. **线性回归**：用于预测连续值的基础算法
2. **逻辑回归**：用于二分类问题的线性模型
3. **决策树**：基于树结构进行决策的算法
4. **随机森林**：集成多个决策树的算法

## 关键概念

- **特征**：用于训练模型的输入变量
- **标签**：监督学习中的目标输出
- **过拟合**：模型在训练数据上表现很好但在新数据上表现较差
- **欠拟合**：模型过于简单，无法捕获数据中的模式
"#;
