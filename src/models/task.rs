use serde::{Deserialize, Serialize};

/// 一条待提交的生成任务
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationTask {
    /// 原文段落编号（仅用于日志与对账）
    pub index: u32,
    pub prompt: String,
}

impl GenerationTask {
    pub fn new(index: u32, prompt: impl Into<String>) -> Self {
        Self {
            index,
            prompt: prompt.into(),
        }
    }
}

/// 提示词表格中的一行：`index,paragraph,prompt`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptRecord {
    pub index: u32,
    #[serde(default)]
    pub paragraph: String,
    #[serde(default)]
    pub prompt: String,
}

impl PromptRecord {
    pub fn is_generated(&self) -> bool {
        !self.prompt.trim().is_empty()
    }
}

/// 一批提示词生成结果，生成失败的条目保留为空提示词
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptBatch {
    pub records: Vec<PromptRecord>,
}

impl PromptBatch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 成功生成的数量
    pub fn successful(&self) -> usize {
        self.records.iter().filter(|r| r.is_generated()).count()
    }

    /// 生成失败（空提示词）的数量
    pub fn failed(&self) -> usize {
        self.len() - self.successful()
    }
}
