//! 任务处理上下文
//!
//! 封装"我正在提交第几条、第几次尝试"这一信息

use std::fmt::Display;

/// 任务处理上下文
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskCtx {
    /// 在本批中的位置（从1开始）
    pub position: usize,

    /// 本批任务总数
    pub total: usize,

    /// 表格中的段落编号
    pub index: u32,

    /// 本任务的第几次尝试（从1开始）
    pub attempt: u32,
}

impl TaskCtx {
    pub fn new(position: usize, total: usize, index: u32, attempt: u32) -> Self {
        Self {
            position,
            total,
            index,
            attempt,
        }
    }
}

impl Display for TaskCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}/{} #{}]", self.position, self.total, self.index)?;
        if self.attempt > 1 {
            write!(f, " (第 {} 次尝试)", self.attempt)?;
        }
        Ok(())
    }
}
