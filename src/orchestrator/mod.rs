//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责按顺序调度提交和恢复，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量提交处理器
//! - 管理应用生命周期（初始化、运行、清理）
//! - 按配置组装会话、准入、恢复、截图等组件
//! - 输出全局统计信息
//!
//! ### `pipeline` - 提交管线
//! - 维护任务游标，只在确认成功后前进
//! - 出错后调用 RecoveryManager，恢复失败则冷却后重试
//! - 支持取消和 AttemptHook
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (组装 + 统计)
//!     ↓
//! pipeline (处理 Vec<GenerationTask>)
//!     ↓
//! workflow::SubmissionFlow (处理单条 GenerationTask)
//!     ↓
//! services (能力层：session / admission / recovery / diagnostics)
//!     ↓
//! browser + human (驱动与拟人操作)
//! ```

pub mod batch_processor;
pub mod pipeline;

// 重新导出主要类型
pub use batch_processor::{build_pipeline, App};
pub use pipeline::{
    AttemptHook, MaxAttempts, PipelineOutcome, PipelineReport, SubmissionPipeline, Unbounded,
};
