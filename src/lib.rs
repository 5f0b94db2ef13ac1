//! # Flow Automation
//!
//! 批量向网页版视频生成工具提交提示词的自动化程序，模拟真人操作，
//! 按远端并发上限排队，出错后自动重建会话并重试。
//!
//! ## 架构设计
//!
//! ### ① 驱动层（Browser / Infrastructure）
//! - `browser/` - `SurfaceDriver` / `SessionLauncher` 抽象与 Chromium 实现
//! - `infrastructure/` - `JsExecutor`，唯一的 page owner，提供 eval() 能力
//! - `human/` - 拟人操作：鼠标轨迹、点击位置、按键节奏、停顿
//!
//! ### ② 业务能力层（Services）
//! - `SessionManager` - 用户数据目录与登录状态机
//! - `AdmissionController` - 按时间窗口估算远端队列
//! - `RecoveryManager` - 清理、重启、重新登录、恢复设置
//! - `Diagnostics` - 错误截图
//! - `PromptGenerator` - LLM 生成提示词
//!
//! ### ③ 流程层（Workflow）
//! - `SubmissionFlow` - 一条提示词的完整提交过程
//!
//! ### ④ 编排层（Orchestration）
//! - `SubmissionPipeline` - 顺序游标、恢复循环、取消
//! - `App` - 按配置组装并输出统计
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod human;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use human::{InteractionSimulator, Operator};
pub use models::{GenerationTask, PromptBatch, PromptRecord};
pub use orchestrator::{App, PipelineOutcome, PipelineReport, SubmissionPipeline};
pub use workflow::{SubmissionFlow, SubmitOutcome};
