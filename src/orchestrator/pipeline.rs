//! 提交管线 - 编排层
//!
//! ## 职责
//!
//! 按输入顺序逐条提交任务，任何一条失败（远端报错或驱动故障）都先恢复会话，
//! 再重试同一条。游标只在确认成功后前进，没有重试上限。
//!
//! ## 循环
//!
//! ```text
//! ┌─> 取消? / AttemptHook 允许继续?
//! │     ↓
//! │   有待恢复? ──失败──> 冷却 ─┐
//! │     ↓ 成功                 │
//! │   SubmissionFlow::submit_once
//! │     ├─ Accepted    → 游标 +1，停顿 2-4s
//! │     ├─ RemoteError → 截图，关闭提示，标记待恢复
//! │     └─ Err         → 标记待恢复
//! └─────────────────────────────┘
//! ```

use std::ops::ControlFlow;
use std::path::PathBuf;
use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::error::{AppError, AppResult};
use crate::human::Operator;
use crate::models::GenerationTask;
use crate::services::{AdmissionController, Diagnostics, RecoveryManager, SessionManager};
use crate::workflow::{SubmissionFlow, SubmitOutcome, TaskCtx};

/// 管线结束方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineOutcome {
    /// 所有任务均已按顺序提交
    #[default]
    Completed,
    /// 被取消或被 AttemptHook 叫停
    Interrupted,
}

/// 运行统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub total: usize,
    pub submitted: usize,
    pub remote_errors: usize,
    pub driver_faults: usize,
    pub recoveries: usize,
    pub recovery_failures: usize,
    /// 循环轮数（含恢复失败后的空转）
    pub attempts: u64,
    pub snapshots: Vec<PathBuf>,
    pub outcome: PipelineOutcome,
}

impl PipelineReport {
    pub fn is_complete(&self) -> bool {
        self.outcome == PipelineOutcome::Completed && self.submitted == self.total
    }

    /// 未全部提交时转为错误，让进程以非零状态退出
    pub fn ensure_complete(&self) -> AppResult<()> {
        if self.is_complete() {
            return Ok(());
        }
        Err(AppError::Incomplete {
            submitted: self.submitted,
            total: self.total,
        })
    }
}

/// 每轮循环前的检查点
///
/// 生产环境不设上限；测试用它把无限重试限制在有限轮数内。
pub trait AttemptHook: Send {
    fn before_attempt(&mut self, attempt: u64, report: &PipelineReport) -> ControlFlow<()>;
}

/// 永不叫停
pub struct Unbounded;

impl AttemptHook for Unbounded {
    fn before_attempt(&mut self, _attempt: u64, _report: &PipelineReport) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}

/// 最多运行 n 轮
pub struct MaxAttempts(pub u64);

impl AttemptHook for MaxAttempts {
    fn before_attempt(&mut self, attempt: u64, _report: &PipelineReport) -> ControlFlow<()> {
        if attempt > self.0 {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }
}

pub struct SubmissionPipeline {
    session: SessionManager,
    operator: Operator,
    admission: AdmissionController,
    recovery: RecoveryManager,
    diagnostics: Diagnostics,
    flow: SubmissionFlow,
    hook: Box<dyn AttemptHook>,
    cancel: CancellationToken,
    pending_recovery: bool,
}

impl SubmissionPipeline {
    pub fn new(
        session: SessionManager,
        operator: Operator,
        admission: AdmissionController,
        recovery: RecoveryManager,
        diagnostics: Diagnostics,
        flow: SubmissionFlow,
    ) -> Self {
        Self {
            session,
            operator,
            admission,
            recovery,
            diagnostics,
            flow,
            hook: Box::new(Unbounded),
            cancel: CancellationToken::new(),
            pending_recovery: false,
        }
    }

    pub fn with_hook(mut self, hook: impl AttemptHook + 'static) -> Self {
        self.hook = Box::new(hook);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn admission_mut(&mut self) -> &mut AdmissionController {
        &mut self.admission
    }

    pub fn recovery_pending(&self) -> bool {
        self.pending_recovery
    }

    /// 启动会话、首次登录并应用项目设置
    ///
    /// 登录失败直接返回；设置失败只标记待恢复，由第一轮循环处理。
    pub async fn start(&mut self) -> AppResult<()> {
        self.session.start().await?;
        self.session.login(None, &mut self.operator).await?;

        if let Err(e) = self
            .recovery
            .restore_settings(&self.session, &mut self.operator)
            .await
        {
            warn!("⚠️ 项目设置失败，稍后通过恢复流程重试: {}", e);
            self.pending_recovery = true;
        }
        Ok(())
    }

    /// 按顺序提交全部任务
    pub async fn run(&mut self, tasks: &[GenerationTask]) -> AppResult<PipelineReport> {
        let mut report = PipelineReport {
            total: tasks.len(),
            ..Default::default()
        };
        let cancel = self.cancel.clone();
        let cooldown = self.recovery.policy().cooldown;

        let mut cursor = 0usize;
        let mut task_attempt = 0u32;

        while cursor < tasks.len() {
            if cancel.is_cancelled() {
                warn!("🛑 收到取消信号，停止提交");
                report.outcome = PipelineOutcome::Interrupted;
                break;
            }

            report.attempts += 1;
            if self
                .hook
                .before_attempt(report.attempts, &report)
                .is_break()
            {
                warn!("🛑 达到尝试上限，停止提交 (第 {} 轮)", report.attempts);
                report.outcome = PipelineOutcome::Interrupted;
                break;
            }

            if self.pending_recovery {
                match self.recovery.recover(&mut self.session, &mut self.operator).await {
                    Ok(_) => {
                        report.recoveries += 1;
                        self.pending_recovery = false;
                    }
                    Err(e) => {
                        report.recovery_failures += 1;
                        error!("❌ {}", e);
                        warn!("⏳ {} 秒后再次尝试恢复", cooldown.as_secs());
                        if !Self::cooldown(&cancel, cooldown).await {
                            report.outcome = PipelineOutcome::Interrupted;
                            break;
                        }
                        continue;
                    }
                }
            }

            let task = &tasks[cursor];
            task_attempt += 1;
            let ctx = TaskCtx::new(cursor + 1, tasks.len(), task.index, task_attempt);

            let result = tokio::select! {
                result = self.attempt(task, &ctx) => result,
                _ = cancel.cancelled() => {
                    warn!("{} 🛑 提交被取消，放弃进行中的任务", ctx);
                    report.outcome = PipelineOutcome::Interrupted;
                    break;
                }
            };

            match result {
                Ok(SubmitOutcome::Accepted) => {
                    report.submitted += 1;
                    cursor += 1;
                    task_attempt = 0;
                    if cursor < tasks.len() {
                        self.operator.pause(2.0, 4.0).await;
                    }
                }
                Ok(SubmitOutcome::RemoteError(_)) => {
                    report.remote_errors += 1;
                    if let Some(path) = self.handle_error_signal().await {
                        report.snapshots.push(path);
                    }
                    self.pending_recovery = true;
                }
                Err(e) => {
                    report.driver_faults += 1;
                    error!("{} ❌ 提交失败: {}", ctx, e);
                    self.pending_recovery = true;
                }
            }
        }

        info!(
            "管线结束: 已提交 {}/{}，恢复 {} 次",
            report.submitted, report.total, report.recoveries
        );
        Ok(report)
    }

    /// 关闭会话（保留用户数据，下次启动可免登录）
    pub async fn shutdown(&mut self) {
        self.session.teardown().await;
    }

    async fn attempt(&mut self, task: &GenerationTask, ctx: &TaskCtx) -> AppResult<SubmitOutcome> {
        let driver = self.session.driver()?;
        self.flow
            .submit_once(driver, &mut self.operator, &mut self.admission, task, ctx)
            .await
    }

    /// 截图并关闭错误提示，返回截图路径
    async fn handle_error_signal(&self) -> Option<PathBuf> {
        let driver = match self.session.driver() {
            Ok(driver) => driver,
            Err(e) => {
                warn!("无法处理错误提示: {}", e);
                return None;
            }
        };

        let snapshot = self.diagnostics.capture(driver).await;
        match driver.dismiss_error_signal().await {
            Ok(true) => info!("已关闭错误提示"),
            Ok(false) => warn!("未找到错误提示的关闭按钮"),
            Err(e) => warn!("关闭错误提示失败: {}", e),
        }
        snapshot
    }

    /// 冷却等待，期间被取消时返回 false
    async fn cooldown(cancel: &CancellationToken, duration: Duration) -> bool {
        tokio::select! {
            _ = sleep(duration) => true,
            _ = cancel.cancelled() => false,
        }
    }
}
