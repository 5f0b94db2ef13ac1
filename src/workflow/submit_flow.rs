//! 单条提交流程 - 流程层
//!
//! 核心职责：定义"一条提示词"的完整提交过程
//!
//! 流程顺序：
//! 1. 等待队列空位
//! 2. 浏览页面 → 点击输入框 → 全选删除 → 粘贴提示词 → 校对停顿 → 回车
//! 3. 记录提交 → 稍等 → 检查错误提示

use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::browser::{Affordance, Key, SurfaceDriver};
use crate::error::{AppResult, SessionError};
use crate::human::Operator;
use crate::models::GenerationTask;
use crate::services::AdmissionController;
use crate::utils::logging::truncate_text;
use crate::workflow::task_ctx::TaskCtx;

/// 提交前浏览页面的时长
const READ_DURATION: Duration = Duration::from_millis(1500);
/// 等待输入框出现的上限
const INPUT_WAIT: Duration = Duration::from_secs(10);

/// 单次提交结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// 提交后没有看到错误提示
    Accepted,
    /// 远端弹出错误提示（附带提示文字，拿不到时为 None）
    RemoteError(Option<String>),
}

/// 单条提交流程
///
/// - 不持有会话，也不做恢复
/// - 出错提示只作为结果返回，由上层决定如何处理
pub struct SubmissionFlow {
    error_settle: Duration,
}

impl SubmissionFlow {
    pub fn new(error_settle: Duration) -> Self {
        Self { error_settle }
    }

    pub async fn submit_once(
        &self,
        driver: &dyn SurfaceDriver,
        operator: &mut Operator,
        admission: &mut AdmissionController,
        task: &GenerationTask,
        ctx: &TaskCtx,
    ) -> AppResult<SubmitOutcome> {
        let limit = admission.policy().capacity;
        admission.await_capacity(limit).await;

        info!("{} 🎬 提交: {}", ctx, truncate_text(&task.prompt, 50));

        operator.read_page(driver, READ_DURATION).await?;

        if !driver.wait_visible(Affordance::PromptInput, INPUT_WAIT).await? {
            return Err(SessionError::WaitTimeout {
                what: Affordance::PromptInput,
                timeout: INPUT_WAIT,
            }
            .into());
        }

        operator.click(driver, Affordance::PromptInput).await?;
        operator.quick(0.2, 0.4).await;

        driver.press_key(Key::SelectAll).await?;
        operator.quick(0.05, 0.15).await;
        driver.press_key(Key::Backspace).await?;
        operator.quick(0.2, 0.4).await;

        driver.insert_text(&task.prompt).await?;
        // 校对
        operator.pause(1.5, 3.0).await;

        driver.press_key(Key::Enter).await?;
        admission.record_submission();

        sleep(self.error_settle).await;

        if driver.has_error_signal().await? {
            let text = match driver.error_signal_text().await {
                Ok(text) => text,
                Err(e) => {
                    warn!("读取错误提示失败: {}", e);
                    None
                }
            };
            warn!("{} ❌ 远端报错: {}", ctx, text.as_deref().unwrap_or("(无文字)"));
            return Ok(SubmitOutcome::RemoteError(text));
        }

        info!("{} ✓ 已提交", ctx);
        Ok(SubmitOutcome::Accepted)
    }
}
