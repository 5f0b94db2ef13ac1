//! 会话恢复 - 业务能力层
//!
//! 出错后不尝试修补会话：记下当前项目地址，关掉浏览器，整体删除用户数据，
//! 重新登录回到同一个项目，再把项目设置恢复原样。

use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::RecoveryPolicy;
use crate::error::{AppResult, RecoveryStage};
use crate::human::Operator;
use crate::services::project_settings::set_outputs_per_prompt;
use crate::services::session_manager::SessionManager;

pub struct RecoveryManager {
    policy: RecoveryPolicy,
}

impl RecoveryManager {
    pub fn new(policy: RecoveryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> RecoveryPolicy {
        self.policy
    }

    /// 重建会话并回到原来的项目，返回使用的恢复目标
    pub async fn recover(
        &self,
        session: &mut SessionManager,
        operator: &mut Operator,
    ) -> AppResult<Option<String>> {
        let target = session.resumption_target().await;
        warn!("🔄 开始恢复，项目地址: {:?}", target);

        session.teardown().await;
        operator.forget_pointer();

        session
            .discard_profile()
            .await
            .map_err(|e| e.in_recovery(RecoveryStage::ClearProfile))?;

        sleep(self.policy.settle).await;

        session
            .start()
            .await
            .map_err(|e| e.in_recovery(RecoveryStage::Relaunch))?;

        session
            .login(target.as_deref(), operator)
            .await
            .map_err(|e| e.in_recovery(RecoveryStage::Login))?;

        self.restore_settings(session, operator)
            .await
            .map_err(|e| e.in_recovery(RecoveryStage::RestoreSettings))?;

        info!("✓ 恢复完成");
        Ok(target)
    }

    /// 恢复被重置的项目设置
    pub async fn restore_settings(
        &self,
        session: &SessionManager,
        operator: &mut Operator,
    ) -> AppResult<()> {
        let driver = session.driver()?;
        set_outputs_per_prompt(driver, operator, self.policy.outputs_per_prompt).await
    }
}
