//! 项目设置 - 业务能力层
//!
//! 会话重建后"每个提示词的输出数量"会回到站点默认值，需要重新设置。

use std::time::Duration;

use tracing::info;

use crate::browser::{Affordance, Key, SurfaceDriver};
use crate::error::{AppResult, SessionError};
use crate::human::Operator;

const SETTINGS_WAIT: Duration = Duration::from_secs(10);

/// 通过设置弹窗选择输出数量
pub async fn set_outputs_per_prompt(
    driver: &dyn SurfaceDriver,
    operator: &mut Operator,
    count: u8,
) -> AppResult<()> {
    info!("⚙️ 设置每个提示词的输出数量为 {}...", count);

    operator.idle(driver).await?;

    click_when_visible(driver, operator, Affordance::SettingsButton).await?;
    operator.quick(0.5, 1.0).await;

    // 弹层是异步渲染的
    click_when_visible(driver, operator, Affordance::OutputsCombobox).await?;
    operator.quick(0.3, 0.6).await;

    click_when_visible(driver, operator, Affordance::OutputsOption(count)).await?;
    operator.quick(0.2, 0.4).await;

    driver.press_key(Key::Escape).await?;
    info!("✓ 输出数量已设置为 {}", count);
    Ok(())
}

async fn click_when_visible(
    driver: &dyn SurfaceDriver,
    operator: &mut Operator,
    target: Affordance,
) -> AppResult<()> {
    if !driver.wait_visible(target, SETTINGS_WAIT).await? {
        return Err(SessionError::WaitTimeout {
            what: target,
            timeout: SETTINGS_WAIT,
        }
        .into());
    }
    operator.click(driver, target).await
}
