//! 驱动抽象
//!
//! 业务代码只通过 `SurfaceDriver` 与页面打交道，只通过 `SessionLauncher` 创建会话。
//! 所有依赖页面状态的等待都是有限等待：超时返回 `Ok(false)`，由调用方决定兜底或报错。

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{sleep, Instant};

use super::Affordance;
use crate::error::AppResult;
use crate::human::{Point, Rect, Viewport};

/// 有限等待的轮询间隔
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// 功能键
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Backspace,
    Escape,
    /// Ctrl/Cmd + A
    SelectAll,
}

/// 一个活动的交互会话（浏览器页面）
#[async_trait]
pub trait SurfaceDriver: Send + Sync {
    async fn goto(&self, url: &str) -> AppResult<()>;

    async fn current_url(&self) -> AppResult<Option<String>>;

    async fn is_visible(&self, target: Affordance) -> AppResult<bool>;

    async fn bounding_box(&self, target: Affordance) -> AppResult<Option<Rect>>;

    /// 直接触发元素点击（拿不到包围盒时使用）
    async fn click_element(&self, target: Affordance) -> AppResult<()>;

    async fn viewport(&self) -> AppResult<Option<Viewport>>;

    async fn mouse_move(&self, to: Point) -> AppResult<()>;

    async fn mouse_down(&self, at: Point) -> AppResult<()>;

    async fn mouse_up(&self, at: Point) -> AppResult<()>;

    async fn mouse_click(&self, at: Point) -> AppResult<()>;

    async fn type_char(&self, ch: char) -> AppResult<()>;

    async fn press_key(&self, key: Key) -> AppResult<()>;

    /// 一次性写入整段文本（长提示词不逐字输入）
    async fn insert_text(&self, text: &str) -> AppResult<()>;

    /// 错误提示是否可见
    async fn has_error_signal(&self) -> AppResult<bool>;

    /// 错误提示的文本，仅用于日志
    async fn error_signal_text(&self) -> AppResult<Option<String>>;

    /// 关闭错误提示，返回是否真的点到了关闭按钮
    async fn dismiss_error_signal(&self) -> AppResult<bool>;

    async fn screenshot(&self, path: &Path) -> AppResult<()>;

    /// 关闭会话（浏览器进程与其用户数据目录解除占用）
    async fn close(&self) -> AppResult<()>;

    /// 等待元素可见，超时返回 false
    async fn wait_visible(&self, target: Affordance, timeout: Duration) -> AppResult<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.is_visible(target).await? {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    /// 等待地址中出现 `fragment`，超时返回 false
    async fn wait_for_url(&self, fragment: &str, timeout: Duration) -> AppResult<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(url) = self.current_url().await? {
                if url.contains(fragment) {
                    return Ok(true);
                }
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            sleep(POLL_INTERVAL).await;
        }
    }
}

/// 会话工厂：基于给定的用户数据目录启动一个新会话
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    async fn launch(&self, profile_dir: &Path) -> AppResult<Box<dyn SurfaceDriver>>;
}
