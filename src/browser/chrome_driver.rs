//! 基于 chromiumoxide 的 `SurfaceDriver` 实现

use std::path::Path;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchKeyEventParams, DispatchKeyEventType, DispatchMouseEventParams,
    DispatchMouseEventType, InsertTextParams, MouseButton,
};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Browser;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::driver::{Key, SurfaceDriver};
use super::Affordance;
use crate::error::{AppError, AppResult, BrowserError};
use crate::human::{Point, Rect, Viewport};
use crate::infrastructure::JsExecutor;

/// Ctrl（Windows/Linux）或 Cmd（macOS）的 CDP 修饰键位
const SELECT_ALL_MODIFIER: i64 = if cfg!(target_os = "macos") { 4 } else { 2 };

/// Chromium 页面驱动
///
/// 持有浏览器进程、事件循环任务和唯一的 `JsExecutor`
pub struct ChromeDriver {
    browser: Mutex<Option<Browser>>,
    executor: JsExecutor,
    background: Vec<JoinHandle<()>>,
}

impl ChromeDriver {
    pub fn new(browser: Browser, executor: JsExecutor, background: Vec<JoinHandle<()>>) -> Self {
        Self {
            browser: Mutex::new(Some(browser)),
            executor,
            background,
        }
    }

    async fn mouse_event(
        &self,
        kind: DispatchMouseEventType,
        at: Point,
        press: bool,
    ) -> AppResult<()> {
        let mut builder = DispatchMouseEventParams::builder()
            .r#type(kind)
            .x(at.x)
            .y(at.y);
        if press {
            builder = builder.button(MouseButton::Left).click_count(1);
        }
        let params = builder.build().map_err(AppError::command_build)?;
        self.executor.page().execute(params).await?;
        Ok(())
    }

    async fn key_event(
        &self,
        kind: DispatchKeyEventType,
        key: &str,
        code: &str,
        virtual_key: i64,
        text: Option<&str>,
    ) -> AppResult<()> {
        let mut builder = DispatchKeyEventParams::builder()
            .r#type(kind)
            .key(key)
            .code(code)
            .windows_virtual_key_code(virtual_key);
        if let Some(text) = text {
            builder = builder.text(text);
        }
        let params = builder.build().map_err(AppError::command_build)?;
        self.executor.page().execute(params).await?;
        Ok(())
    }

    async fn press(&self, key: &str, code: &str, virtual_key: i64, text: Option<&str>) -> AppResult<()> {
        self.key_event(DispatchKeyEventType::KeyDown, key, code, virtual_key, text)
            .await?;
        self.key_event(DispatchKeyEventType::KeyUp, key, code, virtual_key, None)
            .await
    }

    async fn select_all(&self) -> AppResult<()> {
        let down = DispatchKeyEventParams::builder()
            .r#type(DispatchKeyEventType::KeyDown)
            .key("a")
            .code("KeyA")
            .windows_virtual_key_code(65)
            .modifiers(SELECT_ALL_MODIFIER)
            .commands(vec!["selectAll".to_string()])
            .build()
            .map_err(AppError::command_build)?;
        self.executor.page().execute(down).await?;

        let up = DispatchKeyEventParams::builder()
            .r#type(DispatchKeyEventType::KeyUp)
            .key("a")
            .code("KeyA")
            .windows_virtual_key_code(65)
            .modifiers(SELECT_ALL_MODIFIER)
            .build()
            .map_err(AppError::command_build)?;
        self.executor.page().execute(up).await?;
        Ok(())
    }
}

#[async_trait]
impl SurfaceDriver for ChromeDriver {
    async fn goto(&self, url: &str) -> AppResult<()> {
        debug!("导航到: {}", url);
        self.executor.page().goto(url).await?;
        Ok(())
    }

    async fn current_url(&self) -> AppResult<Option<String>> {
        Ok(self.executor.page().url().await?)
    }

    async fn is_visible(&self, target: Affordance) -> AppResult<bool> {
        self.executor.eval_as(target.visibility_js()).await
    }

    async fn bounding_box(&self, target: Affordance) -> AppResult<Option<Rect>> {
        self.executor.eval_as(target.bounding_box_js()).await
    }

    async fn click_element(&self, target: Affordance) -> AppResult<()> {
        let clicked: bool = self.executor.eval_as(target.click_js()).await?;
        if clicked {
            Ok(())
        } else {
            Err(BrowserError::ElementMissing(target).into())
        }
    }

    async fn viewport(&self) -> AppResult<Option<Viewport>> {
        self.executor
            .eval_as("({ width: window.innerWidth, height: window.innerHeight })")
            .await
    }

    async fn mouse_move(&self, to: Point) -> AppResult<()> {
        self.mouse_event(DispatchMouseEventType::MouseMoved, to, false)
            .await
    }

    async fn mouse_down(&self, at: Point) -> AppResult<()> {
        self.mouse_event(DispatchMouseEventType::MousePressed, at, true)
            .await
    }

    async fn mouse_up(&self, at: Point) -> AppResult<()> {
        self.mouse_event(DispatchMouseEventType::MouseReleased, at, true)
            .await
    }

    async fn mouse_click(&self, at: Point) -> AppResult<()> {
        self.mouse_down(at).await?;
        self.mouse_up(at).await
    }

    async fn type_char(&self, ch: char) -> AppResult<()> {
        let text = ch.to_string();
        self.press(&text, "", 0, Some(&text)).await
    }

    async fn press_key(&self, key: Key) -> AppResult<()> {
        match key {
            Key::Enter => self.press("Enter", "Enter", 13, Some("\r")).await,
            Key::Backspace => self.press("Backspace", "Backspace", 8, None).await,
            Key::Escape => self.press("Escape", "Escape", 27, None).await,
            Key::SelectAll => self.select_all().await,
        }
    }

    async fn insert_text(&self, text: &str) -> AppResult<()> {
        self.executor
            .page()
            .execute(InsertTextParams::new(text))
            .await?;
        Ok(())
    }

    async fn has_error_signal(&self) -> AppResult<bool> {
        self.executor
            .eval_as(Affordance::ErrorToast.visibility_js())
            .await
    }

    async fn error_signal_text(&self) -> AppResult<Option<String>> {
        self.executor.eval_as(Affordance::ErrorToast.text_js()).await
    }

    async fn dismiss_error_signal(&self) -> AppResult<bool> {
        self.executor
            .eval_as(Affordance::ErrorToastDismiss.click_js())
            .await
    }

    async fn screenshot(&self, path: &Path) -> AppResult<()> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        self.executor.page().save_screenshot(params, path).await?;
        Ok(())
    }

    async fn close(&self) -> AppResult<()> {
        let browser = self.browser.lock().await.take();
        if let Some(mut browser) = browser {
            if let Err(e) = browser.close().await {
                warn!("关闭浏览器失败: {}", e);
            }
            if let Err(e) = browser.wait().await {
                warn!("等待浏览器进程退出失败: {}", e);
            }
        }
        for task in &self.background {
            task.abort();
        }
        Ok(())
    }
}
