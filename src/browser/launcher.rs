use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::browser::{GrantPermissionsParams, PermissionType};
use chromiumoxide::cdp::browser_protocol::emulation::{
    SetGeolocationOverrideParams, SetLocaleOverrideParams, SetTimezoneOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::fetch::{
    AuthChallengeResponse, AuthChallengeResponseResponse, ContinueRequestParams,
    ContinueWithAuthParams, EnableParams, EventAuthRequired, EventRequestPaused,
};
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info};

use super::chrome_driver::ChromeDriver;
use super::driver::{SessionLauncher, SurfaceDriver};
use crate::config::{BrowserSettings, Fingerprint, ProxyConfig};
use crate::error::{AppResult, BrowserError};
use crate::infrastructure::JsExecutor;

/// 启动参数：关闭自动化标记和各种会打断操作的弹窗
const LAUNCH_ARGS: &[&str] = &[
    "--start-maximized",
    "--disable-blink-features=AutomationControlled",
    "--disable-translate",
    "--disable-session-crashed-bubble",
    "--disable-infobars",
    "--disable-features=TranslateUI",
    "--disable-popup-blocking",
    "--no-first-run",
    "--no-default-browser-check",
    "--disable-sync",
    "--disable-background-networking",
];

/// 以持久化用户数据目录启动 Chromium
pub struct ChromeLauncher {
    settings: BrowserSettings,
}

impl ChromeLauncher {
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl SessionLauncher for ChromeLauncher {
    async fn launch(&self, profile_dir: &Path) -> AppResult<Box<dyn SurfaceDriver>> {
        info!("🚀 启动浏览器...");
        debug!("用户数据目录: {}", profile_dir.display());

        let mut builder = BrowserConfig::builder()
            .user_data_dir(profile_dir)
            .viewport(None)
            .args(LAUNCH_ARGS.iter().copied())
            .arg(format!("--lang={}", self.settings.fingerprint.locale));
        builder = if self.settings.headless {
            builder.new_headless_mode()
        } else {
            builder.with_head()
        };
        if let Some(exe) = &self.settings.chrome_executable {
            builder = builder.chrome_executable(exe);
        }
        if let Some(proxy) = &self.settings.proxy {
            info!("使用代理: {}", proxy.server);
            builder = builder.arg(format!("--proxy-server={}", proxy.server_url()));
        }

        let config = builder.build().map_err(|e| {
            error!("配置浏览器失败: {}", e);
            BrowserError::ConfigurationFailed(e)
        })?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
            error!("启动浏览器失败: {}", e);
            BrowserError::Cdp(e)
        })?;

        // 在后台处理浏览器事件
        let events = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if let Err(e) = h {
                    debug!("浏览器事件处理出错: {}", e);
                }
            }
        });

        // 等待浏览器状态同步
        sleep(Duration::from_millis(300)).await;

        let page = match browser.pages().await?.into_iter().next() {
            Some(page) => page,
            None => browser.new_page("about:blank").await?,
        };

        disguise(&browser, &page, &self.settings.fingerprint).await?;

        let mut background = vec![events];
        if let Some(proxy) = &self.settings.proxy {
            background.push(install_proxy_auth(&page, proxy.clone()).await?);
        }

        info!("✓ 浏览器已启动");
        Ok(Box::new(ChromeDriver::new(
            browser,
            JsExecutor::new(page),
            background,
        )))
    }
}

/// 隐藏自动化痕迹，并统一语言、时区和地理位置
///
/// 注入脚本在下一次导航时生效，所以必须在打开登录页之前完成。
async fn disguise(browser: &Browser, page: &Page, fingerprint: &Fingerprint) -> AppResult<()> {
    // 空 UA 表示保留浏览器自带的 UA
    page.enable_stealth_mode_with_agent("").await?;

    page.execute(SetLocaleOverrideParams::builder().locale(fingerprint.icu_locale()).build())
        .await?;
    page.execute(SetTimezoneOverrideParams::new(fingerprint.timezone.clone()))
        .await?;
    page.execute(
        SetGeolocationOverrideParams::builder()
            .latitude(fingerprint.latitude)
            .longitude(fingerprint.longitude)
            .accuracy(100.0)
            .build(),
    )
    .await?;
    browser
        .execute(GrantPermissionsParams::new(vec![
            PermissionType::Geolocation,
            PermissionType::ClipboardReadWrite,
            PermissionType::ClipboardSanitizedWrite,
        ]))
        .await?;

    debug!(
        "页面环境: {} / {} / ({}, {})",
        fingerprint.locale, fingerprint.timezone, fingerprint.latitude, fingerprint.longitude
    );
    Ok(())
}

/// 代理认证：Chromium 不接受命令行里的代理账号，只能在 Fetch 域里应答认证请求
async fn install_proxy_auth(page: &Page, proxy: ProxyConfig) -> AppResult<JoinHandle<()>> {
    let mut auth_events = page.event_listener::<EventAuthRequired>().await?;
    let mut paused_events = page.event_listener::<EventRequestPaused>().await?;
    page.execute(EnableParams::builder().handle_auth_requests(true).build())
        .await?;

    let page = page.clone();
    Ok(tokio::spawn(async move {
        loop {
            tokio::select! {
                Some(event) = paused_events.next() => {
                    let params = ContinueRequestParams::new(event.request_id.clone());
                    if let Err(e) = page.execute(params).await {
                        debug!("放行请求失败: {}", e);
                    }
                }
                Some(event) = auth_events.next() => {
                    let response = AuthChallengeResponse {
                        response: AuthChallengeResponseResponse::ProvideCredentials,
                        username: Some(proxy.username.clone()),
                        password: Some(proxy.password.clone()),
                    };
                    let params = ContinueWithAuthParams::new(event.request_id.clone(), response);
                    if let Err(e) = page.execute(params).await {
                        debug!("代理认证应答失败: {}", e);
                    }
                }
                else => break,
            }
        }
    }))
}
