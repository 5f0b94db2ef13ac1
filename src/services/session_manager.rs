//! 会话管理 - 业务能力层
//!
//! 唯一持有浏览器用户数据目录和当前页面驱动的模块。
//! 只有恢复流程会在两次提交之间销毁并重建它们。

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::browser::{SessionLauncher, SurfaceDriver};
use crate::config::LoginSettings;
use crate::error::{AppResult, SessionError};
use crate::human::Operator;
use crate::services::login_flow::{LoginFlow, LoginState};

pub struct SessionManager {
    launcher: Box<dyn SessionLauncher>,
    profile_dir: PathBuf,
    login: LoginSettings,
    driver: Option<Box<dyn SurfaceDriver>>,
    /// 最近一次确认过的项目地址
    last_target: Option<String>,
    login_trace: Vec<LoginState>,
}

impl SessionManager {
    pub fn new(
        launcher: Box<dyn SessionLauncher>,
        profile_dir: impl Into<PathBuf>,
        login: LoginSettings,
    ) -> Self {
        Self {
            launcher,
            profile_dir: profile_dir.into(),
            login,
            driver: None,
            last_target: None,
            login_trace: Vec::new(),
        }
    }

    pub fn profile_dir(&self) -> &Path {
        &self.profile_dir
    }

    pub fn is_started(&self) -> bool {
        self.driver.is_some()
    }

    /// 创建用户数据目录并启动新会话
    pub async fn start(&mut self) -> AppResult<()> {
        if self.driver.is_some() {
            debug!("会话已启动，跳过");
            return Ok(());
        }
        tokio::fs::create_dir_all(&self.profile_dir)
            .await
            .map_err(|e| crate::error::AppError::io(self.profile_dir.display().to_string(), e))?;
        let driver = self.launcher.launch(&self.profile_dir).await?;
        self.driver = Some(driver);
        Ok(())
    }

    /// 当前页面驱动
    pub fn driver(&self) -> AppResult<&dyn SurfaceDriver> {
        self.driver
            .as_deref()
            .ok_or_else(|| SessionError::NotStarted.into())
    }

    /// 当前页面地址；同时更新记住的恢复目标
    pub async fn current_location(&mut self) -> Option<String> {
        let driver = self.driver.as_deref()?;
        match driver.current_url().await {
            Ok(Some(url)) if is_resumable(&url) => {
                self.last_target = Some(url.clone());
                Some(url)
            }
            Ok(_) => None,
            Err(e) => {
                warn!("读取当前地址失败: {}", e);
                None
            }
        }
    }

    /// 恢复目标：优先取当前地址，拿不到时用最近一次记住的地址
    pub async fn resumption_target(&mut self) -> Option<String> {
        match self.current_location().await {
            Some(url) => Some(url),
            None => self.last_target.clone(),
        }
    }

    /// 关闭当前会话（不删除用户数据）
    pub async fn teardown(&mut self) {
        if let Some(driver) = self.driver.take() {
            if let Err(e) = driver.close().await {
                warn!("关闭会话失败: {}", e);
            }
            info!("浏览器已关闭");
        }
    }

    /// 整体删除用户数据目录，下次启动即为全新未登录状态
    pub async fn discard_profile(&mut self) -> AppResult<()> {
        match tokio::fs::remove_dir_all(&self.profile_dir).await {
            Ok(()) => {
                info!("🧹 浏览器数据已清理");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(crate::error::AppError::io(
                self.profile_dir.display().to_string(),
                e,
            )),
        }
    }

    /// 登录并进入项目页面
    pub async fn login(&mut self, resume_target: Option<&str>, operator: &mut Operator) -> AppResult<()> {
        let driver = self
            .driver
            .as_deref()
            .ok_or(SessionError::NotStarted)?;

        let trace = LoginFlow::new(driver, operator, &self.login, resume_target)
            .run()
            .await?;
        self.login_trace = trace;
        self.current_location().await;
        Ok(())
    }

    /// 最近一次登录经过的状态
    pub fn login_trace(&self) -> &[LoginState] {
        &self.login_trace
    }
}

/// 空白页不作为恢复目标
fn is_resumable(url: &str) -> bool {
    !url.is_empty() && !url.starts_with("about:") && !url.starts_with("chrome:")
}
