//! 登录状态机
//!
//! ```text
//! Unauthenticated → AwaitingCreationForm → AwaitingCredentials → AwaitingSecret → Authenticated → Ready
//!        └──────────────── 已登录（5s 内出现 New project）───────────────────────────┘
//! ```
//!
//! 每个转移都是一次有限等待。找不到"开始创作"按钮、账号框、密码框或跳转超时都按
//! "可能已经登录"处理，继续往下走；唯一的致命情况是没有恢复目标且登录后主输入框始终不出现。

use std::time::Duration;

use tracing::{info, warn};

use crate::browser::{Affordance, Key, SurfaceDriver};
use crate::config::LoginSettings;
use crate::error::{AppResult, SessionError};
use crate::human::Operator;

/// 登录状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    Unauthenticated,
    AwaitingCreationForm,
    AwaitingCredentials,
    AwaitingSecret,
    Authenticated,
    Ready,
}

/// 一次登录过程
pub struct LoginFlow<'a> {
    driver: &'a dyn SurfaceDriver,
    operator: &'a mut Operator,
    settings: &'a LoginSettings,
    resume_target: Option<&'a str>,
    trace: Vec<LoginState>,
}

impl<'a> LoginFlow<'a> {
    pub fn new(
        driver: &'a dyn SurfaceDriver,
        operator: &'a mut Operator,
        settings: &'a LoginSettings,
        resume_target: Option<&'a str>,
    ) -> Self {
        Self {
            driver,
            operator,
            settings,
            resume_target,
            trace: Vec::new(),
        }
    }

    /// 跑完整个状态机，返回经过的状态序列
    pub async fn run(mut self) -> AppResult<Vec<LoginState>> {
        let mut state = LoginState::Unauthenticated;
        loop {
            self.trace.push(state);
            state = match state {
                LoginState::Unauthenticated => self.open_landing().await?,
                LoginState::AwaitingCreationForm => self.begin_creation().await?,
                LoginState::AwaitingCredentials => self.enter_identity().await?,
                LoginState::AwaitingSecret => self.enter_secret().await?,
                LoginState::Authenticated => self.enter_project().await?,
                LoginState::Ready => return Ok(self.trace),
            };
        }
    }

    async fn open_landing(&mut self) -> AppResult<LoginState> {
        info!("🔐 开始登录，打开 {}", self.settings.landing_url);
        self.driver.goto(&self.settings.landing_url).await?;
        self.operator.pause(2.0, 4.0).await;
        self.operator
            .read_page(self.driver, Duration::from_millis(1500))
            .await?;

        if self
            .driver
            .wait_visible(Affordance::NewProject, self.settings.resume_check)
            .await?
        {
            info!("✓ 已处于登录状态（找到 'New project' 按钮）");
            return Ok(LoginState::Authenticated);
        }
        Ok(LoginState::AwaitingCreationForm)
    }

    async fn begin_creation(&mut self) -> AppResult<LoginState> {
        if self
            .driver
            .wait_visible(Affordance::BeginCreation, self.settings.creation_wait)
            .await?
        {
            info!("点击 'Create with Flow'...");
            self.operator
                .click(self.driver, Affordance::BeginCreation)
                .await?;
            self.operator.pause(2.0, 4.0).await;
        } else {
            warn!("⚠️ 未找到 'Create with Flow' 按钮");
        }
        Ok(LoginState::AwaitingCredentials)
    }

    async fn enter_identity(&mut self) -> AppResult<LoginState> {
        if !self
            .driver
            .wait_visible(Affordance::IdentityField, self.settings.credential_wait)
            .await?
        {
            info!("没有出现登录表单，可能已经登录");
            return Ok(LoginState::Authenticated);
        }

        info!("登录表单已出现，输入账号...");
        self.operator.read_page(self.driver, Duration::from_secs(1)).await?;
        self.operator.quick(0.3, 0.6).await;
        self.operator
            .type_into(self.driver, Affordance::IdentityField, &self.settings.identity)
            .await?;
        self.operator.pause(0.5, 1.0).await;
        self.driver.press_key(Key::Enter).await?;
        self.operator.pause(2.0, 3.0).await;
        Ok(LoginState::AwaitingSecret)
    }

    async fn enter_secret(&mut self) -> AppResult<LoginState> {
        if !self
            .driver
            .wait_visible(Affordance::SecretField, self.settings.credential_wait)
            .await?
        {
            warn!("⚠️ 未出现密码输入框，按已登录处理");
            return Ok(LoginState::Authenticated);
        }

        self.operator.quick(0.3, 0.6).await;
        self.operator
            .type_into(self.driver, Affordance::SecretField, &self.settings.secret)
            .await?;
        self.operator.pause(0.5, 1.0).await;
        self.driver.press_key(Key::Enter).await?;

        if self
            .driver
            .wait_for_url(&self.settings.app_url_fragment, self.settings.transition_wait)
            .await?
        {
            info!("✓ 登录成功");
            self.operator.pause(2.0, 4.0).await;
            self.operator.read_page(self.driver, Duration::from_secs(2)).await?;
        } else {
            warn!("⚠️ 登录后未跳转到应用页面");
        }
        Ok(LoginState::Authenticated)
    }

    async fn enter_project(&mut self) -> AppResult<LoginState> {
        let ready_wait = self.settings.ready_wait;

        if let Some(target) = self.resume_target {
            info!("返回项目: {}", target);
            self.driver.goto(target).await?;
            if !self.wait_for_project_page().await? {
                // 有恢复目标时不致命，提交流程会再次发现并触发恢复
                warn!("⚠️ 返回项目后 {} 未出现", Affordance::PromptInput);
            }
            return Ok(LoginState::Ready);
        }

        if !self
            .driver
            .wait_visible(Affordance::NewProject, ready_wait)
            .await?
        {
            return Err(SessionError::SurfaceNeverReady {
                what: Affordance::NewProject,
                timeout: ready_wait,
            }
            .into());
        }

        info!("点击 'New project'...");
        self.operator
            .click(self.driver, Affordance::NewProject)
            .await?;
        if !self.wait_for_project_page().await? {
            return Err(SessionError::SurfaceNeverReady {
                what: Affordance::PromptInput,
                timeout: ready_wait,
            }
            .into());
        }
        Ok(LoginState::Ready)
    }

    async fn wait_for_project_page(&mut self) -> AppResult<bool> {
        info!("等待项目页面加载...");
        if !self
            .driver
            .wait_visible(Affordance::PromptInput, self.settings.ready_wait)
            .await?
        {
            return Ok(false);
        }
        self.operator
            .read_page(self.driver, Duration::from_millis(1500))
            .await?;
        info!("✓ 项目页面已加载");
        Ok(true)
    }
}
