//! 测试用的假页面
//!
//! `FakeWorld` 模拟远端站点：用户数据目录里有登录标记即视为已登录，
//! 删除目录后下次启动需要完整登录。提交、报错、驱动故障、启动失败都可以按序号编排。

#![allow(dead_code)]

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use flow_automation::browser::{Affordance, Key, SessionLauncher, SurfaceDriver};
use flow_automation::error::{AppResult, BrowserError};
use flow_automation::human::{Point, Rect, Viewport};
use flow_automation::models::GenerationTask;
use flow_automation::orchestrator::{build_pipeline, SubmissionPipeline};
use flow_automation::Config;

pub const LANDING_URL: &str = "https://labs.google/fx/tools/flow";
pub const SIGNIN_URL: &str = "https://accounts.google.com/signin";
pub const PROJECT_PREFIX: &str = "https://labs.google/fx/tools/flow/project/";
pub const EMAIL: &str = "operator@example.com";
pub const PASSWORD: &str = "hunter2-Secret";

const LOGIN_MARKER: &str = "session_cookie";

/// 一次被远端接收的提交
#[derive(Debug, Clone)]
pub struct Submission {
    pub prompt: String,
    pub at: Instant,
    /// 第几次启动的会话
    pub session: usize,
}

#[derive(Default)]
pub struct WorldState {
    /// 每次启动尝试的时间
    pub launches: Vec<Instant>,
    /// 这些启动序号（从1开始）失败
    pub fail_launches: HashSet<usize>,
    /// 这些启动序号的会话里设置按钮不出现
    pub hide_settings_on: HashSet<usize>,
    /// 第 n 次提交之后弹出错误提示
    pub error_after: HashSet<usize>,
    /// 第 n 次写入提示词时驱动报错
    pub fault_on_insert: HashSet<usize>,
    pub always_fault: bool,
    /// 主输入框永远不出现
    pub never_ready: bool,
    /// 设置弹层里的下拉框和选项在点击后多久才出现
    pub popup_delay: Duration,

    pub inserts: usize,
    pub submissions: Vec<Submission>,
    pub screenshots: Vec<PathBuf>,
    pub dismissals: usize,
    pub closes: usize,
    /// (启动序号, 输出数量)
    pub outputs: Vec<(usize, u8)>,
    pub projects: usize,
    pub gotos: Vec<String>,
}

#[derive(Clone, Default)]
pub struct FakeWorld(Arc<Mutex<WorldState>>);

impl FakeWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn configure(&self, f: impl FnOnce(&mut WorldState)) {
        f(&mut self.state());
    }

    pub fn state(&self) -> MutexGuard<'_, WorldState> {
        self.0.lock().unwrap()
    }

    pub fn launcher(&self) -> FakeLauncher {
        FakeLauncher {
            world: self.clone(),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.state()
            .submissions
            .iter()
            .map(|s| s.prompt.clone())
            .collect()
    }
}

pub struct FakeLauncher {
    world: FakeWorld,
}

#[async_trait]
impl SessionLauncher for FakeLauncher {
    async fn launch(&self, profile_dir: &Path) -> AppResult<Box<dyn SurfaceDriver>> {
        let ordinal = {
            let mut state = self.world.state();
            state.launches.push(Instant::now());
            let ordinal = state.launches.len();
            if state.fail_launches.contains(&ordinal) {
                return Err(
                    BrowserError::ConfigurationFailed("scripted launch failure".to_string()).into(),
                );
            }
            ordinal
        };
        Ok(Box::new(FakeDriver {
            world: self.world.clone(),
            session: ordinal,
            profile_dir: profile_dir.to_path_buf(),
            page: Mutex::new(PageState::default()),
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
enum Location {
    #[default]
    Blank,
    Landing,
    Identity,
    Secret,
    Home,
    Project(String),
}

#[derive(Default)]
struct PageState {
    location: Location,
    focus: Option<Affordance>,
    buffer: String,
    input: String,
    select_all: bool,
    toast: bool,
    /// 弹层出现的时刻
    settings_open: Option<Instant>,
    combobox_open: Option<Instant>,
    closed: bool,
}

pub struct FakeDriver {
    world: FakeWorld,
    session: usize,
    profile_dir: PathBuf,
    page: Mutex<PageState>,
}

/// 命中测试顺序：上层元素在前
const HIT_ORDER: [Affordance; 12] = [
    Affordance::ErrorToastDismiss,
    Affordance::OutputsOption(1),
    Affordance::OutputsOption(2),
    Affordance::OutputsOption(3),
    Affordance::OutputsOption(4),
    Affordance::OutputsCombobox,
    Affordance::SettingsButton,
    Affordance::PromptInput,
    Affordance::NewProject,
    Affordance::BeginCreation,
    Affordance::IdentityField,
    Affordance::SecretField,
];

fn rect_for(target: Affordance) -> Rect {
    match target {
        Affordance::NewProject => Rect::new(100.0, 100.0, 160.0, 40.0),
        Affordance::BeginCreation => Rect::new(540.0, 380.0, 200.0, 48.0),
        Affordance::IdentityField => Rect::new(440.0, 300.0, 400.0, 40.0),
        Affordance::SecretField => Rect::new(440.0, 360.0, 400.0, 40.0),
        Affordance::PromptInput => Rect::new(200.0, 650.0, 880.0, 80.0),
        Affordance::SettingsButton => Rect::new(1100.0, 660.0, 40.0, 40.0),
        Affordance::OutputsCombobox => Rect::new(900.0, 400.0, 240.0, 40.0),
        Affordance::OutputsOption(n) => Rect::new(900.0, 450.0 + f64::from(n) * 40.0, 240.0, 36.0),
        Affordance::ErrorToast => Rect::new(900.0, 40.0, 360.0, 80.0),
        Affordance::ErrorToastDismiss => Rect::new(1200.0, 60.0, 40.0, 30.0),
    }
}

fn shown(at: Option<Instant>) -> bool {
    at.is_some_and(|at| Instant::now() >= at)
}

impl FakeDriver {
    fn popup_at(&self) -> Instant {
        Instant::now() + self.world.state().popup_delay
    }

    fn logged_in(&self) -> bool {
        self.profile_dir.join(LOGIN_MARKER).exists()
    }

    fn visible(&self, page: &PageState, target: Affordance) -> bool {
        if page.closed {
            return false;
        }
        let state = self.world.state();
        let in_project = matches!(page.location, Location::Project(_));
        match target {
            Affordance::NewProject => page.location == Location::Home,
            Affordance::BeginCreation => page.location == Location::Landing,
            Affordance::IdentityField => page.location == Location::Identity,
            Affordance::SecretField => page.location == Location::Secret,
            Affordance::PromptInput => in_project && !state.never_ready,
            Affordance::SettingsButton => {
                in_project && !state.hide_settings_on.contains(&self.session)
            }
            Affordance::OutputsCombobox => shown(page.settings_open),
            Affordance::OutputsOption(n) => shown(page.combobox_open) && (1..=4).contains(&n),
            Affordance::ErrorToast | Affordance::ErrorToastDismiss => page.toast,
        }
    }

    fn activate(&self, page: &mut PageState, target: Affordance) {
        match target {
            Affordance::BeginCreation => {
                page.location = Location::Identity;
                page.focus = None;
            }
            Affordance::IdentityField | Affordance::SecretField => {
                page.focus = Some(target);
                page.buffer.clear();
            }
            Affordance::NewProject => {
                let mut state = self.world.state();
                state.projects += 1;
                page.location = Location::Project(format!("{}{}", PROJECT_PREFIX, state.projects));
            }
            Affordance::PromptInput => page.focus = Some(target),
            Affordance::SettingsButton => page.settings_open = Some(self.popup_at()),
            Affordance::OutputsCombobox => page.combobox_open = Some(self.popup_at()),
            Affordance::OutputsOption(n) => {
                self.world.state().outputs.push((self.session, n));
                page.combobox_open = None;
            }
            Affordance::ErrorToastDismiss => {
                page.toast = false;
                self.world.state().dismissals += 1;
            }
            Affordance::ErrorToast => {}
        }
    }

    fn submit(&self, page: &mut PageState) {
        let mut state = self.world.state();
        state.submissions.push(Submission {
            prompt: page.input.clone(),
            at: Instant::now(),
            session: self.session,
        });
        page.input.clear();
        let ordinal = state.submissions.len();
        if state.error_after.contains(&ordinal) {
            page.toast = true;
        }
    }
}

#[async_trait]
impl SurfaceDriver for FakeDriver {
    async fn goto(&self, url: &str) -> AppResult<()> {
        self.world.state().gotos.push(url.to_string());
        let logged_in = self.logged_in();
        let mut page = self.page.lock().unwrap();
        page.location = if url.starts_with(PROJECT_PREFIX) && logged_in {
            Location::Project(url.to_string())
        } else if logged_in {
            Location::Home
        } else {
            Location::Landing
        };
        page.focus = None;
        page.toast = false;
        page.settings_open = None;
        page.combobox_open = None;
        Ok(())
    }

    async fn current_url(&self) -> AppResult<Option<String>> {
        let page = self.page.lock().unwrap();
        let url = match &page.location {
            Location::Blank => "about:blank".to_string(),
            Location::Landing | Location::Home => LANDING_URL.to_string(),
            Location::Identity | Location::Secret => SIGNIN_URL.to_string(),
            Location::Project(url) => url.clone(),
        };
        Ok(Some(url))
    }

    async fn is_visible(&self, target: Affordance) -> AppResult<bool> {
        let page = self.page.lock().unwrap();
        Ok(self.visible(&page, target))
    }

    async fn bounding_box(&self, target: Affordance) -> AppResult<Option<Rect>> {
        let page = self.page.lock().unwrap();
        Ok(self.visible(&page, target).then(|| rect_for(target)))
    }

    async fn click_element(&self, target: Affordance) -> AppResult<()> {
        let mut page = self.page.lock().unwrap();
        if !self.visible(&page, target) {
            return Err(BrowserError::ElementMissing(target).into());
        }
        self.activate(&mut page, target);
        Ok(())
    }

    async fn viewport(&self) -> AppResult<Option<Viewport>> {
        Ok(Some(Viewport {
            width: 1280.0,
            height: 800.0,
        }))
    }

    async fn mouse_move(&self, _to: Point) -> AppResult<()> {
        Ok(())
    }

    async fn mouse_down(&self, _at: Point) -> AppResult<()> {
        Ok(())
    }

    async fn mouse_up(&self, _at: Point) -> AppResult<()> {
        Ok(())
    }

    async fn mouse_click(&self, at: Point) -> AppResult<()> {
        let mut page = self.page.lock().unwrap();
        let hit = HIT_ORDER
            .iter()
            .copied()
            .find(|&t| self.visible(&page, t) && rect_for(t).contains(at));
        if let Some(target) = hit {
            self.activate(&mut page, target);
        }
        Ok(())
    }

    async fn type_char(&self, ch: char) -> AppResult<()> {
        let mut page = self.page.lock().unwrap();
        match page.focus {
            Some(Affordance::PromptInput) => page.input.push(ch),
            Some(_) => page.buffer.push(ch),
            None => {}
        }
        Ok(())
    }

    async fn press_key(&self, key: Key) -> AppResult<()> {
        let mut page = self.page.lock().unwrap();
        match key {
            Key::SelectAll => page.select_all = true,
            Key::Backspace => {
                if page.focus == Some(Affordance::PromptInput) {
                    if page.select_all {
                        page.input.clear();
                        page.select_all = false;
                    } else {
                        page.input.pop();
                    }
                } else {
                    page.buffer.pop();
                }
            }
            Key::Escape => {
                page.settings_open = None;
                page.combobox_open = None;
            }
            Key::Enter => match page.location.clone() {
                Location::Identity if page.buffer == EMAIL => {
                    page.location = Location::Secret;
                    page.focus = None;
                    page.buffer.clear();
                }
                Location::Secret if page.buffer == PASSWORD => {
                    std::fs::write(self.profile_dir.join(LOGIN_MARKER), b"ok")?;
                    page.location = Location::Home;
                    page.focus = None;
                    page.buffer.clear();
                }
                Location::Project(_) => self.submit(&mut page),
                _ => {}
            },
        }
        Ok(())
    }

    async fn insert_text(&self, text: &str) -> AppResult<()> {
        {
            let mut state = self.world.state();
            state.inserts += 1;
            let ordinal = state.inserts;
            if state.always_fault || state.fault_on_insert.contains(&ordinal) {
                return Err(BrowserError::ElementMissing(Affordance::PromptInput).into());
            }
        }
        self.page.lock().unwrap().input.push_str(text);
        Ok(())
    }

    async fn has_error_signal(&self) -> AppResult<bool> {
        Ok(self.page.lock().unwrap().toast)
    }

    async fn error_signal_text(&self) -> AppResult<Option<String>> {
        let page = self.page.lock().unwrap();
        Ok(page.toast.then(|| "Generation failed. Please try again.".to_string()))
    }

    async fn dismiss_error_signal(&self) -> AppResult<bool> {
        let mut page = self.page.lock().unwrap();
        if !page.toast {
            return Ok(false);
        }
        self.activate(&mut page, Affordance::ErrorToastDismiss);
        Ok(true)
    }

    async fn screenshot(&self, path: &Path) -> AppResult<()> {
        std::fs::write(path, b"\x89PNG fake")?;
        self.world.state().screenshots.push(path.to_path_buf());
        Ok(())
    }

    async fn close(&self) -> AppResult<()> {
        self.page.lock().unwrap().closed = true;
        self.world.state().closes += 1;
        Ok(())
    }
}

/// 指向临时目录的配置
pub fn test_config(dir: &Path) -> Config {
    Config {
        login_url: LANDING_URL.to_string(),
        login_email: EMAIL.to_string(),
        login_password: PASSWORD.to_string(),
        browser_state_dir: dir.join("profile").display().to_string(),
        log_dir: dir.join("logs").display().to_string(),
        ..Config::default()
    }
}

pub fn pipeline(world: &FakeWorld, config: &Config) -> SubmissionPipeline {
    build_pipeline(config, Box::new(world.launcher()))
}

pub fn tasks(n: u32) -> Vec<GenerationTask> {
    (1..=n)
        .map(|i| GenerationTask::new(i, format!("prompt {}", i)))
        .collect()
}

pub fn prompt(i: u32) -> String {
    format!("prompt {}", i)
}
