//! 程序配置
//!
//! 配置对象在启动时显式构造一次，再按需拆成各组件的策略结构传入构造函数。
//! 加载顺序：默认值 → TOML 配置文件（可选）→ 环境变量。

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;

use crate::error::ConfigError;

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 远程站点 ---
    /// 登录入口（落地页）
    pub login_url: String,
    /// 登录成功后地址中应出现的片段
    pub app_url_fragment: String,
    pub login_email: String,
    pub login_password: String,
    /// 代理，格式 user:pass@host:port
    pub proxy: Option<String>,

    // --- 浏览器 ---
    /// 浏览器可执行文件（为空时由 chromiumoxide 自动查找）
    pub chrome_executable: Option<String>,
    pub headless: bool,
    /// 持久化的浏览器用户数据目录
    pub browser_state_dir: String,
    /// 页面上报的语言、时区和地理位置
    pub browser_locale: String,
    pub browser_timezone: String,
    pub geo_latitude: f64,
    pub geo_longitude: f64,

    // --- 提交队列 ---
    /// 远端同时生成的上限（观测值，非官方约定）
    pub max_queue_size: usize,
    /// 单次生成的估计耗时（秒）
    pub generation_time_secs: u64,
    /// 队列满时的轮询间隔（秒）
    pub queue_poll_secs: u64,
    /// 每个提示词的输出数量
    pub outputs_per_prompt: u8,
    /// 提交后检查错误提示前的等待（秒）
    pub error_settle_secs: u64,
    /// 恢复时重启浏览器前的等待（秒）
    pub recovery_settle_secs: u64,
    /// 恢复失败后的冷却时间（秒）
    pub recovery_cooldown_secs: u64,

    // --- 目录 ---
    pub input_dir: String,
    pub output_dir: String,
    /// 错误截图目录
    pub log_dir: String,
    /// 运行日志文件
    pub output_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,

    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub llm_max_tokens: u32,
    /// 两次 LLM 调用之间的间隔（毫秒）
    pub llm_pacing_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            login_url: "https://labs.google/fx/tools/flow".to_string(),
            app_url_fragment: "/flow".to_string(),
            login_email: String::new(),
            login_password: String::new(),
            proxy: None,
            chrome_executable: None,
            headless: false,
            browser_state_dir: ".browser_state".to_string(),
            browser_locale: "en-US".to_string(),
            browser_timezone: "America/Los_Angeles".to_string(),
            geo_latitude: 37.7749,
            geo_longitude: -122.4194,
            max_queue_size: 5,
            generation_time_secs: 120,
            queue_poll_secs: 30,
            outputs_per_prompt: 1,
            error_settle_secs: 3,
            recovery_settle_secs: 3,
            recovery_cooldown_secs: 30,
            input_dir: "data/input".to_string(),
            output_dir: "data/output".to_string(),
            log_dir: "logs".to_string(),
            output_log_file: "output.txt".to_string(),
            verbose_logging: false,
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.anthropic.com/v1".to_string(),
            llm_model_name: "claude-3-haiku-20240307".to_string(),
            llm_max_tokens: 512,
            llm_pacing_ms: 1000,
        }
    }
}

impl Config {
    /// 仅从环境变量加载（其余使用默认值）
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件（可选）加载，再叠加环境变量
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        base.with_env_overrides()
    }

    /// 解析 TOML 文件
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::FileParse {
            path: path.display().to_string(),
            source,
        })
    }

    fn with_env_overrides(self) -> Result<Self, ConfigError> {
        Ok(Self {
            login_url: env_string("FLOW_LOGIN_URL", self.login_url),
            app_url_fragment: env_string("FLOW_APP_URL_FRAGMENT", self.app_url_fragment),
            login_email: env_string("FLOW_LOGIN_EMAIL", self.login_email),
            login_password: env_string("FLOW_LOGIN_PASSWORD", self.login_password),
            proxy: std::env::var("FLOW_PROXY").ok().or(self.proxy),
            chrome_executable: std::env::var("CHROME_EXECUTABLE").ok().or(self.chrome_executable),
            headless: env_parse("BROWSER_HEADLESS", self.headless)?,
            browser_state_dir: env_string("BROWSER_STATE_DIR", self.browser_state_dir),
            browser_locale: env_string("BROWSER_LOCALE", self.browser_locale),
            browser_timezone: env_string("BROWSER_TIMEZONE", self.browser_timezone),
            geo_latitude: env_parse("GEO_LATITUDE", self.geo_latitude)?,
            geo_longitude: env_parse("GEO_LONGITUDE", self.geo_longitude)?,
            max_queue_size: env_parse("MAX_QUEUE_SIZE", self.max_queue_size)?,
            generation_time_secs: env_parse("GENERATION_TIME_SECS", self.generation_time_secs)?,
            queue_poll_secs: env_parse("QUEUE_POLL_SECS", self.queue_poll_secs)?,
            outputs_per_prompt: env_parse("OUTPUTS_PER_PROMPT", self.outputs_per_prompt)?,
            error_settle_secs: env_parse("ERROR_SETTLE_SECS", self.error_settle_secs)?,
            recovery_settle_secs: env_parse("RECOVERY_SETTLE_SECS", self.recovery_settle_secs)?,
            recovery_cooldown_secs: env_parse(
                "RECOVERY_COOLDOWN_SECS",
                self.recovery_cooldown_secs,
            )?,
            input_dir: env_string("INPUT_DIR", self.input_dir),
            output_dir: env_string("OUTPUT_DIR", self.output_dir),
            log_dir: env_string("LOG_DIR", self.log_dir),
            output_log_file: env_string("OUTPUT_LOG_FILE", self.output_log_file),
            verbose_logging: env_parse("VERBOSE_LOGGING", self.verbose_logging)?,
            llm_api_key: env_string("LLM_API_KEY", self.llm_api_key),
            llm_api_base_url: env_string("LLM_API_BASE_URL", self.llm_api_base_url),
            llm_model_name: env_string("LLM_MODEL_NAME", self.llm_model_name),
            llm_max_tokens: env_parse("LLM_MAX_TOKENS", self.llm_max_tokens)?,
            llm_pacing_ms: env_parse("LLM_PACING_MS", self.llm_pacing_ms)?,
        })
    }

    /// 提交流程启动前的校验
    pub fn validate_for_submission(&self) -> Result<(), ConfigError> {
        require("FLOW_LOGIN_URL", &self.login_url)?;
        require("FLOW_LOGIN_EMAIL", &self.login_email)?;
        require("FLOW_LOGIN_PASSWORD", &self.login_password)?;
        if self.max_queue_size == 0 {
            return Err(ConfigError::Invalid {
                var_name: "MAX_QUEUE_SIZE".to_string(),
                reason: "必须大于 0".to_string(),
            });
        }
        if !(1..=4).contains(&self.outputs_per_prompt) {
            return Err(ConfigError::Invalid {
                var_name: "OUTPUTS_PER_PROMPT".to_string(),
                reason: format!("必须在 1-4 之间，实际为 {}", self.outputs_per_prompt),
            });
        }
        self.proxy_config()?;
        Ok(())
    }

    /// 提示词生成前的校验
    pub fn validate_for_generation(&self) -> Result<(), ConfigError> {
        require("LLM_API_KEY", &self.llm_api_key)?;
        require("LLM_MODEL_NAME", &self.llm_model_name)
    }

    /// 解析代理配置
    pub fn proxy_config(&self) -> Result<Option<ProxyConfig>, ConfigError> {
        self.proxy
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(ProxyConfig::parse)
            .transpose()
    }

    pub fn login_settings(&self) -> LoginSettings {
        LoginSettings {
            landing_url: self.login_url.clone(),
            app_url_fragment: self.app_url_fragment.clone(),
            identity: self.login_email.clone(),
            secret: self.login_password.clone(),
            ..LoginSettings::default()
        }
    }

    pub fn queue_policy(&self) -> QueuePolicy {
        QueuePolicy {
            capacity: self.max_queue_size,
            window: Duration::from_secs(self.generation_time_secs),
            backoff: Duration::from_secs(self.queue_poll_secs),
        }
    }

    pub fn recovery_policy(&self) -> RecoveryPolicy {
        RecoveryPolicy {
            settle: Duration::from_secs(self.recovery_settle_secs),
            cooldown: Duration::from_secs(self.recovery_cooldown_secs),
            outputs_per_prompt: self.outputs_per_prompt,
        }
    }

    pub fn browser_settings(&self) -> Result<BrowserSettings, ConfigError> {
        Ok(BrowserSettings {
            chrome_executable: self.chrome_executable.as_ref().map(PathBuf::from),
            headless: self.headless,
            proxy: self.proxy_config()?,
            fingerprint: Fingerprint {
                locale: self.browser_locale.clone(),
                timezone: self.browser_timezone.clone(),
                latitude: self.geo_latitude,
                longitude: self.geo_longitude,
            },
        })
    }

    pub fn error_settle(&self) -> Duration {
        Duration::from_secs(self.error_settle_secs)
    }
}

/// 代理配置
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProxyConfig {
    /// host:port
    pub server: String,
    pub username: String,
    pub password: String,
}

impl ProxyConfig {
    /// 解析 `user:pass@host:port`
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        let re = Regex::new(r"^([^:@]+):([^@]+)@([^:@]+):(\d{1,5})$")
            .map_err(|_| ConfigError::InvalidProxy {
                value: value.to_string(),
            })?;
        let caps = re
            .captures(value.trim())
            .ok_or_else(|| ConfigError::InvalidProxy {
                value: value.to_string(),
            })?;

        Ok(Self {
            server: format!("{}:{}", &caps[3], &caps[4]),
            username: caps[1].to_string(),
            password: caps[2].to_string(),
        })
    }

    /// 传给浏览器的 --proxy-server 值
    pub fn server_url(&self) -> String {
        format!("http://{}", self.server)
    }
}

/// 登录状态机参数
#[derive(Clone, Debug)]
pub struct LoginSettings {
    pub landing_url: String,
    pub app_url_fragment: String,
    pub identity: String,
    pub secret: String,
    /// 检查是否已登录
    pub resume_check: Duration,
    /// 等待"开始创作"按钮
    pub creation_wait: Duration,
    /// 等待账号 / 密码输入框
    pub credential_wait: Duration,
    /// 等待跳转进应用
    pub transition_wait: Duration,
    /// 等待"新建项目"按钮和主输入框
    pub ready_wait: Duration,
}

impl Default for LoginSettings {
    fn default() -> Self {
        Self {
            landing_url: String::new(),
            app_url_fragment: "/flow".to_string(),
            identity: String::new(),
            secret: String::new(),
            resume_check: Duration::from_secs(5),
            creation_wait: Duration::from_secs(10),
            credential_wait: Duration::from_secs(10),
            transition_wait: Duration::from_secs(30),
            ready_wait: Duration::from_secs(30),
        }
    }
}

/// 准入控制参数
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueuePolicy {
    pub capacity: usize,
    pub window: Duration,
    pub backoff: Duration,
}

impl Default for QueuePolicy {
    fn default() -> Self {
        Self {
            capacity: 5,
            window: Duration::from_secs(120),
            backoff: Duration::from_secs(30),
        }
    }
}

/// 恢复参数
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecoveryPolicy {
    pub settle: Duration,
    pub cooldown: Duration,
    pub outputs_per_prompt: u8,
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        Self {
            settle: Duration::from_secs(3),
            cooldown: Duration::from_secs(30),
            outputs_per_prompt: 1,
        }
    }
}

/// 浏览器启动参数
#[derive(Clone, Debug, Default)]
pub struct BrowserSettings {
    pub chrome_executable: Option<PathBuf>,
    pub headless: bool,
    pub proxy: Option<ProxyConfig>,
    pub fingerprint: Fingerprint,
}

/// 页面环境伪装：语言、时区、地理位置需与代理出口地区一致
#[derive(Clone, Debug, PartialEq)]
pub struct Fingerprint {
    pub locale: String,
    pub timezone: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for Fingerprint {
    fn default() -> Self {
        Self {
            locale: "en-US".to_string(),
            timezone: "America/Los_Angeles".to_string(),
            latitude: 37.7749,
            longitude: -122.4194,
        }
    }
}

impl Fingerprint {
    /// CDP 要求 ICU 风格的语言标识（en_US）
    pub fn icu_locale(&self) -> String {
        self.locale.replace('-', "_")
    }
}

fn env_string(name: &str, default: String) -> String {
    std::env::var(name).unwrap_or(default)
}

fn env_parse<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::EnvVarParseFailed {
            var_name: name.to_string(),
            value,
            expected_type: std::any::type_name::<T>().to_string(),
        }),
        Err(_) => Ok(default),
    }
}

fn require(name: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Missing {
            var_name: name.to_string(),
        });
    }
    Ok(())
}
