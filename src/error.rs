//! 错误类型
//!
//! 按来源分层：浏览器驱动、会话/登录、文件、LLM、配置，以及恢复流程本身的失败。

use std::time::Duration;

use thiserror::Error;

use crate::browser::Affordance;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 浏览器驱动错误（DriverFault）
    #[error("浏览器错误: {0}")]
    Browser(BrowserError),
    /// 会话 / 登录状态机错误
    #[error("会话错误: {0}")]
    Session(SessionError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(FileError),
    /// LLM 服务错误（CollaboratorFault）
    #[error("LLM错误: {0}")]
    Llm(LlmError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(ConfigError),
    /// 恢复流程失败（RecoveryFault）
    #[error("恢复失败 (阶段: {stage}): {source}")]
    Recovery {
        stage: RecoveryStage,
        #[source]
        source: Box<AppError>,
    },
    /// 管线被取消或叫停，任务没有全部提交
    #[error("运行未完成: 已提交 {submitted}/{total}")]
    Incomplete { submitted: usize, total: usize },
}

impl AppError {
    /// 是否为不可恢复的致命错误
    ///
    /// 只有登录后主输入框始终未出现（且没有恢复目标）这一种情况。
    pub fn is_fatal(&self) -> bool {
        match self {
            AppError::Session(SessionError::SurfaceNeverReady { .. }) => true,
            _ => false,
        }
    }

    /// 包装为恢复阶段错误
    pub fn in_recovery(self, stage: RecoveryStage) -> Self {
        AppError::Recovery {
            stage,
            source: Box::new(self),
        }
    }
}

/// 恢复流程所处阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStage {
    ClearProfile,
    Relaunch,
    Login,
    RestoreSettings,
}

impl std::fmt::Display for RecoveryStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RecoveryStage::ClearProfile => "清理浏览器数据",
            RecoveryStage::Relaunch => "重启浏览器",
            RecoveryStage::Login => "重新登录",
            RecoveryStage::RestoreSettings => "恢复项目设置",
        };
        f.write_str(name)
    }
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// CDP 协议调用失败
    #[error("CDP 调用失败: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),
    /// 浏览器配置失败
    #[error("浏览器配置失败: {0}")]
    ConfigurationFailed(String),
    /// CDP 命令构造失败
    #[error("构造 CDP 命令失败: {0}")]
    CommandBuild(String),
    /// 执行脚本返回了无法解析的结果
    #[error("脚本结果解析失败: {0}")]
    ScriptResult(#[from] serde_json::Error),
    /// 页面上找不到目标元素
    #[error("页面上找不到元素: {0}")]
    ElementMissing(Affordance),
    /// 驱动已关闭
    #[error("浏览器会话已关闭")]
    Closed,
}

/// 会话 / 登录错误
#[derive(Debug, Error)]
pub enum SessionError {
    /// 会话尚未启动
    #[error("会话尚未启动")]
    NotStarted,
    /// 有限等待超时（BoundedWaitTimeout）
    #[error("等待 {what} 超时 ({}s)", timeout.as_secs())]
    WaitTimeout { what: Affordance, timeout: Duration },
    /// 登录后主输入框始终未出现，且没有可返回的项目
    #[error("登录后 {what} 在 {}s 内未出现，无法继续", timeout.as_secs())]
    SurfaceNeverReady { what: Affordance, timeout: Duration },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读写失败
    #[error("文件读写失败 {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// CSV 解析或写入失败
    #[error("CSV 处理失败 {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
    /// 文件不存在
    #[error("文件不存在: {path}")]
    NotFound { path: String },
    /// 文件类型不符
    #[error("文件 {path} 不是 {expected} 文件")]
    WrongExtension { path: String, expected: String },
}

/// LLM 服务错误
#[derive(Debug, Error)]
pub enum LlmError {
    /// 构造请求失败
    #[error("构造 LLM 请求失败: {0}")]
    RequestBuild(String),
    /// API 调用失败
    #[error("LLM API 调用失败 (模型: {model}): {source}")]
    ApiCallFailed {
        model: String,
        #[source]
        source: async_openai::error::OpenAIError,
    },
    /// 返回内容为空
    #[error("LLM 返回内容为空")]
    EmptyResponse,
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 必填项缺失
    #[error("缺少必填配置项 {var_name}")]
    Missing { var_name: String },
    /// 取值非法
    #[error("配置项 {var_name} 取值非法: {reason}")]
    Invalid { var_name: String, reason: String },
    /// 代理格式错误
    #[error("代理格式错误，应为 user:pass@host:port，实际为 '{value}'")]
    InvalidProxy { value: String },
    /// 配置文件读取失败
    #[error("无法读取配置文件 {path}: {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 配置文件解析失败
    #[error("无法解析配置文件 {path}: {source}")]
    FileParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

// ========== 从常见错误类型转换 ==========

impl From<BrowserError> for AppError {
    fn from(err: BrowserError) -> Self {
        AppError::Browser(err)
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        AppError::Session(err)
    }
}

impl From<FileError> for AppError {
    fn from(err: FileError) -> Self {
        AppError::File(err)
    }
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        AppError::Llm(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AppError::Browser(BrowserError::Cdp(err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Browser(BrowserError::ScriptResult(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::File(FileError::Io {
            path: String::new(), // io::Error 不携带路径信息
            source: err,
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建带路径的文件读写错误
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::Io {
            path: path.into(),
            source,
        })
    }

    /// 创建带路径的 CSV 错误
    pub fn csv(path: impl Into<String>, source: csv::Error) -> Self {
        AppError::File(FileError::Csv {
            path: path.into(),
            source,
        })
    }

    /// 创建 CDP 命令构造错误
    pub fn command_build(reason: impl Into<String>) -> Self {
        AppError::Browser(BrowserError::CommandBuild(reason.into()))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
