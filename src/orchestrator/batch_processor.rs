//! 批量提交处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是提交程序的入口，负责按配置组装各组件并管理浏览器资源。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：校验配置、写日志表头、启动浏览器并登录
//! 2. **运行管线**：把任务交给 `SubmissionPipeline`
//! 3. **全局统计**：汇总提交、报错、恢复次数
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单条提交的细节
//! - **资源所有者**：通过 `SessionManager` 唯一持有浏览器会话

use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::browser::{ChromeLauncher, SessionLauncher};
use crate::config::Config;
use crate::error::AppResult;
use crate::human::{InteractionSimulator, Operator};
use crate::models::GenerationTask;
use crate::orchestrator::pipeline::{PipelineOutcome, PipelineReport, SubmissionPipeline};
use crate::services::{AdmissionController, Diagnostics, RecoveryManager, SessionManager};
use crate::utils::logging;
use crate::workflow::SubmissionFlow;

/// 应用主结构
pub struct App {
    config: Config,
    pipeline: SubmissionPipeline,
}

impl App {
    /// 初始化应用：启动 Chromium 并登录
    pub async fn initialize(config: Config, cancel: CancellationToken) -> AppResult<Self> {
        config.validate_for_submission()?;
        let launcher = ChromeLauncher::new(config.browser_settings()?);
        Self::with_launcher(config, Box::new(launcher), cancel).await
    }

    /// 使用指定的会话启动器初始化
    pub async fn with_launcher(
        config: Config,
        launcher: Box<dyn SessionLauncher>,
        cancel: CancellationToken,
    ) -> AppResult<Self> {
        logging::init_log_file(&run_log_path(&config), "视频提交日志")?;

        let queue = config.queue_policy();
        logging::log_startup("顺序提交模式", queue.capacity, queue.window.as_secs());

        let mut pipeline = build_pipeline(&config, launcher).with_cancellation(cancel);
        pipeline.start().await?;

        Ok(Self { config, pipeline })
    }

    /// 运行应用主逻辑
    pub async fn run(&mut self, tasks: &[GenerationTask], source: &Path) -> AppResult<PipelineReport> {
        if tasks.is_empty() {
            warn!("⚠️ 没有可提交的提示词，程序结束");
            return Ok(PipelineReport::default());
        }

        logging::log_tasks_loaded(tasks.len(), source);

        let report = self.pipeline.run(tasks).await?;
        print_final_stats(&report, &run_log_path(&self.config));
        Ok(report)
    }

    /// 关闭浏览器
    pub async fn shutdown(&mut self) {
        self.pipeline.shutdown().await;
        info!("👋 已退出");
    }
}

/// 按配置组装提交管线（尚未启动会话）
pub fn build_pipeline(config: &Config, launcher: Box<dyn SessionLauncher>) -> SubmissionPipeline {
    let session = SessionManager::new(
        launcher,
        PathBuf::from(&config.browser_state_dir),
        config.login_settings(),
    );
    let operator = Operator::new(InteractionSimulator::default());

    SubmissionPipeline::new(
        session,
        operator,
        AdmissionController::new(config.queue_policy()),
        RecoveryManager::new(config.recovery_policy()),
        Diagnostics::new(&config.log_dir),
        SubmissionFlow::new(config.error_settle()),
    )
}

fn run_log_path(config: &Config) -> PathBuf {
    Path::new(&config.log_dir).join(&config.output_log_file)
}

// ========== 日志辅助函数 ==========

fn print_final_stats(report: &PipelineReport, log_file: &Path) {
    let outcome = match report.outcome {
        PipelineOutcome::Completed => "全部完成",
        PipelineOutcome::Interrupted => "已中断",
    };
    logging::print_final_stats(
        &[
            ("🏁 结果", outcome.to_string()),
            ("✅ 已提交", format!("{}/{}", report.submitted, report.total)),
            ("❌ 远端报错", report.remote_errors.to_string()),
            ("⚠️ 驱动故障", report.driver_faults.to_string()),
            ("🔄 恢复成功", report.recoveries.to_string()),
            ("💥 恢复失败", report.recovery_failures.to_string()),
            ("📸 错误截图", report.snapshots.len().to_string()),
        ],
        log_file,
    );
}
