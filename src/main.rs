use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use flow_automation::models::loaders::{check_csv_path, find_latest_csv, load_tasks};
use flow_automation::utils::logging;
use flow_automation::{App, AppError, Config};

/// 按顺序把提示词表格提交到视频生成工具
#[derive(Debug, Parser)]
#[command(name = "flow-submit", version)]
struct Cli {
    /// 提示词表格（index,paragraph,prompt）；省略时使用输出目录中最新的 CSV
    csv: Option<PathBuf>,

    /// TOML 配置文件
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let config = Config::load(cli.config.as_deref()).context("加载配置失败")?;

    // 初始化日志
    logging::init(config.verbose_logging);

    let csv_path = match cli.csv {
        Some(path) => {
            check_csv_path(&path)?;
            path
        }
        None => find_latest_csv(Path::new(&config.output_dir))
            .await?
            .with_context(|| {
                format!(
                    "{} 中没有 CSV 文件，请先运行 flow-prompts 生成提示词",
                    config.output_dir
                )
            })?,
    };

    let tasks = load_tasks(&csv_path).await?;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("收到 Ctrl+C，放弃进行中的任务并退出...");
            ctrl_c.cancel();
        }
    });

    // 初始化并运行应用
    let mut app = App::initialize(config, cancel)
        .await
        .map_err(|e| failure("初始化失败", e))?;

    let result = app.run(&tasks, &csv_path).await;
    app.shutdown().await;

    let report = result.map_err(|e| failure("运行失败", e))?;
    report.ensure_complete().map_err(|e| failure("运行中断", e))?;
    info!("✅ 全部 {} 条已提交", report.total);
    Ok(())
}

/// 记录失败原因，致命错误单独标出
fn failure(stage: &str, e: AppError) -> anyhow::Error {
    if e.is_fatal() {
        error!("💥 {}，致命错误，请检查账号或站点状态: {}", stage, e);
    } else {
        error!("❌ {}: {}", stage, e);
    }
    anyhow::Error::new(e).context(stage.to_string())
}
