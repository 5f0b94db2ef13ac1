use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use flow_automation::models::loaders::{read_paragraphs, write_prompt_records};
use flow_automation::services::{generate_prompts, LlmPromptGenerator};
use flow_automation::utils::logging;
use flow_automation::Config;

/// 把原文段落转成视频提示词表格
#[derive(Debug, Parser)]
#[command(name = "flow-prompts", version)]
struct Cli {
    /// 原文文件（纯文本，空行分段）；相对路径按输入目录解析
    input: PathBuf,

    /// 只处理这些段落（从1开始，逗号分隔）
    #[arg(short, long, value_delimiter = ',')]
    indices: Option<Vec<usize>>,

    /// TOML 配置文件
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("加载配置失败")?;
    logging::init(config.verbose_logging);
    config.validate_for_generation()?;

    let input_path = if cli.input.is_absolute() || cli.input.exists() {
        cli.input.clone()
    } else {
        PathBuf::from(&config.input_dir).join(&cli.input)
    };

    let paragraphs = read_paragraphs(&input_path).await?;
    info!("📄 {} 共 {} 段", input_path.display(), paragraphs.len());

    let generator = LlmPromptGenerator::new(&config);
    let batch = generate_prompts(
        &paragraphs,
        cli.indices.as_deref(),
        &generator,
        Duration::from_millis(config.llm_pacing_ms),
    )
    .await;

    let stem = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("prompts");
    let output_path = PathBuf::from(&config.output_dir).join(format!("{}_prompts.csv", stem));
    write_prompt_records(&output_path, &batch.records).await?;

    info!(
        "✓ 已保存至 {}（成功 {}，失败 {}）",
        output_path.display(),
        batch.successful(),
        batch.failed()
    );
    Ok(())
}
