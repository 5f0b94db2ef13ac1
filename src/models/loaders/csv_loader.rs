use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::{AppError, AppResult, FileError};
use crate::models::task::{GenerationTask, PromptRecord};

/// 从提示词表格加载待提交任务
///
/// 只读取 `index` 和 `prompt` 两列；空提示词（生成失败的条目）会被跳过并告警。
pub async fn load_tasks(csv_path: &Path) -> AppResult<Vec<GenerationTask>> {
    let records = read_prompt_records(csv_path).await?;
    let total = records.len();

    let mut tasks = Vec::with_capacity(total);
    for record in records {
        if record.is_generated() {
            tasks.push(GenerationTask::new(record.index, record.prompt.trim()));
        } else {
            tracing::warn!("第 {} 条提示词为空，跳过", record.index);
        }
    }

    tracing::info!("从 {} 加载 {}/{} 条提示词", csv_path.display(), tasks.len(), total);
    Ok(tasks)
}

/// 读取整张提示词表格
pub async fn read_prompt_records(csv_path: &Path) -> AppResult<Vec<PromptRecord>> {
    let path_str = csv_path.display().to_string();
    let content = fs::read(csv_path)
        .await
        .map_err(|e| AppError::io(&path_str, e))?;

    let mut reader = csv::Reader::from_reader(content.as_slice());
    let mut records = Vec::new();
    for row in reader.deserialize::<PromptRecord>() {
        records.push(row.map_err(|e| AppError::csv(&path_str, e))?);
    }
    Ok(records)
}

/// 写出提示词表格（表头 index,paragraph,prompt）
pub async fn write_prompt_records(csv_path: &Path, records: &[PromptRecord]) -> AppResult<()> {
    let path_str = csv_path.display().to_string();

    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in records {
        writer
            .serialize(record)
            .map_err(|e| AppError::csv(&path_str, e))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::io(&path_str, e.into_error()))?;

    if let Some(parent) = csv_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::io(parent.display().to_string(), e))?;
        }
    }
    fs::write(csv_path, bytes)
        .await
        .map_err(|e| AppError::io(&path_str, e))
}

/// 校验用户指定的表格路径
pub fn check_csv_path(csv_path: &Path) -> AppResult<()> {
    if !csv_path.exists() {
        return Err(FileError::NotFound {
            path: csv_path.display().to_string(),
        }
        .into());
    }
    if csv_path.extension().and_then(|s| s.to_str()) != Some("csv") {
        return Err(FileError::WrongExtension {
            path: csv_path.display().to_string(),
            expected: "CSV".to_string(),
        }
        .into());
    }
    Ok(())
}

/// 目录中最近修改的 CSV 文件
pub async fn find_latest_csv(folder: &Path) -> AppResult<Option<PathBuf>> {
    if !folder.exists() {
        return Ok(None);
    }

    let mut latest: Option<(std::time::SystemTime, PathBuf)> = None;
    let mut entries = fs::read_dir(folder)
        .await
        .map_err(|e| AppError::io(folder.display().to_string(), e))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("csv") {
            continue;
        }
        let modified = entry.metadata().await?.modified()?;
        if latest.as_ref().map_or(true, |(t, _)| modified > *t) {
            latest = Some((modified, path));
        }
    }

    Ok(latest.map(|(_, path)| path))
}

/// 读取纯文本原文，按空行切分段落
pub async fn read_paragraphs(path: &Path) -> AppResult<Vec<String>> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| AppError::io(path.display().to_string(), e))?;
    Ok(split_paragraphs(&content))
}

pub fn split_paragraphs(content: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in content.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join(" "));
                current.clear();
            }
        } else {
            current.push(line.trim());
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join(" "));
    }
    paragraphs
}
