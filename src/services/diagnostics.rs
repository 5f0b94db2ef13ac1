//! 错误截图 - 业务能力层
//!
//! 只负责"把当前页面存成图片"，截图失败只记日志，不影响恢复流程。

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{debug, error};

use crate::browser::SurfaceDriver;

pub struct Diagnostics {
    log_dir: PathBuf,
    /// 同一毫秒内的多张截图靠序号区分
    sequence: AtomicUsize,
}

impl Diagnostics {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
            sequence: AtomicUsize::new(0),
        }
    }

    /// 截图文件名：error_YYYYmmdd_HHMMSS_mmm_NNN.png
    pub fn snapshot_path(&self) -> PathBuf {
        let ts = chrono::Local::now().format("%Y%m%d_%H%M%S_%3f");
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed) % 1000;
        self.log_dir.join(format!("error_{}_{:03}.png", ts, seq))
    }

    /// 保存错误截图，成功时返回文件路径
    pub async fn capture(&self, driver: &dyn SurfaceDriver) -> Option<PathBuf> {
        if let Err(e) = tokio::fs::create_dir_all(&self.log_dir).await {
            error!("无法创建日志目录 {}: {}", self.log_dir.display(), e);
            return None;
        }

        let path = self.snapshot_path();
        debug!("保存错误截图: {}", path.display());
        match driver.screenshot(&path).await {
            Ok(()) => {
                error!("📸 错误截图已保存: {}", path.display());
                Some(path)
            }
            Err(e) => {
                error!("无法保存错误截图: {}", e);
                None
            }
        }
    }
}
