//! 准入控制 - 业务能力层
//!
//! 按提交时间估算远端还在生成的请求数。远端队列的真实深度不可见，
//! 这里的计数只是本地估计。

use std::collections::VecDeque;

use tokio::time::{sleep, Instant};
use tracing::info;

use crate::config::QueuePolicy;

/// 滑动时间窗口内的提交记录
pub struct AdmissionController {
    policy: QueuePolicy,
    submissions: VecDeque<Instant>,
}

impl AdmissionController {
    pub fn new(policy: QueuePolicy) -> Self {
        Self {
            policy,
            submissions: VecDeque::new(),
        }
    }

    pub fn policy(&self) -> QueuePolicy {
        self.policy
    }

    /// 记录一次提交
    pub fn record_submission(&mut self) {
        self.submissions.push_back(Instant::now());
    }

    /// 丢弃超过生成时长的记录，返回仍在生成中的数量
    pub fn active_count(&mut self) -> usize {
        let now = Instant::now();
        let window = self.policy.window;
        // 提交时间单调递增，过期记录总在队首
        while let Some(&oldest) = self.submissions.front() {
            if now.duration_since(oldest) >= window {
                self.submissions.pop_front();
            } else {
                break;
            }
        }
        self.submissions.len()
    }

    /// 等到估计的在途数量低于 `limit`，返回期间休眠的次数
    pub async fn await_capacity(&mut self, limit: usize) -> usize {
        let mut waits = 0;
        loop {
            let active = self.active_count();
            info!("📊 队列: {}/{}", active, limit);

            if active < limit {
                return waits;
            }

            info!(
                "⏳ 队列已满，{} 秒后重试...",
                self.policy.backoff.as_secs()
            );
            sleep(self.policy.backoff).await;
            waits += 1;
        }
    }
}
