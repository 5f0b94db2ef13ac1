//! 拟人操作执行器
//!
//! 向 `InteractionSimulator` 要计划，再逐步交给 `SurfaceDriver` 执行。
//! 记住鼠标最后的位置，下一段轨迹从这里出发。

use std::time::Duration;

use tokio::time::sleep;
use tracing::debug;

use super::keyboard::KeyAction;
use super::simulator::{ActivityStep, InteractionSimulator};
use super::Point;
use crate::browser::{Affordance, Key, SurfaceDriver};
use crate::error::AppResult;

/// 拿不到可视区域时假定的鼠标起点
const FALLBACK_START: Point = Point { x: 500.0, y: 400.0 };

pub struct Operator {
    simulator: InteractionSimulator,
    pointer: Option<Point>,
}

impl Operator {
    pub fn new(simulator: InteractionSimulator) -> Self {
        Self {
            simulator,
            pointer: None,
        }
    }

    pub fn simulator_mut(&mut self) -> &mut InteractionSimulator {
        &mut self.simulator
    }

    /// 会话重建后鼠标位置未知
    pub fn forget_pointer(&mut self) {
        self.pointer = None;
    }

    /// 人的停顿（偶尔走神）
    pub async fn pause(&mut self, min_s: f64, max_s: f64) {
        sleep(self.simulator.human_pause(min_s, max_s)).await;
    }

    /// 动作间的短停顿
    pub async fn quick(&mut self, min_s: f64, max_s: f64) {
        sleep(self.simulator.quick_pause(min_s, max_s)).await;
    }

    /// 沿贝塞尔轨迹移动到目标点
    pub async fn move_to(&mut self, driver: &dyn SurfaceDriver, target: Point) -> AppResult<()> {
        let start = match self.pointer {
            Some(p) => p,
            None => match driver.viewport().await? {
                Some(viewport) => self.simulator.random_point(viewport),
                None => FALLBACK_START,
            },
        };

        let path = self.simulator.pointer_path(start, target);
        for step in path.steps {
            driver.mouse_move(step.point).await?;
            if !step.delay.is_zero() {
                sleep(step.delay).await;
            }
        }
        self.pointer = Some(target);
        Ok(())
    }

    /// 移动到元素内的随机点再点击
    pub async fn click(&mut self, driver: &dyn SurfaceDriver, target: Affordance) -> AppResult<()> {
        let Some(region) = driver.bounding_box(target).await? else {
            debug!("{} 没有包围盒，直接触发点击", target);
            return driver.click_element(target).await;
        };

        let plan = self.simulator.click_point(region);
        self.move_to(driver, plan.point).await?;
        sleep(plan.settle).await;

        if let Some(press) = plan.spurious {
            driver.mouse_down(plan.point).await?;
            sleep(press.hold).await;
            driver.mouse_up(plan.point).await?;
            sleep(press.gap).await;
        }

        driver.mouse_click(plan.point).await
    }

    /// 逐字输入
    pub async fn type_text(&mut self, driver: &dyn SurfaceDriver, text: &str) -> AppResult<()> {
        for key in self.simulator.keystroke_stream(text) {
            match key.action {
                KeyAction::Char(c) => driver.type_char(c).await?,
                KeyAction::Backspace => driver.press_key(Key::Backspace).await?,
            }
            sleep(key.delay_after).await;
        }
        Ok(())
    }

    /// 点击输入框后逐字输入
    pub async fn type_into(
        &mut self,
        driver: &dyn SurfaceDriver,
        target: Affordance,
        text: &str,
    ) -> AppResult<()> {
        self.click(driver, target).await?;
        self.quick(0.1, 0.3).await;
        self.type_text(driver, text).await
    }

    /// 模拟阅读页面
    pub async fn read_page(&mut self, driver: &dyn SurfaceDriver, duration: Duration) -> AppResult<()> {
        match driver.viewport().await? {
            Some(viewport) => {
                let plan = self.simulator.reading_activity(viewport, duration);
                self.perform(driver, plan).await
            }
            None => {
                sleep(duration).await;
                Ok(())
            }
        }
    }

    /// 模拟闲置
    pub async fn idle(&mut self, driver: &dyn SurfaceDriver) -> AppResult<()> {
        match driver.viewport().await? {
            Some(viewport) => {
                let plan = self.simulator.idle_activity(viewport);
                self.perform(driver, plan).await
            }
            None => {
                self.quick(1.0, 3.0).await;
                Ok(())
            }
        }
    }

    async fn perform(&mut self, driver: &dyn SurfaceDriver, plan: Vec<ActivityStep>) -> AppResult<()> {
        for step in plan {
            match step {
                ActivityStep::Glide { to, steps } => {
                    let from = self.pointer.unwrap_or(to);
                    let steps = steps.max(1);
                    for k in 1..=steps {
                        let t = k as f64 / steps as f64;
                        let p = Point::new(from.x + (to.x - from.x) * t, from.y + (to.y - from.y) * t);
                        driver.mouse_move(p).await?;
                    }
                    self.pointer = Some(to);
                }
                ActivityStep::Pause(d) => sleep(d).await,
            }
        }
        Ok(())
    }
}
