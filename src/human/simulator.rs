//! 拟人动作计划生成器
//!
//! 只负责"算"，不负责"做"：所有随机量都落在 `SimulatorBounds` 给出的区间内，
//! 执行交给 `Operator`。

use std::ops::RangeInclusive;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{Point, Rect, Viewport};

/// 随机区间参数
///
/// 时长字段以 `_ms` / `_s` 结尾标明单位，比例字段取值 0-1。
#[derive(Debug, Clone)]
pub struct SimulatorBounds {
    // --- 鼠标轨迹 ---
    /// 控制点偏移占距离的比例
    pub control_offset: RangeInclusive<f64>,
    /// 每个中间采样点的抖动幅度
    pub jitter: f64,
    pub step_delay_ms: RangeInclusive<f64>,
    pub micro_pause_chance: f64,
    pub micro_pause_ms: RangeInclusive<f64>,
    /// 每多少距离一个采样点
    pub step_distance: f64,
    pub min_path_steps: usize,
    pub max_path_steps: usize,

    // --- 点击 ---
    /// 点击落点在元素内的水平比例区间
    pub click_inset_x: RangeInclusive<f64>,
    /// 点击落点在元素内的垂直比例区间
    pub click_inset_y: RangeInclusive<f64>,
    pub click_settle_ms: RangeInclusive<f64>,
    pub spurious_click_chance: f64,
    pub spurious_hold_ms: RangeInclusive<f64>,
    pub spurious_gap_ms: RangeInclusive<f64>,

    // --- 键盘 ---
    pub key_delay_ms: RangeInclusive<f64>,
    pub punctuation_delay_ms: RangeInclusive<f64>,
    pub word_delay_ms: RangeInclusive<f64>,
    pub think_chance: f64,
    pub think_ms: RangeInclusive<f64>,
    pub typo_chance: f64,
    pub typo_hold_ms: RangeInclusive<f64>,
    pub typo_fix_ms: RangeInclusive<f64>,

    // --- 阅读 / 闲置 ---
    pub reading_pause_s: RangeInclusive<f64>,
    pub reading_glide_steps: RangeInclusive<usize>,
    pub idle_drifts: RangeInclusive<usize>,
    pub idle_drift: f64,
    pub idle_margin: f64,
    pub idle_pause_s: RangeInclusive<f64>,
    pub idle_glide_steps: RangeInclusive<usize>,

    // --- 停顿 ---
    pub distraction_chance: f64,
    pub distraction_s: RangeInclusive<f64>,
}

impl Default for SimulatorBounds {
    fn default() -> Self {
        Self {
            control_offset: 0.1..=0.3,
            jitter: 1.0,
            step_delay_ms: 5.0..=20.0,
            micro_pause_chance: 0.1,
            micro_pause_ms: 10.0..=30.0,
            step_distance: 10.0,
            min_path_steps: 15,
            max_path_steps: 50,
            click_inset_x: 0.2..=0.8,
            click_inset_y: 0.3..=0.7,
            click_settle_ms: 50.0..=150.0,
            spurious_click_chance: 0.02,
            spurious_hold_ms: 10.0..=30.0,
            spurious_gap_ms: 50.0..=100.0,
            key_delay_ms: 30.0..=120.0,
            punctuation_delay_ms: 100.0..=250.0,
            word_delay_ms: 50.0..=150.0,
            think_chance: 0.03,
            think_ms: 300.0..=1000.0,
            typo_chance: 0.02,
            typo_hold_ms: 100.0..=300.0,
            typo_fix_ms: 50.0..=150.0,
            reading_pause_s: 0.3..=1.5,
            reading_glide_steps: 5..=15,
            idle_drifts: 1..=3,
            idle_drift: 30.0,
            idle_margin: 100.0,
            idle_pause_s: 0.5..=2.0,
            idle_glide_steps: 3..=8,
            distraction_chance: 0.05,
            distraction_s: 3.0..=8.0,
        }
    }
}

/// 鼠标轨迹上的一个采样点
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerStep {
    pub point: Point,
    /// 移动到该点后的停顿
    pub delay: Duration,
}

/// 鼠标轨迹
#[derive(Debug, Clone, PartialEq)]
pub struct PointerPath {
    pub steps: Vec<PointerStep>,
}

impl PointerPath {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn last_point(&self) -> Option<Point> {
        self.steps.last().map(|s| s.point)
    }
}

/// 点击前的一次"手抖"按压
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpuriousPress {
    pub hold: Duration,
    pub gap: Duration,
}

/// 点击计划
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickPlan {
    pub point: Point,
    /// 鼠标到位后、按下前的停顿
    pub settle: Duration,
    pub spurious: Option<SpuriousPress>,
}

/// 阅读 / 闲置动作
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActivityStep {
    /// 从当前位置线性滑动到目标点，分 `steps` 步
    Glide { to: Point, steps: usize },
    Pause(Duration),
}

/// 拟人动作计划生成器
pub struct InteractionSimulator {
    pub(crate) rng: StdRng,
    pub(crate) bounds: SimulatorBounds,
}

impl Default for InteractionSimulator {
    fn default() -> Self {
        Self::new(SimulatorBounds::default())
    }
}

impl InteractionSimulator {
    pub fn new(bounds: SimulatorBounds) -> Self {
        Self {
            rng: StdRng::from_os_rng(),
            bounds,
        }
    }

    /// 固定种子，便于测试复现
    pub fn seeded(seed: u64, bounds: SimulatorBounds) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            bounds,
        }
    }

    pub fn bounds(&self) -> &SimulatorBounds {
        &self.bounds
    }

    /// 给定距离对应的采样点数量（含终点）
    pub fn path_sample_count(&self, distance: f64) -> usize {
        let raw = (distance / self.bounds.step_distance) as usize;
        raw.clamp(self.bounds.min_path_steps, self.bounds.max_path_steps) + 1
    }

    /// 三次贝塞尔曲线轨迹，smoothstep 缓动，终点精确落在 `end`
    pub fn pointer_path(&mut self, start: Point, end: Point) -> PointerPath {
        let b = &self.bounds;
        let rng = &mut self.rng;

        let dx = end.x - start.x;
        let dy = end.y - start.y;
        let distance = start.distance_to(end);
        let offset = distance * rng.random_range(b.control_offset.clone());

        let c1 = Point::new(
            start.x + dx * 0.3 + spread(rng, offset),
            start.y + dy * 0.3 + spread(rng, offset),
        );
        let c2 = Point::new(
            start.x + dx * 0.7 + spread(rng, offset),
            start.y + dy * 0.7 + spread(rng, offset),
        );

        let samples = self.path_sample_count(distance);
        let b = &self.bounds;
        let rng = &mut self.rng;
        let last = samples - 1;
        let mut steps = Vec::with_capacity(samples);

        for i in 0..samples {
            if i == last {
                steps.push(PointerStep {
                    point: end,
                    delay: Duration::ZERO,
                });
                break;
            }

            let t = i as f64 / last as f64;
            let t = t * t * (3.0 - 2.0 * t);

            let x = bezier(t, start.x, c1.x, c2.x, end.x) + spread(rng, b.jitter);
            let y = bezier(t, start.y, c1.y, c2.y, end.y) + spread(rng, b.jitter);

            let mut delay_ms = rng.random_range(b.step_delay_ms.clone());
            if rng.random_bool(b.micro_pause_chance) {
                delay_ms += rng.random_range(b.micro_pause_ms.clone());
            }

            steps.push(PointerStep {
                point: Point::new(x, y),
                delay: millis(delay_ms),
            });
        }

        PointerPath { steps }
    }

    /// 元素内的随机落点（内缩区域，避开固定的中心点击）
    pub fn click_point(&mut self, region: Rect) -> ClickPlan {
        let b = &self.bounds;
        let rng = &mut self.rng;

        let point = Point::new(
            region.x + region.width * rng.random_range(b.click_inset_x.clone()),
            region.y + region.height * rng.random_range(b.click_inset_y.clone()),
        );
        let settle = millis(rng.random_range(b.click_settle_ms.clone()));

        let spurious = if rng.random_bool(b.spurious_click_chance) {
            Some(SpuriousPress {
                hold: millis(rng.random_range(b.spurious_hold_ms.clone())),
                gap: millis(rng.random_range(b.spurious_gap_ms.clone())),
            })
        } else {
            None
        };

        ClickPlan {
            point,
            settle,
            spurious,
        }
    }

    /// 模拟阅读：在内容区（水平 20%-80%，垂直 20%-70%）随意移动并停顿，
    /// 直到计划的停顿总时长达到 `duration`
    pub fn reading_activity(&mut self, viewport: Viewport, duration: Duration) -> Vec<ActivityStep> {
        let b = &self.bounds;
        let rng = &mut self.rng;
        let mut plan = Vec::new();
        let mut elapsed = Duration::ZERO;

        while elapsed < duration {
            let to = Point::new(
                rng.random_range(viewport.width * 0.2..=viewport.width * 0.8),
                rng.random_range(viewport.height * 0.2..=viewport.height * 0.7),
            );
            plan.push(ActivityStep::Glide {
                to,
                steps: rng.random_range(b.reading_glide_steps.clone()),
            });

            let pause = secs(rng.random_range(b.reading_pause_s.clone()));
            plan.push(ActivityStep::Pause(pause));
            elapsed += pause;
        }

        plan
    }

    /// 模拟闲置：手放在鼠标上的 1-3 次小幅漂移
    pub fn idle_activity(&mut self, viewport: Viewport) -> Vec<ActivityStep> {
        let b = &self.bounds;
        let rng = &mut self.rng;
        let drifts = rng.random_range(b.idle_drifts.clone());
        let mut plan = Vec::with_capacity(drifts * 2);

        for _ in 0..drifts {
            let anchor = Point::new(
                inside(rng, viewport.width, b.idle_margin),
                inside(rng, viewport.height, b.idle_margin),
            );
            let to = Point::new(
                anchor.x + spread(rng, b.idle_drift),
                anchor.y + spread(rng, b.idle_drift),
            );
            plan.push(ActivityStep::Glide {
                to,
                steps: rng.random_range(b.idle_glide_steps.clone()),
            });
            plan.push(ActivityStep::Pause(secs(
                rng.random_range(b.idle_pause_s.clone()),
            )));
        }

        plan
    }

    /// 可视区域内的随机点（鼠标初始位置未知时使用）
    pub fn random_point(&mut self, viewport: Viewport) -> Point {
        Point::new(
            self.rng.random_range(0.0..=viewport.width.max(0.0)),
            self.rng.random_range(0.0..=viewport.height.max(0.0)),
        )
    }

    /// 人的停顿，偶尔走神多停一会
    pub fn human_pause(&mut self, min_s: f64, max_s: f64) -> Duration {
        let mut delay = self.rng.random_range(min_s..=max_s);
        if self.rng.random_bool(self.bounds.distraction_chance) {
            delay += self.rng.random_range(self.bounds.distraction_s.clone());
        }
        secs(delay)
    }

    /// 动作之间的短停顿
    pub fn quick_pause(&mut self, min_s: f64, max_s: f64) -> Duration {
        secs(self.rng.random_range(min_s..=max_s))
    }
}

fn bezier(t: f64, p0: f64, p1: f64, p2: f64, p3: f64) -> f64 {
    let u = 1.0 - t;
    u * u * u * p0 + 3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t * p3
}

/// [-amount, amount] 内均匀取值
fn spread(rng: &mut StdRng, amount: f64) -> f64 {
    if amount <= 0.0 {
        return 0.0;
    }
    rng.random_range(-amount..=amount)
}

/// 距边缘 `margin` 以内的随机坐标；区域太小时取中点
fn inside(rng: &mut StdRng, extent: f64, margin: f64) -> f64 {
    if extent <= margin * 2.0 {
        return extent / 2.0;
    }
    rng.random_range(margin..=extent - margin)
}

pub(crate) fn millis(ms: f64) -> Duration {
    Duration::from_secs_f64(ms.max(0.0) / 1000.0)
}

pub(crate) fn secs(s: f64) -> Duration {
    Duration::from_secs_f64(s.max(0.0))
}
