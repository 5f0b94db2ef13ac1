//! 拟人交互层
//!
//! - `simulator` - 纯计算：鼠标轨迹、点击位置、阅读 / 闲置动作、停顿时长
//! - `keyboard` - 纯计算：逐字输入节奏与偶发的错字修正
//! - `operator` - 把上面生成的计划交给 `SurfaceDriver` 执行
//!
//! 计划只在单次动作内使用，不缓存、不复用。

pub mod keyboard;
pub mod operator;
pub mod simulator;

use serde::Deserialize;

pub use keyboard::{KeyAction, Keystroke};
pub use operator::Operator;
pub use simulator::{
    ActivityStep, ClickPlan, InteractionSimulator, PointerPath, PointerStep, SimulatorBounds,
    SpuriousPress,
};

/// 屏幕坐标
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// 元素包围盒
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }
}

/// 可视区域尺寸
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}
