//! # Easing 模块
//!
//! 缓动函数库与缓动配置。
//!
//! - [`EasingFunction`]：按名称查找的缓动曲线表
//! - [`Easing`]：命名曲线或调用方提供的自定义函数
//! - [`EasingConfig`]：一次运行使用弹簧模型还是固定时长的曲线模型

use std::f32::consts::{FRAC_PI_2, PI};
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use crate::error::{AnimError, AnimResult};
use crate::spring::SpringConfig;

/// 缓动函数类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EasingFunction {
    /// 线性（匀速）
    Linear,
    /// CSS `ease`
    Ease,
    /// 缓入（先慢后快）
    EaseIn,
    /// 缓出（先快后慢）
    EaseOut,
    /// 缓入缓出（两头慢中间快）
    #[default]
    EaseInOut,
    /// 二次缓入
    EaseInQuad,
    /// 二次缓出
    EaseOutQuad,
    /// 二次缓入缓出
    EaseInOutQuad,
    /// 三次缓入
    EaseInCubic,
    /// 三次缓出
    EaseOutCubic,
    /// 三次缓入缓出
    EaseInOutCubic,
    /// 正弦缓入
    EaseInSine,
    /// 正弦缓出
    EaseOutSine,
    /// 正弦缓入缓出
    EaseInOutSine,
    /// 指数缓入
    EaseInExpo,
    /// 指数缓出
    EaseOutExpo,
    /// 指数缓入缓出
    EaseInOutExpo,
    /// 弹性缓出
    EaseOutElastic,
    /// 弹跳缓出
    EaseOutBounce,
}

impl EasingFunction {
    /// 所有缓动函数及其名称
    pub const ALL: &'static [(&'static str, EasingFunction)] = &[
        ("linear", Self::Linear),
        ("ease", Self::Ease),
        ("ease-in", Self::EaseIn),
        ("ease-out", Self::EaseOut),
        ("ease-in-out", Self::EaseInOut),
        ("in-quad", Self::EaseInQuad),
        ("out-quad", Self::EaseOutQuad),
        ("in-out-quad", Self::EaseInOutQuad),
        ("in-cubic", Self::EaseInCubic),
        ("out-cubic", Self::EaseOutCubic),
        ("in-out-cubic", Self::EaseInOutCubic),
        ("in-sine", Self::EaseInSine),
        ("out-sine", Self::EaseOutSine),
        ("in-out-sine", Self::EaseInOutSine),
        ("in-expo", Self::EaseInExpo),
        ("out-expo", Self::EaseOutExpo),
        ("in-out-expo", Self::EaseInOutExpo),
        ("out-elastic", Self::EaseOutElastic),
        ("out-bounce", Self::EaseOutBounce),
    ];

    /// 函数名称
    pub fn name(&self) -> &'static str {
        Self::ALL
            .iter()
            .find(|(_, f)| f == self)
            .map(|(name, _)| *name)
            .unwrap_or("linear")
    }

    /// 计算缓动值
    ///
    /// # 参数
    /// - `t`: 时间进度 (0.0 - 1.0)
    ///
    /// # 返回
    /// - 缓动后的进度值（弹性曲线会短暂越过 1.0）
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);

        match self {
            EasingFunction::Linear => t,
            EasingFunction::Ease => cubic_bezier(0.25, 0.1, 0.25, 1.0, t),
            EasingFunction::EaseIn => cubic_bezier(0.42, 0.0, 1.0, 1.0, t),
            EasingFunction::EaseOut => cubic_bezier(0.0, 0.0, 0.58, 1.0, t),
            EasingFunction::EaseInOut => cubic_bezier(0.42, 0.0, 0.58, 1.0, t),
            EasingFunction::EaseInQuad => power_in(t, 2),
            EasingFunction::EaseOutQuad => power_out(t, 2),
            EasingFunction::EaseInOutQuad => power_in_out(t, 2),
            EasingFunction::EaseInCubic => power_in(t, 3),
            EasingFunction::EaseOutCubic => power_out(t, 3),
            EasingFunction::EaseInOutCubic => power_in_out(t, 3),
            EasingFunction::EaseInSine => 1.0 - (t * FRAC_PI_2).cos(),
            EasingFunction::EaseOutSine => (t * FRAC_PI_2).sin(),
            EasingFunction::EaseInOutSine => (1.0 - (t * PI).cos()) * 0.5,
            EasingFunction::EaseInExpo => {
                if t == 0.0 {
                    0.0
                } else {
                    2.0_f32.powf(10.0 * t - 10.0)
                }
            }
            EasingFunction::EaseOutExpo => {
                if t == 1.0 {
                    1.0
                } else {
                    1.0 - 2.0_f32.powf(-10.0 * t)
                }
            }
            EasingFunction::EaseInOutExpo => ease_in_out_expo(t),
            EasingFunction::EaseOutElastic => ease_out_elastic(t),
            EasingFunction::EaseOutBounce => ease_out_bounce(t),
        }
    }
}

impl FromStr for EasingFunction {
    type Err = AnimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, f)| *f)
            .ok_or(AnimError::UnknownEasing {
                name: s.to_string(),
            })
    }
}

/// CSS cubic-bezier 曲线求值（x 方向用牛顿迭代 + 二分回退）
fn cubic_bezier(x1: f32, y1: f32, x2: f32, y2: f32, t: f32) -> f32 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }

    let bezier = |p1: f32, p2: f32, s: f32| {
        let inv = 1.0 - s;
        3.0 * inv * inv * s * p1 + 3.0 * inv * s * s * p2 + s * s * s
    };
    let derivative = |p1: f32, p2: f32, s: f32| {
        let inv = 1.0 - s;
        3.0 * inv * inv * p1 + 6.0 * inv * s * (p2 - p1) + 3.0 * s * s * (1.0 - p2)
    };

    let mut s = t;
    for _ in 0..8 {
        let x = bezier(x1, x2, s) - t;
        if x.abs() < 1e-6 {
            return bezier(y1, y2, s);
        }
        let d = derivative(x1, x2, s);
        if d.abs() < 1e-6 {
            break;
        }
        s -= x / d;
    }

    let (mut lo, mut hi) = (0.0_f32, 1.0_f32);
    s = t;
    for _ in 0..32 {
        let x = bezier(x1, x2, s);
        if (x - t).abs() < 1e-6 {
            break;
        }
        if x < t {
            lo = s;
        } else {
            hi = s;
        }
        s = (lo + hi) / 2.0;
    }
    bezier(y1, y2, s)
}

fn ease_in_out_expo(t: f32) -> f32 {
    if t == 0.0 {
        0.0
    } else if t == 1.0 {
        1.0
    } else if t < 0.5 {
        2.0_f32.powf(20.0 * t - 10.0) / 2.0
    } else {
        (2.0 - 2.0_f32.powf(-20.0 * t + 10.0)) / 2.0
    }
}

/// `t^n`
fn power_in(t: f32, n: i32) -> f32 {
    t.powi(n)
}

/// `power_in` 的镜像
fn power_out(t: f32, n: i32) -> f32 {
    1.0 - power_in(1.0 - t, n)
}

/// 前半段 `power_in`、后半段 `power_out`，各压缩到一半
fn power_in_out(t: f32, n: i32) -> f32 {
    if t < 0.5 {
        power_in(t * 2.0, n) * 0.5
    } else {
        0.5 + power_out(t * 2.0 - 1.0, n) * 0.5
    }
}

/// 弹性缓出：衰减正弦，周期 0.3
fn ease_out_elastic(t: f32) -> f32 {
    const PERIOD: f32 = 0.3;
    if t <= 0.0 || t >= 1.0 {
        return t;
    }
    let phase = (t - PERIOD / 4.0) * (2.0 * PI) / PERIOD;
    1.0 + 2.0_f32.powf(-10.0 * t) * phase.sin()
}

/// 弹跳缓出
///
/// 四段抛物线，每段 `(右边界, 顶点, 顶点高度)`，右边界以 1/2.75 为单位。
fn ease_out_bounce(t: f32) -> f32 {
    const STRENGTH: f32 = 7.5625;
    const SEGMENTS: [(f32, f32, f32); 4] = [
        (1.0, 0.0, 0.0),
        (2.0, 1.5, 0.75),
        (2.5, 2.25, 0.9375),
        (f32::INFINITY, 2.625, 0.984375),
    ];

    let x = t * 2.75;
    let (_, vertex, height) = SEGMENTS
        .iter()
        .copied()
        .find(|(edge, _, _)| x < *edge)
        .unwrap_or(SEGMENTS[3]);
    let d = (x - vertex) / 2.75;
    STRENGTH * d * d + height
}

/// 缓动曲线：命名函数或自定义函数
#[derive(Clone)]
pub enum Easing {
    Named(EasingFunction),
    Custom(Rc<dyn Fn(f32) -> f32>),
}

impl Easing {
    /// 包装自定义函数
    pub fn custom(f: impl Fn(f32) -> f32 + 'static) -> Self {
        Easing::Custom(Rc::new(f))
    }

    pub fn apply(&self, t: f32) -> f32 {
        match self {
            Easing::Named(f) => f.apply(t),
            Easing::Custom(f) => f(t.clamp(0.0, 1.0)),
        }
    }
}

impl Default for Easing {
    fn default() -> Self {
        Easing::Named(EasingFunction::default())
    }
}

impl fmt::Debug for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Easing::Named(func) => write!(f, "Easing::Named({})", func.name()),
            Easing::Custom(_) => f.write_str("Easing::Custom(..)"),
        }
    }
}

impl From<EasingFunction> for Easing {
    fn from(value: EasingFunction) -> Self {
        Easing::Named(value)
    }
}

/// 缓动配置
#[derive(Debug, Clone)]
pub enum EasingConfig {
    /// 物理弹簧，稳定（idle）时结束
    Spring(SpringConfig),
    /// 固定时长曲线，`elapsed > duration_ms` 时结束
    Standard { easing: Easing, duration_ms: f32 },
}

impl EasingConfig {
    /// 默认弹簧配置
    pub fn spring() -> Self {
        EasingConfig::Spring(SpringConfig::default())
    }

    /// 命名曲线配置
    ///
    /// # 返回
    /// - `Err(UnknownEasing)`: 名称不在缓动表中
    /// - `Err(InvalidDuration)`: 时长不是正数
    pub fn named(name: &str, duration_ms: f32) -> AnimResult<Self> {
        let func: EasingFunction = name.parse()?;
        Self::standard(func, duration_ms)
    }

    /// 标准曲线配置
    pub fn standard(easing: impl Into<Easing>, duration_ms: f32) -> AnimResult<Self> {
        if duration_ms.is_nan() || duration_ms <= 0.0 {
            return Err(AnimError::InvalidDuration { duration_ms });
        }
        Ok(EasingConfig::Standard {
            easing: easing.into(),
            duration_ms,
        })
    }

    pub fn is_spring(&self) -> bool {
        matches!(self, EasingConfig::Spring(_))
    }
}

impl Default for EasingConfig {
    fn default() -> Self {
        Self::spring()
    }
}
