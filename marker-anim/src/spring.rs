//! # Spring 模块
//!
//! 阻尼弹簧积分器，产生 0 → 1 的进度值。
//!
//! 每帧由外部传入时间增量推进；位移与速度都低于静止阈值时进入 idle，
//! 并精确吸附到终点 1.0。
//!
//! 阻尼为 0 的弹簧理论上永远不会 idle，因此每次运行都带一个最长运行时间
//! （`max_duration_ms`），超时后直接吸附到终点。

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AnimError, AnimResult};

/// 单帧最大时间步长（毫秒），避免卡顿后一次性积分过长
pub const MAX_FRAME_MS: f32 = 64.0;

/// 积分子步长（毫秒）
const SOLVER_STEP_MS: f32 = 1.0;

/// 默认最长运行时间（毫秒）
pub const DEFAULT_MAX_DURATION_MS: f32 = 10_000.0;

/// 弹簧参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpringConfig {
    /// 刚度（张力）
    #[serde(default = "default_stiffness")]
    pub stiffness: f32,
    /// 阻尼（摩擦）
    #[serde(default = "default_damping")]
    pub damping: f32,
    /// 质量
    #[serde(default = "default_mass")]
    pub mass: f32,
    /// 静止阈值（位移与速度）
    #[serde(default = "default_rest_threshold")]
    pub rest_threshold: f32,
    /// 最长运行时间（毫秒），`None` 表示不限制
    #[serde(default = "default_max_duration_ms")]
    pub max_duration_ms: Option<f32>,
}

fn default_stiffness() -> f32 {
    170.0
}

fn default_damping() -> f32 {
    26.0
}

fn default_mass() -> f32 {
    1.0
}

fn default_rest_threshold() -> f32 {
    0.001
}

fn default_max_duration_ms() -> Option<f32> {
    Some(DEFAULT_MAX_DURATION_MS)
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            stiffness: default_stiffness(),
            damping: default_damping(),
            mass: default_mass(),
            rest_threshold: default_rest_threshold(),
            max_duration_ms: default_max_duration_ms(),
        }
    }
}

impl SpringConfig {
    pub fn new(stiffness: f32, damping: f32) -> Self {
        Self {
            stiffness,
            damping,
            ..Default::default()
        }
    }

    /// 预设：`default`、`gentle`、`wobbly`、`stiff`、`slow`、`molasses`
    pub fn preset(name: &str) -> Option<Self> {
        let (stiffness, damping) = match name {
            "default" => (170.0, 26.0),
            "gentle" => (120.0, 14.0),
            "wobbly" => (180.0, 12.0),
            "stiff" => (210.0, 20.0),
            "slow" => (280.0, 60.0),
            "molasses" => (280.0, 120.0),
            _ => return None,
        };
        Some(Self::new(stiffness, damping))
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    pub fn with_rest_threshold(mut self, threshold: f32) -> Self {
        self.rest_threshold = threshold;
        self
    }

    pub fn with_max_duration(mut self, max_duration_ms: Option<f32>) -> Self {
        self.max_duration_ms = max_duration_ms;
        self
    }

    /// 校验参数
    ///
    /// 阻尼为 0 是允许的（由最长运行时间兜底），负阻尼会发散，不允许。
    pub fn validate(&self) -> AnimResult<()> {
        let check = |param: &str, ok: bool, message: &str| {
            if ok {
                Ok(())
            } else {
                Err(AnimError::InvalidSpring {
                    param: param.to_string(),
                    message: message.to_string(),
                })
            }
        };
        check("stiffness", self.stiffness > 0.0, "必须大于 0")?;
        check("damping", self.damping >= 0.0, "不能为负数")?;
        check("mass", self.mass > 0.0, "必须大于 0")?;
        check("rest_threshold", self.rest_threshold > 0.0, "必须大于 0")?;
        if let Some(max) = self.max_duration_ms {
            check("max_duration_ms", max > 0.0, "必须大于 0")?;
        }
        Ok(())
    }
}

/// 弹簧积分器
#[derive(Debug, Clone)]
pub struct Spring {
    config: SpringConfig,
    position: f32,
    velocity: f32,
    end: f32,
    elapsed_ms: f32,
    idle: bool,
}

impl Spring {
    /// 创建从 0 到 1 的弹簧
    pub fn new(config: SpringConfig) -> Self {
        Self {
            config,
            position: 0.0,
            velocity: 0.0,
            end: 1.0,
            elapsed_ms: 0.0,
            idle: false,
        }
    }

    /// 当前值
    pub fn value(&self) -> f32 {
        self.position
    }

    /// 当前速度（每秒）
    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    /// 是否已静止
    pub fn is_idle(&self) -> bool {
        self.idle
    }

    /// 已运行的时间（毫秒）
    pub fn elapsed_ms(&self) -> f32 {
        self.elapsed_ms
    }

    /// 推进 `dt_ms` 毫秒
    ///
    /// # 返回
    /// - `true`: 仍在运动
    /// - `false`: 已静止
    pub fn advance(&mut self, dt_ms: f32) -> bool {
        if self.idle {
            return false;
        }
        let dt_ms = if dt_ms.is_finite() { dt_ms.max(0.0) } else { 0.0 };
        self.elapsed_ms += dt_ms;

        let frame_ms = dt_ms.min(MAX_FRAME_MS);
        if frame_ms > 0.0 {
            let steps = (frame_ms / SOLVER_STEP_MS).ceil().max(1.0) as u32;
            let h = frame_ms / steps as f32 / 1000.0;
            let mass = self.config.mass.max(f32::EPSILON);
            for _ in 0..steps {
                let force = -self.config.stiffness * (self.position - self.end)
                    - self.config.damping * self.velocity;
                self.velocity += force / mass * h;
                self.position += self.velocity * h;
            }
        }

        let threshold = self.config.rest_threshold;
        if (self.position - self.end).abs() < threshold && self.velocity.abs() < threshold {
            self.settle();
        } else if let Some(max) = self.config.max_duration_ms
            && self.elapsed_ms >= max
        {
            debug!(
                elapsed_ms = self.elapsed_ms,
                max_duration_ms = max,
                "弹簧超过最长运行时间，强制静止"
            );
            self.settle();
        }

        !self.idle
    }

    fn settle(&mut self) {
        self.position = self.end;
        self.velocity = 0.0;
        self.idle = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_until_idle(spring: &mut Spring, frame_ms: f32, max_frames: usize) -> usize {
        for frame in 0..max_frames {
            if !spring.advance(frame_ms) {
                return frame + 1;
            }
        }
        max_frames
    }

    #[test]
    fn test_spring_settles_exactly() {
        let mut spring = Spring::new(SpringConfig::default());
        assert_eq!(spring.value(), 0.0);

        let frames = run_until_idle(&mut spring, 16.0, 500);
        assert!(frames < 500);
        assert!(spring.is_idle());
        assert_eq!(spring.value(), 1.0);
        assert_eq!(spring.velocity(), 0.0);
    }

    #[test]
    fn test_spring_moves_toward_end() {
        let mut spring = Spring::new(SpringConfig::default());
        spring.advance(16.0);
        let first = spring.value();
        assert!(first > 0.0 && first < 1.0);
        spring.advance(16.0);
        assert!(spring.value() > first);
    }

    #[test]
    fn test_wobbly_spring_overshoots() {
        let mut spring = Spring::new(SpringConfig::preset("wobbly").unwrap());
        let mut peak = 0.0_f32;
        for _ in 0..200 {
            spring.advance(16.0);
            peak = peak.max(spring.value());
        }
        assert!(peak > 1.0);
    }

    #[test]
    fn test_zero_damping_hits_safety_net() {
        let config = SpringConfig::new(170.0, 0.0).with_max_duration(Some(500.0));
        let mut spring = Spring::new(config);

        let frames = run_until_idle(&mut spring, 16.0, 1000);
        assert!(spring.is_idle());
        assert_eq!(spring.value(), 1.0);
        // 500ms / 16ms ≈ 32 帧
        assert!(frames <= 33);
    }

    #[test]
    fn test_zero_dt_does_not_move() {
        let mut spring = Spring::new(SpringConfig::default());
        assert!(spring.advance(0.0));
        assert_eq!(spring.value(), 0.0);
    }

    #[test]
    fn test_validate() {
        assert!(SpringConfig::default().validate().is_ok());
        assert!(SpringConfig::new(170.0, 0.0).validate().is_ok());
        assert!(SpringConfig::new(170.0, -1.0).validate().is_err());
        assert!(SpringConfig::default().with_mass(0.0).validate().is_err());
        assert!(SpringConfig::preset("unknown").is_none());
    }
}
