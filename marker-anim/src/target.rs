//! # Target 模块
//!
//! 动画目标：一次运行要达到的缩放、朝向与透明度。
//!
//! 未设置（或为 NaN）的字段在该次运行中完全不动画。

use serde::{Deserialize, Serialize};

/// 动画目标
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AnimationTarget {
    /// 相对原始符号的缩放倍数
    #[serde(default)]
    pub scale: Option<f32>,
    /// 绝对朝向（度）
    #[serde(default)]
    pub rotate: Option<f32>,
    /// 目标透明度 (0.0 - 1.0)
    #[serde(default)]
    pub opacity: Option<f32>,
}

impl AnimationTarget {
    /// 空目标（所有字段都不动画）
    pub fn new() -> Self {
        Self::default()
    }

    /// 中性状态：原始尺寸、朝向 0、完全不透明
    pub fn neutral() -> Self {
        Self {
            scale: Some(1.0),
            rotate: Some(0.0),
            opacity: Some(1.0),
        }
    }

    pub fn scale(mut self, scale: f32) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn rotate(mut self, degrees: f32) -> Self {
        self.rotate = Some(degrees);
        self
    }

    pub fn opacity(mut self, opacity: f32) -> Self {
        self.opacity = Some(opacity);
        self
    }

    /// 有效的缩放值（过滤 NaN）
    pub fn scale_value(&self) -> Option<f32> {
        valid(self.scale)
    }

    /// 有效的朝向（过滤 NaN）
    pub fn rotate_value(&self) -> Option<f32> {
        valid(self.rotate)
    }

    /// 有效的透明度（过滤 NaN）
    pub fn opacity_value(&self) -> Option<f32> {
        valid(self.opacity)
    }

    /// 是否没有任何有效字段
    pub fn is_empty(&self) -> bool {
        self.scale_value().is_none() && self.rotate_value().is_none() && self.opacity_value().is_none()
    }
}

fn valid(value: Option<f32>) -> Option<f32> {
    value.filter(|v| !v.is_nan())
}
