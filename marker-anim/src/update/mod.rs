//! # Update 模块
//!
//! 按符号类型划分的纯更新函数。
//!
//! 签名统一为 `(progress, current, target, original) -> next`：
//! - `progress`：进度，通常在 0.0 - 1.0，弹簧可能短暂越界
//! - `current`：本次运行的起点符号
//! - `target`：动画目标，未设置的字段保持不变
//! - `original`：构造时捕获的原始符号，缩放以它为基准
//!
//! 类型分派只在 [`update_symbol`] 中做一次全量匹配。

mod composite;
mod picture;
mod simple;

pub use composite::{normalize_heading, shortest_rotation, update_composite};
pub use picture::{parse_wrapped_opacity, update_picture, wrap_with_opacity};
pub use simple::update_simple;

use crate::symbol::Symbol;
use crate::target::AnimationTarget;
use crate::traits::EmbeddedImageSource;

/// 线性插值，`t == 1.0` 时精确返回 `to`
pub fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from * (1.0 - t) + to * t
}

/// 按符号类型计算下一帧符号
///
/// - 三种可动画类型各有专门的更新函数
/// - 其他类型原样返回原始符号
/// - `current` 与 `original` 类型不一致时返回 `current` 的副本
pub fn update_symbol(
    progress: f32,
    current: &Symbol,
    target: &AnimationTarget,
    original: &Symbol,
    images: Option<&dyn EmbeddedImageSource>,
) -> Symbol {
    match (current, original) {
        (Symbol::Simple(c), Symbol::Simple(o)) => {
            Symbol::Simple(update_simple(progress, c, target, o))
        }
        (Symbol::Picture(c), Symbol::Picture(o)) => {
            Symbol::Picture(update_picture(progress, c, target, o, images))
        }
        (Symbol::Composite(c), Symbol::Composite(o)) => {
            Symbol::Composite(update_composite(progress, c, target, o))
        }
        (_, Symbol::Other(_)) => original.clone(),
        _ => current.clone(),
    }
}
