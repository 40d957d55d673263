//! # Marker Anim
//!
//! 地图点要素符号的动画核心库。
//!
//! ## 架构概述
//!
//! `marker-anim` 是纯逻辑核心，不依赖任何 IO、渲染或计时器。
//! 宿主通过 [`traits`] 中的协作接口提供图形、图层与显示上下文，
//! 并在每个渲染帧调用一次 `tick`：
//!
//! ```text
//! Host                              Core
//!   │                                 │
//!   │── make_animatable_symbol ─────►│ 注册动画器 / 插入覆盖图层
//!   │── start(id, props) ───────────►│
//!   │                                 │
//!   │── tick(now_ms) ───────────────►│ 计算进度 → 更新函数 → set_symbol
//!   │◄── Vec<AnimationEvent> ────────│
//! ```
//!
//! ## 核心类型
//!
//! - [`SymbolAnimator`]：单个图形的动画状态机
//! - [`AnimationManager`]：一个父图层上的动画注册表与覆盖图层
//! - [`EasingConfig`]：弹簧或固定时长曲线
//! - [`AnimationTarget`]：缩放、朝向、透明度目标
//! - [`Symbol`]：简单标记、图片标记、矢量复合符号
//!
//! ## 使用示例
//!
//! ```ignore
//! use marker_anim::{AnimationManager, AnimationProps, AnimationTarget, MakeAnimatable};
//!
//! let mut manager = AnimationManager::new(layer, view)?;
//! manager.make_animatable_symbol(MakeAnimatable::new(graphic).animation_id("hover"));
//! manager.start("hover", AnimationProps::new(AnimationTarget::new().scale(1.5)));
//!
//! loop {
//!     let events = manager.tick(clock.now_ms());
//!     // ...
//! }
//! ```
//!
//! ## 模块结构
//!
//! - [`symbol`]：符号数据模型
//! - [`target`]：动画目标
//! - [`easing`] / [`spring`]：进度推进规则
//! - [`update`]：按符号类型的纯更新函数
//! - [`animator`]：单图形动画生命周期
//! - [`filter`]：父图层抑制过滤器
//! - [`manager`]：动画管理器
//! - [`traits`]：宿主协作接口
//! - [`error`]：错误类型定义

pub mod animator;
pub mod easing;
pub mod error;
pub mod filter;
pub mod manager;
pub mod spring;
pub mod symbol;
pub mod target;
pub mod traits;
pub mod update;

#[cfg(test)]
mod test_support;

// 重导出核心类型
pub use animator::{AnimatingFlag, AnimationProps, AnimatorOptions, SymbolAnimator, TickOutcome};
pub use easing::{Easing, EasingConfig, EasingFunction};
pub use error::{AnimError, AnimResult};
pub use filter::{ExclusionFilter, FilterPredicate, SuppressionFilter};
pub use manager::{AnimationEvent, AnimationManager, GraphicLookup, MakeAnimatable, RemovalMode};
pub use spring::{Spring, SpringConfig};
pub use symbol::{
    Color, CompositeLayer, CompositeLayerKind, CompositeSymbol, OpaqueSymbol, Outline,
    PictureMarker, SimpleMarker, Symbol, SymbolKind,
};
pub use target::AnimationTarget;
pub use traits::{
    CollectionWatcher, DisplayContext, Drawable, DrawableRef, EmbeddedImageSource,
    GraphicsCollection, HookDecision, LayerKind, ParentLayer, WatchHandle, unique_id,
};
