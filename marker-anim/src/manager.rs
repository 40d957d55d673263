//! # Manager 模块
//!
//! 一个父图层上所有动画图形的注册表。
//!
//! ## 两种工作模式
//!
//! - 原生图形图层：图形直接在父图层的集合中原地编辑
//! - 其他图层（要素图层等）：在父图层上方插入覆盖图层承载动画副本，
//!   同时在父图层上安装抑制过滤器隐藏原始要素
//!
//! ## 使用方式
//!
//! ```rust,ignore
//! let mut manager = AnimationManager::new(layer, view)?;
//! let graphic = manager.make_animatable_symbol(MakeAnimatable::new(pin));
//! manager.start(&id, AnimationProps::new(AnimationTarget::new().scale(1.5)));
//!
//! // 每帧
//! for event in manager.tick(now_ms) {
//!     // ...
//! }
//! ```

use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::animator::{AnimationProps, AnimatorOptions, SymbolAnimator, TickOutcome};
use crate::easing::EasingConfig;
use crate::error::{AnimError, AnimResult};
use crate::filter::{DEFAULT_OBJECT_ID_FIELD, ExclusionFilter, FilterPredicate};
use crate::traits::{
    DisplayContext, DrawableRef, EmbeddedImageSource, GraphicsCollection, ParentLayer,
    WatchHandle, unique_id,
};

/// 覆盖图层 ID 后缀
const OVERLAY_SUFFIX: &str = "-animation-overlay";

/// 移除方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemovalMode {
    /// 等待显示上下文当前的更新过程结束后再移除
    #[default]
    Deferred,
    /// 立即移除
    Immediate,
}

/// 管理器生命周期事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnimationEvent {
    /// 动画开始
    Started(String),
    /// 往返播放换向
    Reversed(String),
    /// 动画自然结束
    Finished(String),
    /// 已从注册表移除
    Removed(String),
    /// 从覆盖图层的脱离被推迟
    RemovalDeferred(String),
}

/// `make_animatable_symbol` 的参数
#[derive(Clone)]
pub struct MakeAnimatable {
    pub drawable: DrawableRef,
    /// 缓动配置，缺省使用管理器默认值
    pub easing_config: Option<EasingConfig>,
    /// 是否为覆盖副本（不参与排除集合）
    pub is_overlay: bool,
    /// 显式 ID，缺省由图形身份推导
    pub animation_id: Option<String>,
    /// 初始透明度，缺省继承父图层
    pub opacity: Option<f32>,
}

impl MakeAnimatable {
    pub fn new(drawable: DrawableRef) -> Self {
        Self {
            drawable,
            easing_config: None,
            is_overlay: false,
            animation_id: None,
            opacity: None,
        }
    }

    pub fn easing(mut self, config: EasingConfig) -> Self {
        self.easing_config = Some(config);
        self
    }

    pub fn overlay(mut self) -> Self {
        self.is_overlay = true;
        self
    }

    pub fn animation_id(mut self, id: impl Into<String>) -> Self {
        self.animation_id = Some(id.into());
        self
    }

    pub fn opacity(mut self, opacity: f32) -> Self {
        self.opacity = Some(opacity);
        self
    }
}

/// 查找参数：ID 优先，其次图形身份
#[derive(Clone, Default)]
pub struct GraphicLookup {
    pub drawable: Option<DrawableRef>,
    pub animation_id: Option<String>,
}

impl GraphicLookup {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            drawable: None,
            animation_id: Some(id.into()),
        }
    }

    pub fn by_drawable(drawable: DrawableRef) -> Self {
        Self {
            drawable: Some(drawable),
            animation_id: None,
        }
    }

    /// 解析注册 ID；两者都缺失时返回 `None`
    pub fn resolve(&self) -> Option<String> {
        self.animation_id
            .clone()
            .or_else(|| self.drawable.as_deref().map(unique_id))
    }
}

/// 动画管理器
pub struct AnimationManager {
    parent: Rc<dyn ParentLayer>,
    display: Rc<dyn DisplayContext>,
    /// 父图层是否可原地编辑
    native: bool,
    /// 承载动画图形的集合（原生模式下即父图层集合）
    overlay: Rc<dyn GraphicsCollection>,
    /// 插入到显示上下文中的覆盖图层 ID
    overlay_id: Option<String>,
    animators: BTreeMap<String, SymbolAnimator>,
    exclusion: Option<Rc<ExclusionFilter>>,
    watch_handle: Option<WatchHandle>,
    pending_removals: Vec<DrawableRef>,
    default_easing: EasingConfig,
    /// 完成后移除与批量移除使用的方式
    removal_mode: RemovalMode,
    images: Option<Rc<dyn EmbeddedImageSource>>,
    events: Vec<AnimationEvent>,
}

impl AnimationManager {
    /// 为父图层创建管理器
    ///
    /// # 返回
    /// - `Err(MissingGraphics)`: 原生图层没有提供图形集合
    /// - `Err(LayerNotInView)`: 非原生图层不在显示上下文中
    pub fn new(parent: Rc<dyn ParentLayer>, display: Rc<dyn DisplayContext>) -> AnimResult<Self> {
        let layer_id = parent.id();
        let native = parent.kind().is_native();

        let (overlay, overlay_id, exclusion, watch_handle) = if native {
            let graphics = parent.graphics().ok_or_else(|| AnimError::MissingGraphics {
                layer: layer_id.clone(),
            })?;
            (graphics, None, None, None)
        } else {
            let index =
                display
                    .layer_index(&layer_id)
                    .ok_or_else(|| AnimError::LayerNotInView {
                        layer: layer_id.clone(),
                    })?;
            let overlay_id = format!("{layer_id}{OVERLAY_SUFFIX}");
            let overlay = display.insert_overlay(&overlay_id, index + 1);

            let field = parent
                .object_id_field()
                .unwrap_or_else(|| DEFAULT_OBJECT_ID_FIELD.to_string());
            let exclusion = Rc::new(ExclusionFilter::new(parent.clone(), field));
            let handle = overlay.watch(exclusion.clone());
            (overlay, Some(overlay_id), Some(exclusion), Some(handle))
        };

        info!(layer = %layer_id, native, overlay = ?overlay_id, "创建动画管理器");

        Ok(Self {
            parent,
            display,
            native,
            overlay,
            overlay_id,
            animators: BTreeMap::new(),
            exclusion,
            watch_handle,
            pending_removals: Vec::new(),
            default_easing: EasingConfig::default(),
            removal_mode: RemovalMode::default(),
            images: None,
            events: Vec::new(),
        })
    }

    /// 设置默认缓动配置
    pub fn with_default_easing(mut self, config: EasingConfig) -> Self {
        self.default_easing = config;
        self
    }

    /// 设置默认移除方式（完成后移除使用）
    pub fn with_removal_mode(mut self, mode: RemovalMode) -> Self {
        self.removal_mode = mode;
        self
    }

    pub fn removal_mode(&self) -> RemovalMode {
        self.removal_mode
    }

    /// 设置图片内嵌缓存
    pub fn with_images(mut self, images: Rc<dyn EmbeddedImageSource>) -> Self {
        self.images = Some(images);
        self
    }

    /// 覆盖图层 ID（原生模式为 `None`）
    pub fn overlay_id(&self) -> Option<&str> {
        self.overlay_id.as_deref()
    }

    /// 承载动画图形的集合
    pub fn overlay(&self) -> &Rc<dyn GraphicsCollection> {
        &self.overlay
    }

    /// 当前抑制谓词（原生模式为 `None`）
    pub fn filter_predicate(&self) -> Option<FilterPredicate> {
        self.exclusion.as_ref().map(|e| e.predicate())
    }

    /// 让图形可动画
    ///
    /// 同一 ID 重复调用时原样返回已有的图形。
    pub fn make_animatable_symbol(&mut self, request: MakeAnimatable) -> DrawableRef {
        let MakeAnimatable {
            drawable,
            easing_config,
            is_overlay,
            animation_id,
            opacity,
        } = request;

        let id = animation_id.unwrap_or_else(|| unique_id(drawable.as_ref()));
        if let Some(existing) = self.animators.get(&id) {
            debug!(id = %id, "图形已可动画，直接返回");
            return existing.drawable().clone();
        }

        let opacity = match opacity.filter(|o| !o.is_nan()) {
            Some(opacity) => opacity,
            None if self.native => 1.0,
            None => self.parent.opacity(),
        }
        .clamp(0.0, 1.0);

        let mut animator = SymbolAnimator::new(
            drawable.clone(),
            easing_config.unwrap_or_else(|| self.default_easing.clone()),
            id.clone(),
            AnimatorOptions {
                is_overlay,
                opacity,
                images: self.images.clone(),
            },
        );
        animator.set_managed();

        let uid = drawable.uid();
        if let Some(exclusion) = &self.exclusion {
            exclusion.track(&uid, is_overlay, animator.animating_flag());
        }
        // 重新登记时撤销尚未执行的移除
        self.pending_removals.retain(|pending| pending.uid() != uid);

        self.animators.insert(id.clone(), animator);

        if (!self.native || is_overlay) && self.overlay.find(drawable.as_ref()).is_none() {
            self.overlay.add(drawable.clone());
        }

        debug!(id = %id, opacity, overlay = is_overlay, "注册动画图形");
        drawable
    }

    /// 是否已注册
    pub fn has_animated_graphic(&self, lookup: &GraphicLookup) -> bool {
        lookup
            .resolve()
            .is_some_and(|id| self.animators.contains_key(&id))
    }

    /// 查找已注册的图形
    pub fn get_animated_graphic(&self, lookup: &GraphicLookup) -> Option<DrawableRef> {
        let id = lookup.resolve()?;
        self.animators.get(&id).map(|a| a.drawable().clone())
    }

    /// 所有已注册的图形（按 ID 排序）
    pub fn get_all_animated_graphics(&self) -> Vec<DrawableRef> {
        self.animators
            .values()
            .map(|a| a.drawable().clone())
            .collect()
    }

    /// 是否有动画正在运行
    pub fn is_animating(&self) -> bool {
        self.animators.values().any(|a| a.is_animating())
    }

    /// 已注册的动画器
    pub fn animator(&self, id: &str) -> Option<&SymbolAnimator> {
        self.animators.get(id)
    }

    pub fn animator_mut(&mut self, id: &str) -> Option<&mut SymbolAnimator> {
        self.animators.get_mut(id)
    }

    /// 开始动画；ID 不存在时返回 `false`
    pub fn start(&mut self, id: &str, props: AnimationProps) -> bool {
        let Some(animator) = self.animators.get_mut(id) else {
            return false;
        };
        animator.start(props);
        self.events.push(AnimationEvent::Started(id.to_string()));
        true
    }

    /// 停止动画；ID 不存在时返回 `false`
    pub fn stop(&mut self, id: &str) -> bool {
        let Some(animator) = self.animators.get_mut(id) else {
            return false;
        };
        animator.stop();
        true
    }

    /// 移除动画图形
    ///
    /// 恢复原始符号并从注册表删除；覆盖模式下再让图形脱离覆盖图层。
    /// 未找到时返回 `false`。
    pub fn remove_animated_graphic(&mut self, lookup: &GraphicLookup, mode: RemovalMode) -> bool {
        let Some(id) = lookup.resolve() else {
            return false;
        };
        let Some(mut animator) = self.animators.remove(&id) else {
            return false;
        };

        animator.reset_symbol();
        let drawable = animator.drawable().clone();

        if !self.native || animator.is_overlay() {
            match mode {
                RemovalMode::Immediate => self.detach(&drawable),
                RemovalMode::Deferred => {
                    debug!(id = %id, "推迟从覆盖图层移除");
                    self.pending_removals.push(drawable);
                    self.events
                        .push(AnimationEvent::RemovalDeferred(id.clone()));
                }
            }
        } else if let Some(exclusion) = &self.exclusion {
            exclusion.untrack(&drawable.uid());
        }

        debug!(id = %id, "移除动画图形");
        self.events.push(AnimationEvent::Removed(id));
        true
    }

    /// 移除所有动画图形
    pub fn remove_all_animated_graphics(&mut self, mode: RemovalMode) {
        let ids: Vec<String> = self.animators.keys().cloned().collect();
        for id in ids {
            self.remove_animated_graphic(&GraphicLookup::by_id(id), mode);
        }
    }

    /// 执行被推迟的移除
    ///
    /// 显示上下文仍在更新时什么也不做。返回实际处理的数量。
    pub fn flush_removals(&mut self) -> usize {
        if self.pending_removals.is_empty() || self.display.is_updating() {
            return 0;
        }
        let pending = std::mem::take(&mut self.pending_removals);
        let count = pending.len();
        for drawable in &pending {
            self.detach(drawable);
        }
        count
    }

    /// 推进所有动画器，返回自上次调用以来的事件
    pub fn tick(&mut self, now_ms: f64) -> Vec<AnimationEvent> {
        let mut finished = Vec::new();
        for (id, animator) in self.animators.iter_mut() {
            match animator.tick(now_ms) {
                TickOutcome::Reversed => self.events.push(AnimationEvent::Reversed(id.clone())),
                TickOutcome::Finished { remove_requested } => {
                    finished.push((id.clone(), animator.drawable().clone(), remove_requested));
                }
                TickOutcome::Idle | TickOutcome::Running => {}
            }
        }

        for (id, drawable, remove_requested) in finished {
            self.events.push(AnimationEvent::Finished(id.clone()));

            // 动画期间被否决的移除，在结束后重试；成功后注销
            if let Some(exclusion) = &self.exclusion
                && let Some(vetoed) = exclusion.take_vetoed(&drawable.uid())
            {
                debug!(id = %id, "重试被否决的移除");
                if self.overlay.remove(&vetoed) {
                    self.animators.remove(&id);
                    self.events.push(AnimationEvent::Removed(id));
                    continue;
                }
            }

            if remove_requested {
                self.remove_animated_graphic(&GraphicLookup::by_id(id), self.removal_mode);
            }
        }

        self.flush_removals();
        std::mem::take(&mut self.events)
    }

    /// 销毁管理器：移除所有图形、解除监听、移除覆盖图层
    pub fn destroy(mut self) {
        self.remove_all_animated_graphics(RemovalMode::Immediate);
        for drawable in std::mem::take(&mut self.pending_removals) {
            self.detach(&drawable);
        }

        if let Some(handle) = self.watch_handle.take() {
            self.overlay.unwatch(handle);
        }
        if let Some(exclusion) = self.exclusion.take() {
            exclusion.clear();
        }
        if let Some(overlay_id) = self.overlay_id.take() {
            self.display.remove_overlay(&overlay_id);
        }
        info!(layer = %self.parent.id(), "销毁动画管理器");
    }

    /// 让图形脱离覆盖图层
    fn detach(&self, drawable: &DrawableRef) {
        if self.overlay.find(drawable.as_ref()).is_some() {
            self.overlay.remove(drawable);
        } else if let Some(exclusion) = &self.exclusion {
            exclusion.untrack(&drawable.uid());
        }
    }
}
