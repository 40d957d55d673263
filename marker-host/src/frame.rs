//! # Frame 模块
//!
//! 帧驱动：把时钟、图片缓存填充与管理器的 `tick` 串成一帧。
//!
//! 真实宿主使用 [`SystemClock`]，测试使用可手动推进的 [`FakeClock`]。

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

use marker_anim::{AnimationEvent, AnimationManager};
use tracing::trace;

use crate::resources::{EmbeddedImageCache, ResourceSource};

/// 默认帧间隔（约 60 FPS）
pub const DEFAULT_FRAME_MS: f64 = 1000.0 / 60.0;

/// 毫秒时钟
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// 单调系统时钟
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// 手动推进的时钟
#[derive(Debug, Clone, Default)]
pub struct FakeClock {
    now: Rc<Cell<f64>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn set(&self, ms: f64) {
        self.now.set(ms);
    }
}

impl Clock for FakeClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

/// 帧驱动
pub struct FrameDriver<C: Clock> {
    clock: C,
    images: Option<(Rc<EmbeddedImageCache>, Box<dyn ResourceSource>)>,
    frames: u64,
}

impl<C: Clock> FrameDriver<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            images: None,
            frames: 0,
        }
    }

    /// 每帧开始前从 `source` 填充图片缓存
    pub fn with_images(mut self, cache: Rc<EmbeddedImageCache>, source: Box<dyn ResourceSource>) -> Self {
        self.images = Some((cache, source));
        self
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// 已执行的帧数
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// 执行一帧
    pub fn frame(&mut self, manager: &mut AnimationManager) -> Vec<AnimationEvent> {
        if let Some((cache, source)) = &self.images {
            let loaded = cache.pump(source.as_ref());
            if loaded > 0 {
                trace!(loaded, "填充图片缓存");
            }
        }
        self.frames += 1;
        manager.tick(self.clock.now_ms())
    }
}

impl FrameDriver<FakeClock> {
    /// 以固定间隔推进，直到没有动画在运行或达到帧数上限
    pub fn run_until_idle(
        &mut self,
        manager: &mut AnimationManager,
        frame_ms: f64,
        max_frames: usize,
    ) -> Vec<AnimationEvent> {
        let mut events = self.frame(manager);
        for _ in 0..max_frames {
            if !manager.is_animating() {
                break;
            }
            self.clock.advance(frame_ms);
            events.extend(self.frame(manager));
        }
        events
    }
}
