//! # Animator 模块
//!
//! 单个图形的动画生命周期。
//!
//! `SymbolAnimator` 是一个由外部 `tick(now_ms)` 驱动的状态机：
//! 宿主在每个渲染帧（或测试中的假时钟）调用一次 `tick`，
//! 动画器计算进度、调用更新函数并把新符号写回图形。
//!
//! ## 生命周期
//!
//! ```text
//! new ──► start ──► tick ... tick ──► Finished
//!           ▲         │ stop / start
//!           └─────────┘
//! ```
//!
//! - 同一动画器同时最多只有一次运行，新的 `start` 会取消旧运行
//! - 被取消的运行不再触发任何回调
//! - 标准缓动结束时强制以进度 1.0 再更新一次，保证精确到达目标

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::easing::{Easing, EasingConfig};
use crate::spring::Spring;
use crate::symbol::Symbol;
use crate::target::AnimationTarget;
use crate::traits::{DrawableRef, EmbeddedImageSource};
use crate::update::update_symbol;

/// 自定义单步函数：`(progress, from, target, original) -> next`
pub type StepFn = Box<dyn FnMut(f32, &Symbol, &AnimationTarget, &Symbol) -> Symbol>;

/// 生命周期回调
pub type Callback = Box<dyn FnMut()>;

/// 共享的"正在动画"标记
///
/// 过滤器监听器通过它判断移除是否需要推迟。
#[derive(Debug, Clone, Default)]
pub struct AnimatingFlag(Rc<Cell<bool>>);

impl AnimatingFlag {
    pub fn get(&self) -> bool {
        self.0.get()
    }

    fn set(&self, value: bool) {
        self.0.set(value);
    }
}

/// 一次运行的参数
#[derive(Default)]
pub struct AnimationProps {
    /// 动画目标
    pub to: AnimationTarget,
    /// 开始时同步调用
    pub on_start: Option<Callback>,
    /// 替换默认更新函数
    pub on_step: Option<StepFn>,
    /// 自然结束时调用
    pub on_finish: Option<Callback>,
    /// 结束后往返播放
    pub yoyo: bool,
    /// 结束后移除图形
    pub remove_on_complete: bool,
}

impl AnimationProps {
    pub fn new(to: AnimationTarget) -> Self {
        Self {
            to,
            ..Default::default()
        }
    }

    pub fn on_start(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_start = Some(Box::new(f));
        self
    }

    pub fn on_step(
        mut self,
        f: impl FnMut(f32, &Symbol, &AnimationTarget, &Symbol) -> Symbol + 'static,
    ) -> Self {
        self.on_step = Some(Box::new(f));
        self
    }

    pub fn on_finish(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_finish = Some(Box::new(f));
        self
    }

    pub fn yoyo(mut self) -> Self {
        self.yoyo = true;
        self
    }

    pub fn remove_on_complete(mut self) -> Self {
        self.remove_on_complete = true;
        self
    }
}

impl fmt::Debug for AnimationProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationProps")
            .field("to", &self.to)
            .field("on_start", &self.on_start.is_some())
            .field("on_step", &self.on_step.is_some())
            .field("on_finish", &self.on_finish.is_some())
            .field("yoyo", &self.yoyo)
            .field("remove_on_complete", &self.remove_on_complete)
            .finish()
    }
}

/// 构造选项
#[derive(Clone)]
pub struct AnimatorOptions {
    /// 是否为覆盖副本
    pub is_overlay: bool,
    /// 初始透明度
    pub opacity: f32,
    /// 图片内嵌缓存（图片标记透明度需要）
    pub images: Option<Rc<dyn EmbeddedImageSource>>,
}

impl Default for AnimatorOptions {
    fn default() -> Self {
        Self {
            is_overlay: false,
            opacity: 1.0,
            images: None,
        }
    }
}

/// 单次 tick 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// 没有进行中的运行
    Idle,
    /// 仍在运行
    Running,
    /// 往返播放换向，新的运行已开始
    Reversed,
    /// 自然结束
    Finished {
        /// 是否要求移除图形
        remove_requested: bool,
    },
}

/// 往返方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum YoyoDirection {
    /// 朝调用方目标
    Out,
    /// 回到中性状态
    In,
}

impl YoyoDirection {
    fn flip(self) -> Self {
        match self {
            Self::Out => Self::In,
            Self::In => Self::Out,
        }
    }
}

/// 运行时钟
enum RunClock {
    Spring {
        spring: Spring,
        last_ms: Option<f64>,
    },
    Standard {
        easing: Easing,
        duration_ms: f32,
        origin_ms: Option<f64>,
    },
}

impl RunClock {
    fn new(config: &EasingConfig) -> Self {
        match config {
            EasingConfig::Spring(spring) => RunClock::Spring {
                spring: Spring::new(*spring),
                last_ms: None,
            },
            EasingConfig::Standard {
                easing,
                duration_ms,
            } => RunClock::Standard {
                easing: easing.clone(),
                duration_ms: *duration_ms,
                origin_ms: None,
            },
        }
    }

    /// 推进到 `now_ms`，返回 `(progress, done)`
    fn advance(&mut self, now_ms: f64) -> (f32, bool) {
        match self {
            RunClock::Spring { spring, last_ms } => {
                let dt = last_ms.map(|last| (now_ms - last) as f32).unwrap_or(0.0);
                *last_ms = Some(now_ms);
                spring.advance(dt);
                (spring.value(), spring.is_idle())
            }
            RunClock::Standard {
                easing,
                duration_ms,
                origin_ms,
            } => {
                let origin = *origin_ms.get_or_insert(now_ms);
                let elapsed = (now_ms - origin) as f32;
                if elapsed > *duration_ms {
                    (1.0, true)
                } else {
                    (easing.apply(elapsed / *duration_ms), false)
                }
            }
        }
    }
}

/// 进行中的运行
struct ActiveRun {
    props: AnimationProps,
    target: AnimationTarget,
    from_symbol: Symbol,
    clock: RunClock,
}

/// 单个图形的符号动画器
pub struct SymbolAnimator {
    id: String,
    is_overlay: bool,
    easing_config: EasingConfig,
    drawable: DrawableRef,
    opacity: f32,
    original_symbol: Symbol,
    /// 应用初始透明度之前的符号，更新函数以它为基准
    base_symbol: Symbol,
    animating: AnimatingFlag,
    run: Option<ActiveRun>,
    yoyo_direction: YoyoDirection,
    images: Option<Rc<dyn EmbeddedImageSource>>,
    managed: bool,
}

impl fmt::Debug for SymbolAnimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymbolAnimator")
            .field("id", &self.id)
            .field("is_overlay", &self.is_overlay)
            .field("easing_config", &self.easing_config)
            .field("opacity", &self.opacity)
            .field("is_animating", &self.animating.get())
            .finish()
    }
}

impl SymbolAnimator {
    /// 创建动画器
    ///
    /// 捕获图形当前符号作为原始符号；`opacity != 1` 时立即以进度 1.0
    /// 应用一次透明度更新（原始符号与图形同时生效），并记录到符号上。
    /// 之后的运行以应用透明度之前的符号为基准，初始透明度为 0 也能恢复。
    pub fn new(
        drawable: DrawableRef,
        easing_config: EasingConfig,
        id: impl Into<String>,
        options: AnimatorOptions,
    ) -> Self {
        let id = id.into();
        let base_symbol = drawable.symbol();
        let mut original_symbol = base_symbol.clone();

        if options.opacity != 1.0 {
            let target = AnimationTarget::new().opacity(options.opacity);
            original_symbol = update_symbol(
                1.0,
                &base_symbol,
                &target,
                &base_symbol,
                options.images.as_deref(),
            );
            original_symbol.record_opacity(options.opacity);
            drawable.set_symbol(original_symbol.clone());
        }

        debug!(id = %id, overlay = options.is_overlay, opacity = options.opacity, "创建符号动画器");

        Self {
            id,
            is_overlay: options.is_overlay,
            easing_config,
            drawable,
            opacity: options.opacity,
            original_symbol,
            base_symbol,
            animating: AnimatingFlag::default(),
            run: None,
            yoyo_direction: YoyoDirection::Out,
            images: options.images,
            managed: false,
        }
    }

    /// 标记为由管理器托管（完成后的移除交给管理器）
    pub(crate) fn set_managed(&mut self) {
        self.managed = true;
    }

    // ========== 只读字段 ==========

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_overlay(&self) -> bool {
        self.is_overlay
    }

    pub fn easing_config(&self) -> &EasingConfig {
        &self.easing_config
    }

    pub fn original_symbol(&self) -> &Symbol {
        &self.original_symbol
    }

    pub fn is_animating(&self) -> bool {
        self.animating.get()
    }

    pub fn drawable(&self) -> &DrawableRef {
        &self.drawable
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// 共享的动画标记
    pub fn animating_flag(&self) -> AnimatingFlag {
        self.animating.clone()
    }

    // ========== 动画控制 ==========

    /// 开始一次运行（先取消进行中的运行）
    pub fn start(&mut self, props: AnimationProps) {
        self.stop();
        self.yoyo_direction = YoyoDirection::Out;
        let target = props.to;
        self.begin_run(props, target);
    }

    fn begin_run(&mut self, mut props: AnimationProps, target: AnimationTarget) {
        let from_symbol = self.drawable.symbol();
        let clock = RunClock::new(&self.easing_config);

        self.animating.set(true);
        if let Some(on_start) = props.on_start.as_mut() {
            on_start();
        }

        debug!(id = %self.id, target = ?target, spring = self.easing_config.is_spring(), "开始动画");

        self.run = Some(ActiveRun {
            props,
            target,
            from_symbol,
            clock,
        });
    }

    /// 停止进行中的运行，不恢复符号
    pub fn stop(&mut self) {
        if self.run.take().is_some() {
            debug!(id = %self.id, "停止动画");
        }
        self.animating.set(false);
    }

    /// 停止并恢复原始符号
    pub fn reset_symbol(&mut self) {
        self.stop();
        self.drawable.set_symbol(self.original_symbol.clone());
    }

    /// 推进到 `now_ms`
    pub fn tick(&mut self, now_ms: f64) -> TickOutcome {
        let Some(run) = self.run.as_mut() else {
            return TickOutcome::Idle;
        };

        let (progress, done) = run.clock.advance(now_ms);

        let next = match run.props.on_step.as_mut() {
            Some(step) => step(progress, &run.from_symbol, &run.target, &self.base_symbol),
            None => update_symbol(
                progress,
                &run.from_symbol,
                &run.target,
                &self.base_symbol,
                self.images.as_deref(),
            ),
        };
        self.drawable.set_symbol(next);

        if done {
            self.complete()
        } else {
            TickOutcome::Running
        }
    }

    fn complete(&mut self) -> TickOutcome {
        let Some(mut run) = self.run.take() else {
            return TickOutcome::Idle;
        };

        if run.props.yoyo {
            self.yoyo_direction = self.yoyo_direction.flip();
            let target = match self.yoyo_direction {
                YoyoDirection::Out => run.props.to,
                YoyoDirection::In => AnimationTarget::neutral(),
            };
            debug!(id = %self.id, direction = ?self.yoyo_direction, "往返换向");
            self.begin_run(run.props, target);
            return TickOutcome::Reversed;
        }

        self.animating.set(false);
        if let Some(on_finish) = run.props.on_finish.as_mut() {
            on_finish();
        }
        debug!(id = %self.id, "动画完成");

        let remove_requested = run.props.remove_on_complete;
        if remove_requested && !self.managed {
            debug!(id = %self.id, "完成后销毁图形");
            self.drawable.destroy();
        }
        TickOutcome::Finished { remove_requested }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::EasingFunction;
    use crate::spring::SpringConfig;
    use crate::symbol::{Color, PictureMarker, SimpleMarker};
    use crate::test_support::{TestGraphic, TestImages};
    use crate::traits::Drawable;
    use std::cell::RefCell;

    fn simple_graphic() -> Rc<TestGraphic> {
        Rc::new(TestGraphic::new(
            "g1",
            None,
            SimpleMarker::new(10.0, Color::rgba(255, 0, 0, 1.0)).into(),
        ))
    }

    fn linear(duration_ms: f32) -> EasingConfig {
        EasingConfig::standard(EasingFunction::Linear, duration_ms).unwrap()
    }

    fn size_of(graphic: &TestGraphic) -> f32 {
        match graphic.symbol() {
            Symbol::Simple(s) => s.size,
            other => panic!("unexpected symbol: {:?}", other),
        }
    }

    fn angle_of(graphic: &TestGraphic) -> f32 {
        match graphic.symbol() {
            Symbol::Simple(s) => s.angle,
            other => panic!("unexpected symbol: {:?}", other),
        }
    }

    #[test]
    fn test_standard_run_reaches_exact_target() {
        let graphic = simple_graphic();
        let mut animator =
            SymbolAnimator::new(graphic.clone(), linear(300.0), "g1", AnimatorOptions::default());

        animator.start(AnimationProps::new(AnimationTarget::new().scale(1.1)));
        assert!(animator.is_animating());

        // 第一帧锁定时间原点
        assert_eq!(animator.tick(1000.0), TickOutcome::Running);
        assert_eq!(size_of(&graphic), 10.0);

        assert_eq!(animator.tick(1150.0), TickOutcome::Running);
        let mid = size_of(&graphic);
        assert!(mid > 10.0 && mid < 11.0);

        let mut t = 1150.0;
        let outcome = loop {
            t += 16.7;
            match animator.tick(t) {
                TickOutcome::Running => continue,
                other => break other,
            }
        };
        assert_eq!(
            outcome,
            TickOutcome::Finished {
                remove_requested: false
            }
        );
        assert_eq!(size_of(&graphic), 11.0);
        assert!(!animator.is_animating());
        assert_eq!(animator.tick(t + 16.0), TickOutcome::Idle);
    }

    #[test]
    fn test_spring_settles_to_target() {
        let graphic = simple_graphic();
        let mut animator = SymbolAnimator::new(
            graphic.clone(),
            EasingConfig::Spring(SpringConfig::default()),
            "g1",
            AnimatorOptions::default(),
        );

        animator.start(AnimationProps::new(AnimationTarget::new().rotate(135.0)));
        let mut finished = false;
        for frame in 0..600 {
            if let TickOutcome::Finished { .. } = animator.tick(frame as f64 * 16.0) {
                finished = true;
                break;
            }
        }

        assert!(finished);
        assert_eq!(angle_of(&graphic), 135.0);
        assert!(!animator.is_animating());
    }

    #[test]
    fn test_callbacks_fire_in_order() {
        let graphic = simple_graphic();
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut animator =
            SymbolAnimator::new(graphic, linear(100.0), "g1", AnimatorOptions::default());

        let (start_log, finish_log) = (log.clone(), log.clone());
        animator.start(
            AnimationProps::new(AnimationTarget::new().scale(2.0))
                .on_start(move || start_log.borrow_mut().push("start"))
                .on_finish(move || finish_log.borrow_mut().push("finish")),
        );
        // onStart 同步触发
        assert_eq!(log.borrow().as_slice(), ["start"]);

        animator.tick(0.0);
        animator.tick(50.0);
        animator.tick(101.0);
        assert_eq!(log.borrow().as_slice(), ["start", "finish"]);
    }

    #[test]
    fn test_restart_drops_stale_finish() {
        let graphic = simple_graphic();
        let finished = Rc::new(RefCell::new(Vec::new()));
        let mut animator = SymbolAnimator::new(
            graphic.clone(),
            linear(100.0),
            "g1",
            AnimatorOptions::default(),
        );

        let first = finished.clone();
        animator.start(
            AnimationProps::new(AnimationTarget::new().scale(3.0))
                .on_finish(move || first.borrow_mut().push(1)),
        );
        animator.tick(0.0);
        animator.tick(50.0);

        let second = finished.clone();
        animator.start(
            AnimationProps::new(AnimationTarget::new().scale(0.5))
                .on_finish(move || second.borrow_mut().push(2)),
        );
        for t in [60.0, 120.0, 170.0] {
            animator.tick(t);
        }

        assert_eq!(finished.borrow().as_slice(), [2]);
        assert_eq!(size_of(&graphic), 5.0);
    }

    #[test]
    fn test_chained_run_starts_from_current_symbol() {
        let graphic = simple_graphic();
        let mut animator = SymbolAnimator::new(
            graphic.clone(),
            linear(100.0),
            "g1",
            AnimatorOptions::default(),
        );

        animator.start(AnimationProps::new(AnimationTarget::new().scale(2.0)));
        animator.tick(0.0);
        animator.tick(50.0);
        assert_eq!(size_of(&graphic), 15.0);

        // 第二次运行从 15 出发，而不是原始的 10
        animator.start(AnimationProps::new(AnimationTarget::new().scale(1.0)));
        animator.tick(100.0);
        assert_eq!(size_of(&graphic), 15.0);
        animator.tick(150.0);
        assert_eq!(size_of(&graphic), 12.5);
    }

    #[test]
    fn test_stop_is_noop_without_run() {
        let graphic = simple_graphic();
        let mut animator =
            SymbolAnimator::new(graphic.clone(), linear(100.0), "g1", AnimatorOptions::default());
        animator.stop();
        assert!(!animator.is_animating());
        assert_eq!(animator.tick(0.0), TickOutcome::Idle);
    }

    #[test]
    fn test_stop_keeps_symbol_and_aborts_ticks() {
        let graphic = simple_graphic();
        let mut animator = SymbolAnimator::new(
            graphic.clone(),
            linear(100.0),
            "g1",
            AnimatorOptions::default(),
        );
        animator.start(AnimationProps::new(AnimationTarget::new().scale(2.0)));
        animator.tick(0.0);
        animator.tick(50.0);
        animator.stop();

        assert!(!animator.is_animating());
        assert_eq!(size_of(&graphic), 15.0);
        assert_eq!(animator.tick(80.0), TickOutcome::Idle);
        assert_eq!(size_of(&graphic), 15.0);
    }

    #[test]
    fn test_reset_restores_original() {
        let graphic = simple_graphic();
        let original = graphic.symbol();
        let mut animator = SymbolAnimator::new(
            graphic.clone(),
            linear(100.0),
            "g1",
            AnimatorOptions::default(),
        );

        animator.start(AnimationProps::new(
            AnimationTarget::new().scale(2.0).rotate(45.0).opacity(0.3),
        ));
        animator.tick(0.0);
        animator.tick(70.0);
        animator.start(AnimationProps::new(AnimationTarget::new().rotate(-30.0)));
        animator.tick(80.0);
        animator.tick(120.0);

        animator.reset_symbol();
        assert_eq!(graphic.symbol(), original);
        assert_eq!(animator.original_symbol(), &original);
        assert!(!animator.is_animating());
    }

    #[test]
    fn test_custom_step_function() {
        let graphic = simple_graphic();
        let mut animator = SymbolAnimator::new(
            graphic.clone(),
            linear(100.0),
            "g1",
            AnimatorOptions::default(),
        );
        animator.start(
            AnimationProps::new(AnimationTarget::new().scale(2.0)).on_step(
                |progress, from, _target, _original| match from {
                    Symbol::Simple(s) => {
                        let mut next = s.clone();
                        next.size = 100.0 * progress;
                        Symbol::Simple(next)
                    }
                    other => other.clone(),
                },
            ),
        );
        animator.tick(0.0);
        animator.tick(25.0);
        assert_eq!(size_of(&graphic), 25.0);
    }

    #[test]
    fn test_yoyo_alternates_until_stopped() {
        let graphic = simple_graphic();
        let finished = Rc::new(Cell::new(false));
        let mut animator = SymbolAnimator::new(
            graphic.clone(),
            linear(100.0),
            "g1",
            AnimatorOptions::default(),
        );
        let flag = finished.clone();
        animator.start(
            AnimationProps::new(AnimationTarget::new().scale(2.0))
                .yoyo()
                .on_finish(move || flag.set(true)),
        );

        animator.tick(0.0);
        assert_eq!(animator.tick(101.0), TickOutcome::Reversed);
        assert_eq!(size_of(&graphic), 20.0);

        // 回程朝中性状态
        animator.tick(200.0);
        assert_eq!(animator.tick(301.0), TickOutcome::Reversed);
        assert_eq!(size_of(&graphic), 10.0);
        assert_eq!(angle_of(&graphic), 0.0);

        // 再次朝调用方目标
        animator.tick(400.0);
        assert_eq!(animator.tick(501.0), TickOutcome::Reversed);
        assert_eq!(size_of(&graphic), 20.0);

        assert!(animator.is_animating());
        animator.stop();
        assert!(!finished.get());
    }

    #[test]
    fn test_remove_on_complete_destroys_unmanaged_graphic() {
        let graphic = simple_graphic();
        let mut animator = SymbolAnimator::new(
            graphic.clone(),
            linear(10.0),
            "g1",
            AnimatorOptions::default(),
        );
        animator.start(AnimationProps::new(AnimationTarget::new().scale(2.0)).remove_on_complete());
        animator.tick(0.0);
        assert_eq!(
            animator.tick(20.0),
            TickOutcome::Finished {
                remove_requested: true
            }
        );
        assert!(graphic.is_destroyed());
    }

    #[test]
    fn test_initial_opacity_applied_to_simple_marker() {
        let graphic = simple_graphic();
        let animator = SymbolAnimator::new(
            graphic.clone(),
            linear(100.0),
            "g1",
            AnimatorOptions {
                opacity: 0.5,
                ..Default::default()
            },
        );

        match graphic.symbol() {
            Symbol::Simple(s) => {
                assert_eq!(s.color.a, 0.5);
                assert_eq!(s.opacity, Some(0.5));
            }
            other => panic!("unexpected symbol: {:?}", other),
        }
        assert_eq!(animator.original_symbol(), &graphic.symbol());
    }

    #[test]
    fn test_fade_in_from_zero_initial_opacity() {
        let graphic = simple_graphic();
        let mut animator = SymbolAnimator::new(
            graphic.clone(),
            linear(100.0),
            "g1",
            AnimatorOptions {
                opacity: 0.0,
                ..Default::default()
            },
        );
        let alpha = |g: &TestGraphic| match g.symbol() {
            Symbol::Simple(s) => s.color.a,
            other => panic!("unexpected symbol: {:?}", other),
        };
        assert_eq!(alpha(&graphic), 0.0);

        animator.start(AnimationProps::new(AnimationTarget::new().opacity(1.0)));
        animator.tick(0.0);
        animator.tick(50.0);
        assert_eq!(alpha(&graphic), 0.5);
        animator.tick(101.0);
        assert_eq!(alpha(&graphic), 1.0);

        // 重置回到构造时的透明度
        animator.reset_symbol();
        assert_eq!(alpha(&graphic), 0.0);
    }

    #[test]
    fn test_picture_opacity_round_trip() {
        let images = Rc::new(TestImages::with("pin.png"));
        let graphic = Rc::new(TestGraphic::new(
            "p1",
            None,
            PictureMarker::new("pin.png", 16.0, 16.0).into(),
        ));
        let mut animator = SymbolAnimator::new(
            graphic.clone(),
            linear(100.0),
            "p1",
            AnimatorOptions {
                opacity: 0.5,
                images: Some(images),
                ..Default::default()
            },
        );

        let url = |g: &TestGraphic| match g.symbol() {
            Symbol::Picture(p) => p.url,
            other => panic!("unexpected symbol: {:?}", other),
        };
        assert!(url(&graphic).contains("opacity='0.5'"));

        animator.start(AnimationProps::new(AnimationTarget::new().opacity(1.0)));
        animator.tick(0.0);
        animator.tick(50.0);
        assert!(url(&graphic).contains("opacity='0.75'"));
    }
}
