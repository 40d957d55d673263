//! 简单形状标记的更新函数。

use super::lerp;
use crate::symbol::{Color, SimpleMarker};
use crate::target::AnimationTarget;

/// 基础透明度低于此值时不再用于换算
const MIN_BASE_OPACITY: f32 = 1e-4;

/// 简单标记更新
///
/// - 尺寸：插值到 `original.size * scale`
/// - 角度：插值到绝对朝向 `rotate`
/// - 透明度：填充色与描边色的 alpha 分别插值到 `基础 alpha * opacity`，
///   基础 alpha 为原始 alpha 去除已记录的基础透明度
pub fn update_simple(
    progress: f32,
    current: &SimpleMarker,
    target: &AnimationTarget,
    original: &SimpleMarker,
) -> SimpleMarker {
    let mut next = current.clone();

    if let Some(scale) = target.scale_value() {
        next.size = lerp(current.size, original.size * scale, progress);
    }

    if let Some(rotate) = target.rotate_value() {
        next.angle = lerp(current.angle, rotate, progress);
    }

    if let Some(opacity) = target.opacity_value() {
        let base = original
            .opacity
            .filter(|o| *o > MIN_BASE_OPACITY)
            .unwrap_or(1.0);

        next.color = fade(current.color, original.color, base, opacity, progress);

        if let (Some(outline), Some(current_outline), Some(original_outline)) =
            (next.outline.as_mut(), current.outline.as_ref(), original.outline.as_ref())
            && let (Some(from), Some(orig)) = (current_outline.color, original_outline.color)
        {
            outline.color = Some(fade(from, orig, base, opacity, progress));
        }
    }

    next
}

fn fade(from: Color, original: Color, base: f32, opacity: f32, progress: f32) -> Color {
    let goal = original.a / base * opacity;
    from.with_alpha(lerp(from.a, goal, progress).clamp(0.0, 1.0))
}
