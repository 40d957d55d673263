//! 矢量复合符号的更新函数。
//!
//! 只有矢量标记与图片标记子图层带有尺寸和旋转；其他子图层保持不变。
//! 旋转沿最短角度路径进行，终点朝向与目标在模 360 意义下相同。

use super::lerp;
use crate::symbol::CompositeSymbol;
use crate::target::AnimationTarget;

/// 复合符号更新
pub fn update_composite(
    progress: f32,
    current: &CompositeSymbol,
    target: &AnimationTarget,
    original: &CompositeSymbol,
) -> CompositeSymbol {
    let mut next = current.clone();
    let scale = target.scale_value();
    let rotate = target.rotate_value();

    for (index, layer) in next.layers.iter_mut().enumerate() {
        if !layer.kind.is_marker() {
            continue;
        }

        if let Some(scale) = scale
            && let Some(original_layer) = original.layers.get(index)
        {
            layer.size = lerp(layer.size, original_layer.size * scale, progress);
        }

        if let Some(rotate) = rotate {
            layer.rotation += shortest_rotation(layer.rotation, rotate) * progress;
        }
    }

    next
}

/// 把朝向归一化到 [-180, 180)
pub fn normalize_heading(degrees: f32) -> f32 {
    (degrees + 180.0).rem_euclid(360.0) - 180.0
}

/// 从 `from` 转到 `to` 的最短有符号角度，正值为顺时针
pub fn shortest_rotation(from: f32, to: f32) -> f32 {
    normalize_heading(normalize_heading(to) - normalize_heading(from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::{CompositeLayer, CompositeLayerKind};

    fn symbol() -> CompositeSymbol {
        CompositeSymbol {
            layers: vec![
                CompositeLayer::new(CompositeLayerKind::VectorMarker, 20.0),
                CompositeLayer::new(CompositeLayerKind::PictureMarker, 10.0),
                CompositeLayer::new(CompositeLayerKind::Fill, 5.0),
            ],
        }
    }

    #[test]
    fn test_normalize_heading() {
        assert_eq!(normalize_heading(0.0), 0.0);
        assert_eq!(normalize_heading(180.0), -180.0);
        assert_eq!(normalize_heading(270.0), -90.0);
        assert_eq!(normalize_heading(-190.0), 170.0);
        assert_eq!(normalize_heading(720.0), 0.0);
    }

    #[test]
    fn test_shortest_rotation() {
        assert_eq!(shortest_rotation(0.0, 90.0), 90.0);
        assert_eq!(shortest_rotation(0.0, 270.0), -90.0);
        assert_eq!(shortest_rotation(350.0, 10.0), 20.0);
        assert_eq!(shortest_rotation(10.0, 350.0), -20.0);
    }

    #[test]
    fn test_marker_layers_scale_and_rotate() {
        let s = symbol();
        let next = update_composite(1.0, &s, &AnimationTarget::new().scale(2.0).rotate(90.0), &s);

        assert_eq!(next.layers[0].size, 40.0);
        assert_eq!(next.layers[0].rotation, 90.0);
        assert_eq!(next.layers[1].size, 20.0);
        assert_eq!(next.layers[1].rotation, 90.0);
        // 填充子图层不参与
        assert_eq!(next.layers[2], s.layers[2]);
    }

    #[test]
    fn test_rotation_takes_short_path() {
        let mut s = symbol();
        s.layers[0].rotation = 350.0;
        let half = update_composite(0.5, &s, &AnimationTarget::new().rotate(10.0), &s);
        assert_eq!(half.layers[0].rotation, 360.0);

        let full = update_composite(1.0, &s, &AnimationTarget::new().rotate(10.0), &s);
        assert_eq!(normalize_heading(full.layers[0].rotation), 10.0);
    }
}
