//! 图片标记的更新函数。
//!
//! 图片格式本身没有独立的 alpha 字段，透明度通过把图片重新编码为
//! 内嵌 SVG 包装实现：包装中嵌入缓存的 base64 图片并带 `opacity` 属性。
//! 上一次应用的透明度也从包装中解析回来，作为下一次插值的起点。

use tracing::trace;

use super::lerp;
use crate::symbol::PictureMarker;
use crate::target::AnimationTarget;
use crate::traits::EmbeddedImageSource;

/// SVG 包装前缀
pub const SVG_WRAPPER_PREFIX: &str = "data:image/svg+xml;utf8,";

const OPACITY_ATTR: &str = "opacity='";

/// 图片标记更新
///
/// - 宽高：插值到 `original * scale`
/// - 角度：插值到绝对朝向 `rotate`
/// - 透明度：需要内嵌缓存命中；未命中时登记获取请求并跳过本帧透明度
pub fn update_picture(
    progress: f32,
    current: &PictureMarker,
    target: &AnimationTarget,
    original: &PictureMarker,
    images: Option<&dyn EmbeddedImageSource>,
) -> PictureMarker {
    let mut next = current.clone();

    if let Some(scale) = target.scale_value() {
        next.width = lerp(current.width, original.width * scale, progress);
        next.height = lerp(current.height, original.height * scale, progress);
    }

    if let Some(rotate) = target.rotate_value() {
        next.angle = lerp(current.angle, rotate, progress);
    }

    if let Some(opacity) = target.opacity_value() {
        let source = original.image_source();
        match images.map(|cache| (cache, cache.get_embedded(source))) {
            Some((_, Some(embedded))) => {
                let from = parse_wrapped_opacity(&current.url)
                    .or(current.opacity)
                    .unwrap_or(1.0);
                let value = lerp(from, opacity, progress).clamp(0.0, 1.0);
                next.url = wrap_with_opacity(&embedded, value, next.width, next.height);
                next.source_url = Some(source.to_string());
            }
            Some((cache, None)) => {
                trace!(url = %source, "内嵌图片未缓存，跳过本帧透明度");
                cache.request(source);
            }
            None => {
                trace!(url = %source, "没有图片缓存，跳过透明度");
            }
        }
    }

    next
}

/// 生成带透明度的 SVG 包装
pub fn wrap_with_opacity(embedded: &str, opacity: f32, width: f32, height: f32) -> String {
    format!(
        "{SVG_WRAPPER_PREFIX}<svg xmlns='http://www.w3.org/2000/svg' width='{width}' height='{height}'>\
         <image href='{embedded}' width='100%' height='100%' opacity='{opacity}'/></svg>"
    )
}

/// 从 SVG 包装中解析透明度；不是包装时返回 `None`
pub fn parse_wrapped_opacity(url: &str) -> Option<f32> {
    let body = url.strip_prefix(SVG_WRAPPER_PREFIX)?;
    let start = body.rfind(OPACITY_ATTR)? + OPACITY_ATTR.len();
    let end = body[start..].find('\'')? + start;
    body[start..end].parse().ok()
}
