//! # Symbol 模块
//!
//! 点要素符号的数据模型。
//!
//! 符号是一个封闭的带标签联合体，每种类型各自携带可动画的数值字段：
//!
//! - [`SimpleMarker`]：简单形状（尺寸、角度、填充色、描边色）
//! - [`PictureMarker`]：图片（宽高、角度、图片 URL）
//! - [`CompositeSymbol`]：由多个子图层组成的矢量复合符号
//! - [`OpaqueSymbol`]：其他类型，动画请求对其无效
//!
//! 符号总是按值克隆后再修改，核心层不会修改仍被当作"原始"或"起点"引用的值。

use serde::{Deserialize, Serialize};

/// RGBA 颜色（alpha 范围 0.0 - 1.0）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// 替换 alpha，返回新颜色
    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::rgb(0, 0, 0)
    }
}

/// 描边
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    /// 描边颜色；没有颜色时不参与透明度动画
    #[serde(default)]
    pub color: Option<Color>,
    /// 线宽（pt）
    #[serde(default = "default_outline_width")]
    pub width: f32,
}

fn default_outline_width() -> f32 {
    1.0
}

/// 简单形状标记
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleMarker {
    /// 形状名称（circle、square 等），动画不关心
    #[serde(default = "default_style")]
    pub style: String,
    /// 尺寸（pt）
    pub size: f32,
    /// 旋转角度（度）
    #[serde(default)]
    pub angle: f32,
    /// 填充色
    pub color: Color,
    /// 描边
    #[serde(default)]
    pub outline: Option<Outline>,
    /// 已应用的基础透明度（由动画层记录）
    #[serde(default)]
    pub opacity: Option<f32>,
}

fn default_style() -> String {
    "circle".to_string()
}

impl SimpleMarker {
    pub fn new(size: f32, color: Color) -> Self {
        Self {
            style: default_style(),
            size,
            angle: 0.0,
            color,
            outline: None,
            opacity: None,
        }
    }

    pub fn with_outline(mut self, color: Color, width: f32) -> Self {
        self.outline = Some(Outline {
            color: Some(color),
            width,
        });
        self
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }
}

/// 图片标记
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PictureMarker {
    /// 图片地址：普通 URL，或由透明度动画生成的内嵌包装
    pub url: String,
    /// 宽度（pt）
    pub width: f32,
    /// 高度（pt）
    pub height: f32,
    /// 旋转角度（度）
    #[serde(default)]
    pub angle: f32,
    /// 已应用的透明度（由动画层记录）
    #[serde(default)]
    pub opacity: Option<f32>,
    /// 被内嵌包装前的原始图片地址
    #[serde(default)]
    pub source_url: Option<String>,
}

impl PictureMarker {
    pub fn new(url: impl Into<String>, width: f32, height: f32) -> Self {
        Self {
            url: url.into(),
            width,
            height,
            angle: 0.0,
            opacity: None,
            source_url: None,
        }
    }

    /// 原始图片地址（作为内嵌缓存的键）
    pub fn image_source(&self) -> &str {
        self.source_url.as_deref().unwrap_or(&self.url)
    }
}

/// 复合符号子图层类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompositeLayerKind {
    /// 矢量标记
    VectorMarker,
    /// 图片标记
    PictureMarker,
    /// 填充
    Fill,
    /// 线
    Stroke,
    /// 文本
    Text,
}

impl CompositeLayerKind {
    /// 是否带有可动画的尺寸与旋转
    pub fn is_marker(&self) -> bool {
        matches!(self, Self::VectorMarker | Self::PictureMarker)
    }
}

/// 复合符号子图层
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeLayer {
    pub kind: CompositeLayerKind,
    #[serde(default)]
    pub size: f32,
    /// 旋转角度（度）
    #[serde(default)]
    pub rotation: f32,
}

impl CompositeLayer {
    pub fn new(kind: CompositeLayerKind, size: f32) -> Self {
        Self {
            kind,
            size,
            rotation: 0.0,
        }
    }
}

/// 矢量复合符号
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CompositeSymbol {
    /// 有序子图层
    pub layers: Vec<CompositeLayer>,
}

/// 不支持动画的符号，原样透传
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpaqueSymbol {
    /// 宿主侧的类型名
    pub kind: String,
}

/// 符号
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Symbol {
    Simple(SimpleMarker),
    Picture(PictureMarker),
    Composite(CompositeSymbol),
    Other(OpaqueSymbol),
}

/// 符号类型标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Simple,
    Picture,
    Composite,
    Other,
}

impl Symbol {
    pub fn kind(&self) -> SymbolKind {
        match self {
            Symbol::Simple(_) => SymbolKind::Simple,
            Symbol::Picture(_) => SymbolKind::Picture,
            Symbol::Composite(_) => SymbolKind::Composite,
            Symbol::Other(_) => SymbolKind::Other,
        }
    }

    /// 创建透传符号
    pub fn other(kind: impl Into<String>) -> Self {
        Symbol::Other(OpaqueSymbol { kind: kind.into() })
    }

    /// 已记录的透明度（不支持透明度的类型返回 `None`）
    pub fn recorded_opacity(&self) -> Option<f32> {
        match self {
            Symbol::Simple(s) => s.opacity,
            Symbol::Picture(p) => p.opacity,
            Symbol::Composite(_) | Symbol::Other(_) => None,
        }
    }

    /// 记录透明度；不支持的类型静默忽略
    pub fn record_opacity(&mut self, opacity: f32) {
        match self {
            Symbol::Simple(s) => s.opacity = Some(opacity),
            Symbol::Picture(p) => p.opacity = Some(opacity),
            Symbol::Composite(_) | Symbol::Other(_) => {}
        }
    }
}

impl From<SimpleMarker> for Symbol {
    fn from(value: SimpleMarker) -> Self {
        Symbol::Simple(value)
    }
}

impl From<PictureMarker> for Symbol {
    fn from(value: PictureMarker) -> Self {
        Symbol::Picture(value)
    }
}

impl From<CompositeSymbol> for Symbol {
    fn from(value: CompositeSymbol) -> Self {
        Symbol::Composite(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_kind() {
        let simple: Symbol = SimpleMarker::new(10.0, Color::rgb(255, 0, 0)).into();
        assert_eq!(simple.kind(), SymbolKind::Simple);
        assert_eq!(Symbol::other("text").kind(), SymbolKind::Other);
    }

    #[test]
    fn test_record_opacity_ignored_for_composite() {
        let mut composite: Symbol = CompositeSymbol::default().into();
        composite.record_opacity(0.5);
        assert_eq!(composite.recorded_opacity(), None);

        let mut picture: Symbol = PictureMarker::new("a.png", 16.0, 16.0).into();
        picture.record_opacity(0.5);
        assert_eq!(picture.recorded_opacity(), Some(0.5));
    }

    #[test]
    fn test_picture_image_source() {
        let mut picture = PictureMarker::new("icons/pin.png", 16.0, 16.0);
        assert_eq!(picture.image_source(), "icons/pin.png");

        picture.source_url = Some("icons/pin.png".to_string());
        picture.url = "data:image/svg+xml;utf8,<svg/>".to_string();
        assert_eq!(picture.image_source(), "icons/pin.png");
    }

    #[test]
    fn test_symbol_deserialize() {
        let json = r#"{"type":"simple","size":12,"color":{"r":0,"g":128,"b":255,"a":0.8}}"#;
        let symbol: Symbol = serde_json::from_str(json).unwrap();
        match symbol {
            Symbol::Simple(s) => {
                assert_eq!(s.size, 12.0);
                assert_eq!(s.style, "circle");
                assert_eq!(s.color.a, 0.8);
                assert!(s.outline.is_none());
            }
            other => panic!("unexpected symbol: {:?}", other),
        }
    }
}
