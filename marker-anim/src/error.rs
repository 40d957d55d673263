//! # Error 模块
//!
//! 定义 marker-anim 中使用的错误类型。
//!
//! 动画过程本身不产生错误：更新函数、查找和图片获取失败都在本地吸收。
//! 错误只出现在构造边界（缓动解析、弹簧参数校验、管理器创建）。

use thiserror::Error;

/// 动画核心错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimError {
    /// 未知的缓动函数名称
    #[error("未知的缓动函数 '{name}'")]
    UnknownEasing { name: String },

    /// 弹簧参数无效
    #[error("弹簧参数 '{param}' 无效: {message}")]
    InvalidSpring { param: String, message: String },

    /// 标准缓动时长无效
    #[error("缓动时长无效: {duration_ms}ms")]
    InvalidDuration { duration_ms: f32 },

    /// 原生图形图层缺少图形集合
    #[error("图层 '{layer}' 声明为原生图形图层，但没有提供图形集合")]
    MissingGraphics { layer: String },

    /// 父图层不在显示上下文中
    #[error("图层 '{layer}' 不在显示上下文中，无法插入覆盖图层")]
    LayerNotInView { layer: String },
}

/// Result 类型别名
pub type AnimResult<T> = Result<T, AnimError>;
