//! # Resource Error 模块
//!
//! 图片获取与内嵌过程中的错误。这些错误只写入日志，不会传给动画调用方。

use thiserror::Error;

/// 图片资源错误
#[derive(Error, Debug)]
pub enum ResourceError {
    /// 读取失败
    #[error("读取图片失败: {path} ({source_kind}) - {message}")]
    LoadFailed {
        path: String,
        /// 来源类型（file, memory）
        source_kind: &'static str,
        message: String,
    },

    /// 来源中不存在
    #[error("图片未找到: {path}")]
    NotFound { path: String },

    /// 字节不是可识别的图片
    #[error("无法识别的图片格式: {path} - {message}")]
    InvalidFormat { path: String, message: String },

    /// 远程地址，需要宿主自行获取后放入缓存
    #[error("不支持从远程地址读取: {url}")]
    Remote { url: String },
}
