//! # Error 模块
//!
//! 宿主层错误类型。

use marker_anim::AnimError;
use thiserror::Error;

/// 宿主层错误
#[derive(Error, Debug)]
pub enum HostError {
    /// 配置文件读写失败
    #[error("配置 IO 错误: {path} - {message}")]
    Io { path: String, message: String },

    /// 配置 JSON 无效
    #[error("配置解析失败: {0}")]
    Json(#[from] serde_json::Error),

    /// 配置取值无效
    #[error("配置验证失败: {0}")]
    InvalidConfig(String),

    /// 动画核心拒绝了配置
    #[error(transparent)]
    Anim(#[from] AnimError),
}

/// Result 类型别名
pub type HostResult<T> = Result<T, HostError>;
