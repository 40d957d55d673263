//! # Resources 模块
//!
//! 图片标记透明度动画所需的图片内嵌缓存。
//!
//! - [`source`]：图片字节来源（文件系统、内存）
//! - [`cache`]：带 LRU 驱逐的 data URI 缓存，实现核心的 `EmbeddedImageSource`
//! - [`path`]：缓存键规范化

pub mod cache;
mod error;
pub mod path;
pub mod source;

pub use cache::{CacheStats, DEFAULT_IMAGE_BUDGET_MB, EmbeddedImageCache, encode_data_uri};
pub use error::ResourceError;
pub use path::normalize_image_url;
pub use source::{FsSource, MemorySource, ResourceSource};
