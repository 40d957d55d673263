//! # Resource Source 模块
//!
//! 图片字节的来源抽象。
//!
//! - [`FsSource`]：从本地资源目录读取
//! - [`MemorySource`]：预先放入内存的图片（测试、打包资源）
//!
//! 所有路径参数都是经过 [`normalize_image_url`] 规范化的地址。

use std::collections::HashMap;
use std::path::PathBuf;

use super::ResourceError;
use super::path::{is_remote, normalize_image_url};

/// 图片来源
pub trait ResourceSource {
    /// 读取图片字节
    fn read(&self, url: &str) -> Result<Vec<u8>, ResourceError>;

    /// 是否存在
    fn exists(&self, url: &str) -> bool;

    /// 完整路径（用于日志）
    fn full_path(&self, url: &str) -> String;
}

/// 文件系统来源
#[derive(Debug, Clone)]
pub struct FsSource {
    base_path: PathBuf,
}

impl FsSource {
    /// # 参数
    /// - `base_path`: 资源根目录（如 `assets`）
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn resolve(&self, url: &str) -> PathBuf {
        self.base_path.join(normalize_image_url(url))
    }
}

impl ResourceSource for FsSource {
    fn read(&self, url: &str) -> Result<Vec<u8>, ResourceError> {
        if is_remote(url) {
            return Err(ResourceError::Remote {
                url: url.to_string(),
            });
        }

        let full_path = self.resolve(url);
        if !full_path.exists() {
            return Err(ResourceError::NotFound {
                path: full_path.to_string_lossy().to_string(),
            });
        }

        std::fs::read(&full_path).map_err(|e| ResourceError::LoadFailed {
            path: full_path.to_string_lossy().to_string(),
            source_kind: "file",
            message: e.to_string(),
        })
    }

    fn exists(&self, url: &str) -> bool {
        !is_remote(url) && self.resolve(url).exists()
    }

    fn full_path(&self, url: &str) -> String {
        self.resolve(url).to_string_lossy().to_string()
    }
}

/// 内存来源
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// 放入一张图片
    pub fn insert(&mut self, url: &str, bytes: impl Into<Vec<u8>>) {
        self.files.insert(normalize_image_url(url), bytes.into());
    }

    pub fn with(mut self, url: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(url, bytes);
        self
    }
}

impl ResourceSource for MemorySource {
    fn read(&self, url: &str) -> Result<Vec<u8>, ResourceError> {
        let key = normalize_image_url(url);
        self.files
            .get(&key)
            .cloned()
            .ok_or(ResourceError::NotFound { path: key })
    }

    fn exists(&self, url: &str) -> bool {
        self.files.contains_key(&normalize_image_url(url))
    }

    fn full_path(&self, url: &str) -> String {
        format!("memory://{}", normalize_image_url(url))
    }
}
