//! # Embedded Image Cache 模块
//!
//! 图片地址到 base64 data URI 的缓存，带 LRU 驱逐和字节预算。
//!
//! 动画核心同步调用 `get_embedded`，未命中时调用 `request` 登记；
//! 宿主在帧间调用 [`EmbeddedImageCache::pump`] 从资源来源读取并填充。
//! 获取失败只写日志，缓存保持为空，下次 `request` 会重新登记。

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::ImageFormat;
use marker_anim::EmbeddedImageSource;
use tracing::{debug, warn};

use super::ResourceError;
use super::path::{is_data_uri, mime_from_extension, normalize_image_url};
use super::source::ResourceSource;

/// 默认预算：16 MB
pub const DEFAULT_IMAGE_BUDGET_MB: usize = 16;

#[derive(Debug)]
struct CacheEntry {
    data_uri: String,
    size_bytes: usize,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    /// 最近使用的在后面
    lru_order: VecDeque<String>,
    used_bytes: usize,
    /// 等待获取的地址（按登记顺序）
    pending: Vec<String>,
    hits: u64,
    misses: u64,
    evictions: u64,
    failures: u64,
}

impl CacheState {
    fn touch(&mut self, key: &str) {
        self.remove_from_lru(key);
        self.lru_order.push_back(key.to_string());
    }

    fn remove_from_lru(&mut self, key: &str) {
        self.lru_order.retain(|k| k != key);
    }

    fn evict_one(&mut self) -> bool {
        let Some(key) = self.lru_order.pop_front() else {
            return false;
        };
        if let Some(entry) = self.entries.remove(&key) {
            self.used_bytes = self.used_bytes.saturating_sub(entry.size_bytes);
            self.evictions += 1;
            debug!(url = %key, "驱逐内嵌图片");
        }
        true
    }
}

/// 内嵌图片缓存
///
/// 特性：
/// - LRU 驱逐策略
/// - 字节预算限制（按 data URI 长度计）
/// - 待获取队列，由宿主驱动填充
pub struct EmbeddedImageCache {
    state: RefCell<CacheState>,
    budget_bytes: usize,
}

impl EmbeddedImageCache {
    /// # 参数
    /// - `budget_mb`: 预算（MB）
    pub fn new(budget_mb: usize) -> Self {
        Self::with_budget_bytes(budget_mb * 1024 * 1024)
    }

    pub fn with_budget_bytes(budget_bytes: usize) -> Self {
        Self {
            state: RefCell::new(CacheState::default()),
            budget_bytes,
        }
    }

    pub fn with_default_budget() -> Self {
        Self::new(DEFAULT_IMAGE_BUDGET_MB)
    }

    /// 获取内嵌表示（命中时更新 LRU）
    pub fn get(&self, url: &str) -> Option<String> {
        if is_data_uri(url) {
            return Some(url.to_string());
        }
        let key = normalize_image_url(url);
        let mut state = self.state.borrow_mut();
        let found = state.entries.get(&key).map(|e| e.data_uri.clone());
        match found {
            Some(data_uri) => {
                state.hits += 1;
                state.touch(&key);
                Some(data_uri)
            }
            None => {
                state.misses += 1;
                None
            }
        }
    }

    /// 只读查询（不更新 LRU 与统计）
    pub fn peek(&self, url: &str) -> Option<String> {
        self.state
            .borrow()
            .entries
            .get(&normalize_image_url(url))
            .map(|e| e.data_uri.clone())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.state
            .borrow()
            .entries
            .contains_key(&normalize_image_url(url))
    }

    /// 放入内嵌表示
    ///
    /// 超出预算时先驱逐最久未使用的条目。
    pub fn insert(&self, url: &str, data_uri: String) {
        let key = normalize_image_url(url);
        let new_size = data_uri.len();
        let mut state = self.state.borrow_mut();

        if let Some(old) = state.entries.remove(&key) {
            state.used_bytes = state.used_bytes.saturating_sub(old.size_bytes);
            state.remove_from_lru(&key);
        }

        while state.used_bytes + new_size > self.budget_bytes {
            if !state.evict_one() {
                warn!(
                    url = %key,
                    size_bytes = new_size,
                    budget_bytes = self.budget_bytes,
                    "单张图片超出缓存预算，仍然插入"
                );
                break;
            }
        }

        state.used_bytes += new_size;
        state.entries.insert(
            key.clone(),
            CacheEntry {
                data_uri,
                size_bytes: new_size,
            },
        );
        state.lru_order.push_back(key);
    }

    pub fn remove(&self, url: &str) {
        let key = normalize_image_url(url);
        let mut state = self.state.borrow_mut();
        if let Some(entry) = state.entries.remove(&key) {
            state.used_bytes = state.used_bytes.saturating_sub(entry.size_bytes);
            state.remove_from_lru(&key);
        }
    }

    pub fn clear(&self) {
        let mut state = self.state.borrow_mut();
        state.entries.clear();
        state.lru_order.clear();
        state.pending.clear();
        state.used_bytes = 0;
    }

    /// 登记获取请求（已缓存或已登记时忽略）
    pub fn request(&self, url: &str) {
        if is_data_uri(url) {
            return;
        }
        let key = normalize_image_url(url);
        let mut state = self.state.borrow_mut();
        if state.entries.contains_key(&key) || state.pending.contains(&key) {
            return;
        }
        debug!(url = %key, "登记图片获取");
        state.pending.push(key);
    }

    /// 等待获取的地址
    pub fn pending(&self) -> Vec<String> {
        self.state.borrow().pending.clone()
    }

    /// 从资源来源获取所有待处理的图片
    ///
    /// 返回成功填充的数量。失败的地址只记录日志。
    pub fn pump(&self, source: &dyn ResourceSource) -> usize {
        let pending = std::mem::take(&mut self.state.borrow_mut().pending);
        let mut loaded = 0;

        for url in pending {
            match load_embedded(source, &url) {
                Ok(data_uri) => {
                    self.insert(&url, data_uri);
                    loaded += 1;
                }
                Err(e) => {
                    warn!(url = %url, path = %source.full_path(&url), error = %e, "图片内嵌失败");
                    self.state.borrow_mut().failures += 1;
                }
            }
        }

        loaded
    }

    pub fn used_bytes(&self) -> usize {
        self.state.borrow().used_bytes
    }

    pub fn budget_bytes(&self) -> usize {
        self.budget_bytes
    }

    pub fn len(&self) -> usize {
        self.state.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().entries.is_empty()
    }

    /// 获取统计信息
    pub fn stats(&self) -> CacheStats {
        let state = self.state.borrow();
        let lookups = state.hits + state.misses;
        CacheStats {
            entries: state.entries.len(),
            used_bytes: state.used_bytes,
            budget_bytes: self.budget_bytes,
            pending: state.pending.len(),
            hits: state.hits,
            misses: state.misses,
            evictions: state.evictions,
            failures: state.failures,
            hit_rate: if lookups > 0 {
                state.hits as f64 / lookups as f64
            } else {
                0.0
            },
        }
    }

    pub fn reset_stats(&self) {
        let mut state = self.state.borrow_mut();
        state.hits = 0;
        state.misses = 0;
        state.evictions = 0;
        state.failures = 0;
    }
}

impl Default for EmbeddedImageCache {
    fn default() -> Self {
        Self::with_default_budget()
    }
}

impl EmbeddedImageSource for EmbeddedImageCache {
    fn get_embedded(&self, url: &str) -> Option<String> {
        self.get(url)
    }

    fn request(&self, url: &str) {
        EmbeddedImageCache::request(self, url);
    }
}

/// 读取并编码为 data URI
pub fn load_embedded(source: &dyn ResourceSource, url: &str) -> Result<String, ResourceError> {
    let bytes = source.read(url)?;
    encode_data_uri(url, &bytes)
}

/// 编码为 base64 data URI，MIME 类型优先按字节探测
pub fn encode_data_uri(url: &str, bytes: &[u8]) -> Result<String, ResourceError> {
    let mime = image::guess_format(bytes)
        .ok()
        .and_then(mime_for_format)
        .or_else(|| mime_from_extension(url))
        .ok_or_else(|| ResourceError::InvalidFormat {
            path: url.to_string(),
            message: "既不是可识别的图片字节，也没有已知的扩展名".to_string(),
        })?;

    Ok(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
}

fn mime_for_format(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Png => Some("image/png"),
        ImageFormat::Jpeg => Some("image/jpeg"),
        ImageFormat::WebP => Some("image/webp"),
        ImageFormat::Gif => Some("image/gif"),
        ImageFormat::Bmp => Some("image/bmp"),
        _ => None,
    }
}

/// 缓存统计信息
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub entries: usize,
    pub used_bytes: usize,
    pub budget_bytes: usize,
    /// 等待获取的数量
    pub pending: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    /// 获取失败次数
    pub failures: u64,
    pub hit_rate: f64,
}

impl CacheStats {
    /// 格式化为可读字符串
    pub fn format(&self) -> String {
        format!(
            "Images: {} entries, {:.1}KB / {:.1}KB, pending: {}, hit rate: {:.1}%, evictions: {}, failures: {}",
            self.entries,
            self.used_bytes as f64 / 1024.0,
            self.budget_bytes as f64 / 1024.0,
            self.pending,
            self.hit_rate * 100.0,
            self.evictions,
            self.failures,
        )
    }
}
