//! # 图片地址规范化
//!
//! 缓存键统一使用规范化后的地址：
//!
//! - 使用 `/` 作为分隔符
//! - 去掉开头的 `./`，折叠 `.` 与 `..`
//! - 远程地址与 data URI 原样保留

/// 是否为远程地址（http/https）
pub fn is_remote(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// 是否已经是内嵌 data URI
pub fn is_data_uri(url: &str) -> bool {
    url.starts_with("data:")
}

/// 规范化图片地址
///
/// # 示例
///
/// ```ignore
/// assert_eq!(normalize_image_url("icons/../pins/red.png"), "pins/red.png");
/// assert_eq!(normalize_image_url(".\\pins\\red.png"), "pins/red.png");
/// ```
pub fn normalize_image_url(url: &str) -> String {
    if is_remote(url) || is_data_uri(url) {
        return url.to_string();
    }

    let unified = url.replace('\\', "/");
    let mut components: Vec<&str> = Vec::new();
    for component in unified.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                components.pop();
            }
            _ => components.push(component),
        }
    }
    components.join("/")
}

/// 按扩展名推断 MIME 类型（字节探测失败时的兜底）
pub fn mime_from_extension(url: &str) -> Option<&'static str> {
    let ext = url.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "svg" => Some("image/svg+xml"),
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}
