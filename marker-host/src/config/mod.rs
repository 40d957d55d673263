//! # Config 模块
//!
//! 宿主配置，从 JSON 文件加载，缺失字段使用默认值。
//!
//! ```json
//! {
//!   "easing": { "type": "standard", "easing": "ease-out", "duration_ms": 250 },
//!   "removal": "deferred",
//!   "images": { "assets_root": "assets", "budget_mb": 16 },
//!   "log_filter": "marker_anim=debug,info"
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use marker_anim::{AnimationManager, EasingConfig, RemovalMode, SpringConfig};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{HostError, HostResult};

/// 缓动预设（缓动配置的可序列化形式）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum EasingPreset {
    /// 自定义弹簧参数，缺省字段取默认弹簧
    Spring(SpringConfig),
    /// 命名弹簧预设
    SpringPreset { name: String },
    /// 命名曲线 + 时长
    Standard { easing: String, duration_ms: f32 },
}

impl Default for EasingPreset {
    fn default() -> Self {
        EasingPreset::Spring(SpringConfig::default())
    }
}

impl EasingPreset {
    /// 转换为缓动配置（会做参数校验）
    pub fn to_config(&self) -> HostResult<EasingConfig> {
        match self {
            EasingPreset::Spring(config) => {
                config.validate()?;
                Ok(EasingConfig::Spring(*config))
            }
            EasingPreset::SpringPreset { name } => SpringConfig::preset(name)
                .map(EasingConfig::Spring)
                .ok_or_else(|| HostError::InvalidConfig(format!("未知的弹簧预设: {}", name))),
            EasingPreset::Standard {
                easing,
                duration_ms,
            } => Ok(EasingConfig::named(easing, *duration_ms)?),
        }
    }
}

/// 图片内嵌缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageCacheConfig {
    /// 图片资源根目录
    #[serde(default = "default_assets_root")]
    pub assets_root: PathBuf,

    /// 缓存预算（MB）
    #[serde(default = "default_image_budget_mb")]
    pub budget_mb: usize,
}

impl Default for ImageCacheConfig {
    fn default() -> Self {
        Self {
            assets_root: default_assets_root(),
            budget_mb: default_image_budget_mb(),
        }
    }
}

/// 宿主配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// 默认缓动
    #[serde(default)]
    pub easing: EasingPreset,

    /// 默认移除方式
    #[serde(default)]
    pub removal: RemovalMode,

    /// 图片缓存
    #[serde(default)]
    pub images: ImageCacheConfig,

    /// 日志过滤（`tracing_subscriber::EnvFilter` 语法）
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_assets_root() -> PathBuf {
    PathBuf::from("assets")
}

fn default_image_budget_mb() -> usize {
    16
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            easing: EasingPreset::default(),
            removal: RemovalMode::default(),
            images: ImageCacheConfig::default(),
            log_filter: default_log_filter(),
        }
    }
}

impl HostConfig {
    /// 加载配置文件
    ///
    /// 文件不存在时返回默认配置；读取、解析或验证失败时返回错误。
    pub fn load(path: impl AsRef<Path>) -> HostResult<Self> {
        let path = path.as_ref();

        if !path.exists() {
            warn!(path = ?path, "配置文件不存在，使用默认配置");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| HostError::Io {
            path: path.to_string_lossy().to_string(),
            message: e.to_string(),
        })?;
        let config = Self::from_json(&content)?;
        info!(path = ?path, "配置文件加载成功");
        Ok(config)
    }

    /// 从 JSON 文本解析并验证
    pub fn from_json(content: &str) -> HostResult<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> HostResult<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|e| HostError::Io {
            path: path.to_string_lossy().to_string(),
            message: e.to_string(),
        })
    }

    /// 验证配置有效性
    pub fn validate(&self) -> HostResult<()> {
        self.easing.to_config()?;

        if self.images.budget_mb == 0 {
            return Err(HostError::InvalidConfig(
                "图片缓存预算必须大于 0".to_string(),
            ));
        }

        Ok(())
    }

    /// 默认缓动配置
    pub fn easing_config(&self) -> HostResult<EasingConfig> {
        self.easing.to_config()
    }

    /// 把默认缓动与移除方式应用到管理器
    pub fn configure(&self, manager: AnimationManager) -> HostResult<AnimationManager> {
        Ok(manager
            .with_default_easing(self.easing_config()?)
            .with_removal_mode(self.removal))
    }
}
