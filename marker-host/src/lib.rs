//! # Marker Host
//!
//! `marker-anim` 的宿主层：提供动画核心所需的全部协作方实现。
//!
//! ## 模块结构
//!
//! - [`graphic`]：点图形
//! - [`layers`]：图形集合、原生图形图层、要素图层、地图视图
//! - [`resources`]：图片内嵌缓存与资源来源
//! - [`frame`]：时钟与帧驱动
//! - [`config`]：JSON 配置
//! - [`logging`]：日志初始化
//! - [`error`]：宿主层错误
//!
//! ## 使用示例
//!
//! ```ignore
//! let config = HostConfig::load("config.json")?;
//! init_logging(&config.log_filter);
//!
//! let view = Rc::new(MapView::new());
//! view.add_layer("points");
//! let layer = Rc::new(FeatureLayer::new("points"));
//!
//! let images = Rc::new(EmbeddedImageCache::new(config.images.budget_mb));
//! let manager = AnimationManager::new(layer, view)?.with_images(images.clone());
//! let mut manager = config.configure(manager)?;
//!
//! let mut driver = FrameDriver::new(SystemClock::new())
//!     .with_images(images, Box::new(FsSource::new(&config.images.assets_root)));
//! loop {
//!     let events = driver.frame(&mut manager);
//!     // ...
//! }
//! ```

pub mod config;
pub mod error;
pub mod frame;
pub mod graphic;
pub mod layers;
pub mod logging;
pub mod resources;

pub use config::{EasingPreset, HostConfig, ImageCacheConfig};
pub use error::{HostError, HostResult};
pub use frame::{Clock, FakeClock, FrameDriver, SystemClock};
pub use graphic::Graphic;
pub use layers::{FeatureLayer, GraphicStore, GraphicsLayer, MapView};
pub use logging::init_logging;
pub use resources::{EmbeddedImageCache, FsSource, MemorySource, ResourceError, ResourceSource};
