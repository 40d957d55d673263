//! # Traits 模块
//!
//! 核心层对宿主协作方的全部要求。
//!
//! ## 核心概念
//!
//! - [`Drawable`]：可替换符号的图形（核心只借用，从不拥有）
//! - [`GraphicsCollection`]：可增删图形的集合，支持 before-add / before-remove 监听
//! - [`ParentLayer`]：被动画的父图层，可安装抑制过滤器
//! - [`DisplayContext`]：承载图层的显示上下文（地图视图）
//! - [`EmbeddedImageSource`]：图片内嵌缓存，未命中时异步填充
//!
//! 宿主对象通过 `&self` 修改自身状态（内部可变性），
//! 便于在监听回调中被重入访问。

use std::rc::Rc;

use crate::filter::SuppressionFilter;
use crate::symbol::Symbol;

/// 可动画的图形
///
/// ## 实现示例
///
/// ```rust,ignore
/// struct Pin {
///     uid: String,
///     symbol: RefCell<Symbol>,
/// }
///
/// impl Drawable for Pin {
///     fn uid(&self) -> String { self.uid.clone() }
///     fn object_id(&self) -> Option<u64> { None }
///     fn symbol(&self) -> Symbol { self.symbol.borrow().clone() }
///     fn set_symbol(&self, symbol: Symbol) { *self.symbol.borrow_mut() = symbol; }
/// }
/// ```
pub trait Drawable: 'static {
    /// 宿主分配的唯一标签（对象 ID 缺失时的身份兜底）
    fn uid(&self) -> String;

    /// 要素对象 ID（图形图层中的图形通常没有）
    fn object_id(&self) -> Option<u64>;

    /// 当前符号（按值返回副本）
    fn symbol(&self) -> Symbol;

    /// 替换符号
    fn set_symbol(&self, symbol: Symbol);

    /// 销毁图形（脱离管理器运行、要求完成后移除时调用）
    fn destroy(&self) {}
}

/// 图形共享引用
pub type DrawableRef = Rc<dyn Drawable>;

/// 结构监听的决定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookDecision {
    /// 继续执行
    Proceed,
    /// 取消本次增删
    Veto,
}

/// 图形集合结构监听器
pub trait CollectionWatcher {
    /// 图形即将加入集合
    fn before_add(&self, drawable: &DrawableRef) -> HookDecision;

    /// 图形即将离开集合
    fn before_remove(&self, drawable: &DrawableRef) -> HookDecision;
}

/// 监听句柄，用于解除监听
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchHandle(pub u64);

/// 可编辑的图形集合
pub trait GraphicsCollection {
    /// 加入图形；被监听器否决时返回 `false`
    fn add(&self, drawable: DrawableRef) -> bool;

    /// 移除图形；被监听器否决或图形不存在时返回 `false`
    fn remove(&self, drawable: &DrawableRef) -> bool;

    /// 查找图形位置
    fn find(&self, drawable: &dyn Drawable) -> Option<usize>;

    /// 图形数量
    fn len(&self) -> usize;

    /// 是否为空
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 注册结构监听
    fn watch(&self, watcher: Rc<dyn CollectionWatcher>) -> WatchHandle;

    /// 解除结构监听
    fn unwatch(&self, handle: WatchHandle);
}

/// 父图层类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerKind {
    /// 原生图形图层：图形可直接原地编辑
    Graphics,
    /// 要素图层：需要覆盖图层 + 抑制过滤器
    Feature,
    /// 其他图层类型（按要素图层处理）
    Other(String),
}

impl LayerKind {
    /// 是否为可直接编辑的原生图形集合
    pub fn is_native(&self) -> bool {
        matches!(self, LayerKind::Graphics)
    }
}

/// 被动画的父图层
pub trait ParentLayer {
    /// 图层 ID
    fn id(&self) -> String;

    /// 图层类型
    fn kind(&self) -> LayerKind;

    /// 图层声明的透明度
    fn opacity(&self) -> f32;

    /// 对象 ID 字段名
    fn object_id_field(&self) -> Option<String>;

    /// 原生图形集合（仅 [`LayerKind::Graphics`] 提供）
    fn graphics(&self) -> Option<Rc<dyn GraphicsCollection>>;

    /// 安装或清除抑制过滤器
    fn set_suppression_filter(&self, filter: Option<SuppressionFilter>);
}

/// 显示上下文（地图视图）
pub trait DisplayContext {
    /// 图层在绘制顺序中的位置
    fn layer_index(&self, layer_id: &str) -> Option<usize>;

    /// 在 `index` 处插入一个新的覆盖图形图层
    fn insert_overlay(&self, overlay_id: &str, index: usize) -> Rc<dyn GraphicsCollection>;

    /// 移除覆盖图层
    fn remove_overlay(&self, overlay_id: &str);

    /// 当前是否处于渲染/更新过程中
    fn is_updating(&self) -> bool;
}

/// 图片内嵌缓存
///
/// `get_embedded` 同步返回，未命中时返回 `None`；
/// `request` 只登记获取请求，稍后由宿主填充。
pub trait EmbeddedImageSource {
    /// 已缓存的内嵌表示（data URI）
    fn get_embedded(&self, url: &str) -> Option<String>;

    /// 请求获取并缓存
    fn request(&self, url: &str);
}

/// 图形的注册 ID：对象 ID 优先，否则使用 uid
pub fn unique_id(drawable: &dyn Drawable) -> String {
    drawable
        .object_id()
        .map(|id| id.to_string())
        .unwrap_or_else(|| drawable.uid())
}
