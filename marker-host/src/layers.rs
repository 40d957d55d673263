//! # Layers 模块
//!
//! 宿主侧的图层与地图视图。
//!
//! - [`GraphicStore`]：有序图形集合，增删前通知结构监听器
//! - [`GraphicsLayer`]：原生图形图层，图形可原地编辑
//! - [`FeatureLayer`]：要素图层，记录被安装的抑制过滤器
//! - [`MapView`]：图层绘制顺序与覆盖图层的显示上下文

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use marker_anim::{
    CollectionWatcher, DisplayContext, Drawable, DrawableRef, GraphicsCollection, HookDecision,
    LayerKind, ParentLayer, SuppressionFilter, WatchHandle,
};
use tracing::{debug, trace};

/// 图形集合
#[derive(Default)]
pub struct GraphicStore {
    items: RefCell<Vec<DrawableRef>>,
    watchers: RefCell<Vec<(WatchHandle, Rc<dyn CollectionWatcher>)>>,
    next_handle: Cell<u64>,
}

impl GraphicStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按 uid 判断是否包含
    pub fn contains(&self, uid: &str) -> bool {
        self.items.borrow().iter().any(|d| d.uid() == uid)
    }

    /// 当前图形（按加入顺序）
    pub fn items(&self) -> Vec<DrawableRef> {
        self.items.borrow().clone()
    }

    pub fn watcher_count(&self) -> usize {
        self.watchers.borrow().len()
    }

    // 回调期间监听器可能重入集合，先复制一份
    fn snapshot_watchers(&self) -> Vec<Rc<dyn CollectionWatcher>> {
        self.watchers
            .borrow()
            .iter()
            .map(|(_, watcher)| watcher.clone())
            .collect()
    }
}

impl GraphicsCollection for GraphicStore {
    fn add(&self, drawable: DrawableRef) -> bool {
        for watcher in self.snapshot_watchers() {
            if watcher.before_add(&drawable) == HookDecision::Veto {
                debug!(uid = %drawable.uid(), "加入图形被否决");
                return false;
            }
        }
        trace!(uid = %drawable.uid(), "加入图形");
        self.items.borrow_mut().push(drawable);
        true
    }

    fn remove(&self, drawable: &DrawableRef) -> bool {
        if self.find(drawable.as_ref()).is_none() {
            return false;
        }
        for watcher in self.snapshot_watchers() {
            if watcher.before_remove(drawable) == HookDecision::Veto {
                debug!(uid = %drawable.uid(), "移除图形被否决");
                return false;
            }
        }
        // 监听器可能改变了顺序，重新定位
        let Some(index) = self.find(drawable.as_ref()) else {
            return false;
        };
        trace!(uid = %drawable.uid(), "移除图形");
        self.items.borrow_mut().remove(index);
        true
    }

    fn find(&self, drawable: &dyn Drawable) -> Option<usize> {
        let uid = drawable.uid();
        self.items.borrow().iter().position(|d| d.uid() == uid)
    }

    fn len(&self) -> usize {
        self.items.borrow().len()
    }

    fn watch(&self, watcher: Rc<dyn CollectionWatcher>) -> WatchHandle {
        let handle = WatchHandle(self.next_handle.get());
        self.next_handle.set(handle.0 + 1);
        self.watchers.borrow_mut().push((handle, watcher));
        handle
    }

    fn unwatch(&self, handle: WatchHandle) {
        self.watchers.borrow_mut().retain(|(h, _)| *h != handle);
    }
}

/// 原生图形图层
pub struct GraphicsLayer {
    id: String,
    opacity: f32,
    store: Rc<GraphicStore>,
}

impl GraphicsLayer {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            opacity: 1.0,
            store: Rc::new(GraphicStore::new()),
        }
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn store(&self) -> &Rc<GraphicStore> {
        &self.store
    }
}

impl ParentLayer for GraphicsLayer {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn kind(&self) -> LayerKind {
        LayerKind::Graphics
    }

    fn opacity(&self) -> f32 {
        self.opacity
    }

    fn object_id_field(&self) -> Option<String> {
        None
    }

    fn graphics(&self) -> Option<Rc<dyn GraphicsCollection>> {
        Some(self.store.clone())
    }

    // 原生图层不需要过滤器
    fn set_suppression_filter(&self, _filter: Option<SuppressionFilter>) {}
}

/// 要素图层
pub struct FeatureLayer {
    id: String,
    opacity: f32,
    object_id_field: Option<String>,
    filter: RefCell<Option<SuppressionFilter>>,
    /// 每次安装的过滤器（`None` 表示清除）
    filter_history: RefCell<Vec<Option<String>>>,
}

impl FeatureLayer {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            opacity: 1.0,
            object_id_field: None,
            filter: RefCell::new(None),
            filter_history: RefCell::new(Vec::new()),
        }
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_object_id_field(mut self, field: impl Into<String>) -> Self {
        self.object_id_field = Some(field.into());
        self
    }

    /// 当前过滤器
    pub fn filter(&self) -> Option<SuppressionFilter> {
        self.filter.borrow().clone()
    }

    /// 当前 where 子句
    pub fn where_clause(&self) -> Option<String> {
        self.filter.borrow().as_ref().map(|f| f.where_clause())
    }

    /// 安装过的 where 子句序列
    pub fn filter_history(&self) -> Vec<Option<String>> {
        self.filter_history.borrow().clone()
    }
}

impl ParentLayer for FeatureLayer {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn kind(&self) -> LayerKind {
        LayerKind::Feature
    }

    fn opacity(&self) -> f32 {
        self.opacity
    }

    fn object_id_field(&self) -> Option<String> {
        self.object_id_field.clone()
    }

    fn graphics(&self) -> Option<Rc<dyn GraphicsCollection>> {
        None
    }

    fn set_suppression_filter(&self, filter: Option<SuppressionFilter>) {
        self.filter_history
            .borrow_mut()
            .push(filter.as_ref().map(|f| f.where_clause()));
        *self.filter.borrow_mut() = filter;
    }
}

/// 地图视图
#[derive(Default)]
pub struct MapView {
    /// 绘制顺序（底层在前）
    layers: RefCell<Vec<String>>,
    overlays: RefCell<HashMap<String, Rc<GraphicStore>>>,
    updating: Cell<bool>,
}

impl MapView {
    pub fn new() -> Self {
        Self::default()
    }

    /// 在顶部追加图层
    pub fn add_layer(&self, id: impl Into<String>) {
        self.layers.borrow_mut().push(id.into());
    }

    pub fn layer_ids(&self) -> Vec<String> {
        self.layers.borrow().clone()
    }

    /// 覆盖图层的图形集合
    pub fn overlay(&self, id: &str) -> Option<Rc<GraphicStore>> {
        self.overlays.borrow().get(id).cloned()
    }

    /// 开始一次渲染/更新过程
    pub fn begin_update(&self) {
        self.updating.set(true);
    }

    /// 结束渲染/更新过程
    pub fn end_update(&self) {
        self.updating.set(false);
    }
}

impl DisplayContext for MapView {
    fn layer_index(&self, layer_id: &str) -> Option<usize> {
        self.layers.borrow().iter().position(|id| id == layer_id)
    }

    fn insert_overlay(&self, overlay_id: &str, index: usize) -> Rc<dyn GraphicsCollection> {
        let store = Rc::new(GraphicStore::new());
        {
            let mut layers = self.layers.borrow_mut();
            let index = index.min(layers.len());
            layers.insert(index, overlay_id.to_string());
        }
        self.overlays
            .borrow_mut()
            .insert(overlay_id.to_string(), store.clone());
        debug!(overlay = %overlay_id, index, "插入覆盖图层");
        store
    }

    fn remove_overlay(&self, overlay_id: &str) {
        self.layers.borrow_mut().retain(|id| id != overlay_id);
        self.overlays.borrow_mut().remove(overlay_id);
        debug!(overlay = %overlay_id, "移除覆盖图层");
    }

    fn is_updating(&self) -> bool {
        self.updating.get()
    }
}
