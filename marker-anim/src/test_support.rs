//! 单元测试用的宿主替身。

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::filter::SuppressionFilter;
use crate::symbol::Symbol;
use crate::traits::{
    CollectionWatcher, DisplayContext, Drawable, DrawableRef, EmbeddedImageSource,
    GraphicsCollection, HookDecision, LayerKind, ParentLayer, WatchHandle,
};

pub struct TestGraphic {
    uid: String,
    object_id: Option<u64>,
    symbol: RefCell<Symbol>,
    destroyed: Cell<bool>,
}

impl TestGraphic {
    pub fn new(uid: &str, object_id: Option<u64>, symbol: Symbol) -> Self {
        Self {
            uid: uid.to_string(),
            object_id,
            symbol: RefCell::new(symbol),
            destroyed: Cell::new(false),
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }
}

impl Drawable for TestGraphic {
    fn uid(&self) -> String {
        self.uid.clone()
    }

    fn object_id(&self) -> Option<u64> {
        self.object_id
    }

    fn symbol(&self) -> Symbol {
        self.symbol.borrow().clone()
    }

    fn set_symbol(&self, symbol: Symbol) {
        *self.symbol.borrow_mut() = symbol;
    }

    fn destroy(&self) {
        self.destroyed.set(true);
    }
}

#[derive(Default)]
pub struct TestImages {
    cached: HashMap<String, String>,
    pub requested: RefCell<Vec<String>>,
}

impl TestImages {
    pub fn with(url: &str) -> Self {
        let mut images = Self::default();
        images
            .cached
            .insert(url.to_string(), "data:image/png;base64,AAAA".to_string());
        images
    }
}

impl EmbeddedImageSource for TestImages {
    fn get_embedded(&self, url: &str) -> Option<String> {
        self.cached.get(url).cloned()
    }

    fn request(&self, url: &str) {
        self.requested.borrow_mut().push(url.to_string());
    }
}

#[derive(Default)]
pub struct TestCollection {
    items: RefCell<Vec<DrawableRef>>,
    watchers: RefCell<Vec<(WatchHandle, Rc<dyn CollectionWatcher>)>>,
    next_handle: Cell<u64>,
}

impl TestCollection {
    pub fn contains(&self, uid: &str) -> bool {
        self.items.borrow().iter().any(|d| d.uid() == uid)
    }

    pub fn watcher_count(&self) -> usize {
        self.watchers.borrow().len()
    }

    fn watchers(&self) -> Vec<Rc<dyn CollectionWatcher>> {
        self.watchers.borrow().iter().map(|(_, w)| w.clone()).collect()
    }
}

impl GraphicsCollection for TestCollection {
    fn add(&self, drawable: DrawableRef) -> bool {
        for watcher in self.watchers() {
            if watcher.before_add(&drawable) == HookDecision::Veto {
                return false;
            }
        }
        self.items.borrow_mut().push(drawable);
        true
    }

    fn remove(&self, drawable: &DrawableRef) -> bool {
        let Some(index) = self.find(drawable.as_ref()) else {
            return false;
        };
        for watcher in self.watchers() {
            if watcher.before_remove(drawable) == HookDecision::Veto {
                return false;
            }
        }
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

pub struct TestLayer {
    id: String,
    kind: LayerKind,
    opacity: f32,
    graphics: Option<Rc<TestCollection>>,
    pub filter: RefCell<Option<SuppressionFilter>>,
}

impl TestLayer {
    pub fn feature(id: &str, opacity: f32) -> Self {
        Self {
            id: id.to_string(),
            kind: LayerKind::Feature,
            opacity,
            graphics: None,
            filter: RefCell::new(None),
        }
    }

    pub fn graphics(id: &str) -> Self {
        Self {
            id: id.to_string(),
            kind: LayerKind::Graphics,
            opacity: 1.0,
            graphics: Some(Rc::new(TestCollection::default())),
            filter: RefCell::new(None),
        }
    }

    pub fn collection(&self) -> Option<Rc<TestCollection>> {
        self.graphics.clone()
    }

    pub fn where_clause(&self) -> Option<String> {
        self.filter.borrow().as_ref().map(|f| f.where_clause())
    }
}

impl ParentLayer for TestLayer {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn kind(&self) -> LayerKind {
        self.kind.clone()
    }

    fn opacity(&self) -> f32 {
        self.opacity
    }

    fn object_id_field(&self) -> Option<String> {
        None
    }

    fn graphics(&self) -> Option<Rc<dyn GraphicsCollection>> {
        self.graphics
            .clone()
            .map(|g| g as Rc<dyn GraphicsCollection>)
    }

    fn set_suppression_filter(&self, filter: Option<SuppressionFilter>) {
        *self.filter.borrow_mut() = filter;
    }
}

#[derive(Default)]
pub struct TestView {
    pub layers: RefCell<Vec<String>>,
    overlays: RefCell<HashMap<String, Rc<TestCollection>>>,
    pub updating: Cell<bool>,
}

impl TestView {
    pub fn with_layers(ids: &[&str]) -> Self {
        let view = Self::default();
        *view.layers.borrow_mut() = ids.iter().map(|id| id.to_string()).collect();
        view
    }

    pub fn overlay(&self, id: &str) -> Option<Rc<TestCollection>> {
        self.overlays.borrow().get(id).cloned()
    }
}

impl DisplayContext for TestView {
    fn layer_index(&self, layer_id: &str) -> Option<usize> {
        self.layers.borrow().iter().position(|id| id == layer_id)
    }

    fn insert_overlay(&self, overlay_id: &str, index: usize) -> Rc<dyn GraphicsCollection> {
        let collection = Rc::new(TestCollection::default());
        let mut layers = self.layers.borrow_mut();
        let index = index.min(layers.len());
        layers.insert(index, overlay_id.to_string());
        self.overlays
            .borrow_mut()
            .insert(overlay_id.to_string(), collection.clone());
        collection
    }

    fn remove_overlay(&self, overlay_id: &str) {
        self.layers.borrow_mut().retain(|id| id != overlay_id);
        self.overlays.borrow_mut().remove(overlay_id);
    }

    fn is_updating(&self) -> bool {
        self.updating.get()
    }
}
