//! # Graphic 模块
//!
//! 宿主侧的点图形：一个可替换的符号槽位加上身份信息。

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use marker_anim::{Drawable, Symbol};
use tracing::trace;

static NEXT_UID: AtomicU64 = AtomicU64::new(1);

fn next_uid() -> String {
    format!("graphic-{}", NEXT_UID.fetch_add(1, Ordering::Relaxed))
}

/// 点图形
#[derive(Debug)]
pub struct Graphic {
    uid: String,
    object_id: Option<u64>,
    symbol: RefCell<Symbol>,
    destroyed: Cell<bool>,
}

impl Graphic {
    /// 创建带自动 uid 的图形
    pub fn new(symbol: impl Into<Symbol>) -> Self {
        Self {
            uid: next_uid(),
            object_id: None,
            symbol: RefCell::new(symbol.into()),
            destroyed: Cell::new(false),
        }
    }

    /// 要素图形（带对象 ID）
    pub fn feature(object_id: u64, symbol: impl Into<Symbol>) -> Self {
        Self {
            object_id: Some(object_id),
            ..Self::new(symbol)
        }
    }

    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = uid.into();
        self
    }

    pub fn into_ref(self) -> Rc<Self> {
        Rc::new(self)
    }

    /// 是否已被销毁
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }
}

impl Drawable for Graphic {
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
        if self.destroyed.get() {
            trace!(uid = %self.uid, "图形已销毁，忽略符号更新");
            return;
        }
        *self.symbol.borrow_mut() = symbol;
    }

    fn destroy(&self) {
        self.destroyed.set(true);
    }
}
