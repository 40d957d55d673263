//! # Filter 模块
//!
//! 抑制过滤器：在父图层上隐藏正在被动画的原始要素。
//!
//! 被隐藏的要素仍保留交互（命中测试、弹窗），只是以几乎不可见的效果绘制。
//! [`ExclusionFilter`] 作为覆盖图层的结构监听器维护被排除的对象 ID 集合，
//! 每次集合变化都重建父图层的过滤谓词。

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::animator::AnimatingFlag;
use crate::traits::{CollectionWatcher, DrawableRef, HookDecision, ParentLayer};

/// 默认对象 ID 字段
pub const DEFAULT_OBJECT_ID_FIELD: &str = "OBJECTID";

/// 被包含要素的绘制效果：几乎不可见，但非零
pub const SUPPRESSED_EFFECT: &str = "opacity(0.001%)";

/// 过滤谓词
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterPredicate {
    /// 恒为假，不匹配任何要素
    Never,
    /// `<field> IN (<ids>)`，ID 升序
    ObjectIdIn { field: String, ids: Vec<u64> },
}

impl fmt::Display for FilterPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterPredicate::Never => f.write_str("1=0"),
            FilterPredicate::ObjectIdIn { field, ids } => {
                let list = ids
                    .iter()
                    .map(|id| id.to_string())
                    .collect::<Vec<_>>()
                    .join(",");
                write!(f, "{field} IN ({list})")
            }
        }
    }
}

/// 安装到父图层上的抑制过滤器
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuppressionFilter {
    /// 匹配被隐藏要素的谓词
    pub predicate: FilterPredicate,
    /// 匹配要素的绘制效果
    pub included_effect: String,
}

impl SuppressionFilter {
    pub fn new(predicate: FilterPredicate) -> Self {
        Self {
            predicate,
            included_effect: SUPPRESSED_EFFECT.to_string(),
        }
    }

    /// 谓词的 where 子句形式
    pub fn where_clause(&self) -> String {
        self.predicate.to_string()
    }
}

/// 被跟踪的动画图形
#[derive(Debug, Clone)]
struct Tracked {
    is_overlay: bool,
    animating: AnimatingFlag,
}

#[derive(Default)]
struct ExclusionState {
    excluded: BTreeSet<u64>,
    tracked: HashMap<String, Tracked>,
    vetoed: HashMap<String, DrawableRef>,
}

/// 排除集合 + 父图层过滤器维护
pub struct ExclusionFilter {
    parent: Rc<dyn ParentLayer>,
    field: String,
    state: RefCell<ExclusionState>,
}

impl fmt::Debug for ExclusionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ExclusionFilter")
            .field("field", &self.field)
            .field("excluded", &state.excluded)
            .field("tracked", &state.tracked.len())
            .finish()
    }
}

impl ExclusionFilter {
    /// 创建并立即安装"不隐藏任何要素"的过滤器
    pub fn new(parent: Rc<dyn ParentLayer>, field: impl Into<String>) -> Self {
        let filter = Self {
            parent,
            field: field.into(),
            state: RefCell::new(ExclusionState::default()),
        };
        filter.apply();
        filter
    }

    /// 登记一个由管理器创建的动画图形
    pub fn track(&self, uid: &str, is_overlay: bool, animating: AnimatingFlag) {
        self.state.borrow_mut().tracked.insert(
            uid.to_string(),
            Tracked {
                is_overlay,
                animating,
            },
        );
    }

    /// 取消登记
    pub fn untrack(&self, uid: &str) {
        self.state.borrow_mut().tracked.remove(uid);
    }

    /// 是否已登记
    pub fn is_tracked(&self, uid: &str) -> bool {
        self.state.borrow().tracked.contains_key(uid)
    }

    /// 取出因动画进行中而被否决的移除
    pub fn take_vetoed(&self, uid: &str) -> Option<DrawableRef> {
        self.state.borrow_mut().vetoed.remove(uid)
    }

    /// 当前被排除的对象 ID（升序）
    pub fn excluded_ids(&self) -> Vec<u64> {
        self.state.borrow().excluded.iter().copied().collect()
    }

    /// 当前谓词
    pub fn predicate(&self) -> FilterPredicate {
        let state = self.state.borrow();
        if state.excluded.is_empty() {
            FilterPredicate::Never
        } else {
            FilterPredicate::ObjectIdIn {
                field: self.field.clone(),
                ids: state.excluded.iter().copied().collect(),
            }
        }
    }

    /// 清空所有状态并从父图层移除过滤器
    pub fn clear(&self) {
        {
            let mut state = self.state.borrow_mut();
            state.excluded.clear();
            state.tracked.clear();
            state.vetoed.clear();
        }
        self.parent.set_suppression_filter(None);
    }

    /// 重建并安装过滤器
    fn apply(&self) {
        let filter = SuppressionFilter::new(self.predicate());
        debug!(layer = %self.parent.id(), filter = %filter.predicate, "更新抑制过滤器");
        self.parent.set_suppression_filter(Some(filter));
    }
}

impl CollectionWatcher for ExclusionFilter {
    fn before_add(&self, drawable: &DrawableRef) -> HookDecision {
        let changed = {
            let mut state = self.state.borrow_mut();
            let excludable = state
                .tracked
                .get(&drawable.uid())
                .is_some_and(|t| !t.is_overlay);
            match drawable.object_id() {
                Some(object_id) if excludable => state.excluded.insert(object_id),
                _ => false,
            }
        };
        if changed {
            self.apply();
        }
        HookDecision::Proceed
    }

    fn before_remove(&self, drawable: &DrawableRef) -> HookDecision {
        let uid = drawable.uid();
        let changed = {
            let mut state = self.state.borrow_mut();
            let animating = state
                .tracked
                .get(&uid)
                .is_some_and(|t| t.animating.get());
            if animating {
                debug!(uid = %uid, "图形仍在动画中，推迟移除");
                state.vetoed.insert(uid, drawable.clone());
                return HookDecision::Veto;
            }
            state.tracked.remove(&uid);
            match drawable.object_id() {
                Some(object_id) => state.excluded.remove(&object_id),
                None => false,
            }
        };
        if changed {
            self.apply();
        }
        HookDecision::Proceed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::Symbol;
    use crate::test_support::{TestGraphic, TestLayer};

    fn graphic(uid: &str, object_id: Option<u64>) -> DrawableRef {
        Rc::new(TestGraphic::new(uid, object_id, Symbol::other("marker")))
    }

    fn filter() -> (Rc<TestLayer>, ExclusionFilter) {
        let layer = Rc::new(TestLayer::feature("points", 1.0));
        let filter = ExclusionFilter::new(layer.clone(), DEFAULT_OBJECT_ID_FIELD);
        (layer, filter)
    }

    #[test]
    fn test_predicate_display() {
        assert_eq!(FilterPredicate::Never.to_string(), "1=0");
        let predicate = FilterPredicate::ObjectIdIn {
            field: "FID".to_string(),
            ids: vec![3, 10, 200],
        };
        insta::assert_snapshot!(predicate.to_string(), @"FID IN (3,10,200)");
    }

    #[test]
    fn test_new_installs_never_filter() {
        let (layer, _filter) = filter();
        assert_eq!(layer.where_clause().as_deref(), Some("1=0"));
    }

    #[test]
    fn test_untracked_graphics_are_ignored() {
        let (layer, filter) = filter();
        let g = graphic("g1", Some(5));
        assert_eq!(filter.before_add(&g), HookDecision::Proceed);
        assert!(filter.excluded_ids().is_empty());
        assert_eq!(layer.where_clause().as_deref(), Some("1=0"));
    }

    #[test]
    fn test_add_and_remove_update_filter() {
        let (layer, filter) = filter();
        let g = graphic("g1", Some(999));
        filter.track("g1", false, AnimatingFlag::default());

        filter.before_add(&g);
        assert_eq!(filter.excluded_ids(), vec![999]);
        assert_eq!(layer.where_clause().as_deref(), Some("OBJECTID IN (999)"));

        assert_eq!(filter.before_remove(&g), HookDecision::Proceed);
        assert!(!filter.is_tracked("g1"));
        assert_eq!(layer.where_clause().as_deref(), Some("1=0"));
    }

    #[test]
    fn test_graphic_without_object_id_is_not_excluded() {
        let (_layer, filter) = filter();
        let g = graphic("g1", None);
        filter.track("g1", false, AnimatingFlag::default());
        filter.before_add(&g);
        assert_eq!(filter.predicate(), FilterPredicate::Never);
    }

    #[test]
    fn test_clear_removes_parent_filter() {
        let (layer, filter) = filter();
        filter.track("g1", false, AnimatingFlag::default());
        filter.before_add(&graphic("g1", Some(1)));

        filter.clear();
        assert!(layer.filter.borrow().is_none());
        assert!(filter.excluded_ids().is_empty());
        assert!(!filter.is_tracked("g1"));
    }
}
