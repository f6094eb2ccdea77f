//! Arena storage for the widget tree.
//!
//! Widgets are stored in a `SlotMap` keyed by [`WidgetId`]. Ownership runs
//! strictly top-down: a Box lists its children by id, and the parent link
//! is a secondary map used only for upward queries ("walk to root").
//! Removing a widget removes its whole subtree.

use slotmap::{SecondaryMap, SlotMap};

use super::node::{WidgetBase, WidgetId};
use super::traits::Widget;
use crate::widgets::container::BoxState;

// ---------------------------------------------------------------------------
// WidgetKind / WidgetNode
// ---------------------------------------------------------------------------

/// The closed set of widget kinds.
pub enum WidgetKind {
    /// A container laying out its children.
    Box(BoxState),
    /// Any leaf widget, behind the [`Widget`] trait.
    Leaf(Box<dyn Widget>),
}

impl std::fmt::Debug for WidgetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WidgetKind::Box(state) => f.debug_tuple("Box").field(state).finish(),
            WidgetKind::Leaf(w) => f.debug_tuple("Leaf").field(&w.class_name()).finish(),
        }
    }
}

/// One arena slot: shared base state plus the kind-specific state.
#[derive(Debug)]
pub struct WidgetNode {
    pub base: WidgetBase,
    pub kind: WidgetKind,
}

impl WidgetNode {
    pub fn is_box(&self) -> bool {
        matches!(self.kind, WidgetKind::Box(_))
    }

    pub fn as_box(&self) -> Option<&BoxState> {
        match &self.kind {
            WidgetKind::Box(state) => Some(state),
            WidgetKind::Leaf(_) => None,
        }
    }

    pub fn as_box_mut(&mut self) -> Option<&mut BoxState> {
        match &mut self.kind {
            WidgetKind::Box(state) => Some(state),
            WidgetKind::Leaf(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// WidgetArena
// ---------------------------------------------------------------------------

/// Every live widget, with parent links.
#[derive(Debug, Default)]
pub struct WidgetArena {
    nodes: SlotMap<WidgetId, WidgetNode>,
    parents: SecondaryMap<WidgetId, WidgetId>,
}

impl WidgetArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a detached widget.
    pub fn insert(&mut self, base: WidgetBase, kind: WidgetKind) -> WidgetId {
        self.nodes.insert(WidgetNode { base, kind })
    }

    pub fn contains(&self, id: WidgetId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: WidgetId) -> Option<&WidgetNode> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: WidgetId) -> Option<&mut WidgetNode> {
        self.nodes.get_mut(id)
    }

    pub fn base(&self, id: WidgetId) -> Option<&WidgetBase> {
        self.nodes.get(id).map(|n| &n.base)
    }

    pub fn base_mut(&mut self, id: WidgetId) -> Option<&mut WidgetBase> {
        self.nodes.get_mut(id).map(|n| &mut n.base)
    }

    pub fn box_state(&self, id: WidgetId) -> Option<&BoxState> {
        self.nodes.get(id).and_then(WidgetNode::as_box)
    }

    pub fn box_state_mut(&mut self, id: WidgetId) -> Option<&mut BoxState> {
        self.nodes.get_mut(id).and_then(WidgetNode::as_box_mut)
    }

    pub fn is_box(&self, id: WidgetId) -> bool {
        self.nodes.get(id).is_some_and(WidgetNode::is_box)
    }

    /// Downcast a leaf widget to its concrete type.
    pub fn leaf<T: Widget + 'static>(&self, id: WidgetId) -> Option<&T> {
        match &self.nodes.get(id)?.kind {
            WidgetKind::Leaf(w) => w.as_any().downcast_ref::<T>(),
            WidgetKind::Box(_) => None,
        }
    }

    pub fn leaf_mut<T: Widget + 'static>(&mut self, id: WidgetId) -> Option<&mut T> {
        match &mut self.nodes.get_mut(id)?.kind {
            WidgetKind::Leaf(w) => w.as_any_mut().downcast_mut::<T>(),
            WidgetKind::Box(_) => None,
        }
    }

    /// Children in display order (empty for leaves).
    pub fn children(&self, id: WidgetId) -> &[WidgetId] {
        self.box_state(id).map(|b| b.children.as_slice()).unwrap_or(&[])
    }

    pub fn parent(&self, id: WidgetId) -> Option<WidgetId> {
        self.parents.get(id).copied()
    }

    pub(crate) fn set_parent(&mut self, child: WidgetId, parent: WidgetId) {
        self.parents.insert(child, parent);
    }

    pub(crate) fn clear_parent(&mut self, child: WidgetId) {
        self.parents.remove(child);
    }

    /// The top-level widget containing `id` (possibly `id` itself).
    pub fn root_of(&self, mut id: WidgetId) -> WidgetId {
        while let Some(parent) = self.parent(id) {
            id = parent;
        }
        id
    }

    /// Ancestors from the immediate parent up to the root.
    pub fn ancestors(&self, id: WidgetId) -> Vec<WidgetId> {
        let mut result = Vec::new();
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            result.push(parent);
            current = parent;
        }
        result
    }

    /// Pre-order depth-first traversal starting from `start`.
    pub fn walk_depth_first(&self, start: WidgetId) -> Vec<WidgetId> {
        let mut result = Vec::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if !self.nodes.contains_key(current) {
                continue;
            }
            result.push(current);
            for &child in self.children(current).iter().rev() {
                stack.push(child);
            }
        }
        result
    }

    /// Remove `id` and its whole subtree. Returns the removed ids, root first.
    ///
    /// The caller is responsible for unlinking `id` from its parent's child
    /// list.
    pub fn remove_subtree(&mut self, id: WidgetId) -> Vec<WidgetId> {
        let doomed = self.walk_depth_first(id);
        for &d in &doomed {
            self.nodes.remove(d);
            self.parents.remove(d);
        }
        doomed
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = WidgetId> + '_ {
        self.nodes.keys()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::container::BoxState;
    use crate::widgets::label::Label;

    /// ```text
    ///       root
    ///      /    \
    ///    a        b
    ///   / \
    ///  c   d
    /// ```
    fn build_tree() -> (WidgetArena, [WidgetId; 5]) {
        let mut arena = WidgetArena::new();
        let mk_box = |arena: &mut WidgetArena| {
            arena.insert(WidgetBase::new("Box"), WidgetKind::Box(BoxState::new(false, true)))
        };
        let root = mk_box(&mut arena);
        let a = mk_box(&mut arena);
        let b = arena.insert(WidgetBase::new("Label"), WidgetKind::Leaf(Box::new(Label::new("b"))));
        let c = arena.insert(WidgetBase::new("Label"), WidgetKind::Leaf(Box::new(Label::new("c"))));
        let d = arena.insert(WidgetBase::new("Label"), WidgetKind::Leaf(Box::new(Label::new("d"))));
        for (parent, child) in [(root, a), (root, b), (a, c), (a, d)] {
            if let Some(state) = arena.box_state_mut(parent) {
                state.children.push(child);
            }
            arena.set_parent(child, parent);
        }
        (arena, [root, a, b, c, d])
    }

    #[test]
    fn parent_and_root_queries() {
        let (arena, [root, a, _b, c, _d]) = build_tree();
        assert_eq!(arena.parent(c), Some(a));
        assert_eq!(arena.parent(root), None);
        assert_eq!(arena.root_of(c), root);
        assert_eq!(arena.ancestors(c), vec![a, root]);
    }

    #[test]
    fn walk_is_preorder() {
        let (arena, [root, a, b, c, d]) = build_tree();
        assert_eq!(arena.walk_depth_first(root), vec![root, a, c, d, b]);
        assert_eq!(arena.walk_depth_first(a), vec![a, c, d]);
    }

    #[test]
    fn leaf_downcast() {
        let (arena, [root, _a, b, ..]) = build_tree();
        assert_eq!(arena.leaf::<Label>(b).map(Label::text), Some("b"));
        assert!(arena.leaf::<Label>(root).is_none());
        assert!(arena.is_box(root));
    }

    #[test]
    fn remove_subtree_drops_descendants() {
        let (mut arena, [root, a, b, c, d]) = build_tree();
        let removed = arena.remove_subtree(a);
        assert_eq!(removed, vec![a, c, d]);
        assert!(!arena.contains(c));
        assert!(arena.contains(b));
        assert!(arena.contains(root));
        assert_eq!(arena.len(), 2);
        assert!(arena.parent(c).is_none());
    }
}
