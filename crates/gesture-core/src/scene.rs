#![forbid(unsafe_code)]

//! Scene-graph collaborator interface.
//!
//! The node tree, rendering and picking live outside this crate. Drag
//! listeners only need to read and write a node's local matrix and to know
//! the transform from a node's parent frame to the global frame, which is
//! what [`SceneGraph`] exposes. [`SceneTree`] is a minimal in-memory
//! implementation for hosts without their own tree and for tests.
//!
//! [`TransformNotifier`] delivers "an ancestor's transform changed" signals.
//! A [`TransformSubscription`] is an owned handle: dropping it unsubscribes,
//! so a gesture session that owns one releases it deterministically when
//! the session ends.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use ahash::AHashMap;

use crate::geometry::{Matrix3, Transform};

/// Identity of a scene node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// SceneGraph
// ---------------------------------------------------------------------------

/// What drag listeners need from the host scene graph.
pub trait SceneGraph {
    /// The node's own (local) matrix, or `None` for unknown nodes.
    fn matrix(&self, node: NodeId) -> Option<Matrix3>;

    /// Replace the node's own matrix.
    fn set_matrix(&mut self, node: NodeId, matrix: Matrix3);

    /// The node's parent on the trail to the root.
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Ancestors from the parent up to the trail root.
    fn ancestors(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cur = self.parent(node);
        while let Some(id) = cur {
            out.push(id);
            cur = self.parent(id);
        }
        out
    }

    /// Matrix mapping the node's parent frame into the global frame.
    fn parent_to_global(&self, node: NodeId) -> Matrix3 {
        self.ancestors(node)
            .iter()
            .fold(Matrix3::IDENTITY, |acc, id| {
                self.matrix(*id).unwrap_or_default().multiply(&acc)
            })
    }

    /// Invertible form of [`parent_to_global`](SceneGraph::parent_to_global),
    /// falling back to identity for degenerate ancestor chains.
    fn parent_to_global_transform(&self, node: NodeId) -> Transform {
        Transform::new(self.parent_to_global(node)).unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// SceneTree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct NodeData {
    parent: Option<NodeId>,
    matrix: Matrix3,
}

/// Minimal parent/matrix tree.
///
/// When built with a [`TransformNotifier`], every `set_matrix` is announced
/// to subscribers watching that node.
#[derive(Debug, Default)]
pub struct SceneTree {
    nodes: AHashMap<NodeId, NodeData>,
    next_id: u64,
    notifier: Option<TransformNotifier>,
}

impl SceneTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tree that announces matrix changes through `notifier`.
    #[must_use]
    pub fn with_notifier(notifier: TransformNotifier) -> Self {
        Self {
            notifier: Some(notifier),
            ..Self::default()
        }
    }

    /// Add a node under `parent` (or as a root).
    pub fn add_node(&mut self, parent: Option<NodeId>, matrix: Matrix3) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, NodeData { parent, matrix });
        id
    }

    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl SceneGraph for SceneTree {
    fn matrix(&self, node: NodeId) -> Option<Matrix3> {
        self.nodes.get(&node).map(|n| n.matrix)
    }

    fn set_matrix(&mut self, node: NodeId, matrix: Matrix3) {
        if let Some(data) = self.nodes.get_mut(&node) {
            data.matrix = matrix;
            if let Some(notifier) = &self.notifier {
                notifier.notify(node);
            }
        }
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node).and_then(|n| n.parent)
    }
}

// ---------------------------------------------------------------------------
// TransformNotifier
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Watch {
    id: u64,
    watched: Vec<NodeId>,
    changed: bool,
}

#[derive(Debug, Default)]
struct NotifierInner {
    next_id: u64,
    watches: Vec<Watch>,
}

/// Broadcasts node transform changes to subscriptions.
#[derive(Debug, Clone, Default)]
pub struct TransformNotifier {
    inner: Rc<RefCell<NotifierInner>>,
}

impl TransformNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Watch `nodes` for transform changes.
    #[must_use]
    pub fn subscribe(&self, nodes: Vec<NodeId>) -> TransformSubscription {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.watches.push(Watch {
            id,
            watched: nodes,
            changed: false,
        });
        TransformSubscription {
            id,
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Announce that `node`'s transform changed.
    pub fn notify(&self, node: NodeId) {
        for watch in &mut self.inner.borrow_mut().watches {
            if watch.watched.contains(&node) {
                watch.changed = true;
            }
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.inner.borrow().watches.len()
    }
}

/// Owned subscription; unsubscribes on drop.
pub struct TransformSubscription {
    id: u64,
    inner: Weak<RefCell<NotifierInner>>,
}

impl fmt::Debug for TransformSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformSubscription")
            .field("id", &self.id)
            .field("live", &self.inner.strong_count())
            .finish()
    }
}

impl TransformSubscription {
    /// Return and clear the "changed since last check" flag.
    pub fn take_changed(&mut self) -> bool {
        let Some(inner) = self.inner.upgrade() else {
            return false;
        };
        let mut inner = inner.borrow_mut();
        inner
            .watches
            .iter_mut()
            .find(|w| w.id == self.id)
            .is_some_and(|w| std::mem::take(&mut w.changed))
    }
}

impl Drop for TransformSubscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.borrow_mut().watches.retain(|w| w.id != self.id);
        }
    }
}
