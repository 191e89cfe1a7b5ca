pub mod node;
pub mod primitive;

pub use node::{BooleanOp, Displacement, NodeData, NodeId, NodeKind};
pub use primitive::{Ellipsoid, PolyconeStack, Primitive, Tube, ZPlane};

use std::collections::HashSet;

use crate::error::TreeError;
use crate::math::{Rotation3, Vector3};
use slotmap::SlotMap;

/// Central arena that owns all CSG nodes of one tree family.
///
/// Nodes reference their children via typed IDs (generational indices).
/// There are no up-links; parents are recovered by building a
/// [`ParentMap`](crate::operations::tree::ParentMap).
#[derive(Debug, Default)]
pub struct CsgStore {
    nodes: SlotMap<NodeId, NodeData>,
}

impl CsgStore {
    /// Creates a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the store holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns `true` if `id` refers to a live node.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Inserts a node and returns its ID.
    pub fn add_node(&mut self, data: NodeData) -> NodeId {
        self.nodes.insert(data)
    }

    /// Returns a reference to the node data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is not in the store.
    pub fn node(&self, id: NodeId) -> Result<&NodeData, TreeError> {
        self.nodes
            .get(id)
            .ok_or_else(|| TreeError::NodeNotFound(format!("{id:?}")))
    }

    /// Returns a mutable reference to the node data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is not in the store.
    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeData, TreeError> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| TreeError::NodeNotFound(format!("{id:?}")))
    }

    // --- Builders ---

    /// Inserts a primitive leaf.
    pub fn add_primitive(
        &mut self,
        name: impl Into<String>,
        shape: impl Into<Primitive>,
    ) -> NodeId {
        self.add_node(NodeData::primitive(name, shape))
    }

    /// Inserts a displacement wrapper around `child`.
    pub fn add_displaced(
        &mut self,
        child: NodeId,
        rotation: Rotation3,
        translation: Vector3,
    ) -> NodeId {
        self.add_node(NodeData::displaced(child, rotation, translation))
    }

    /// Inserts a boolean node.
    ///
    /// When `translation` is given, the right operand is wrapped in a fresh
    /// displacement first. The left operand is always used as is.
    pub fn add_boolean(
        &mut self,
        name: impl Into<String>,
        op: BooleanOp,
        left: NodeId,
        right: NodeId,
        translation: Option<Vector3>,
    ) -> NodeId {
        let right = match translation {
            Some(t) => self.add_displaced(right, Rotation3::identity(), t),
            None => right,
        };
        self.add_node(NodeData::boolean(name, op, left, right))
    }

    // --- Structural queries ---

    /// Follows a chain of displacement wrappers down to the node they wrap.
    ///
    /// Returns `id` itself when it is not a wrapper.
    ///
    /// # Errors
    ///
    /// Returns an error if any node on the chain is missing.
    pub fn unwrap_displaced(&self, id: NodeId) -> Result<NodeId, TreeError> {
        let mut current = id;
        while let Some(d) = self.node(current)?.displacement() {
            current = d.child;
        }
        Ok(current)
    }

    /// Returns the wrapper closest to the unwrapped node, if `id` is displaced.
    ///
    /// # Errors
    ///
    /// Returns an error if any node on the chain is missing.
    pub fn innermost_displacement(&self, id: NodeId) -> Result<Option<NodeId>, TreeError> {
        let mut current = id;
        let mut innermost = None;
        while let Some(d) = self.node(current)?.displacement() {
            innermost = Some(current);
            current = d.child;
        }
        Ok(innermost)
    }

    /// Returns the left and right operands reached from tree position `id`.
    ///
    /// Wrappers are seen through, so a displaced boolean still has children.
    ///
    /// # Errors
    ///
    /// Returns an error if a node is missing.
    pub fn children(&self, id: NodeId) -> Result<Option<(NodeId, NodeId)>, TreeError> {
        let node = self.node(self.unwrap_displaced(id)?)?;
        Ok(match node.kind {
            NodeKind::Boolean { left, right, .. } => Some((left, right)),
            _ => None,
        })
    }

    /// Returns the node reached by unwrapping `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if a node is missing.
    pub fn resolved(&self, id: NodeId) -> Result<&NodeData, TreeError> {
        self.node(self.unwrap_displaced(id)?)
    }

    /// Returns the shape of the primitive reached by unwrapping `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if a node is missing or the resolved node is not a primitive.
    pub fn primitive(&self, id: NodeId) -> Result<&Primitive, TreeError> {
        let node = self.resolved(id)?;
        match &node.kind {
            NodeKind::Primitive(p) => Ok(p),
            _ => Err(TreeError::NotPrimitive(node.name.clone())),
        }
    }

    /// Returns the mutable shape of the primitive reached by unwrapping `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if a node is missing or the resolved node is not a primitive.
    pub fn primitive_mut(&mut self, id: NodeId) -> Result<&mut Primitive, TreeError> {
        let inner = self.unwrap_displaced(id)?;
        let node = self.node_mut(inner)?;
        match &mut node.kind {
            NodeKind::Primitive(p) => Ok(p),
            _ => Err(TreeError::NotPrimitive(node.name.clone())),
        }
    }

    /// Collects every node reachable from `root`, wrappers included.
    ///
    /// # Errors
    ///
    /// Returns an error if a node is missing.
    pub fn reachable(&self, root: NodeId) -> Result<HashSet<NodeId>, TreeError> {
        let mut seen = HashSet::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            match &self.node(id)?.kind {
                NodeKind::Primitive(_) => {}
                NodeKind::Boolean { left, right, .. } => {
                    stack.push(*left);
                    stack.push(*right);
                }
                NodeKind::Displaced(d) => stack.push(d.child),
            }
        }
        Ok(seen)
    }

    /// Removes every node not reachable from `root` and returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if a node reachable from `root` is missing.
    pub fn retain_reachable(&mut self, root: NodeId) -> Result<usize, TreeError> {
        let keep = self.reachable(root)?;
        let before = self.nodes.len();
        self.nodes.retain(|id, _| keep.contains(&id));
        Ok(before - self.nodes.len())
    }
}

/// A CSG tree: a store together with the root of the solid it describes.
///
/// The tree exclusively owns every node in its store. Use
/// [`DeepClone`](crate::operations::clone::DeepClone) to obtain an
/// independent copy.
#[derive(Debug)]
pub struct CsgTree {
    store: CsgStore,
    root: NodeId,
}

impl CsgTree {
    /// Creates a tree from a store and the root node of the solid.
    #[must_use]
    pub fn new(store: CsgStore, root: NodeId) -> Self {
        Self { store, root }
    }

    /// The root node.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Read access to the node store.
    #[must_use]
    pub fn store(&self) -> &CsgStore {
        &self.store
    }

    /// Write access to the node store.
    pub fn store_mut(&mut self) -> &mut CsgStore {
        &mut self.store
    }

    /// Replaces the root node.
    pub(crate) fn set_root(&mut self, root: NodeId) {
        self.root = root;
    }

    /// Name of the solid at the root.
    ///
    /// # Errors
    ///
    /// Returns an error if the root is missing.
    pub fn name(&self) -> Result<&str, TreeError> {
        Ok(self.store.resolved(self.root)?.name.as_str())
    }

    /// Splits the tree into its store and root.
    #[must_use]
    pub fn into_parts(self) -> (CsgStore, NodeId) {
        (self.store, self.root)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn tube(store: &mut CsgStore, name: &str, hz: f64) -> NodeId {
        store.add_primitive(name, Tube::new(0.0, 1.0, hz))
    }

    #[test]
    fn boolean_with_translation_wraps_right_only() {
        let mut store = CsgStore::new();
        let a = tube(&mut store, "a", 1.0);
        let b = tube(&mut store, "b", 1.0);
        let u = store.add_boolean("u", BooleanOp::Union, a, b, Some(Vector3::new(0.0, 0.0, 3.0)));

        let NodeKind::Boolean { left, right, .. } = store.node(u).unwrap().kind else {
            panic!("expected boolean");
        };
        assert_eq!(left, a);
        assert!(store.node(right).unwrap().is_displaced());
        assert_eq!(store.unwrap_displaced(right).unwrap(), b);
    }

    #[test]
    fn boolean_without_translation_keeps_right_bare() {
        let mut store = CsgStore::new();
        let a = tube(&mut store, "a", 1.0);
        let b = tube(&mut store, "b", 1.0);
        let u = store.add_boolean("u", BooleanOp::Subtraction, a, b, None);
        assert_eq!(store.children(u).unwrap(), Some((a, b)));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn unwrap_follows_nested_wrappers() {
        let mut store = CsgStore::new();
        let a = tube(&mut store, "a", 1.0);
        let inner = store.add_displaced(a, Rotation3::identity(), Vector3::z());
        let outer = store.add_displaced(inner, Rotation3::identity(), Vector3::z());
        assert_eq!(store.unwrap_displaced(outer).unwrap(), a);
        assert_eq!(store.innermost_displacement(outer).unwrap(), Some(inner));
        assert_eq!(store.innermost_displacement(a).unwrap(), None);
        assert_eq!(store.resolved(outer).unwrap().name, "a");
    }

    #[test]
    fn displaced_boolean_still_has_children() {
        let mut store = CsgStore::new();
        let a = tube(&mut store, "a", 1.0);
        let b = tube(&mut store, "b", 1.0);
        let u = store.add_boolean("u", BooleanOp::Union, a, b, None);
        let d = store.add_displaced(u, Rotation3::identity(), Vector3::z());
        assert_eq!(store.children(d).unwrap(), Some((a, b)));
        assert_eq!(store.children(a).unwrap(), None);
    }

    #[test]
    fn primitive_of_boolean_is_an_error() {
        let mut store = CsgStore::new();
        let a = tube(&mut store, "a", 1.0);
        let b = tube(&mut store, "b", 1.0);
        let u = store.add_boolean("u", BooleanOp::Union, a, b, None);
        assert!(matches!(store.primitive(u), Err(TreeError::NotPrimitive(_))));
        assert!(store.primitive(a).is_ok());
    }

    #[test]
    fn retain_reachable_drops_orphans() {
        let mut store = CsgStore::new();
        let a = tube(&mut store, "a", 1.0);
        let b = tube(&mut store, "b", 1.0);
        let u = store.add_boolean("u", BooleanOp::Union, a, b, Some(Vector3::z()));
        let removed = store.retain_reachable(a).unwrap();
        assert_eq!(removed, 3);
        assert!(store.contains(a));
        assert!(!store.contains(u));
    }
}
