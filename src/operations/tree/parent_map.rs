use std::collections::HashMap;

use crate::csg::{CsgStore, NodeId};
use crate::error::TreeError;

/// Up-links for a CSG tree, which has none of its own.
///
/// Keys are tree positions as stored in their parent boolean, so a
/// displaced operand is recorded under its wrapper. This keeps every
/// transform on the way to the root visible when walking upwards.
#[derive(Debug, Clone, Default)]
pub struct ParentMap {
    parents: HashMap<NodeId, Option<NodeId>>,
}

impl ParentMap {
    /// Builds the map with a postorder walk from `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if a node reachable from `root` is missing.
    pub fn build(store: &CsgStore, root: NodeId) -> Result<Self, TreeError> {
        let mut parents = HashMap::new();
        parents.insert(root, None);
        fill_r(store, root, &mut parents)?;
        Ok(Self { parents })
    }

    /// Returns the parent position of `id`, `None` for the root.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is not a position of the tree the map was built for.
    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>, TreeError> {
        self.parents
            .get(&id)
            .copied()
            .ok_or_else(|| TreeError::StaleParentMap(format!("{id:?}")))
    }

    /// Returns `true` if `id` is a position in the mapped tree.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.parents.contains_key(&id)
    }

    /// Number of positions, root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    /// Returns `true` if the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }
}

fn fill_r(
    store: &CsgStore,
    node: NodeId,
    parents: &mut HashMap<NodeId, Option<NodeId>>,
) -> Result<(), TreeError> {
    if let Some((left, right)) = store.children(node)? {
        fill_r(store, left, parents)?;
        fill_r(store, right, parents)?;

        parents.insert(left, Some(node));
        parents.insert(right, Some(node));
    }
    Ok(())
}
