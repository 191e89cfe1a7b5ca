use crate::csg::{CsgStore, NodeId};
use crate::error::Result;
use crate::operations::tree::{TraversalOrder, TreeIndex};

use super::classify::{ClassificationMap, ZClass};

/// Picks the subtree that survives a cut, to become the new root.
///
/// Walks the tree in reverse preorder (self, right, left), the exact undo
/// of the postorder in which successive booleans are built, and stops at
/// the first node classified purely `INCLUDE`. For a left-unbalanced tree
/// whose cut removes a suffix of right-hand operands this is the highest
/// node with nothing excluded below it.
///
/// Exclusions scattered over both sides of a boolean are not detected:
/// the result is then a subtree that may be deeper than necessary.
pub struct FindCandidateRoot<'a> {
    index: &'a TreeIndex,
    classes: &'a ClassificationMap,
}

impl<'a> FindCandidateRoot<'a> {
    /// Creates a new search over an indexed and classified tree.
    #[must_use]
    pub fn new(index: &'a TreeIndex, classes: &'a ClassificationMap) -> Self {
        Self { index, classes }
    }

    /// Executes the search. `None` means nothing survives the cut.
    ///
    /// # Errors
    ///
    /// Returns an error if an indexed node is missing from the store.
    pub fn execute(&self, store: &CsgStore) -> Result<Option<NodeId>> {
        for &node in self.index.sequence(TraversalOrder::ReversePreorder) {
            let class = self.classes.get(store, node)?;
            let name = &store.resolved(node)?.name;
            tracing::debug!(
                node = %name,
                rpre = self.index.rank(TraversalOrder::ReversePreorder, node),
                post = self.index.rank(TraversalOrder::Postorder, node),
                class = %class,
                "candidate root search"
            );
            if class == ZClass::INCLUDE {
                return Ok(Some(node));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::csg::{BooleanOp, Tube};
    use crate::math::Vector3;
    use crate::operations::tree::ParentMap;
    use crate::operations::zcut::Classify;

    /// ((a ∪ b) ∪ c): a at [-1, 1], b at [1, 3], c at [3, 5].
    fn stack(store: &mut CsgStore) -> NodeId {
        let a = store.add_primitive("a", Tube::new(0.0, 1.0, 1.0));
        let b = store.add_primitive("b", Tube::new(0.0, 1.0, 1.0));
        let c = store.add_primitive("c", Tube::new(0.0, 1.0, 1.0));
        let ab = store.add_boolean("ab", BooleanOp::Union, a, b, Some(Vector3::new(0.0, 0.0, 2.0)));
        store.add_boolean("abc", BooleanOp::Union, ab, c, Some(Vector3::new(0.0, 0.0, 4.0)))
    }

    fn candidate(store: &CsgStore, root: NodeId, z_cut: f64) -> Option<String> {
        let parents = ParentMap::build(store, root).unwrap();
        let index = TreeIndex::build(store, root).unwrap();
        let classes = Classify::new(z_cut).execute(store, root, &parents).unwrap();
        FindCandidateRoot::new(&index, &classes)
            .execute(store)
            .unwrap()
            .map(|n| store.resolved(n).unwrap().name.clone())
    }

    #[test]
    fn whole_tree_survives_low_cut() {
        let mut store = CsgStore::new();
        let root = stack(&mut store);
        assert_eq!(candidate(&store, root, -5.0).as_deref(), Some("abc"));
    }

    #[test]
    fn right_operand_survives_high_cut() {
        let mut store = CsgStore::new();
        let root = stack(&mut store);
        assert_eq!(candidate(&store, root, 3.0).as_deref(), Some("c"));
    }

    #[test]
    fn nothing_survives_cut_above_everything() {
        let mut store = CsgStore::new();
        let root = stack(&mut store);
        assert_eq!(candidate(&store, root, 5.0), None);
    }

    #[test]
    fn straddling_nodes_are_never_picked() {
        let mut store = CsgStore::new();
        let root = stack(&mut store);
        // c straddles, a and b are excluded.
        assert_eq!(candidate(&store, root, 4.0), None);
    }
}
