use crate::csg::{CsgStore, CsgTree, NodeData, NodeId, NodeKind};
use crate::error::{InvariantError, Result};
use crate::math::{is_identity_rotation, Rotation3, Vector3, TOLERANCE};

/// Copies a CSG tree into a fresh store.
///
/// The copy shares nothing with the source, so its primitive parameters
/// and displacements can be edited without touching the original. The
/// right operand of every boolean in the copy is a displacement wrapper,
/// with identity translation where the source had none.
pub struct DeepClone {
    root: NodeId,
}

impl DeepClone {
    /// Creates a new `DeepClone` operation for the tree rooted at `root`.
    #[must_use]
    pub fn new(root: NodeId) -> Self {
        Self { root }
    }

    /// Executes the clone, returning an independent tree.
    ///
    /// # Errors
    ///
    /// Returns an error if a node is missing, a boolean's left operand is
    /// displaced, or any displacement carries a rotation.
    pub fn execute(&self, source: &CsgStore) -> Result<CsgTree> {
        let mut store = CsgStore::new();
        let root = self.execute_into(source, &mut store)?;
        Ok(CsgTree::new(store, root))
    }

    /// Clones the tree into an existing store and returns the new root.
    ///
    /// On error `target` may hold a partial copy that nothing refers to.
    ///
    /// # Errors
    ///
    /// Same as [`DeepClone::execute`].
    pub fn execute_into(&self, source: &CsgStore, target: &mut CsgStore) -> Result<NodeId> {
        clone_r(source, target, self.root, 0)
    }
}

/// Preorder copy. Wrappers are rebuilt around the clone of their child and
/// bare right operands get an identity wrapper.
fn clone_r(source: &CsgStore, target: &mut CsgStore, id: NodeId, depth: usize) -> Result<NodeId> {
    let node = source.node(id)?;
    let name = source.resolved(id)?.name.as_str();
    tracing::trace!(
        node = name,
        kind = node.type_name(),
        depth,
        "deep clone visit"
    );

    match &node.kind {
        NodeKind::Primitive(shape) => {
            Ok(target.add_node(NodeData::primitive(node.name.clone(), shape.clone())))
        }
        NodeKind::Boolean { op, left, right } => {
            let left_clone = clone_r(source, target, *left, depth + 1)?;
            let mut right_clone = clone_r(source, target, *right, depth + 1)?;

            // A left operand never carries a transform, so its translation
            // is zero and its rotation identity by construction.
            if target.node(left_clone)?.is_displaced() {
                return Err(InvariantError::DisplacedLeftOperand {
                    node: node.name.clone(),
                }
                .into());
            }

            // Every cloned right operand gets a wrapper, so any right-hand
            // tube can be re-centred when cut.
            if !target.node(right_clone)?.is_displaced() {
                right_clone = target.add_displaced(right_clone, Rotation3::identity(), Vector3::zeros());
            }

            Ok(target.add_node(NodeData::boolean(
                node.name.clone(),
                *op,
                left_clone,
                right_clone,
            )))
        }
        NodeKind::Displaced(d) => {
            if !is_identity_rotation(&d.rotation, TOLERANCE) {
                return Err(InvariantError::RotatedDisplacement {
                    node: name.to_owned(),
                }
                .into());
            }
            let child = clone_r(source, target, d.child, depth)?;
            Ok(target.add_displaced(child, d.rotation, d.translation))
        }
    }
}
