use crate::csg::{CsgStore, NodeId};
use crate::error::{InvariantError, Result};
use crate::math::{is_identity_rotation, Vector3, TOLERANCE};

use super::ParentMap;

/// Resolves where a tree position sits in the frame of the tree's root.
///
/// Boolean trees carry transforms only on displacement wrappers, so the
/// global offset of a node is the sum of the wrapper translations met on
/// the way up. Rotations are not supported and must be identity.
pub struct FrameResolver<'a> {
    store: &'a CsgStore,
    parents: &'a ParentMap,
}

impl<'a> FrameResolver<'a> {
    /// Creates a resolver over a store and its parent map.
    #[must_use]
    pub fn new(store: &'a CsgStore, parents: &'a ParentMap) -> Self {
        Self { store, parents }
    }

    /// Accumulated translation from `node` up to the root.
    ///
    /// # Errors
    ///
    /// Returns an error if `node` is not a position of the mapped tree or a
    /// wrapper on the way carries a rotation.
    pub fn global_translation(&self, node: NodeId) -> Result<Vector3> {
        let mut total = Vector3::zeros();
        let mut position = Some(node);
        while let Some(pos) = position {
            total += self.local_translation(pos)?;
            position = self.parents.parent(pos)?;
        }
        Ok(total)
    }

    /// Z component of [`FrameResolver::global_translation`].
    ///
    /// # Errors
    ///
    /// Same as [`FrameResolver::global_translation`].
    pub fn global_z_offset(&self, node: NodeId) -> Result<f64> {
        Ok(self.global_translation(node)?.z)
    }

    /// Translation held by the wrapper chain at a single position.
    ///
    /// # Errors
    ///
    /// Returns an error if a node is missing or a wrapper carries a rotation.
    pub fn local_translation(&self, position: NodeId) -> Result<Vector3> {
        let mut total = Vector3::zeros();
        let mut link = position;
        while let Some(d) = self.store.node(link)?.displacement() {
            if !is_identity_rotation(&d.rotation, TOLERANCE) {
                return Err(InvariantError::RotatedDisplacement {
                    node: self.store.resolved(link)?.name.clone(),
                }
                .into());
            }
            total += d.translation;
            link = d.child;
        }
        Ok(total)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::csg::{BooleanOp, NodeKind, Tube};
    use crate::error::ZCutError;
    use crate::math::Rotation3;

    fn right_of(store: &CsgStore, id: NodeId) -> NodeId {
        let NodeKind::Boolean { right, .. } = store.node(id).unwrap().kind else {
            panic!("expected boolean");
        };
        right
    }

    #[test]
    fn left_leaf_of_root_has_no_offset() {
        let mut store = CsgStore::new();
        let a = store.add_primitive("a", Tube::new(0.0, 1.0, 1.0));
        let b = store.add_primitive("b", Tube::new(0.0, 1.0, 1.0));
        let u = store.add_boolean("u", BooleanOp::Union, a, b, Some(Vector3::new(0.0, 0.0, 4.0)));
        let parents = ParentMap::build(&store, u).unwrap();
        let frame = FrameResolver::new(&store, &parents);

        assert_eq!(frame.global_z_offset(a).unwrap(), 0.0);
        assert_eq!(frame.global_z_offset(right_of(&store, u)).unwrap(), 4.0);
    }

    #[test]
    fn offsets_accumulate_through_displaced_subtrees() {
        let mut store = CsgStore::new();
        let a = store.add_primitive("a", Tube::new(0.0, 1.0, 1.0));
        let b = store.add_primitive("b", Tube::new(0.0, 1.0, 1.0));
        let inner = store.add_boolean(
            "inner",
            BooleanOp::Union,
            a,
            b,
            Some(Vector3::new(1.0, 0.0, -3.0)),
        );
        let c = store.add_primitive("c", Tube::new(0.0, 1.0, 1.0));
        let outer = store.add_boolean(
            "outer",
            BooleanOp::Subtraction,
            c,
            inner,
            Some(Vector3::new(0.0, 2.0, 10.0)),
        );
        let parents = ParentMap::build(&store, outer).unwrap();
        let frame = FrameResolver::new(&store, &parents);

        let inner_pos = right_of(&store, outer);
        let b_pos = right_of(&store, inner);
        assert_eq!(frame.global_z_offset(a).unwrap(), 10.0);
        assert_eq!(
            frame.global_translation(b_pos).unwrap(),
            Vector3::new(1.0, 2.0, 7.0)
        );
        assert_eq!(frame.global_z_offset(inner_pos).unwrap(), 10.0);
        assert_eq!(frame.global_z_offset(c).unwrap(), 0.0);
    }

    #[test]
    fn wrapper_chains_sum() {
        let mut store = CsgStore::new();
        let a = store.add_primitive("a", Tube::new(0.0, 1.0, 1.0));
        let b = store.add_primitive("b", Tube::new(0.0, 1.0, 1.0));
        let once = store.add_displaced(b, Rotation3::identity(), Vector3::new(0.0, 0.0, 1.5));
        let twice = store.add_displaced(once, Rotation3::identity(), Vector3::new(0.0, 0.0, 2.0));
        let u = store.add_boolean("u", BooleanOp::Union, a, twice, None);
        let parents = ParentMap::build(&store, u).unwrap();
        let frame = FrameResolver::new(&store, &parents);
        assert_eq!(frame.global_z_offset(twice).unwrap(), 3.5);
    }

    #[test]
    fn rotation_on_the_way_up_is_fatal() {
        let mut store = CsgStore::new();
        let a = store.add_primitive("a", Tube::new(0.0, 1.0, 1.0));
        let b = store.add_primitive("b", Tube::new(0.0, 1.0, 1.0));
        let turned = store.add_displaced(
            b,
            Rotation3::from_axis_angle(&Vector3::y_axis(), 0.3),
            Vector3::zeros(),
        );
        let u = store.add_boolean("u", BooleanOp::Union, a, turned, None);
        let parents = ParentMap::build(&store, u).unwrap();
        let frame = FrameResolver::new(&store, &parents);
        assert!(matches!(
            frame.global_z_offset(turned),
            Err(ZCutError::Invariant(InvariantError::RotatedDisplacement { .. }))
        ));
        assert_eq!(frame.global_z_offset(a).unwrap(), 0.0);
    }

    #[test]
    fn unknown_position_is_an_error() {
        let mut store = CsgStore::new();
        let a = store.add_primitive("a", Tube::new(0.0, 1.0, 1.0));
        let stray = store.add_primitive("stray", Tube::new(0.0, 1.0, 1.0));
        let parents = ParentMap::build(&store, a).unwrap();
        let frame = FrameResolver::new(&store, &parents);
        assert!(matches!(
            frame.global_z_offset(stray),
            Err(ZCutError::Tree(_))
        ));
    }
}
