use crate::csg::{CsgStore, NodeId, NodeKind, Primitive};
use crate::error::{InvariantError, Result, TreeError};

/// New half-length and centre shift of a tube cut at `local_z_cut`.
///
/// ```text
///      +hz  +---------+               +---------+   z_offset + new_hz
///           |         |               |         |
///           |         |             __|_________|__ z_offset
///         0-|---------|-              |         |
///  local_z  | . . . . | . . . . . . . +---------+   z_offset - new_hz
///      -hz  +---------+
///
///      new_hz   = (hz - local_z) / 2
///      z_offset = (hz + local_z) / 2
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TubeCut {
    /// Half-length of the remaining upper part.
    pub half_z: f64,
    /// Shift of the tube centre along z.
    pub z_offset: f64,
}

impl TubeCut {
    /// Computes the cut of a tube with half-length `half_z`.
    #[must_use]
    pub fn new(half_z: f64, local_z_cut: f64) -> Self {
        Self {
            half_z: (half_z - local_z_cut) / 2.0,
            z_offset: (local_z_cut + half_z) / 2.0,
        }
    }
}

/// Reshapes the primitive at a tree position so it starts at `local_z_cut`.
///
/// The part above the cut survives. Tubes are symmetric about their own
/// centre, so they also need their displacement shifted up; a tube without
/// a wrapper cannot be cut.
pub struct ApplyZCut {
    position: NodeId,
    local_z_cut: f64,
}

impl ApplyZCut {
    /// Creates a new `ApplyZCut` operation. `local_z_cut` is in the primitive's own frame.
    #[must_use]
    pub fn new(position: NodeId, local_z_cut: f64) -> Self {
        Self {
            position,
            local_z_cut,
        }
    }

    /// Executes the cut, editing the store in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the cut lies outside the primitive's z range, a
    /// polycone does not have exactly two z-planes, or a tube has no
    /// displacement.
    pub fn execute(&self, store: &mut CsgStore) -> Result<()> {
        let name = store.resolved(self.position)?.name.clone();
        let z_cut = self.local_z_cut;
        let (z0, z1) = store.primitive(self.position)?.local_z_range(&name)?;
        if !(z0 <= z_cut && z_cut < z1) {
            return Err(InvariantError::CutOutOfRange {
                node: name,
                z_cut,
                z0,
                z1,
            }
            .into());
        }

        let wrapper = store.innermost_displacement(self.position)?;
        let shift = match store.primitive_mut(self.position)? {
            Primitive::Ellipsoid(ellipsoid) => {
                ellipsoid.z_bottom_cut = z_cut;
                tracing::debug!(node = %name, z0, z1, new_z0 = z_cut, "cut ellipsoid");
                None
            }
            Primitive::Polycone(polycone) => {
                let planes = polycone.planes.len();
                if planes != 2 {
                    return Err(InvariantError::UnsupportedPolyconePlanes { node: name, planes }.into());
                }
                polycone.planes[0].z = z_cut;
                tracing::debug!(node = %name, z0, z1, new_z0 = z_cut, "cut polycone");
                None
            }
            Primitive::Tube(tube) => {
                let Some(wrapper) = wrapper else {
                    return Err(InvariantError::MissingDisplacement { node: name }.into());
                };
                let cut = TubeCut::new(tube.half_z, z_cut);
                tube.half_z = cut.half_z;
                tracing::debug!(
                    node = %name,
                    half_z = z1,
                    new_half_z = cut.half_z,
                    z_offset = cut.z_offset,
                    "cut tube"
                );
                Some((wrapper, cut.z_offset))
            }
        };
        if let Some((wrapper, dz)) = shift {
            shift_wrapper_z(store, wrapper, dz)?;
        }
        Ok(())
    }
}

fn shift_wrapper_z(store: &mut CsgStore, wrapper: NodeId, dz: f64) -> Result<()> {
    let node = store.node_mut(wrapper)?;
    match &mut node.kind {
        NodeKind::Displaced(d) => {
            d.translation.z += dz;
            Ok(())
        }
        _ => Err(TreeError::NodeNotFound(format!("displacement {wrapper:?}")).into()),
    }
}
