use std::collections::HashMap;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use crate::csg::{CsgStore, NodeId};
use crate::error::{InvariantError, Result, TreeError};
use crate::operations::tree::{FrameResolver, ParentMap};

/// Inclusion status of a node with regard to a z-cut, as a bitmask.
///
/// Leaves hold exactly one of `INCLUDE`, `STRADDLE`, `EXCLUDE`. Boolean
/// nodes hold the OR of their operands, e.g. `INCLUDE | EXCLUDE`.
///
/// ```text
///                        ---
///                         .   EXCLUDE  : zcut entirely above the solid
///       +--- az1 ----+   ---
///       |            |    .   STRADDLE : zcut within z range of solid
///       +--- az0 ----+   ---
///                         .   INCLUDE  : zcut at or below the solid
///                        ---
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ZClass(u8);

impl ZClass {
    pub const UNDEFINED: Self = Self(0);
    pub const INCLUDE: Self = Self(1);
    pub const STRADDLE: Self = Self(2);
    pub const EXCLUDE: Self = Self(4);

    /// Classifies a global z range `[az0, az1)` against `z_cut`.
    ///
    /// A cut within `tolerance` of either end counts as at that end.
    /// Callers must ensure `az1 > az0`.
    #[must_use]
    pub fn of_range(az0: f64, az1: f64, z_cut: f64, tolerance: f64) -> Self {
        if z_cut <= az0 + tolerance {
            Self::INCLUDE
        } else if z_cut >= az1 - tolerance {
            Self::EXCLUDE
        } else {
            Self::STRADDLE
        }
    }

    /// Raw bits.
    #[must_use]
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Returns `true` if every flag of `other` is set in `self`.
    #[must_use]
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Full name of a single-flag value, `None` for mixed masks.
    #[must_use]
    pub fn name(self) -> Option<&'static str> {
        match self {
            Self::UNDEFINED => Some("UNDEFINED"),
            Self::INCLUDE => Some("INCLUDE"),
            Self::STRADDLE => Some("STRADDLE"),
            Self::EXCLUDE => Some("EXCLUDE"),
            _ => None,
        }
    }

    /// Compact mask name: `U`, or the initials of each flag set (e.g. `IE`).
    #[must_use]
    pub fn mask_name(self) -> String {
        if self == Self::UNDEFINED {
            return "U".to_owned();
        }
        [(Self::INCLUDE, 'I'), (Self::STRADDLE, 'S'), (Self::EXCLUDE, 'E')]
            .into_iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, c)| c)
            .collect()
    }
}

impl BitOr for ZClass {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ZClass {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for ZClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.mask_name())
    }
}

/// Classification of every node of one tree against one cut height.
///
/// Entries are keyed by the unwrapped node, so a wrapper and the node it
/// wraps always agree.
#[derive(Debug, Clone, Default)]
pub struct ClassificationMap {
    classes: HashMap<NodeId, ZClass>,
}

impl ClassificationMap {
    /// Classification of tree position `id`; `UNDEFINED` when never classified.
    ///
    /// # Errors
    ///
    /// Returns an error if a wrapper on `id` is missing from the store.
    pub fn get(&self, store: &CsgStore, id: NodeId) -> std::result::Result<ZClass, TreeError> {
        let inner = store.unwrap_displaced(id)?;
        Ok(self.classes.get(&inner).copied().unwrap_or_default())
    }

    /// Records the classification of tree position `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if a wrapper on `id` is missing from the store.
    pub fn set(
        &mut self,
        store: &CsgStore,
        id: NodeId,
        class: ZClass,
    ) -> std::result::Result<(), TreeError> {
        let inner = store.unwrap_displaced(id)?;
        self.classes.insert(inner, class);
        Ok(())
    }

    /// Number of classified nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns `true` if nothing has been classified.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Global z range `[az0, az1)` of the primitive at tree position `id`.
///
/// # Errors
///
/// Returns an error if the node is not a primitive, its range is
/// degenerate, or the frame cannot be resolved.
pub fn global_z_range(store: &CsgStore, parents: &ParentMap, id: NodeId) -> Result<(f64, f64)> {
    let name = &store.resolved(id)?.name;
    let (z0, z1) = store.primitive(id)?.local_z_range(name)?;
    let zd = FrameResolver::new(store, parents).global_z_offset(id)?;
    let (az0, az1) = (z0 + zd, z1 + zd);
    if az1 <= az0 {
        return Err(InvariantError::DegenerateZRange {
            node: name.clone(),
            z0: az0,
            z1: az1,
        }
        .into());
    }
    Ok((az0, az1))
}

/// Classifies every node of a tree against a cut height.
///
/// Postorder: leaves by their global z range, boolean nodes by the OR of
/// their operands. The boolean operator is not taken into account.
pub struct Classify {
    z_cut: f64,
    tolerance: f64,
}

impl Classify {
    /// Creates a new `Classify` operation with zero tolerance.
    #[must_use]
    pub fn new(z_cut: f64) -> Self {
        Self {
            z_cut,
            tolerance: 0.0,
        }
    }

    /// Sets the tolerance used when comparing the cut with leaf ranges.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Executes the classification of the tree rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if a leaf has a degenerate z range, a wrapper
    /// carries a rotation, or `parents` does not describe this tree.
    pub fn execute(
        &self,
        store: &CsgStore,
        root: NodeId,
        parents: &ParentMap,
    ) -> Result<ClassificationMap> {
        tracing::debug!(z_cut = self.z_cut, "classifying tree");
        let mut map = ClassificationMap::default();
        self.classify_r(store, parents, root, 0, &mut map)?;
        Ok(map)
    }

    fn classify_r(
        &self,
        store: &CsgStore,
        parents: &ParentMap,
        node: NodeId,
        depth: usize,
        map: &mut ClassificationMap,
    ) -> Result<ZClass> {
        let name = store.resolved(node)?.name.as_str();
        let class = if let Some((left, right)) = store.children(node)? {
            let left_class = self.classify_r(store, parents, left, depth + 1, map)?;
            let right_class = self.classify_r(store, parents, right, depth + 1, map)?;
            tracing::trace!(
                node = name,
                depth,
                left = %left_class,
                right = %right_class,
                "classify boolean"
            );
            left_class | right_class
        } else {
            let (az0, az1) = global_z_range(store, parents, node)?;
            let class = ZClass::of_range(az0, az1, self.z_cut, self.tolerance);
            tracing::trace!(
                node = name,
                depth,
                az0,
                az1,
                class = %class,
                "classify leaf"
            );
            class
        };
        map.set(store, node, class)?;
        Ok(class)
    }
}
