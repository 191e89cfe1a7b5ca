//! Cutting CSG trees with a horizontal plane.
//!
//! Everything below the plane `z = z_cut` is removed from a copy of the
//! tree: primitives straddling the plane are reshaped, subtrees lying
//! entirely below it are dropped by re-rooting onto the highest subtree
//! that survives whole.

mod apply;
mod classify;
mod cutter;
mod reroot;

pub use apply::{ApplyZCut, TubeCut};
pub use classify::{global_z_range, ClassificationMap, Classify, ZClass};
pub use cutter::{CutReport, ZCutter};
pub use reroot::FindCandidateRoot;

use crate::csg::{CsgStore, CsgTree, NodeId};
use crate::error::Result;
use crate::operations::tree::TraversalOrder;

/// Tunables for a z-cut.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZCutParams {
    /// Distance within which a cut counts as touching a leaf's bottom or top.
    pub tolerance: f64,
    /// Order whose ranks label the debug drawing.
    pub draw_order: TraversalOrder,
    /// Whether to render the tree at debug level after cutting.
    pub draw: bool,
}

impl Default for ZCutParams {
    fn default() -> Self {
        Self {
            tolerance: 1e-9,
            draw_order: TraversalOrder::ReversePreorder,
            draw: true,
        }
    }
}

/// Result of a z-cut.
#[derive(Debug)]
pub enum ZCutOutcome {
    /// The part of the solid above the cut.
    Cut(CsgTree),
    /// Nothing lies above the cut.
    Excluded,
}

impl ZCutOutcome {
    /// Returns `true` when no geometry survived.
    #[must_use]
    pub fn is_excluded(&self) -> bool {
        matches!(self, Self::Excluded)
    }

    /// The surviving tree, if any.
    #[must_use]
    pub fn tree(&self) -> Option<&CsgTree> {
        match self {
            Self::Cut(tree) => Some(tree),
            Self::Excluded => None,
        }
    }

    /// Consumes the outcome, returning the surviving tree, if any.
    #[must_use]
    pub fn into_tree(self) -> Option<CsgTree> {
        match self {
            Self::Cut(tree) => Some(tree),
            Self::Excluded => None,
        }
    }
}

/// Cuts the tree rooted at `root` at height `z_cut`, keeping what lies above.
///
/// The source store is only read; the result is built on a deep copy.
pub struct ZCut {
    root: NodeId,
    z_cut: f64,
    params: ZCutParams,
}

impl ZCut {
    /// Creates a new `ZCut` operation with default parameters.
    #[must_use]
    pub fn new(root: NodeId, z_cut: f64) -> Self {
        Self {
            root,
            z_cut,
            params: ZCutParams::default(),
        }
    }

    /// Replaces the parameters.
    #[must_use]
    pub fn with_params(mut self, params: ZCutParams) -> Self {
        self.params = params;
        self
    }

    /// Executes the cut.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree breaks an assumption of the engine: a
    /// rotated or left-hand displacement, a degenerate z range, an
    /// uncuttable primitive, or a cut that fails to converge.
    pub fn execute(&self, store: &CsgStore) -> Result<ZCutOutcome> {
        let mut cutter = ZCutter::new(store, self.root, self.params)?;
        cutter.cut(self.z_cut)?;
        Ok(cutter.into_outcome())
    }
}
