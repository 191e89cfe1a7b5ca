use std::collections::HashMap;

use crate::csg::{CsgStore, NodeId};
use crate::error::TreeError;

/// The six depth-first orders a CSG tree is indexed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraversalOrder {
    /// Left, self, right. The rank is the node's horizontal "side" position.
    Inorder,
    /// Right, self, left.
    ReverseInorder,
    /// Self, left, right.
    Preorder,
    /// Self, right, left. Undoes a postorder walk step by step.
    ReversePreorder,
    /// Left, right, self.
    Postorder,
    /// Right, left, self.
    ReversePostorder,
}

impl TraversalOrder {
    /// All orders, in index-slot order.
    pub const ALL: [Self; 6] = [
        Self::Inorder,
        Self::ReverseInorder,
        Self::Preorder,
        Self::ReversePreorder,
        Self::Postorder,
        Self::ReversePostorder,
    ];

    /// Short name used in dumps.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Inorder => "IN",
            Self::ReverseInorder => "RIN",
            Self::Preorder => "PRE",
            Self::ReversePreorder => "RPRE",
            Self::Postorder => "POST",
            Self::ReversePostorder => "RPOST",
        }
    }

    /// The order that visits the same nodes back to front.
    #[must_use]
    pub fn mirror(self) -> Self {
        match self {
            Self::Inorder => Self::ReverseInorder,
            Self::ReverseInorder => Self::Inorder,
            Self::Preorder => Self::ReversePostorder,
            Self::ReversePostorder => Self::Preorder,
            Self::ReversePreorder => Self::Postorder,
            Self::Postorder => Self::ReversePreorder,
        }
    }

    fn slot(self) -> usize {
        match self {
            Self::Inorder => 0,
            Self::ReverseInorder => 1,
            Self::Preorder => 2,
            Self::ReversePreorder => 3,
            Self::Postorder => 4,
            Self::ReversePostorder => 5,
        }
    }
}

/// Per-order sequences and ranks, plus depths, for one tree shape.
///
/// Rebuild whenever the shape changes (e.g. after re-rooting).
#[derive(Debug, Clone, Default)]
pub struct TreeIndex {
    sequences: [Vec<NodeId>; 6],
    ranks: [HashMap<NodeId, usize>; 6],
    depths: HashMap<NodeId, usize>,
    height: usize,
}

impl TreeIndex {
    /// Indexes the tree rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if a node reachable from `root` is missing.
    pub fn build(store: &CsgStore, root: NodeId) -> Result<Self, TreeError> {
        let mut index = Self::default();
        for order in TraversalOrder::ALL {
            let mut seq = Vec::new();
            visit_r(store, root, order, &mut seq)?;
            index.ranks[order.slot()] = seq.iter().enumerate().map(|(i, &n)| (n, i)).collect();
            index.sequences[order.slot()] = seq;
        }
        depth_r(store, root, 0, &mut index.depths)?;
        index.height = index.depths.values().copied().max().unwrap_or(0);
        Ok(index)
    }

    /// Nodes in the given order.
    #[must_use]
    pub fn sequence(&self, order: TraversalOrder) -> &[NodeId] {
        &self.sequences[order.slot()]
    }

    /// Rank of `node` in the given order.
    #[must_use]
    pub fn rank(&self, order: TraversalOrder, node: NodeId) -> Option<usize> {
        self.ranks[order.slot()].get(&node).copied()
    }

    /// Rank of `node` counted from the back of the mirrored order.
    ///
    /// Always equal to [`TreeIndex::rank`] for the same order.
    #[must_use]
    pub fn mirrored_rank(&self, order: TraversalOrder, node: NodeId) -> Option<usize> {
        let mirror = self.rank(order.mirror(), node)?;
        Some(self.width() - 1 - mirror)
    }

    /// Depth of `node`, the root being 0.
    #[must_use]
    pub fn depth(&self, node: NodeId) -> Option<usize> {
        self.depths.get(&node).copied()
    }

    /// Number of nodes in the tree.
    #[must_use]
    pub fn width(&self) -> usize {
        self.sequences[TraversalOrder::Inorder.slot()].len()
    }

    /// Maximum depth.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }
}

fn visit_r(
    store: &CsgStore,
    node: NodeId,
    order: TraversalOrder,
    out: &mut Vec<NodeId>,
) -> Result<(), TreeError> {
    let Some((left, right)) = store.children(node)? else {
        out.push(node);
        return Ok(());
    };
    match order {
        TraversalOrder::Inorder => {
            visit_r(store, left, order, out)?;
            out.push(node);
            visit_r(store, right, order, out)?;
        }
        TraversalOrder::ReverseInorder => {
            visit_r(store, right, order, out)?;
            out.push(node);
            visit_r(store, left, order, out)?;
        }
        TraversalOrder::Preorder => {
            out.push(node);
            visit_r(store, left, order, out)?;
            visit_r(store, right, order, out)?;
        }
        TraversalOrder::ReversePreorder => {
            out.push(node);
            visit_r(store, right, order, out)?;
            visit_r(store, left, order, out)?;
        }
        TraversalOrder::Postorder => {
            visit_r(store, left, order, out)?;
            visit_r(store, right, order, out)?;
            out.push(node);
        }
        TraversalOrder::ReversePostorder => {
            visit_r(store, right, order, out)?;
            visit_r(store, left, order, out)?;
            out.push(node);
        }
    }
    Ok(())
}

fn depth_r(
    store: &CsgStore,
    node: NodeId,
    depth: usize,
    depths: &mut HashMap<NodeId, usize>,
) -> Result<(), TreeError> {
    if let Some((left, right)) = store.children(node)? {
        depth_r(store, left, depth + 1, depths)?;
        depth_r(store, right, depth + 1, depths)?;
    }
    depths.insert(node, depth);
    Ok(())
}
