use crate::math::{Rotation3, Vector3};

use super::primitive::Primitive;

slotmap::new_key_type! {
    /// Unique identifier for a node in the CSG store.
    pub struct NodeId;
}

/// The boolean combination applied by a boolean node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOp {
    Union,
    Intersection,
    Subtraction,
}

impl BooleanOp {
    /// Short type name used in diagnostics.
    #[must_use]
    pub fn type_name(self) -> &'static str {
        match self {
            BooleanOp::Union => "UnionSolid",
            BooleanOp::Intersection => "IntersectionSolid",
            BooleanOp::Subtraction => "SubtractionSolid",
        }
    }
}

/// A rigid transform wrapped around a single child node.
///
/// Only translation takes part in z-cutting; the rotation must stay identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Displacement {
    /// The displaced node.
    pub child: NodeId,
    /// Rotation of the child relative to the wrapper's frame.
    pub rotation: Rotation3,
    /// Translation of the child relative to the wrapper's frame.
    pub translation: Vector3,
}

/// The kind of a CSG node and its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// A leaf shape.
    Primitive(Primitive),
    /// A boolean combination of two operands.
    ///
    /// The left operand is never displaced; a transformed right operand
    /// is wrapped in [`NodeKind::Displaced`].
    Boolean {
        op: BooleanOp,
        left: NodeId,
        right: NodeId,
    },
    /// A transparent transform wrapper.
    Displaced(Displacement),
}

/// Data associated with a CSG node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    /// Solid name. Empty for displacement wrappers.
    pub name: String,
    /// What the node is.
    pub kind: NodeKind,
}

impl NodeData {
    /// Creates a primitive leaf.
    #[must_use]
    pub fn primitive(name: impl Into<String>, shape: impl Into<Primitive>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Primitive(shape.into()),
        }
    }

    /// Creates a boolean node.
    #[must_use]
    pub fn boolean(name: impl Into<String>, op: BooleanOp, left: NodeId, right: NodeId) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Boolean { op, left, right },
        }
    }

    /// Creates an unnamed displacement wrapper.
    #[must_use]
    pub fn displaced(child: NodeId, rotation: Rotation3, translation: Vector3) -> Self {
        Self {
            name: String::new(),
            kind: NodeKind::Displaced(Displacement {
                child,
                rotation,
                translation,
            }),
        }
    }

    /// Returns `true` for boolean nodes.
    #[must_use]
    pub fn is_boolean(&self) -> bool {
        matches!(self.kind, NodeKind::Boolean { .. })
    }

    /// Returns `true` for displacement wrappers.
    #[must_use]
    pub fn is_displaced(&self) -> bool {
        matches!(self.kind, NodeKind::Displaced(_))
    }

    /// Returns the displacement if this node is a wrapper.
    #[must_use]
    pub fn displacement(&self) -> Option<&Displacement> {
        match &self.kind {
            NodeKind::Displaced(d) => Some(d),
            _ => None,
        }
    }

    /// Type name used in diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match &self.kind {
            NodeKind::Primitive(p) => p.type_name(),
            NodeKind::Boolean { op, .. } => op.type_name(),
            NodeKind::Displaced(_) => "DisplacedSolid",
        }
    }

    /// Three letter tag used on the debug canvas.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match &self.kind {
            NodeKind::Primitive(Primitive::Ellipsoid(_)) => "Ell",
            NodeKind::Primitive(Primitive::Tube(_)) => "Tub",
            NodeKind::Primitive(Primitive::Polycone(_)) => "Pol",
            NodeKind::Boolean { op: BooleanOp::Union, .. } => "Uni",
            NodeKind::Boolean { op: BooleanOp::Intersection, .. } => "Int",
            NodeKind::Boolean { op: BooleanOp::Subtraction, .. } => "Sub",
            NodeKind::Displaced(_) => "Dis",
        }
    }
}
