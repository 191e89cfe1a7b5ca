use thiserror::Error;

/// Top-level error type for the Z-cut engine.
#[derive(Debug, Error)]
pub enum ZCutError {
    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Invariant(#[from] InvariantError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Errors related to node lookups and derived tree maps.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("node {0} is missing from the parent map")]
    StaleParentMap(String),

    #[error("node {0} is not a primitive")]
    NotPrimitive(String),
}

/// Violations of the foundational assumptions of the Z-cut engine.
///
/// These are never retried: the input tree (or a cut height) is outside
/// what the engine supports and the operation is abandoned.
#[derive(Debug, Error)]
pub enum InvariantError {
    #[error("displacement on {node} has a non-identity rotation")]
    RotatedDisplacement { node: String },

    #[error("left operand of boolean {node} is displaced")]
    DisplacedLeftOperand { node: String },

    #[error("degenerate z range on {node}: [{z0}, {z1}]")]
    DegenerateZRange { node: String, z0: f64, z1: f64 },

    #[error("polycone {node} has {planes} z-planes, cutting supports exactly 2")]
    UnsupportedPolyconePlanes { node: String, planes: usize },

    #[error("cut at local z {z_cut} is outside [{z0}, {z1}) of {node}")]
    CutOutOfRange {
        node: String,
        z_cut: f64,
        z0: f64,
        z1: f64,
    },

    #[error("tube {node} has no displacement to re-centre after cutting")]
    MissingDisplacement { node: String },

    #[error("{node} still straddles z = {z_cut} after cutting")]
    CutDidNotConverge { node: String, z_cut: f64 },
}

/// Errors related to exporting placement transforms.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("transform table holds {values} values for {names} solids")]
    LengthMismatch { values: usize, names: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for results using [`ZCutError`].
pub type Result<T> = std::result::Result<T, ZCutError>;
