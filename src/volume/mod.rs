//! Placement hierarchies and the export of their transforms.
//!
//! A physical volume places a logical volume in its mother with a rotation
//! and translation; a logical volume names its solid and material and holds
//! the placements of its daughters.

mod export;

pub use export::{is_identity_rotation_flat, TransformTable};

use crate::math::{Rotation3, Vector3};

/// An unplaced volume: a solid, a material and placed daughters.
#[derive(Debug, Clone)]
pub struct LogicalVolume {
    pub name: String,
    /// Name of the solid giving the volume its shape.
    pub solid: String,
    pub material: String,
    pub daughters: Vec<PhysicalVolume>,
}

impl LogicalVolume {
    /// Creates a logical volume with no daughters.
    #[must_use]
    pub fn new(name: impl Into<String>, solid: impl Into<String>, material: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            solid: solid.into(),
            material: material.into(),
            daughters: Vec::new(),
        }
    }

    /// Places a daughter inside this volume.
    pub fn add_daughter(&mut self, daughter: PhysicalVolume) {
        self.daughters.push(daughter);
    }

    /// Builder form of [`LogicalVolume::add_daughter`].
    #[must_use]
    pub fn with_daughter(mut self, daughter: PhysicalVolume) -> Self {
        self.add_daughter(daughter);
        self
    }
}

/// A logical volume placed in its mother's frame.
#[derive(Debug, Clone)]
pub struct PhysicalVolume {
    pub name: String,
    pub logical: LogicalVolume,
    /// Object-to-mother rotation.
    pub rotation: Rotation3,
    /// Object-to-mother translation.
    pub translation: Vector3,
}

impl PhysicalVolume {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        logical: LogicalVolume,
        rotation: Rotation3,
        translation: Vector3,
    ) -> Self {
        Self {
            name: name.into(),
            logical,
            rotation,
            translation,
        }
    }

    /// Places `logical` with a translation only.
    #[must_use]
    pub fn translated(name: impl Into<String>, logical: LogicalVolume, translation: Vector3) -> Self {
        Self::new(name, logical, Rotation3::identity(), translation)
    }

    /// Places `logical` at the origin as the top of a hierarchy, named `<logical>_phys`.
    #[must_use]
    pub fn world(logical: LogicalVolume) -> Self {
        let name = format!("{}_phys", logical.name);
        Self::translated(name, logical, Vector3::zeros())
    }
}
