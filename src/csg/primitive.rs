use std::f64::consts::TAU;

use crate::error::InvariantError;

/// An ellipsoid with optional flat cuts perpendicular to its z semi-axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Ellipsoid {
    /// Semi-axis along x.
    pub semi_x: f64,
    /// Semi-axis along y.
    pub semi_y: f64,
    /// Semi-axis along z.
    pub semi_z: f64,
    /// Lower cut plane in the local frame.
    pub z_bottom_cut: f64,
    /// Upper cut plane in the local frame.
    pub z_top_cut: f64,
}

impl Ellipsoid {
    /// Creates an uncut ellipsoid, with cut planes at `-semi_z` and `+semi_z`.
    #[must_use]
    pub fn new(semi_x: f64, semi_y: f64, semi_z: f64) -> Self {
        Self {
            semi_x,
            semi_y,
            semi_z,
            z_bottom_cut: -semi_z,
            z_top_cut: semi_z,
        }
    }

    /// Returns the ellipsoid with the given bottom and top cut planes.
    #[must_use]
    pub fn with_z_cuts(mut self, z_bottom_cut: f64, z_top_cut: f64) -> Self {
        self.z_bottom_cut = z_bottom_cut;
        self.z_top_cut = z_top_cut;
        self
    }
}

/// A cylindrical tube segment centred on its local origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Tube {
    /// Inner radius.
    pub r_min: f64,
    /// Outer radius.
    pub r_max: f64,
    /// Half-length along z.
    pub half_z: f64,
    /// Starting azimuth in radians.
    pub start_phi: f64,
    /// Azimuthal sweep in radians.
    pub delta_phi: f64,
}

impl Tube {
    /// Creates a full-sweep tube.
    #[must_use]
    pub fn new(r_min: f64, r_max: f64, half_z: f64) -> Self {
        Self {
            r_min,
            r_max,
            half_z,
            start_phi: 0.0,
            delta_phi: TAU,
        }
    }
}

/// One z-plane of a polycone: the inner and outer radius at height `z`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZPlane {
    pub r_inner: f64,
    pub r_outer: f64,
    pub z: f64,
}

impl ZPlane {
    /// Creates a new z-plane.
    #[must_use]
    pub fn new(r_inner: f64, r_outer: f64, z: f64) -> Self {
        Self {
            r_inner,
            r_outer,
            z,
        }
    }
}

/// A stack of conical sections joining consecutive z-planes.
#[derive(Debug, Clone, PartialEq)]
pub struct PolyconeStack {
    /// Starting azimuth in radians.
    pub start_phi: f64,
    /// Azimuthal sweep in radians.
    pub delta_phi: f64,
    /// Planes ordered by increasing z.
    pub planes: Vec<ZPlane>,
}

impl PolyconeStack {
    /// Creates a full-sweep polycone from its z-planes.
    #[must_use]
    pub fn new(planes: Vec<ZPlane>) -> Self {
        Self {
            start_phi: 0.0,
            delta_phi: TAU,
            planes,
        }
    }
}

/// The primitive shapes the Z-cut engine knows how to classify and cut.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Ellipsoid(Ellipsoid),
    Tube(Tube),
    Polycone(PolyconeStack),
}

impl Primitive {
    /// Returns the z extent `(z0, z1)` of the shape in its own frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the extent is empty or inverted: a tube with a
    /// non-positive half-length, a polycone with fewer than two planes or
    /// with planes not strictly increasing in z.
    pub fn local_z_range(&self, name: &str) -> Result<(f64, f64), InvariantError> {
        let (z0, z1) = match self {
            Primitive::Ellipsoid(e) => (e.z_bottom_cut, e.z_top_cut),
            Primitive::Tube(t) => (-t.half_z, t.half_z),
            Primitive::Polycone(p) => {
                let (Some(first), Some(last)) = (p.planes.first(), p.planes.last()) else {
                    return Err(degenerate(name, 0.0, 0.0));
                };
                if p.planes.len() < 2 {
                    return Err(degenerate(name, first.z, last.z));
                }
                for pair in p.planes.windows(2) {
                    if pair[1].z <= pair[0].z {
                        return Err(degenerate(name, pair[0].z, pair[1].z));
                    }
                }
                (first.z, last.z)
            }
        };
        if z1 <= z0 {
            return Err(degenerate(name, z0, z1));
        }
        Ok((z0, z1))
    }

    /// Short type name used in diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Primitive::Ellipsoid(_) => "Ellipsoid",
            Primitive::Tube(_) => "Tube",
            Primitive::Polycone(_) => "Polycone",
        }
    }
}

fn degenerate(name: &str, z0: f64, z1: f64) -> InvariantError {
    InvariantError::DegenerateZRange {
        node: name.to_owned(),
        z0,
        z1,
    }
}

impl From<Ellipsoid> for Primitive {
    fn from(value: Ellipsoid) -> Self {
        Primitive::Ellipsoid(value)
    }
}

impl From<Tube> for Primitive {
    fn from(value: Tube) -> Self {
        Primitive::Tube(value)
    }
}

impl From<PolyconeStack> for Primitive {
    fn from(value: PolyconeStack) -> Self {
        Primitive::Polycone(value)
    }
}
