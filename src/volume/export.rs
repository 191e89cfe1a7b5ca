use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ExportError, Result};
use crate::math::{object_transform, Matrix4};

use super::PhysicalVolume;

/// Values per flattened 4x4 transform.
const MATRIX_LEN: usize = 16;

/// Tolerance of the identity check in [`TransformTable::dump`].
const IDENTITY_EPSILON: f64 = 1e-6;

/// Returns `true` if the rotation block of a column-major 4x4 matrix is identity.
#[must_use]
pub fn is_identity_rotation_flat(m: &[f64; MATRIX_LEN], epsilon: f64) -> bool {
    (0..3).all(|col| {
        (0..3).all(|row| {
            let expect = if row == col { 1.0 } else { 0.0 };
            (m[col * 4 + row] - expect).abs() <= epsilon
        })
    })
}

/// One object-to-mother transform per volume of a hierarchy, paired with
/// the name of the volume's solid.
///
/// Volumes are listed in preorder. Each transform is flattened column by
/// column, so values `12..15` of a row are `tx, ty, tz, 1`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformTable {
    values: Vec<f64>,
    names: Vec<String>,
}

impl TransformTable {
    /// Collects the transforms of `world` and all volumes placed below it.
    #[must_use]
    pub fn collect(world: &PhysicalVolume) -> Self {
        let mut table = Self::default();
        table.collect_r(world, 0);
        table
    }

    fn collect_r(&mut self, pv: &PhysicalVolume, depth: usize) {
        let lv = &pv.logical;
        tracing::debug!(
            index = self.names.len(),
            depth,
            pv = %pv.name,
            lv = %lv.name,
            solid = %lv.solid,
            material = %lv.material,
            daughters = lv.daughters.len(),
            "collect volume"
        );
        let m = object_transform(&pv.rotation, &pv.translation);
        self.values.extend_from_slice(m.as_slice());
        self.names.push(lv.solid.clone());
        for daughter in &lv.daughters {
            self.collect_r(daughter, depth + 1);
        }
    }

    /// Builds a table from flattened values and solid names.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::LengthMismatch`] unless there are exactly 16
    /// values per name.
    pub fn from_parts(values: Vec<f64>, names: Vec<String>) -> Result<Self> {
        if values.len() != MATRIX_LEN * names.len() {
            return Err(ExportError::LengthMismatch {
                values: values.len(),
                names: names.len(),
            }
            .into());
        }
        Ok(Self { values, names })
    }

    /// Number of volumes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// All values, 16 per volume.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Solid names, one per volume.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Flattened transform of volume `i`.
    #[must_use]
    pub fn row(&self, i: usize) -> Option<&[f64; MATRIX_LEN]> {
        self.values
            .get(i * MATRIX_LEN..(i + 1) * MATRIX_LEN)
            .and_then(|s| s.try_into().ok())
    }

    /// Transform of volume `i` as a matrix.
    #[must_use]
    pub fn matrix(&self, i: usize) -> Option<Matrix4> {
        self.row(i).map(|r| Matrix4::from_column_slice(r))
    }

    /// Solid names joined by newlines, as stored next to the transforms.
    #[must_use]
    pub fn names_metadata(&self) -> String {
        self.names.join("\n")
    }

    /// Encodes the values as a NumPy v1.0 array of shape `(n, 4, 4)`, `<f8`.
    #[must_use]
    pub fn to_npy_bytes(&self) -> Vec<u8> {
        const MAGIC: &[u8] = b"\x93NUMPY\x01\x00";
        let mut header = format!(
            "{{'descr': '<f8', 'fortran_order': False, 'shape': ({}, 4, 4), }}",
            self.len()
        );
        // magic + u16 length + header + newline, padded to a multiple of 64
        let unpadded = MAGIC.len() + 2 + header.len() + 1;
        header.push_str(&" ".repeat((64 - unpadded % 64) % 64));
        header.push('\n');

        let mut out = Vec::with_capacity(MAGIC.len() + 2 + header.len() + 8 * self.values.len());
        out.extend_from_slice(MAGIC);
        let header_len = u16::try_from(header.len()).unwrap_or(u16::MAX);
        out.extend_from_slice(&header_len.to_le_bytes());
        out.extend_from_slice(header.as_bytes());
        for v in &self.values {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out
    }

    /// Writes `<stem>.npy` and `<stem>_meta.txt` into `dir` and returns their paths.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` cannot be created or a file cannot be written.
    pub fn save(&self, dir: &Path, stem: &str) -> Result<(PathBuf, PathBuf)> {
        fs::create_dir_all(dir).map_err(ExportError::from)?;
        let npy = dir.join(format!("{stem}.npy"));
        let meta = dir.join(format!("{stem}_meta.txt"));
        fs::write(&npy, self.to_npy_bytes()).map_err(ExportError::from)?;
        fs::write(&meta, self.names_metadata()).map_err(ExportError::from)?;
        tracing::info!(
            volumes = self.len(),
            npy = %npy.display(),
            meta = %meta.display(),
            "saved transforms"
        );
        Ok((npy, meta))
    }

    /// Logs one event per volume. Identity rotations are left out.
    pub fn dump(&self) {
        for (i, name) in self.names.iter().enumerate() {
            let Some(row) = self.row(i) else { continue };
            let (tx, ty, tz) = (row[12], row[13], row[14]);
            if is_identity_rotation_flat(row, IDENTITY_EPSILON) {
                tracing::info!(i, solid = %name, tx, ty, tz, "transform");
            } else {
                tracing::info!(i, solid = %name, tx, ty, tz, rotation = ?&row[..12], "transform");
            }
        }
    }
}
