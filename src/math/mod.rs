/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// 3D rotation type.
pub type Rotation3 = nalgebra::Rotation3<f64>;

/// 4x4 transformation matrix.
pub type Matrix4 = nalgebra::Matrix4<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Returns `true` if every element of `rotation` is within `epsilon` of the identity.
#[must_use]
pub fn is_identity_rotation(rotation: &Rotation3, epsilon: f64) -> bool {
    let m = rotation.matrix();
    (0..3).all(|i| {
        (0..3).all(|j| {
            let expect = if i == j { 1.0 } else { 0.0 };
            (m[(i, j)] - expect).abs() <= epsilon
        })
    })
}

/// Composes a rotation and translation into an object-to-mother transform.
#[must_use]
pub fn object_transform(rotation: &Rotation3, translation: &Vector3) -> Matrix4 {
    let mut m = rotation.to_homogeneous();
    m[(0, 3)] = translation.x;
    m[(1, 3)] = translation.y;
    m[(2, 3)] = translation.z;
    m
}
