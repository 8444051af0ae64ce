//! Math utilities and types
//!
//! Provides the fundamental math types used by the transform hierarchy and the
//! collision core. All matrices use nalgebra's column-vector convention, so a
//! world matrix is composed as `parent * translation * rotation * scale`.

pub use nalgebra::{
    Vector3, Vector4,
    Matrix3, Matrix4,
    Quaternion,
    Unit,
};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Scale components smaller than this are treated as zero during decomposition
const MIN_SCALE: f32 = 1.0e-8;

/// Translation, rotation and scale extracted from an affine matrix
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decomposed {
    /// Translation column
    pub translation: Vec3,
    /// Rotation with scale removed
    pub rotation: Quat,
    /// Per-axis scale (x is negated for mirrored matrices)
    pub scale: Vec3,
}

impl Default for Decomposed {
    fn default() -> Self {
        Self {
            translation: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Decomposed {
    /// Recompose into a single `T * R * S` matrix
    pub fn to_matrix(&self) -> Mat4 {
        compose_trs(&self.translation, &self.rotation, &self.scale)
    }
}

/// Build a `T * R * S` matrix
pub fn compose_trs(translation: &Vec3, rotation: &Quat, scale: &Vec3) -> Mat4 {
    Mat4::new_translation(translation)
        * rotation.to_homogeneous()
        * Mat4::new_nonuniform_scaling(scale)
}

/// Decompose an affine matrix into translation, rotation and scale
///
/// Shear is not representable and is folded into the rotation estimate.
/// A zero-length basis column leaves the rotation as identity for that axis.
pub fn decompose(matrix: &Mat4) -> Decomposed {
    let translation = Vec3::new(matrix.m14, matrix.m24, matrix.m34);

    let linear: Mat3 = matrix.fixed_view::<3, 3>(0, 0).into_owned();
    let mut scale = Vec3::new(
        linear.column(0).norm(),
        linear.column(1).norm(),
        linear.column(2).norm(),
    );

    // A mirrored basis cannot be a pure rotation; carry the flip on x.
    if linear.determinant() < 0.0 {
        scale.x = -scale.x;
    }

    let mut rotation_matrix = Mat3::identity();
    for axis in 0..3 {
        if scale[axis].abs() > MIN_SCALE {
            rotation_matrix.set_column(axis, &(linear.column(axis) / scale[axis]));
        }
    }
    let rotation = Quat::from_matrix(&rotation_matrix);

    Decomposed {
        translation,
        rotation,
        scale,
    }
}

/// Build a rotation from Euler angles in radians
///
/// `angles` is `(pitch, yaw, roll)`: rotation about X, Y and Z respectively,
/// applied X first, then Y, then Z.
pub fn quat_from_euler(angles: &Vec3) -> Quat {
    Quat::from_euler_angles(angles.x, angles.y, angles.z)
}

/// Inverse of [`quat_from_euler`]
pub fn euler_from_quat(rotation: &Quat) -> Vec3 {
    let (pitch, yaw, roll) = rotation.euler_angles();
    Vec3::new(pitch, yaw, roll)
}

/// Inverse-transpose of the matrix, used for transforming normals
///
/// Returns `None` for singular matrices (e.g. a zero scale axis).
pub fn inverse_transpose(matrix: &Mat4) -> Option<Mat4> {
    matrix.try_inverse().map(|inverse| inverse.transpose())
}

/// Transform an object-space position by an affine matrix
pub fn transform_position(matrix: &Mat4, position: &Vec3) -> Vec3 {
    matrix.transform_point(&Point3::from(*position)).coords
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }
}
