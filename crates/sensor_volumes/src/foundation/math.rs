//! Math utilities and types
//!
//! Provides the double precision math types used for globe-scale geometry.
//! Vertex data handed to the backend is narrowed to `f32` only at upload time.

pub use nalgebra::{
    Vector3,
    Matrix3, Matrix4,
    Quaternion,
    Unit,
};

/// 3D vector type
pub type Vec3 = Vector3<f64>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f64>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f64>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f64>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f64>>;

/// Direction expressed as clock and cone angles
///
/// The clock angle is measured in the sensor's X-Y plane from +X toward +Y.
/// The cone angle is measured from the +Z boresight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spherical {
    /// Clock (azimuth) angle in radians
    pub clock: f64,
    /// Cone angle from +Z in radians
    pub cone: f64,
}

impl Spherical {
    /// Create a spherical direction
    pub const fn new(clock: f64, cone: f64) -> Self {
        Self { clock, cone }
    }

    /// Convert to a unit cartesian vector
    pub fn to_cartesian(self) -> Vec3 {
        let sin_cone = self.cone.sin();
        Vec3::new(
            sin_cone * self.clock.cos(),
            sin_cone * self.clock.sin(),
            self.cone.cos(),
        )
    }
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f64 = std::f64::consts::PI;

    /// 2 * Pi
    pub const TAU: f64 = 2.0 * PI;

    /// Pi / 2
    pub const HALF_PI: f64 = PI * 0.5;

    /// Pi / 4
    pub const QUARTER_PI: f64 = PI * 0.25;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f64 = PI / 180.0;
}

/// Math utility functions
pub mod utils {
    use super::{constants, Mat4, Quat, Vec3};

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f64) -> f64 {
        degrees * constants::DEG_TO_RAD
    }

    /// Clamp a value between min and max
    pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
        if value < min { min } else if value > max { max } else { value }
    }

    /// Angle in radians between two vectors, zero when either is degenerate
    pub fn angle_between(a: &Vec3, b: &Vec3) -> f64 {
        let denom = a.norm() * b.norm();
        if denom == 0.0 {
            return 0.0;
        }
        // atan2 stays accurate for nearly parallel vectors where acos does not
        a.cross(b).norm().atan2(a.dot(b))
    }

    /// Normalize a vector, returning zero for a zero-length input
    pub fn normalize_or_zero(v: &Vec3) -> Vec3 {
        v.try_normalize(0.0).unwrap_or_else(Vec3::zeros)
    }

    /// Build a model matrix from a rotation and a translation
    pub fn from_rotation_translation(rotation: &Quat, translation: &Vec3) -> Mat4 {
        let mut matrix = rotation.to_homogeneous();
        matrix[(0, 3)] = translation.x;
        matrix[(1, 3)] = translation.y;
        matrix[(2, 3)] = translation.z;
        matrix
    }

    /// Largest column scale of the upper 3x3 part of a matrix
    pub fn maximum_scale(matrix: &Mat4) -> f64 {
        let x = Vec3::new(matrix.m11, matrix.m21, matrix.m31).norm();
        let y = Vec3::new(matrix.m12, matrix.m22, matrix.m32).norm();
        let z = Vec3::new(matrix.m13, matrix.m23, matrix.m33).norm();
        x.max(y).max(z)
    }
}

/// Extension trait for Mat3 rotations
pub trait Mat3Ext {
    /// Create a rotation matrix around the Y axis
    fn rotation_y(angle: f64) -> Mat3;

    /// Create a rotation matrix around the Z axis
    fn rotation_z(angle: f64) -> Mat3;
}

impl Mat3Ext for Mat3 {
    fn rotation_y(angle: f64) -> Mat3 {
        nalgebra::Rotation3::from_axis_angle(&Vec3::y_axis(), angle).into_inner()
    }

    fn rotation_z(angle: f64) -> Mat3 {
        nalgebra::Rotation3::from_axis_angle(&Vec3::z_axis(), angle).into_inner()
    }
}
