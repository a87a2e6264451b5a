//! Math types shared by the transform hierarchy and the render surface.
//!
//! Everything is a thin alias over `nalgebra` so that callers never have to
//! spell out the generic parameters.

pub use nalgebra::{Matrix3, Matrix4, Quaternion, Unit, Vector3, Vector4};

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

/// Unit quaternion used for all rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Position, rotation and scale triple
///
/// Used as the local part of every transform node. The matrix form is
/// `T * R * S`, so scale is applied first and translation last.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Translation
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Per-axis scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Transform with only a translation
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Transform with translation and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Full TRS constructor
    pub fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Builder: replace the scale with a uniform factor
    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::new(scale, scale, scale);
        self
    }

    /// Homogeneous matrix `translate * rotate * scale`
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Decompose a TRS matrix. Shear is discarded.
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let position = Vec3::new(matrix.m14, matrix.m24, matrix.m34);

        let scale = Vec3::new(
            Vec3::new(matrix.m11, matrix.m21, matrix.m31).magnitude(),
            Vec3::new(matrix.m12, matrix.m22, matrix.m32).magnitude(),
            Vec3::new(matrix.m13, matrix.m23, matrix.m33).magnitude(),
        );

        let rotation_matrix = Mat3::new(
            matrix.m11 / scale.x, matrix.m12 / scale.y, matrix.m13 / scale.z,
            matrix.m21 / scale.x, matrix.m22 / scale.y, matrix.m23 / scale.z,
            matrix.m31 / scale.x, matrix.m32 / scale.y, matrix.m33 / scale.z,
        );

        Self {
            position,
            rotation: Quat::from_matrix(&rotation_matrix),
            scale,
        }
    }

    /// Apply this transform to a point
    pub fn transform_point(&self, point: &Point3) -> Point3 {
        self.to_matrix().transform_point(point)
    }

    /// Compose `self` (parent) with `child`
    ///
    /// Exact for uniform scale; with non-uniform parent scale and a rotated
    /// child the matrix form is the only faithful representation.
    pub fn combine(&self, child: &Transform) -> Transform {
        Transform {
            position: self.position + self.rotation * self.scale.component_mul(&child.position),
            rotation: self.rotation * child.rotation,
            scale: self.scale.component_mul(&child.scale),
        }
    }

    /// Inverse transform
    pub fn inverse(&self) -> Transform {
        let inv_scale = Vec3::new(1.0 / self.scale.x, 1.0 / self.scale.y, 1.0 / self.scale.z);
        let inv_rotation = self.rotation.inverse();
        let inv_position = inv_rotation * (-self.position.component_mul(&inv_scale));

        Transform {
            position: inv_position,
            rotation: inv_rotation,
            scale: inv_scale,
        }
    }
}

/// Math utility functions
pub mod utils {
    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees.to_radians()
    }

    /// Linear interpolation
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }
}
