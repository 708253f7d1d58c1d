//! Math extension methods for pneumo_core types
//!
//! Provides the extra vector and matrix operations used to place the
//! suspension primitives.

use pneumo_core::{Mat4, Vec3};

/// Extension trait for Vec3
pub trait Vec3Ext {
    /// Linear interpolation
    fn lerp(&self, other: Vec3, t: f32) -> Vec3;
    /// Midpoint between two points
    fn midpoint(&self, other: Vec3) -> Vec3;
    /// In-plane (XY) perpendicular, rotated +90 degrees about Z
    fn perpendicular_xy(&self) -> Vec3;
    /// Angle of the XY projection in degrees, measured from +X
    fn angle_xy_deg(&self) -> f32;
}

impl Vec3Ext for Vec3 {
    fn lerp(&self, other: Vec3, t: f32) -> Vec3 {
        Vec3::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
            self.z + (other.z - self.z) * t,
        )
    }

    fn midpoint(&self, other: Vec3) -> Vec3 {
        self.lerp(other, 0.5)
    }

    fn perpendicular_xy(&self) -> Vec3 {
        Vec3::new(-self.y, self.x, 0.0).normalize()
    }

    fn angle_xy_deg(&self) -> f32 {
        self.y.atan2(self.x).to_degrees()
    }
}

/// Extension trait for Mat4
pub trait Mat4Ext {
    /// Create a translation matrix
    fn from_translation(v: Vec3) -> Mat4;
    /// Create a scale matrix
    fn from_scale(v: Vec3) -> Mat4;
    /// Create a rotation matrix around the Z axis
    fn from_rotation_z(angle: f32) -> Mat4;
    /// Transform a point (Vec3)
    fn transform_point(&self, p: Vec3) -> Vec3;
    /// Transform a direction (Vec3, ignores translation)
    fn transform_vector(&self, v: Vec3) -> Vec3;
}

impl Mat4Ext for Mat4 {
    fn from_translation(v: Vec3) -> Mat4 {
        Mat4::translation(v.x, v.y, v.z)
    }

    fn from_scale(v: Vec3) -> Mat4 {
        Mat4::scale(v.x, v.y, v.z)
    }

    fn from_rotation_z(angle: f32) -> Mat4 {
        Mat4::rotation_z(angle)
    }

    fn transform_point(&self, p: Vec3) -> Vec3 {
        let x = self.cols[0][0] * p.x + self.cols[1][0] * p.y + self.cols[2][0] * p.z + self.cols[3][0];
        let y = self.cols[0][1] * p.x + self.cols[1][1] * p.y + self.cols[2][1] * p.z + self.cols[3][1];
        let z = self.cols[0][2] * p.x + self.cols[1][2] * p.y + self.cols[2][2] * p.z + self.cols[3][2];
        Vec3::new(x, y, z)
    }

    fn transform_vector(&self, v: Vec3) -> Vec3 {
        let x = self.cols[0][0] * v.x + self.cols[1][0] * v.y + self.cols[2][0] * v.z;
        let y = self.cols[0][1] * v.x + self.cols[1][1] * v.y + self.cols[2][1] * v.z;
        let z = self.cols[0][2] * v.x + self.cols[1][2] * v.y + self.cols[2][2] * v.z;
        Vec3::new(x, y, z)
    }
}

/// `a * b`, applying `b` first
pub fn mat4_mul(a: &Mat4, b: &Mat4) -> Mat4 {
    a.mul(b)
}
