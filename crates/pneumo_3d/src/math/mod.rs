//! Math utilities for suspension geometry

mod extensions;

pub use extensions::{mat4_mul, Mat4Ext, Vec3Ext};

// Re-export common math types from pneumo_core
pub use pneumo_core::{Mat4, Vec2, Vec3};
