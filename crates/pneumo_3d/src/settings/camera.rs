//! Orbit camera settings

use super::{assign, FieldKey, SectionReader};
use crate::render::ViewParams;
use serde::Serialize;

const FOV: FieldKey = FieldKey::flat("fov");
const NEAR: FieldKey = FieldKey::flat("near");
const FAR: FieldKey = FieldKey::flat("far");
const ORBIT_DISTANCE: FieldKey = FieldKey::nested("orbit_distance", "orbit", "distance");
const ORBIT_YAW: FieldKey = FieldKey::nested("orbit_yaw", "orbit", "yaw");
const ORBIT_PITCH: FieldKey = FieldKey::nested("orbit_pitch", "orbit", "pitch");
const AUTO_ROTATE: FieldKey = FieldKey::flat("auto_rotate");
const AUTO_ROTATE_SPEED: FieldKey = FieldKey::flat("auto_rotate_speed");

/// Orbit camera around the vehicle frame
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CameraSettings {
    /// Vertical field of view in degrees
    pub fov: f32,
    /// Near clip plane (mm)
    pub near: f32,
    /// Far clip plane (mm)
    pub far: f32,
    pub orbit_distance: f32,
    pub orbit_yaw: f32,
    pub orbit_pitch: f32,
    pub auto_rotate: bool,
    /// Degrees per frame while auto-rotating
    pub auto_rotate_speed: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov: 60.0,
            near: 10.0,
            far: 50000.0,
            orbit_distance: 3500.0,
            orbit_yaw: 30.0,
            orbit_pitch: -10.0,
            auto_rotate: false,
            auto_rotate_speed: 0.5,
        }
    }
}

impl CameraSettings {
    pub fn apply(&mut self, r: &SectionReader) -> usize {
        let mut n = 0;
        n += assign(&mut self.fov, r.number(FOV).map(|v| v.clamp(10.0, 120.0)));
        n += assign(&mut self.near, r.number(NEAR).map(|v| v.max(0.1)));
        n += assign(&mut self.far, r.number(FAR));
        n += assign(&mut self.orbit_distance, r.number(ORBIT_DISTANCE).map(|v| v.max(100.0)));
        n += assign(&mut self.orbit_yaw, r.number(ORBIT_YAW));
        n += assign(&mut self.orbit_pitch, r.number(ORBIT_PITCH).map(|v| v.clamp(-89.0, 89.0)));
        n += assign(&mut self.auto_rotate, r.flag(AUTO_ROTATE));
        n += assign(&mut self.auto_rotate_speed, r.number(AUTO_ROTATE_SPEED).map(|v| v.max(0.0)));

        // Far plane must stay beyond the near plane
        self.far = self.far.max(self.near + 1.0);
        n
    }

    /// Clip planes for depth linearization
    pub fn view_params(&self) -> ViewParams {
        ViewParams {
            near: self.near,
            far: self.far,
        }
    }
}
