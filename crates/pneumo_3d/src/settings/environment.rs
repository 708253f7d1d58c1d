//! Background, image-based lighting and fog

use super::{assign, FieldKey, SectionReader};
use pneumo_core::Color;
use serde::Serialize;

const BACKGROUND_COLOR: FieldKey = FieldKey::flat("background_color");
const IBL_ENABLED: FieldKey = FieldKey::nested("ibl_enabled", "ibl", "enabled");
const IBL_INTENSITY: FieldKey = FieldKey::nested("ibl_intensity", "ibl", "intensity");
const SKYBOX_ENABLED: FieldKey = FieldKey::nested("skybox_enabled", "skybox", "enabled");
const SKYBOX_BLUR: FieldKey = FieldKey::nested("skybox_blur", "skybox", "blur");
const FOG_ENABLED: FieldKey = FieldKey::nested("fog_enabled", "fog", "enabled");
const FOG_COLOR: FieldKey = FieldKey::nested("fog_color", "fog", "color");
const FOG_NEAR: FieldKey = FieldKey::nested("fog_near", "fog", "near");
const FOG_FAR: FieldKey = FieldKey::nested("fog_far", "fog", "far");

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct EnvironmentSettings {
    pub background_color: Color,
    pub ibl_enabled: bool,
    pub ibl_intensity: f32,
    pub skybox_enabled: bool,
    /// Skybox blur amount (0..1)
    pub skybox_blur: f32,
    pub fog_enabled: bool,
    pub fog_color: Color,
    /// Fog start distance (mm)
    pub fog_near: f32,
    /// Fog end distance (mm)
    pub fog_far: f32,
}

impl Default for EnvironmentSettings {
    fn default() -> Self {
        Self {
            background_color: Color::from_hex(0x1f2430),
            ibl_enabled: true,
            ibl_intensity: 1.0,
            skybox_enabled: false,
            skybox_blur: 0.0,
            fog_enabled: false,
            fog_color: Color::from_hex(0x808890),
            fog_near: 2000.0,
            fog_far: 20000.0,
        }
    }
}

impl EnvironmentSettings {
    pub fn apply(&mut self, r: &SectionReader) -> usize {
        let mut n = 0;
        n += assign(&mut self.background_color, r.color(BACKGROUND_COLOR));
        n += assign(&mut self.ibl_enabled, r.flag(IBL_ENABLED));
        n += assign(&mut self.ibl_intensity, r.number(IBL_INTENSITY).map(|v| v.max(0.0)));
        n += assign(&mut self.skybox_enabled, r.flag(SKYBOX_ENABLED));
        n += assign(&mut self.skybox_blur, r.number(SKYBOX_BLUR).map(|v| v.clamp(0.0, 1.0)));
        n += assign(&mut self.fog_enabled, r.flag(FOG_ENABLED));
        n += assign(&mut self.fog_color, r.color(FOG_COLOR));
        n += assign(&mut self.fog_near, r.number(FOG_NEAR).map(|v| v.max(0.0)));
        n += assign(&mut self.fog_far, r.number(FOG_FAR));

        self.fog_far = self.fog_far.max(self.fog_near);
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fog_range_kept_ordered() {
        let mut env = EnvironmentSettings::default();
        let payload = json!({ "fog": { "enabled": "on", "near": 5000, "far": 1000 } });
        let n = env.apply(&SectionReader::new(&payload));

        assert_eq!(n, 3);
        assert!(env.fog_enabled);
        assert_eq!(env.fog_near, 5000.0);
        assert_eq!(env.fog_far, 5000.0);
    }

    #[test]
    fn test_background_color() {
        let mut env = EnvironmentSettings::default();
        let payload = json!({ "backgroundColor": "#000000" });
        env.apply(&SectionReader::new(&payload));
        assert_eq!(env.background_color, Color::BLACK);
    }
}
