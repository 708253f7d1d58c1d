//! Scene lighting settings

use super::{assign, FieldKey, SectionReader};
use pneumo_core::Color;
use serde::Serialize;

const KEY_BRIGHTNESS: FieldKey = FieldKey::nested("key_brightness", "key_light", "brightness");
const KEY_COLOR: FieldKey = FieldKey::nested("key_color", "key_light", "color");
const KEY_ANGLE_X: FieldKey = FieldKey::nested("key_angle_x", "key_light", "angle_x");
const KEY_ANGLE_Y: FieldKey = FieldKey::nested("key_angle_y", "key_light", "angle_y");
const FILL_BRIGHTNESS: FieldKey = FieldKey::nested("fill_brightness", "fill_light", "brightness");
const FILL_COLOR: FieldKey = FieldKey::nested("fill_color", "fill_light", "color");
const RIM_BRIGHTNESS: FieldKey = FieldKey::nested("rim_brightness", "rim_light", "brightness");
const RIM_COLOR: FieldKey = FieldKey::nested("rim_color", "rim_light", "color");
const POINT_BRIGHTNESS: FieldKey = FieldKey::nested("point_brightness", "point_light", "brightness");
const POINT_COLOR: FieldKey = FieldKey::nested("point_color", "point_light", "color");
const POINT_Y: FieldKey = FieldKey::nested("point_y", "point_light", "position_y");
const POINT_FADE: FieldKey = FieldKey::nested("point_fade", "point_light", "fade");
const CAST_SHADOWS: FieldKey = FieldKey::nested("cast_shadows", "key_light", "cast_shadow");

/// Three-point rig plus one point light above the frame
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LightingSettings {
    pub key_brightness: f32,
    pub key_color: Color,
    /// Key light pitch in degrees
    pub key_angle_x: f32,
    /// Key light yaw in degrees
    pub key_angle_y: f32,
    pub fill_brightness: f32,
    pub fill_color: Color,
    pub rim_brightness: f32,
    pub rim_color: Color,
    pub point_brightness: f32,
    pub point_color: Color,
    /// Point light height (mm)
    pub point_y: f32,
    /// Quadratic fade factor of the point light
    pub point_fade: f32,
    pub cast_shadows: bool,
}

impl Default for LightingSettings {
    fn default() -> Self {
        Self {
            key_brightness: 1.2,
            key_color: Color::WHITE,
            key_angle_x: -35.0,
            key_angle_y: -40.0,
            fill_brightness: 0.7,
            fill_color: Color::from_hex(0xdfe7ff),
            rim_brightness: 1.0,
            rim_color: Color::from_hex(0xffe2b0),
            point_brightness: 1000.0,
            point_color: Color::from_hex(0xffffff),
            point_y: 1800.0,
            point_fade: 0.00008,
            cast_shadows: true,
        }
    }
}

impl LightingSettings {
    pub fn apply(&mut self, r: &SectionReader) -> usize {
        let non_negative = |v: f32| v.max(0.0);

        let mut n = 0;
        n += assign(&mut self.key_brightness, r.number(KEY_BRIGHTNESS).map(non_negative));
        n += assign(&mut self.key_color, r.color(KEY_COLOR));
        n += assign(&mut self.key_angle_x, r.number(KEY_ANGLE_X));
        n += assign(&mut self.key_angle_y, r.number(KEY_ANGLE_Y));
        n += assign(&mut self.fill_brightness, r.number(FILL_BRIGHTNESS).map(non_negative));
        n += assign(&mut self.fill_color, r.color(FILL_COLOR));
        n += assign(&mut self.rim_brightness, r.number(RIM_BRIGHTNESS).map(non_negative));
        n += assign(&mut self.rim_color, r.color(RIM_COLOR));
        n += assign(&mut self.point_brightness, r.number(POINT_BRIGHTNESS).map(non_negative));
        n += assign(&mut self.point_color, r.color(POINT_COLOR));
        n += assign(&mut self.point_y, r.number(POINT_Y));
        n += assign(&mut self.point_fade, r.number(POINT_FADE).map(non_negative));
        n += assign(&mut self.cast_shadows, r.flag(CAST_SHADOWS));
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_lights() {
        let mut lighting = LightingSettings::default();
        let payload = json!({
            "key_light": { "brightness": 2.5, "color": "#ff0000", "angleY": 15 },
            "fillBrightness": -1,
            "point_light": { "color": "not-a-colour" },
        });
        let n = lighting.apply(&SectionReader::new(&payload));

        assert_eq!(n, 4);
        assert_eq!(lighting.key_brightness, 2.5);
        assert_eq!(lighting.key_color, Color::RED);
        assert_eq!(lighting.key_angle_y, 15.0);
        assert_eq!(lighting.fill_brightness, 0.0);
        assert_eq!(lighting.point_color, Color::from_hex(0xffffff));
    }
}
