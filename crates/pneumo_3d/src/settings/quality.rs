//! Render quality settings

use super::{assign, FieldKey, SectionReader};
use serde::Serialize;
use serde_json::Value;

const ANTIALIASING: FieldKey = FieldKey::nested("antialiasing", "antialiasing", "mode");
const AA_QUALITY: FieldKey = FieldKey::nested("aa_quality", "antialiasing", "quality");
const SHADOWS_ENABLED: FieldKey = FieldKey::nested("shadows_enabled", "shadows", "enabled");
const SHADOW_QUALITY: FieldKey = FieldKey::nested("shadow_quality", "shadows", "quality");
const SHADOW_SOFTNESS: FieldKey = FieldKey::nested("shadow_softness", "shadows", "softness");
const RENDER_SCALE: FieldKey = FieldKey::flat("render_scale");
const FRAME_RATE_LIMIT: FieldKey = FieldKey::flat("frame_rate_limit");

/// Scene antialiasing technique
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AntialiasingMode {
    Off,
    Ssaa,
    #[default]
    Msaa,
}

impl AntialiasingMode {
    /// Accepts `"off"`/`"ssaa"`/`"msaa"` or the index 0/1/2
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "off" | "none" => Some(AntialiasingMode::Off),
                "ssaa" => Some(AntialiasingMode::Ssaa),
                "msaa" => Some(AntialiasingMode::Msaa),
                _ => None,
            },
            Value::Number(n) => match n.as_f64()?.round() as i64 {
                0 => Some(AntialiasingMode::Off),
                1 => Some(AntialiasingMode::Ssaa),
                2 => Some(AntialiasingMode::Msaa),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Four-step quality level shared by antialiasing and shadows
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityLevel {
    Low,
    #[default]
    Medium,
    High,
    VeryHigh,
}

impl QualityLevel {
    /// Accepts names or indices; out-of-range indices clamp
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "low" => Some(QualityLevel::Low),
                "medium" => Some(QualityLevel::Medium),
                "high" => Some(QualityLevel::High),
                "very_high" | "veryhigh" | "very high" => Some(QualityLevel::VeryHigh),
                _ => None,
            },
            Value::Number(n) => {
                let index = n.as_f64()?.round();
                Some(if index <= 0.0 {
                    QualityLevel::Low
                } else if index == 1.0 {
                    QualityLevel::Medium
                } else if index == 2.0 {
                    QualityLevel::High
                } else {
                    QualityLevel::VeryHigh
                })
            }
            _ => None,
        }
    }

    /// Shadow map edge length for this level
    pub fn shadow_map_size(&self) -> u32 {
        match self {
            QualityLevel::Low => 512,
            QualityLevel::Medium => 1024,
            QualityLevel::High => 2048,
            QualityLevel::VeryHigh => 4096,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct QualitySettings {
    pub antialiasing: AntialiasingMode,
    pub aa_quality: QualityLevel,
    pub shadows_enabled: bool,
    pub shadow_quality: QualityLevel,
    /// Shadow filter softness (0..1)
    pub shadow_softness: f32,
    /// Internal resolution multiplier
    pub render_scale: f32,
    /// Frames per second cap, 0 for uncapped
    pub frame_rate_limit: u32,
}

impl Default for QualitySettings {
    fn default() -> Self {
        Self {
            antialiasing: AntialiasingMode::Msaa,
            aa_quality: QualityLevel::High,
            shadows_enabled: true,
            shadow_quality: QualityLevel::Medium,
            shadow_softness: 0.5,
            render_scale: 1.0,
            frame_rate_limit: 144,
        }
    }
}

impl QualitySettings {
    pub fn apply(&mut self, r: &SectionReader) -> usize {
        let mut n = 0;
        n += assign(
            &mut self.antialiasing,
            r.parse(ANTIALIASING, AntialiasingMode::from_value),
        );
        n += assign(&mut self.aa_quality, r.parse(AA_QUALITY, QualityLevel::from_value));
        n += assign(&mut self.shadows_enabled, r.flag(SHADOWS_ENABLED));
        n += assign(
            &mut self.shadow_quality,
            r.parse(SHADOW_QUALITY, QualityLevel::from_value),
        );
        n += assign(&mut self.shadow_softness, r.number(SHADOW_SOFTNESS).map(|v| v.clamp(0.0, 1.0)));
        n += assign(&mut self.render_scale, r.number(RENDER_SCALE).map(|v| v.clamp(0.25, 2.0)));
        n += assign(&mut self.frame_rate_limit, r.count(FRAME_RATE_LIMIT));
        n
    }

    pub fn shadow_map_size(&self) -> u32 {
        self.shadow_quality.shadow_map_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_modes_from_names_and_indices() {
        assert_eq!(AntialiasingMode::from_value(&json!("SSAA")), Some(AntialiasingMode::Ssaa));
        assert_eq!(AntialiasingMode::from_value(&json!(0)), Some(AntialiasingMode::Off));
        assert_eq!(AntialiasingMode::from_value(&json!(7)), None);

        assert_eq!(QualityLevel::from_value(&json!("very_high")), Some(QualityLevel::VeryHigh));
        assert_eq!(QualityLevel::from_value(&json!(9)), Some(QualityLevel::VeryHigh));
        assert_eq!(QualityLevel::from_value(&json!(-1)), Some(QualityLevel::Low));
    }

    #[test]
    fn test_nested_mode_behind_object() {
        let mut quality = QualitySettings::default();
        let payload = json!({ "antialiasing": { "mode": "ssaa", "quality": 0 } });
        assert_eq!(quality.apply(&SectionReader::new(&payload)), 2);
        assert_eq!(quality.antialiasing, AntialiasingMode::Ssaa);
        assert_eq!(quality.aa_quality, QualityLevel::Low);
    }

    #[test]
    fn test_apply() {
        let mut quality = QualitySettings::default();
        let payload = json!({
            "antialiasing": "off",
            "shadows": { "quality": "high", "softness": 3.0 },
            "renderScale": 0.1,
            "frame_rate_limit": 60,
        });
        let n = quality.apply(&SectionReader::new(&payload));

        assert_eq!(n, 5);
        assert_eq!(quality.antialiasing, AntialiasingMode::Off);
        assert_eq!(quality.shadow_quality, QualityLevel::High);
        assert_eq!(quality.shadow_map_size(), 2048);
        assert_eq!(quality.shadow_softness, 1.0);
        assert_eq!(quality.render_scale, 0.25);
        assert_eq!(quality.frame_rate_limit, 60);
    }
}
