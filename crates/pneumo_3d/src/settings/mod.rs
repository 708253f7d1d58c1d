//! Inbound parameter payload schema
//!
//! The simulation/UI process pushes complete or partial settings as a JSON
//! object with one sub-object per section:
//!
//! ```json
//! {
//!     "geometry":    { "lever_length": 800, "rodPosition": 0.6 },
//!     "camera":      { "fov": 55 },
//!     "effects":     { "bloom": { "enabled": true, "intensity": 0.4 } },
//!     "animation":   { "is_running": true, "frequency": 1.5 }
//! }
//! ```
//!
//! Every section is a typed struct with defaults. Fields are read through
//! [`SectionReader`] (snake_case, camelCase and nested spellings), clamped
//! into their valid range and assigned. Unknown keys are ignored.

mod animation;
mod camera;
mod environment;
mod geometry;
mod lighting;
mod materials;
mod quality;
mod reader;

pub use animation::AnimationSettings;
pub use camera::CameraSettings;
pub use environment::EnvironmentSettings;
pub use geometry::GeometrySettings;
pub use lighting::LightingSettings;
pub use materials::{MaterialParams, MaterialSettings, MaterialSlot};
pub use quality::{AntialiasingMode, QualityLevel, QualitySettings};
pub use reader::{coerce_bool, coerce_number, to_camel_case, FieldKey, FieldKeys, SectionReader};

use serde::Serialize;
use std::fmt;

/// Payload sections in application order
pub const SECTIONS: [&str; 8] = [
    "geometry",
    "camera",
    "lighting",
    "environment",
    "quality",
    "materials",
    "effects",
    "animation",
];

/// Assign an optional value, counting it as one updated field
pub(crate) fn assign<T>(target: &mut T, value: Option<T>) -> usize {
    match value {
        Some(v) => {
            *target = v;
            1
        }
        None => 0,
    }
}

/// Everything in the scene except the post effects
#[derive(Clone, Debug, Default, Serialize)]
pub struct SceneSettings {
    pub geometry: GeometrySettings,
    pub camera: CameraSettings,
    pub lighting: LightingSettings,
    pub environment: EnvironmentSettings,
    pub quality: QualitySettings,
    pub materials: MaterialSettings,
    pub animation: AnimationSettings,
}

impl SceneSettings {
    /// Apply one named section; returns the number of fields read, or
    /// `None` for a section this struct does not own
    pub fn apply_section(&mut self, name: &str, reader: &SectionReader) -> Option<usize> {
        let fields = match name {
            "geometry" => self.geometry.apply(reader),
            "camera" => self.camera.apply(reader),
            "lighting" => self.lighting.apply(reader),
            "environment" => self.environment.apply(reader),
            "quality" => self.quality.apply(reader),
            "materials" => self.materials.apply(reader),
            "animation" => self.animation.apply(reader),
            _ => return None,
        };
        Some(fields)
    }
}

/// What a batch update touched
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ApplySummary {
    /// Sections present in the payload, in application order
    pub sections: Vec<&'static str>,
    /// Number of fields that were read and assigned
    pub fields: usize,
    /// Number of piston positions assigned
    pub pistons: usize,
}

impl ApplySummary {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty() && self.pistons == 0
    }
}

impl fmt::Display for ApplySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "nothing applied");
        }
        write!(
            f,
            "applied [{}] ({} fields",
            self.sections.join(", "),
            self.fields
        )?;
        if self.pistons > 0 {
            write!(f, ", {} pistons", self.pistons)?;
        }
        write!(f, ")")
    }
}
