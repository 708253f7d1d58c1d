//! PBR material slots for the suspension models

use super::{assign, FieldKey, SectionReader};
use pneumo_core::Color;
use rustc_hash::FxHashMap;
use serde::Serialize;

const BASE_COLOR: FieldKey = FieldKey::flat("base_color");
const COLOR: FieldKey = FieldKey::flat("color");
const METALNESS: FieldKey = FieldKey::flat("metalness");
const ROUGHNESS: FieldKey = FieldKey::flat("roughness");
const OPACITY: FieldKey = FieldKey::flat("opacity");

/// Named material slot, one per model part
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialSlot {
    Frame,
    Lever,
    TailRod,
    Cylinder,
    PistonBody,
    PistonRod,
    JointTail,
    JointArm,
    JointRod,
}

impl MaterialSlot {
    pub const ALL: [MaterialSlot; 9] = [
        MaterialSlot::Frame,
        MaterialSlot::Lever,
        MaterialSlot::TailRod,
        MaterialSlot::Cylinder,
        MaterialSlot::PistonBody,
        MaterialSlot::PistonRod,
        MaterialSlot::JointTail,
        MaterialSlot::JointArm,
        MaterialSlot::JointRod,
    ];

    /// Payload key of this slot
    pub fn key(&self) -> &'static str {
        match self {
            MaterialSlot::Frame => "frame",
            MaterialSlot::Lever => "lever",
            MaterialSlot::TailRod => "tail_rod",
            MaterialSlot::Cylinder => "cylinder",
            MaterialSlot::PistonBody => "piston_body",
            MaterialSlot::PistonRod => "piston_rod",
            MaterialSlot::JointTail => "joint_tail",
            MaterialSlot::JointArm => "joint_arm",
            MaterialSlot::JointRod => "joint_rod",
        }
    }

    fn default_params(&self) -> MaterialParams {
        match self {
            MaterialSlot::Frame => MaterialParams::new(Color::from_hex(0xcc0000), 0.8, 0.4),
            MaterialSlot::Lever => MaterialParams::new(Color::from_hex(0x888888), 1.0, 0.28),
            MaterialSlot::TailRod => MaterialParams::new(Color::from_hex(0xcccccc), 1.0, 0.3),
            MaterialSlot::Cylinder => {
                MaterialParams::new(Color::from_hex(0xe1f5ff), 0.0, 0.05).with_opacity(0.35)
            }
            MaterialSlot::PistonBody => MaterialParams::new(Color::from_hex(0xff0066), 1.0, 0.26),
            MaterialSlot::PistonRod => MaterialParams::new(Color::from_hex(0xececec), 1.0, 0.18),
            MaterialSlot::JointTail => MaterialParams::new(Color::from_hex(0x2a82ff), 0.9, 0.35),
            MaterialSlot::JointArm => MaterialParams::new(Color::from_hex(0xff9c3a), 0.9, 0.32),
            MaterialSlot::JointRod => MaterialParams::new(Color::from_hex(0x00ff55), 0.9, 0.3),
        }
    }
}

/// Metal/roughness parameters of one slot, all in 0..1
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MaterialParams {
    pub base_color: Color,
    pub metalness: f32,
    pub roughness: f32,
    pub opacity: f32,
}

impl MaterialParams {
    pub fn new(base_color: Color, metalness: f32, roughness: f32) -> Self {
        Self {
            base_color,
            metalness,
            roughness,
            opacity: 1.0,
        }
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn is_transparent(&self) -> bool {
        self.opacity < 1.0
    }

    fn apply(&mut self, r: &SectionReader) -> usize {
        let unit = |v: f32| v.clamp(0.0, 1.0);

        let mut n = 0;
        n += assign(&mut self.base_color, r.color(BASE_COLOR).or_else(|| r.color(COLOR)));
        n += assign(&mut self.metalness, r.number(METALNESS).map(unit));
        n += assign(&mut self.roughness, r.number(ROUGHNESS).map(unit));
        n += assign(&mut self.opacity, r.number(OPACITY).map(unit));
        n
    }
}

/// Material table keyed by slot
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MaterialSettings {
    slots: FxHashMap<MaterialSlot, MaterialParams>,
}

impl Default for MaterialSettings {
    fn default() -> Self {
        let slots = MaterialSlot::ALL
            .iter()
            .map(|slot| (*slot, slot.default_params()))
            .collect();
        Self { slots }
    }
}

impl MaterialSettings {
    pub fn get(&self, slot: MaterialSlot) -> MaterialParams {
        self.slots
            .get(&slot)
            .copied()
            .unwrap_or_else(|| slot.default_params())
    }

    pub fn get_mut(&mut self, slot: MaterialSlot) -> &mut MaterialParams {
        self.slots
            .entry(slot)
            .or_insert_with(|| slot.default_params())
    }

    /// Slots in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (MaterialSlot, MaterialParams)> + '_ {
        MaterialSlot::ALL.iter().map(|slot| (*slot, self.get(*slot)))
    }

    pub fn apply(&mut self, r: &SectionReader) -> usize {
        MaterialSlot::ALL
            .iter()
            .map(|slot| {
                let child = r.child(slot.key());
                if child.is_present() {
                    self.get_mut(*slot).apply(&child)
                } else {
                    0
                }
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_cover_every_slot() {
        let materials = MaterialSettings::default();
        assert_eq!(materials.iter().count(), MaterialSlot::ALL.len());
        assert!(materials.get(MaterialSlot::Cylinder).is_transparent());
        assert!(!materials.get(MaterialSlot::Frame).is_transparent());
    }

    #[test]
    fn test_apply_slots() {
        let mut materials = MaterialSettings::default();
        let payload = json!({
            "frame": { "color": "#00ff00", "metalness": 2.0 },
            "pistonRod": { "roughness": -0.5 },
            "unknown_part": { "roughness": 0.9 },
        });
        let n = materials.apply(&SectionReader::new(&payload));

        assert_eq!(n, 3);
        let frame = materials.get(MaterialSlot::Frame);
        assert_eq!(frame.base_color, Color::GREEN);
        assert_eq!(frame.metalness, 1.0);
        assert_eq!(materials.get(MaterialSlot::PistonRod).roughness, 0.0);
    }

    #[test]
    fn test_base_color_wins_over_color() {
        let mut materials = MaterialSettings::default();
        let payload = json!({ "lever": { "base_color": "#0000ff", "color": "#ff0000" } });
        materials.apply(&SectionReader::new(&payload));
        assert_eq!(materials.get(MaterialSlot::Lever).base_color, Color::BLUE);
    }
}
