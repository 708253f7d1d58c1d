//! Frame and linkage dimensions

use super::{assign, FieldKey, SectionReader};
use crate::suspension::{CornerConfig, RigLayout, SuspensionRig, PISTON_END_MARGIN};
use pneumo_core::UnitRule;
use serde::Serialize;

const FRAME_LENGTH: FieldKey = FieldKey::flat("frame_length");
const FRAME_HEIGHT: FieldKey = FieldKey::flat("frame_height");
const FRAME_BEAM_SIZE: FieldKey = FieldKey::flat("frame_beam_size");
const TRACK_WIDTH: FieldKey = FieldKey::flat("track_width");
const WHEELBASE: FieldKey = FieldKey::flat("wheelbase");
const FRAME_TO_PIVOT: FieldKey = FieldKey::flat("frame_to_pivot");
const LEVER_LENGTH: FieldKey = FieldKey::flat("lever_length");
const ROD_POSITION: FieldKey = FieldKey::flat("rod_position");
const CYLINDER_LENGTH: FieldKey = FieldKey::flat("cylinder_length");
const BORE_HEAD: FieldKey = FieldKey::flat("bore_head");
const ROD_DIAMETER: FieldKey = FieldKey::flat("rod_diameter");
const PISTON_THICKNESS: FieldKey = FieldKey::flat("piston_thickness");
const PISTON_ROD_LENGTH: FieldKey = FieldKey::flat("piston_rod_length");
const TAIL_ROD_LENGTH: FieldKey = FieldKey::flat("tail_rod_length");

/// Dimensions of the frame and the suspension linkage, in millimetres
///
/// `bore_head`, `rod_diameter` and `piston_thickness` are small enough that
/// upstream tools sometimes send them in metres; they are read through
/// [`UnitRule::MILLIMETERS`]. Every other length is taken verbatim.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GeometrySettings {
    pub frame_length: f32,
    pub frame_height: f32,
    pub frame_beam_size: f32,
    /// Distance between left and right tail pivots
    pub track_width: f32,
    /// Longitudinal distance between front and rear pivots
    pub wheelbase: f32,
    /// Lateral offset of each arm pivot from the centre line
    pub frame_to_pivot: f32,
    pub lever_length: f32,
    pub rod_position: f32,
    pub cylinder_length: f32,
    pub bore_head: f32,
    pub rod_diameter: f32,
    pub piston_thickness: f32,
    pub piston_rod_length: f32,
    pub tail_rod_length: f32,
}

impl Default for GeometrySettings {
    fn default() -> Self {
        let linkage = CornerConfig::default();
        Self {
            frame_length: 3200.0,
            frame_height: 650.0,
            frame_beam_size: 120.0,
            track_width: 1600.0,
            wheelbase: 3200.0,
            frame_to_pivot: 600.0,
            lever_length: linkage.lever_length,
            rod_position: linkage.rod_position,
            cylinder_length: linkage.cylinder_length,
            bore_head: linkage.bore_head,
            rod_diameter: linkage.rod_diameter,
            piston_thickness: linkage.piston_thickness,
            piston_rod_length: linkage.piston_rod_length,
            tail_rod_length: linkage.tail_rod_length,
        }
    }
}

impl GeometrySettings {
    pub fn apply(&mut self, r: &SectionReader) -> usize {
        let mm = UnitRule::MILLIMETERS;
        let positive = |v: f32| v.max(1.0);

        let mut n = 0;
        n += assign(&mut self.frame_length, r.number(FRAME_LENGTH).map(positive));
        n += assign(&mut self.frame_height, r.number(FRAME_HEIGHT).map(positive));
        n += assign(&mut self.frame_beam_size, r.number(FRAME_BEAM_SIZE).map(positive));
        n += assign(&mut self.track_width, r.number(TRACK_WIDTH).map(positive));
        n += assign(&mut self.wheelbase, r.number(WHEELBASE).map(positive));
        n += assign(&mut self.frame_to_pivot, r.number(FRAME_TO_PIVOT).map(|v| v.max(0.0)));
        n += assign(&mut self.lever_length, r.number(LEVER_LENGTH).map(positive));
        n += assign(&mut self.rod_position, r.number(ROD_POSITION).map(|v| v.clamp(0.0, 1.0)));
        n += assign(
            &mut self.cylinder_length,
            r.number(CYLINDER_LENGTH).map(|v| v.max(2.0 * PISTON_END_MARGIN)),
        );
        n += assign(&mut self.bore_head, r.length(BORE_HEAD, mm).map(positive));
        n += assign(&mut self.rod_diameter, r.length(ROD_DIAMETER, mm).map(positive));
        n += assign(&mut self.piston_thickness, r.length(PISTON_THICKNESS, mm).map(positive));
        n += assign(
            &mut self.piston_rod_length,
            r.number(PISTON_ROD_LENGTH).map(|v| v.max(0.0)),
        );
        n += assign(&mut self.tail_rod_length, r.number(TAIL_ROD_LENGTH).map(|v| v.max(0.0)));
        n
    }

    /// Linkage dimensions for the solver
    pub fn corner_config(&self) -> CornerConfig {
        CornerConfig {
            lever_length: self.lever_length,
            rod_position: self.rod_position,
            cylinder_length: self.cylinder_length,
            bore_head: self.bore_head,
            rod_diameter: self.rod_diameter,
            piston_thickness: self.piston_thickness,
            piston_rod_length: self.piston_rod_length,
            tail_rod_length: self.tail_rod_length,
        }
    }

    /// Pivot layout on the frame
    pub fn rig_layout(&self) -> RigLayout {
        RigLayout {
            arm_pivot_offset: self.frame_to_pivot,
            arm_pivot_height: self.frame_beam_size,
            tail_pivot_offset: self.track_width * 0.5,
            tail_pivot_height: self.frame_beam_size + self.frame_height,
            wheelbase: self.wheelbase,
        }
    }

    pub fn rig(&self) -> SuspensionRig {
        SuspensionRig::new(self.corner_config(), self.rig_layout())
    }
}
