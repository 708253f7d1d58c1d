//! Scene view: the single owner of all mutable view state
//!
//! Updates arrive as batches between frames ([`SceneView::apply_batch`],
//! [`SceneView::apply_piston_positions`], [`SceneView::set_lever_angles`]);
//! [`SceneView::frame`] then reads the state and produces a snapshot.

use crate::error::{Result, ViewError};
use crate::render::{CapabilityProbe, EffectKind, PassMode, PostEffectChain, ViewParams};
use crate::settings::{ApplySummary, SceneSettings, SectionReader, SECTIONS};
use crate::suspension::{
    Corner, CornerGeometry, CornerInput, PistonPositions, SuspensionRig, ToleranceMonitor,
};
use pneumo_core::Color;
use serde::Serialize;
use serde_json::Value;
use std::cell::Cell;
use tracing::{debug, info};

/// Key of the piston-position object inside a batch payload
const PISTONS: &str = "pistons";

/// Solved state of one corner for one frame
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CornerFrame {
    pub corner: Corner,
    pub geometry: CornerGeometry,
    pub joint_color: Color,
    /// Piston position reported by the simulation
    pub piston_position: f32,
}

/// Everything the renderer needs for one frame
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameSnapshot {
    /// Animation clock in seconds
    pub time: f32,
    pub corners: [CornerFrame; 4],
    pub passes: [(EffectKind, PassMode); 4],
}

impl FrameSnapshot {
    pub fn corner(&self, corner: Corner) -> &CornerFrame {
        &self.corners[corner.index()]
    }

    /// Largest rod-length error across the corners
    pub fn max_rod_length_error(&self) -> f32 {
        self.corners
            .iter()
            .map(|c| c.geometry.rod_length_error)
            .fold(0.0, f32::max)
    }
}

#[derive(Clone, Debug, Default)]
pub struct SceneView {
    settings: SceneSettings,
    effects: PostEffectChain,
    pistons: PistonPositions,
    lever_angles: [f32; 4],
    time: f32,
    /// Updated by every solved frame so breaches are logged on change
    tolerance: Cell<ToleranceMonitor>,
}

impl SceneView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Probe effect capabilities; only the first call has an effect
    pub fn initialize(&mut self, probe: &dyn CapabilityProbe) {
        if self.effects.is_probed() {
            return;
        }
        self.effects.probe(probe);
        for line in self.effects.diagnostics() {
            debug!("{}", line);
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.effects.is_probed()
    }

    pub fn settings(&self) -> &SceneSettings {
        &self.settings
    }

    pub fn effects(&self) -> &PostEffectChain {
        &self.effects
    }

    pub fn effects_mut(&mut self) -> &mut PostEffectChain {
        &mut self.effects
    }

    pub fn pistons(&self) -> &PistonPositions {
        &self.pistons
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn view_params(&self) -> ViewParams {
        self.settings.camera.view_params()
    }

    /// Apply a payload with any subset of the sections
    ///
    /// Sections are applied in [`SECTIONS`] order. An optional `pistons`
    /// object is applied last. Anything that is not an object is ignored.
    pub fn apply_batch(&mut self, payload: &Value) -> ApplySummary {
        let mut summary = ApplySummary::default();
        if !payload.is_object() {
            debug!("batch payload is not an object, ignoring");
            return summary;
        }

        for name in SECTIONS {
            let reader = SectionReader::section(payload, name);
            if !reader.is_present() {
                continue;
            }
            let fields = match name {
                "effects" => self.effects.apply_settings(&reader),
                _ => self.settings.apply_section(name, &reader).unwrap_or(0),
            };
            summary.sections.push(name);
            summary.fields += fields;
        }

        if let Some(pistons) = payload.get(PISTONS) {
            summary.pistons = self.pistons.apply_payload(pistons);
        }

        info!(
            sections = ?summary.sections,
            fields = summary.fields,
            pistons = summary.pistons,
            "settings batch applied"
        );
        summary
    }

    /// Parse and apply a JSON payload
    pub fn apply_batch_json(&mut self, text: &str) -> Result<ApplySummary> {
        let payload: Value = serde_json::from_str(text)?;
        if !payload.is_object() {
            return Err(ViewError::Payload(format!(
                "expected a JSON object at the root, got {}",
                json_kind(&payload)
            )));
        }
        Ok(self.apply_batch(&payload))
    }

    /// Apply a `{fl, fr, rl, rr}` piston-position payload
    pub fn apply_piston_positions(&mut self, payload: &Value) -> usize {
        self.pistons.apply_payload(payload)
    }

    /// Lever angles from the simulation, in [`Corner::ALL`] order
    pub fn set_lever_angles(&mut self, degrees: [f32; 4]) {
        self.lever_angles = degrees;
    }

    /// Advance the animation clock
    pub fn advance(&mut self, dt: f32) {
        if dt.is_finite() && dt > 0.0 {
            self.time += dt;
        }
    }

    /// Lever angles used for the next frame
    ///
    /// The built-in oscillation overrides the simulation angles while it is
    /// running.
    pub fn lever_angles(&self) -> [f32; 4] {
        let animation = &self.settings.animation;
        if animation.is_running {
            animation.lever_angles(self.time)
        } else {
            self.lever_angles
        }
    }

    /// Solve the frame from the current settings
    pub fn frame(&self) -> FrameSnapshot {
        let rig = self.settings.geometry.rig();
        let inputs = rig.inputs(self.lever_angles());
        self.solve_frame(&rig, &inputs)
    }

    /// Solve the frame from explicit per-corner inputs
    pub fn frame_with_inputs(&self, inputs: &[CornerInput; 4]) -> FrameSnapshot {
        self.solve_frame(&self.settings.geometry.rig(), inputs)
    }

    fn solve_frame(&self, rig: &SuspensionRig, inputs: &[CornerInput; 4]) -> FrameSnapshot {
        let geometry = rig.solve(inputs);

        let mut tolerance = self.tolerance.get();
        tolerance.observe(&geometry);
        self.tolerance.set(tolerance);

        let corners = Corner::ALL.map(|corner| {
            let geometry = geometry[corner.index()];
            CornerFrame {
                corner,
                geometry,
                joint_color: geometry.joint_marker_color(),
                piston_position: self.pistons.get(corner),
            }
        });

        FrameSnapshot {
            time: self.time,
            corners,
            passes: self.effects.pass_modes(),
        }
    }

    /// Corners currently out of rod-length tolerance
    pub fn tolerance(&self) -> ToleranceMonitor {
        self.tolerance.get()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{Capabilities, PostEffect, StageState, TextureInput};
    use crate::suspension::JOINT_WARNING_COLOR;
    use pneumo_core::Vec3;
    use serde_json::json;

    #[test]
    fn test_batch_sections_in_order() {
        let mut view = SceneView::new();
        let summary = view.apply_batch(&json!({
            "animation": { "amplitude": 5 },
            "camera": { "fov": 50 },
            "unknown": { "x": 1 },
            "effects": { "bloom_intensity": 0.42 },
            "pistons": { "fl": "12.5", "rr": 3 },
        }));

        assert_eq!(summary.sections, vec!["camera", "effects", "animation"]);
        assert_eq!(summary.fields, 3);
        assert_eq!(summary.pistons, 2);
        assert_eq!(view.effects().bloom.intensity, 0.42);
        assert_eq!(view.pistons().fl, 12.5);
        assert_eq!(view.settings().camera.fov, 50.0);
    }

    #[test]
    fn test_non_object_payloads() {
        let mut view = SceneView::new();
        assert!(view.apply_batch(&json!([1, 2, 3])).is_empty());
        assert!(matches!(
            view.apply_batch_json("42"),
            Err(ViewError::Payload(_))
        ));
        assert!(matches!(
            view.apply_batch_json("{ nope"),
            Err(ViewError::Json(_))
        ));
        let summary = view.apply_batch_json(r#"{ "quality": { "render_scale": 0.5 } }"#);
        assert_eq!(summary.map(|s| s.fields).ok(), Some(1));
    }

    #[test]
    fn test_initialize_once() {
        let mut view = SceneView::new();
        view.initialize(&Capabilities::none());
        view.initialize(&Capabilities::all());

        assert!(view.is_initialized());
        assert_eq!(
            view.effects().ssao.stage().state(),
            StageState::Fallback {
                missing: TextureInput::Depth
            }
        );
    }

    #[test]
    fn test_frame_reference_corner() {
        let mut view = SceneView::new();
        view.apply_batch(&json!({
            "geometry": {
                "lever_length": 800,
                "rod_position": 0.6,
                "cylinder_length": 500,
                "piston_rod_length": 200,
            }
        }));

        let input = CornerInput::new(Vec3::new(-600.0, 120.0, 0.0), Vec3::new(-800.0, 770.0, 0.0), 0.0);
        let inputs = [input, input.mirrored(), input, input.mirrored()];
        let frame = view.frame_with_inputs(&inputs);

        let fl = frame.corner(Corner::FrontLeft);
        let distance = fl.geometry.rod_attach.distance(fl.geometry.piston_center);
        assert!((distance - 200.0).abs() < 1e-3);
        assert!(frame.max_rod_length_error() < 1e-3);
    }

    #[test]
    fn test_default_frame_is_within_tolerance() {
        let view = SceneView::new();
        let frame = view.frame();
        for corner in &frame.corners {
            assert!(corner.geometry.within_tolerance());
            assert_ne!(corner.joint_color, JOINT_WARNING_COLOR);
        }
    }

    #[test]
    fn test_frames_track_tolerance() {
        let mut view = SceneView::new();
        view.frame();
        assert_eq!(view.tolerance(), ToleranceMonitor::default());

        // A cylinder too short to hold the piston clamps it away from the rod
        view.apply_batch(&json!({ "geometry": { "cylinder_length": 20 } }));
        let frame = view.frame();
        let breached = Corner::ALL
            .into_iter()
            .filter(|c| view.tolerance().is_breached(*c))
            .count();
        let out_of_tolerance = frame
            .corners
            .iter()
            .filter(|c| !c.geometry.within_tolerance())
            .count();
        assert_eq!(breached, out_of_tolerance);
    }

    #[test]
    fn test_animation_drives_lever_angles() {
        let mut view = SceneView::new();
        view.set_lever_angles([1.0, 2.0, 3.0, 4.0]);
        assert_eq!(view.lever_angles(), [1.0, 2.0, 3.0, 4.0]);

        view.apply_batch(&json!({
            "animation": { "is_running": true, "amplitude": 10, "frequency": 1 }
        }));
        view.advance(0.25);
        view.advance(-1.0);
        assert_eq!(view.time(), 0.25);
        for angle in view.lever_angles() {
            assert!((angle - 10.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_enabled_flags_under_every_effect_name() {
        let mut view = SceneView::new();
        let summary = view.apply_batch(&json!({
            "effects": {
                "motion_blur_enabled": true,
                "depth_of_field_enabled": true,
                "dof_enabled": true,
                "bloom_enabled": false,
            }
        }));

        assert_eq!(summary.fields, 3);
        assert!(view.effects().motion_blur.is_enabled());
        assert!(view.effects().depth_of_field.is_enabled());
        assert!(!view.effects().bloom.is_enabled());
    }

    #[test]
    fn test_frame_reports_pass_modes() {
        let mut view = SceneView::new();
        view.initialize(&Capabilities::all().with_velocity(false));
        view.apply_batch(&json!({ "effects": { "motion_blur": true, "bloom": { "enabled": true } } }));

        let frame = view.frame();
        assert_eq!(frame.passes[1], (EffectKind::Bloom, PassMode::Full));
        assert_eq!(frame.passes[3], (EffectKind::MotionBlur, PassMode::Passthrough));
        assert!(view.effects().motion_blur.is_enabled());
    }
}
