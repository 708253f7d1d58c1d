//! Depth of field with a 16-tap bokeh kernel

use super::texel_size;
use crate::render::cpu::FrameBuffers;
use crate::render::post_process::{EffectKind, EffectStage, PostEffect};
use crate::render::shaders::BOKEH_TAPS;
use crate::render::ViewParams;
use crate::settings::{assign, FieldKey, SectionReader};
use serde::Serialize;
use std::f32::consts::TAU;

const ENABLED: [FieldKey; 3] = [
    FieldKey::nested("depth_of_field", "depth_of_field", "enabled"),
    FieldKey::nested("depth_of_field_enabled", "dof", "enabled"),
    FieldKey::flat("dof_enabled"),
];
const FOCUS_DISTANCE: [FieldKey; 2] = [
    FieldKey::nested("dof_focus_distance", "depth_of_field", "focus_distance"),
    FieldKey::nested("depth_of_field_focus_distance", "dof", "focus_distance"),
];
const FOCUS_RANGE: [FieldKey; 2] = [
    FieldKey::nested("dof_focus_range", "depth_of_field", "focus_range"),
    FieldKey::nested("depth_of_field_focus_range", "dof", "focus_range"),
];
const BLUR: [FieldKey; 2] = [
    FieldKey::nested("dof_blur", "depth_of_field", "blur"),
    FieldKey::nested("depth_of_field_blur", "dof", "blur"),
];

#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DofUniform {
    pub texel_size: [f32; 2],
    pub near: f32,
    pub far: f32,
    pub focus_distance: f32,
    pub focus_range: f32,
    pub blur: f32,
    pub _padding: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DepthOfField {
    stage: EffectStage,
    /// Distance in focus (mm)
    pub focus_distance: f32,
    /// Distance over which blur ramps to full (mm)
    pub focus_range: f32,
    /// Kernel radius at full blur, in texels
    pub blur: f32,
}

impl Default for DepthOfField {
    fn default() -> Self {
        Self {
            stage: EffectStage::new(EffectKind::DepthOfField, false),
            focus_distance: 2000.0,
            focus_range: 900.0,
            blur: 3.0,
        }
    }
}

impl DepthOfField {
    pub fn uniform(&self, width: u32, height: u32, view: &ViewParams) -> DofUniform {
        DofUniform {
            texel_size: texel_size(width, height),
            near: view.near,
            far: view.far,
            focus_distance: self.focus_distance,
            focus_range: self.focus_range,
            blur: self.blur,
            _padding: 0.0,
        }
    }

    /// Blur amount in `[0, 1]` for a raw depth value
    pub fn focus_factor(&self, depth: f32, view: &ViewParams) -> f32 {
        let z = view.linearize_depth(depth);
        ((z - self.focus_distance).abs() / self.focus_range.max(1e-4)).clamp(0.0, 1.0)
    }

    /// Kernel tap `i` on the unit disc: outer ring for even taps, inner for odd
    pub fn tap_offset(i: u32) -> [f32; 2] {
        let angle = i as f32 * TAU / BOKEH_TAPS as f32;
        let ring = if i % 2 == 0 { 1.0 } else { 0.5 };
        [angle.cos() * ring, angle.sin() * ring]
    }
}

impl PostEffect for DepthOfField {
    fn stage(&self) -> &EffectStage {
        &self.stage
    }

    fn stage_mut(&mut self) -> &mut EffectStage {
        &mut self.stage
    }

    fn apply_settings(&mut self, r: &SectionReader) -> usize {
        let mut n = 0;
        n += assign(&mut self.stage.enabled, r.flag(ENABLED));
        n += assign(&mut self.focus_distance, r.number(FOCUS_DISTANCE).map(|v| v.max(0.0)));
        n += assign(&mut self.focus_range, r.number(FOCUS_RANGE).map(|v| v.max(1.0)));
        n += assign(&mut self.blur, r.number(BLUR).map(|v| v.clamp(0.0, 32.0)));
        n
    }

    fn uniform_bytes(&self, width: u32, height: u32, view: &ViewParams) -> Vec<u8> {
        bytemuck::bytes_of(&self.uniform(width, height, view)).to_vec()
    }

    fn process_cpu(&self, frame: &FrameBuffers, view: &ViewParams) -> Vec<[f32; 4]> {
        let [tx, ty] = frame.texel_size();

        frame.map_pixels(|x, y, uv| {
            let color = frame.pixel(x, y);
            let Some(depth) = frame.load_depth(uv) else {
                return color;
            };
            let focus = self.focus_factor(depth, view);
            let reach = focus * self.blur;

            let mut sum = [color[0], color[1], color[2]];
            for i in 0..BOKEH_TAPS {
                let [ox, oy] = Self::tap_offset(i);
                let tap = frame.sample_color([uv[0] + ox * reach * tx, uv[1] + oy * reach * ty]);
                for c in 0..3 {
                    sum[c] += tap[c];
                }
            }

            let count = (BOKEH_TAPS + 1) as f32;
            let mix = |c: usize| color[c] + (sum[c] / count - color[c]) * focus;
            [mix(0), mix(1), mix(2), color[3]]
        })
    }
}
