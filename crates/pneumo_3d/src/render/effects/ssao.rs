//! Screen-space ambient occlusion with a fixed sample pattern

use super::{clamp_samples, texel_size};
use crate::render::cpu::FrameBuffers;
use crate::render::post_process::{EffectKind, EffectStage, PostEffect};
use crate::render::shaders::{MAX_SAMPLES, SSAO_DIRECTIONS, SSAO_RADIUS_SCALE};
use crate::render::ViewParams;
use crate::settings::{assign, FieldKey, SectionReader};
use serde::Serialize;
use std::f32::consts::TAU;

const ENABLED: [FieldKey; 2] = [
    FieldKey::nested("ssao_enabled", "ssao", "enabled"),
    FieldKey::flat("ssao"),
];
const INTENSITY: FieldKey = FieldKey::nested("ssao_intensity", "ssao", "intensity");
const RADIUS: FieldKey = FieldKey::nested("ssao_radius", "ssao", "radius");
const BIAS: FieldKey = FieldKey::nested("ssao_bias", "ssao", "bias");
const SAMPLES: FieldKey = FieldKey::nested("ssao_samples", "ssao", "samples");

const MIN_RADIUS: f32 = 0.01;

#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SsaoUniform {
    pub texel_size: [f32; 2],
    pub intensity: f32,
    pub radius: f32,
    pub bias: f32,
    pub samples: u32,
    pub _padding: [f32; 2],
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Ssao {
    stage: EffectStage,
    /// Darkening per unit of occlusion
    pub intensity: f32,
    /// Sampling radius
    pub radius: f32,
    /// Depth difference ignored as self-occlusion
    pub bias: f32,
    pub samples: u32,
}

impl Default for Ssao {
    fn default() -> Self {
        Self {
            stage: EffectStage::new(EffectKind::Ssao, true),
            intensity: 0.5,
            radius: 2.0,
            bias: 0.025,
            samples: 16,
        }
    }
}

impl Ssao {
    pub fn effective_samples(&self) -> u32 {
        clamp_samples(self.samples)
    }

    pub fn uniform(&self, width: u32, height: u32) -> SsaoUniform {
        SsaoUniform {
            texel_size: texel_size(width, height),
            intensity: self.intensity,
            radius: self.radius,
            bias: self.bias,
            samples: self.effective_samples(),
            _padding: [0.0; 2],
        }
    }

    /// Sample direction `i` of `n` before orienting to the normal
    pub fn sample_direction(i: u32, n: u32) -> [f32; 3] {
        let angle = i as f32 * TAU / SSAO_DIRECTIONS as f32;
        let r = (i + 1) as f32 / n.max(1) as f32;
        [angle.cos() * r, angle.sin() * r, r]
    }

    /// Fraction of samples that hit closer geometry, `None` at the far
    /// plane or without depth and normal planes
    pub fn occlusion(&self, frame: &FrameBuffers, uv: [f32; 2]) -> Option<f32> {
        let depth = frame.load_depth(uv)?;
        if depth >= 1.0 {
            return None;
        }
        let normal = frame.load_normal(uv)?;
        let [tx, ty] = frame.texel_size();
        let samples = self.effective_samples();
        let reach = self.radius * SSAO_RADIUS_SCALE;

        let mut occluded = 0u32;
        for i in 0..samples {
            let mut dir = Self::sample_direction(i, samples);
            if dir[0] * normal[0] + dir[1] * normal[1] + dir[2] * normal[2] < 0.0 {
                dir = [-dir[0], -dir[1], -dir[2]];
            }
            let offset_uv = [uv[0] + dir[0] * reach * tx, uv[1] + dir[1] * reach * ty];
            let sample_depth = frame.load_depth(offset_uv).unwrap_or(depth);
            if sample_depth < depth - self.bias {
                occluded += 1;
            }
        }
        Some(occluded as f32 / samples as f32)
    }
}

impl PostEffect for Ssao {
    fn stage(&self) -> &EffectStage {
        &self.stage
    }

    fn stage_mut(&mut self) -> &mut EffectStage {
        &mut self.stage
    }

    fn apply_settings(&mut self, r: &SectionReader) -> usize {
        let mut n = 0;
        n += assign(&mut self.stage.enabled, r.flag(ENABLED));
        n += assign(&mut self.intensity, r.number(INTENSITY).map(|v| v.max(0.0)));
        n += assign(&mut self.radius, r.number(RADIUS).map(|v| v.max(MIN_RADIUS)));
        n += assign(&mut self.bias, r.number(BIAS).map(|v| v.max(0.0)));
        n += assign(&mut self.samples, r.count(SAMPLES).map(|v| v.clamp(1, MAX_SAMPLES)));
        n
    }

    fn uniform_bytes(&self, width: u32, height: u32, _view: &ViewParams) -> Vec<u8> {
        bytemuck::bytes_of(&self.uniform(width, height)).to_vec()
    }

    fn process_cpu(&self, frame: &FrameBuffers, _view: &ViewParams) -> Vec<[f32; 4]> {
        frame.map_pixels(|x, y, uv| {
            let color = frame.pixel(x, y);
            let Some(occlusion) = self.occlusion(frame, uv) else {
                return color;
            };
            let ao = (1.0 - occlusion * self.intensity).clamp(0.0, 1.0);
            [color[0] * ao, color[1] * ao, color[2] * ao, color[3]]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{Capabilities, PassMode, TextureInput};
    use serde_json::json;

    fn gradient(width: u32, height: u32) -> FrameBuffers {
        FrameBuffers::from_fn(width, height, |x, y| {
            [x as f32 / width as f32, y as f32 / height as f32, 0.25, 1.0]
        })
    }

    #[test]
    fn test_zero_samples_clamp_to_one() {
        let ssao = Ssao {
            samples: 0,
            ..Default::default()
        };
        assert_eq!(ssao.effective_samples(), 1);
        assert_eq!(ssao.uniform(10, 10).samples, 1);
    }

    #[test]
    fn test_uniform_depth_has_no_occlusion() {
        let ssao = Ssao::default();
        assert_eq!(
            (ssao.intensity, ssao.radius, ssao.bias, ssao.samples),
            (0.5, 2.0, 0.025, 16)
        );

        let frame = gradient(16, 16)
            .with_depth(vec![0.5; 256])
            .with_normal(vec![[0.0, 0.0, 1.0]; 256]);
        for (x, y) in [(0, 0), (7, 8), (15, 15)] {
            assert_eq!(ssao.occlusion(&frame, frame.uv(x, y)), Some(0.0));
        }
        assert_eq!(ssao.process_cpu(&frame, &ViewParams::default()), frame.color);
    }

    #[test]
    fn test_far_plane_exits_early() {
        let ssao = Ssao::default();
        let frame = gradient(4, 4)
            .with_depth(vec![1.0; 16])
            .with_normal(vec![[0.0, 0.0, 1.0]; 16]);
        assert_eq!(ssao.occlusion(&frame, [0.5, 0.5]), None);
    }

    #[test]
    fn test_step_occludes() {
        let ssao = Ssao {
            intensity: 1.0,
            ..Default::default()
        };
        // Everything except the centre texel sits much closer to the camera
        let mut depth = vec![0.2; 33 * 33];
        depth[16 * 33 + 16] = 0.9;
        let frame = FrameBuffers::filled(33, 33, [1.0; 4])
            .with_depth(depth)
            .with_normal(vec![[0.0, 0.0, 1.0]; 33 * 33]);

        let occlusion = ssao.occlusion(&frame, frame.uv(16, 16));
        assert_eq!(occlusion, Some(1.0));
        let out = ssao.process_cpu(&frame, &ViewParams::default());
        assert_eq!(out[16 * 33 + 16], [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_missing_depth_is_passthrough_for_any_settings() {
        let frame = gradient(8, 8);
        for enabled in [true, false] {
            for intensity in [0.0, 0.5, 5.0] {
                let mut ssao = Ssao {
                    intensity,
                    ..Default::default()
                };
                ssao.set_enabled(enabled);
                ssao.stage_mut().probe(&Capabilities::all().with_depth(false));

                assert!(ssao.stage().fallback_active());
                assert_eq!(
                    ssao.stage().state(),
                    crate::render::StageState::Fallback {
                        missing: TextureInput::Depth
                    }
                );
                assert_eq!(ssao.pass_mode(), PassMode::Passthrough);
                assert_eq!(ssao.render_cpu(&frame, &ViewParams::default()), frame.color);
            }
        }
    }

    #[test]
    fn test_apply_settings_clamps() {
        let mut ssao = Ssao::default();
        let payload = json!({
            "ssao": { "radius": 0.0, "samples": 500, "bias": "-1" },
            "ssaoIntensity": "0.75",
        });
        let n = ssao.apply_settings(&SectionReader::new(&payload));

        assert_eq!(n, 4);
        assert_eq!(ssao.radius, MIN_RADIUS);
        assert_eq!(ssao.samples, 64);
        assert_eq!(ssao.bias, 0.0);
        assert_eq!(ssao.intensity, 0.75);
    }

    #[test]
    fn test_directions_grow_outward() {
        let first = Ssao::sample_direction(0, 16);
        let last = Ssao::sample_direction(15, 16);
        assert!((first[2] - 1.0 / 16.0).abs() < 1e-6);
        assert!((last[2] - 1.0).abs() < 1e-6);
    }
}
