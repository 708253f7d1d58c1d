//! Bloom: bright-pass, separable Gaussian glow, additive composite

use super::texel_size;
use crate::render::cpu::{luminance, FrameBuffers};
use crate::render::post_process::{EffectKind, EffectStage, PostEffect};
use crate::render::ViewParams;
use crate::settings::{assign, FieldKey, SectionReader};
use serde::Serialize;

const ENABLED: [FieldKey; 2] = [
    FieldKey::nested("bloom_enabled", "bloom", "enabled"),
    FieldKey::flat("bloom"),
];
const INTENSITY: FieldKey = FieldKey::nested("bloom_intensity", "bloom", "intensity");
const THRESHOLD: FieldKey = FieldKey::nested("bloom_threshold", "bloom", "threshold");
const SPREAD: FieldKey = FieldKey::nested("bloom_spread", "bloom", "spread");

/// Gaussian weights for tap offsets 0..=4
pub const BLOOM_WEIGHTS: [f32; 5] = [0.227027, 0.1945946, 0.1216216, 0.054054, 0.016216];

#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BloomUniform {
    pub texel_size: [f32; 2],
    pub intensity: f32,
    pub threshold: f32,
    pub spread: f32,
    pub _padding: [f32; 3],
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Bloom {
    stage: EffectStage,
    /// Glow gain added onto the image
    pub intensity: f32,
    /// Luminance below which pixels do not glow; 0 makes everything glow
    pub threshold: f32,
    /// Tap spacing in texels
    pub spread: f32,
}

impl Default for Bloom {
    fn default() -> Self {
        Self {
            stage: EffectStage::new(EffectKind::Bloom, true),
            intensity: 0.3,
            threshold: 0.7,
            spread: 1.0,
        }
    }
}

impl Bloom {
    pub fn new(intensity: f32, threshold: f32) -> Self {
        Self {
            intensity,
            threshold,
            ..Default::default()
        }
    }

    pub fn uniform(&self, width: u32, height: u32) -> BloomUniform {
        BloomUniform {
            texel_size: texel_size(width, height),
            intensity: self.intensity,
            threshold: self.threshold,
            spread: self.spread,
            _padding: [0.0; 3],
        }
    }

    fn bright_pass(&self, rgb: [f32; 3]) -> [f32; 3] {
        if self.threshold <= 0.0 {
            return rgb;
        }
        let lum = luminance(rgb);
        let k = (lum - self.threshold).max(0.0) / lum.max(1e-4);
        [rgb[0] * k, rgb[1] * k, rgb[2] * k]
    }
}

impl PostEffect for Bloom {
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
        n += assign(&mut self.threshold, r.number(THRESHOLD).map(|v| v.max(0.0)));
        n += assign(&mut self.spread, r.number(SPREAD).map(|v| v.clamp(0.0, 16.0)));
        n
    }

    fn uniform_bytes(&self, width: u32, height: u32, _view: &ViewParams) -> Vec<u8> {
        bytemuck::bytes_of(&self.uniform(width, height)).to_vec()
    }

    fn process_cpu(&self, frame: &FrameBuffers, _view: &ViewParams) -> Vec<[f32; 4]> {
        let [tx, ty] = frame.texel_size();

        frame.map_pixels(|x, y, uv| {
            let color = frame.pixel(x, y);
            let mut glow = [0.0f32; 3];

            for i in -4i32..=4 {
                let w = BLOOM_WEIGHTS[i.unsigned_abs() as usize] * 0.5;
                let offset = i as f32 * self.spread;
                let h = frame.sample_color([uv[0] + offset * tx, uv[1]]);
                let v = frame.sample_color([uv[0], uv[1] + offset * ty]);
                let h = self.bright_pass([h[0], h[1], h[2]]);
                let v = self.bright_pass([v[0], v[1], v[2]]);
                for c in 0..3 {
                    glow[c] += (h[c] + v[c]) * w;
                }
            }

            [
                color[0] + glow[0] * self.intensity,
                color[1] + glow[1] * self.intensity,
                color[2] + glow[2] * self.intensity,
                color[3],
            ]
        })
    }
}
