//! Per-pixel velocity motion blur

use super::clamp_samples;
use crate::render::cpu::FrameBuffers;
use crate::render::post_process::{EffectKind, EffectStage, PostEffect};
use crate::render::shaders::MAX_SAMPLES;
use crate::render::ViewParams;
use crate::settings::{assign, FieldKey, SectionReader};
use serde::Serialize;

const ENABLED: [FieldKey; 2] = [
    FieldKey::nested("motion_blur", "motion_blur", "enabled"),
    FieldKey::flat("motion_blur_enabled"),
];
const STRENGTH: FieldKey = FieldKey::nested("motion_blur_strength", "motion_blur", "strength");
const AMOUNT: FieldKey = FieldKey::nested("motion_blur_amount", "motion_blur", "amount");
const SAMPLES: FieldKey = FieldKey::nested("motion_blur_samples", "motion_blur", "samples");

#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MotionBlurUniform {
    pub strength: f32,
    pub samples: u32,
    pub _padding: [f32; 2],
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MotionBlur {
    stage: EffectStage,
    /// Scale applied to the velocity vector
    pub strength: f32,
    pub samples: u32,
}

impl Default for MotionBlur {
    fn default() -> Self {
        Self {
            stage: EffectStage::new(EffectKind::MotionBlur, false),
            strength: 0.5,
            samples: 8,
        }
    }
}

impl MotionBlur {
    pub fn effective_samples(&self) -> u32 {
        clamp_samples(self.samples)
    }

    pub fn uniform(&self) -> MotionBlurUniform {
        MotionBlurUniform {
            strength: self.strength,
            samples: self.effective_samples(),
            _padding: [0.0; 2],
        }
    }
}

impl PostEffect for MotionBlur {
    fn stage(&self) -> &EffectStage {
        &self.stage
    }

    fn stage_mut(&mut self) -> &mut EffectStage {
        &mut self.stage
    }

    fn apply_settings(&mut self, r: &SectionReader) -> usize {
        let strength = r.number(STRENGTH).or_else(|| r.number(AMOUNT));

        let mut n = 0;
        n += assign(&mut self.stage.enabled, r.flag(ENABLED));
        n += assign(&mut self.strength, strength.map(|v| v.max(0.0)));
        n += assign(&mut self.samples, r.count(SAMPLES).map(|v| v.clamp(1, MAX_SAMPLES)));
        n
    }

    fn uniform_bytes(&self, _width: u32, _height: u32, _view: &ViewParams) -> Vec<u8> {
        bytemuck::bytes_of(&self.uniform()).to_vec()
    }

    fn process_cpu(&self, frame: &FrameBuffers, _view: &ViewParams) -> Vec<[f32; 4]> {
        let samples = self.effective_samples();

        frame.map_pixels(|x, y, uv| {
            let color = frame.pixel(x, y);
            let Some(velocity) = frame.load_velocity(uv) else {
                return color;
            };

            let mut sum = frame.sample_color(uv);
            for i in 1..samples {
                let t = i as f32 / samples as f32 * self.strength;
                let tap = frame.sample_color([uv[0] - velocity[0] * t, uv[1] - velocity[1] * t]);
                for c in 0..4 {
                    sum[c] += tap[c];
                }
            }
            sum.map(|v| v / samples as f32)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_zero_samples_clamp_to_one() {
        let blur = MotionBlur {
            samples: 0,
            ..Default::default()
        };
        assert_eq!(blur.effective_samples(), 1);
        assert_eq!(blur.uniform().samples, 1);

        // One tap is the pixel itself
        let frame = FrameBuffers::from_fn(4, 1, |x, _| [x as f32, 0.0, 0.0, 1.0])
            .with_velocity(vec![[0.5, 0.0]; 4]);
        let out = blur.process_cpu(&frame, &ViewParams::default());
        for (o, c) in out.iter().zip(&frame.color) {
            assert!((o[0] - c[0]).abs() < 1e-5);
        }
    }

    #[test]
    fn test_still_pixels_stay_sharp() {
        let blur = MotionBlur::default();
        let frame = FrameBuffers::from_fn(5, 5, |x, y| [x as f32, y as f32, 0.0, 1.0])
            .with_velocity(vec![[0.0, 0.0]; 25]);
        let out = blur.process_cpu(&frame, &ViewParams::default());
        for (o, c) in out.iter().zip(&frame.color) {
            for k in 0..4 {
                assert!((o[k] - c[k]).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn test_blur_trails_backwards() {
        let blur = MotionBlur {
            strength: 1.0,
            samples: 4,
            ..Default::default()
        };
        // Bright column on the left, moving right by half the frame
        let frame = FrameBuffers::from_fn(8, 1, |x, _| {
            if x == 0 {
                [1.0, 1.0, 1.0, 1.0]
            } else {
                [0.0, 0.0, 0.0, 1.0]
            }
        })
        .with_velocity(vec![[0.5, 0.0]; 8]);
        let out = blur.process_cpu(&frame, &ViewParams::default());

        assert!((out[3][0] - 0.25).abs() < 1e-5);
        assert!(out[0][0] > 0.99);
        assert_eq!(out[7][0], 0.0);
    }

    #[test]
    fn test_enabled_spellings() {
        for key in ["motion_blur", "motionBlur", "motion_blur_enabled", "motionBlurEnabled"] {
            let mut blur = MotionBlur::default();
            let payload = json!({ key: true });
            assert_eq!(blur.apply_settings(&SectionReader::new(&payload)), 1, "{}", key);
            assert!(blur.is_enabled(), "{}", key);
        }

        let mut blur = MotionBlur::default();
        let payload = json!({ "motion_blur": { "enabled": "on" } });
        assert_eq!(blur.apply_settings(&SectionReader::new(&payload)), 1);
        assert!(blur.is_enabled());
    }

    #[test]
    fn test_amount_alias() {
        let mut blur = MotionBlur::default();
        let payload = json!({ "motionBlurAmount": 0.8, "motion_blur_samples": 0 });
        assert_eq!(blur.apply_settings(&SectionReader::new(&payload)), 2);
        assert_eq!(blur.strength, 0.8);
        assert_eq!(blur.samples, 1);
    }
}
