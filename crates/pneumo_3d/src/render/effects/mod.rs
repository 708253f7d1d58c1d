//! Effect parameters, uniform blocks and CPU reference passes

mod bloom;
mod dof;
mod motion_blur;
mod ssao;

pub use bloom::{Bloom, BloomUniform, BLOOM_WEIGHTS};
pub use dof::{DepthOfField, DofUniform};
pub use motion_blur::{MotionBlur, MotionBlurUniform};
pub use ssao::{Ssao, SsaoUniform};

use super::shaders::MAX_SAMPLES;

/// Sample count actually used by the shaders
pub(crate) fn clamp_samples(samples: u32) -> u32 {
    samples.clamp(1, MAX_SAMPLES)
}

fn texel_size(width: u32, height: u32) -> [f32; 2] {
    [1.0 / width.max(1) as f32, 1.0 / height.max(1) as f32]
}
