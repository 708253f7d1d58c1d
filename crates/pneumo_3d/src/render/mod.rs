//! Post-processing render system
//!
//! Screen-space effects applied after the scene pass, in chain order:
//! SSAO, bloom, depth of field, motion blur. Every stage always renders;
//! a stage that is disabled or lacks a required input texture runs the
//! passthrough shader so the chain keeps the same shape.
//!
//! Each effect exists three times: as parameters with a capability state
//! ([`PostEffect`]), as a WGSL fragment shader ([`ShaderLibrary`]), and as a
//! CPU reference ([`FrameBuffers`]) used by tests and tools.

mod capabilities;
mod cpu;
mod effects;
mod pipelines;
mod post_process;
mod shaders;

pub use capabilities::{Capabilities, CapabilityProbe, ProbeError, TextureInput};
pub use cpu::{luminance, FrameBuffers};
pub use effects::{
    Bloom, BloomUniform, DepthOfField, DofUniform, MotionBlur, MotionBlurUniform, Ssao,
    SsaoUniform, BLOOM_WEIGHTS,
};
pub use pipelines::{PostProcessRenderer, SceneTextures};
pub use post_process::{EffectKind, EffectStage, PassMode, PostEffect, PostEffectChain, StageState};
pub use shaders::{
    ShaderId, ShaderLibrary, ShaderRegistry, BOKEH_TAPS, MAX_SAMPLES, SHADER_VERSION,
    SSAO_DIRECTIONS, SSAO_RADIUS_SCALE,
};

use serde::Serialize;

/// Camera values the effects need besides their own parameters
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ViewParams {
    /// Near clip plane (mm)
    pub near: f32,
    /// Far clip plane (mm)
    pub far: f32,
}

impl Default for ViewParams {
    fn default() -> Self {
        Self {
            near: 10.0,
            far: 50000.0,
        }
    }
}

impl ViewParams {
    /// Convert a `[0, 1]` depth buffer value to view distance
    pub fn linearize_depth(&self, depth: f32) -> f32 {
        let (n, f) = (self.near, self.far);
        n * f / (f - depth * (f - n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linearize_depth_endpoints() {
        let view = ViewParams::default();
        assert!((view.linearize_depth(0.0) - view.near).abs() < 1e-3);
        assert!((view.linearize_depth(1.0) - view.far).abs() < 1e-1);
    }
}
