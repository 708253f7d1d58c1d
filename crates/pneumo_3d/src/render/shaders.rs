//! WGSL shader library and registry
//!
//! Effect sources live next to this file as `.wgsl` assets. A composed
//! shader is the version header, the shared constants, `common.wgsl`
//! (fullscreen vertex stage, input colour bindings, helpers) and the effect
//! body with its `fs_main`.

use super::post_process::{EffectKind, PassMode};
use crate::error::{Result, ViewError};
use rustc_hash::FxHashMap;
use std::f32::consts::TAU;
use tracing::debug;

/// Version tag written at the top of every composed shader
pub const SHADER_VERSION: &str = "pneumo-post 1";

/// Upper bound on sample counts in the shader loops
pub const MAX_SAMPLES: u32 = 64;

/// Angular steps of the SSAO sample spiral
pub const SSAO_DIRECTIONS: u32 = 16;

/// Taps of the depth-of-field kernel
pub const BOKEH_TAPS: u32 = 16;

/// Texels per unit of SSAO radius
pub const SSAO_RADIUS_SCALE: f32 = 8.0;

const COMMON: &str = include_str!("shaders/common.wgsl");
const PASSTHROUGH: &str = include_str!("shaders/passthrough.wgsl");
const BLOOM: &str = include_str!("shaders/bloom.wgsl");
const SSAO: &str = include_str!("shaders/ssao.wgsl");
const DEPTH_OF_FIELD: &str = include_str!("shaders/depth_of_field.wgsl");
const MOTION_BLUR: &str = include_str!("shaders/motion_blur.wgsl");

/// Shader identifiers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderId {
    /// Copies the input colour
    Passthrough,
    Bloom,
    Ssao,
    DepthOfField,
    MotionBlur,
}

impl ShaderId {
    pub const ALL: [ShaderId; 5] = [
        ShaderId::Passthrough,
        ShaderId::Bloom,
        ShaderId::Ssao,
        ShaderId::DepthOfField,
        ShaderId::MotionBlur,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ShaderId::Passthrough => "passthrough",
            ShaderId::Bloom => "bloom",
            ShaderId::Ssao => "ssao",
            ShaderId::DepthOfField => "depth_of_field",
            ShaderId::MotionBlur => "motion_blur",
        }
    }

    pub fn from_name(name: &str) -> Option<ShaderId> {
        ShaderId::ALL.into_iter().find(|id| id.name() == name)
    }

    /// Shader a stage runs in the given mode
    pub fn for_pass(kind: EffectKind, mode: PassMode) -> ShaderId {
        match mode {
            PassMode::Full => kind.shader_id(),
            PassMode::Passthrough => ShaderId::Passthrough,
        }
    }

    fn body(&self) -> &'static str {
        match self {
            ShaderId::Passthrough => PASSTHROUGH,
            ShaderId::Bloom => BLOOM,
            ShaderId::Ssao => SSAO,
            ShaderId::DepthOfField => DEPTH_OF_FIELD,
            ShaderId::MotionBlur => MOTION_BLUR,
        }
    }
}

/// Builds complete WGSL modules from the assets
pub struct ShaderLibrary;

impl ShaderLibrary {
    /// Complete WGSL source for a shader
    pub fn compose(id: ShaderId) -> String {
        let mut code = String::new();

        code.push_str(&format!("// {} :: {}\n\n", SHADER_VERSION, id.name()));
        code.push_str(&Self::constants());
        code.push('\n');
        code.push_str(COMMON);
        code.push('\n');
        code.push_str(id.body());

        code
    }

    /// Source for one stage of the chain
    pub fn compose_pass(kind: EffectKind, mode: PassMode) -> String {
        Self::compose(ShaderId::for_pass(kind, mode))
    }

    fn constants() -> String {
        let mut code = String::new();
        code.push_str(&format!("const TAU: f32 = {:?};\n", TAU));
        code.push_str(&format!("const MAX_SAMPLES: u32 = {}u;\n", MAX_SAMPLES));
        code.push_str(&format!("const SSAO_DIRECTIONS: u32 = {}u;\n", SSAO_DIRECTIONS));
        code.push_str(&format!("const BOKEH_TAPS: u32 = {}u;\n", BOKEH_TAPS));
        code.push_str(&format!(
            "const SSAO_RADIUS_SCALE: f32 = {:?};\n",
            SSAO_RADIUS_SCALE
        ));
        code
    }
}

/// Shader registry for compiled shader modules
pub struct ShaderRegistry {
    shaders: FxHashMap<ShaderId, wgpu::ShaderModule>,
}

impl ShaderRegistry {
    pub fn new() -> Self {
        Self {
            shaders: FxHashMap::default(),
        }
    }

    /// Compose and register every library shader
    pub fn register_defaults(&mut self, device: &wgpu::Device) {
        for id in ShaderId::ALL {
            self.register(device, id, &ShaderLibrary::compose(id));
        }
    }

    /// Register a shader from WGSL source
    pub fn register(&mut self, device: &wgpu::Device, id: ShaderId, wgsl: &str) {
        debug!(shader = id.name(), bytes = wgsl.len(), "compiling shader module");
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("shader_{}", id.name())),
            source: wgpu::ShaderSource::Wgsl(wgsl.into()),
        });
        self.shaders.insert(id, module);
    }

    pub fn get(&self, id: ShaderId) -> Option<&wgpu::ShaderModule> {
        self.shaders.get(&id)
    }

    /// Like [`get`](Self::get), failing for an unregistered shader
    pub fn require(&self, id: ShaderId) -> Result<&wgpu::ShaderModule> {
        self.get(id).ok_or(ViewError::ShaderMissing(id))
    }

    pub fn contains(&self, id: ShaderId) -> bool {
        self.shaders.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.shaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shaders.is_empty()
    }
}

impl Default for ShaderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
