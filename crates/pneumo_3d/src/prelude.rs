//! Prelude module for convenient imports
//!
//! ```rust
//! use pneumo_3d::prelude::*;
//! ```

// Suspension
pub use crate::suspension::{
    solve_corner, Corner, CornerConfig, CornerConstants, CornerGeometry, CornerInput,
    PistonPositions, RigLayout, SuspensionRig, ToleranceMonitor,
};

// Settings
pub use crate::settings::{
    AnimationSettings, ApplySummary, CameraSettings, EnvironmentSettings, GeometrySettings,
    LightingSettings, MaterialSettings, QualitySettings, SceneSettings, SectionReader,
};

// Render
pub use crate::render::{
    Bloom, Capabilities, CapabilityProbe, DepthOfField, EffectKind, FrameBuffers, MotionBlur,
    PassMode, PostEffect, PostEffectChain, PostProcessRenderer, SceneTextures, ShaderId,
    ShaderLibrary, ShaderRegistry, Ssao, StageState, TextureInput, ViewParams,
};

// View
pub use crate::view::{CornerFrame, FrameSnapshot, SceneView};

// Errors
pub use crate::error::{Result, ViewError};

// Math
pub use crate::math::{Mat4Ext, Vec3Ext};
pub use pneumo_core::{Color, Mat4, UnitRule, Vec2, Vec3};
