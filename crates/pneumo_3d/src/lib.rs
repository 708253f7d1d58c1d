//! # Pneumo 3D
//!
//! The 3D view layer of the PneumoStabSim pneumatic-suspension simulator.
//!
//! This crate provides:
//! - **Suspension kinematics**: closed-form placement of lever, tail rod,
//!   cylinder and piston for each of the four corners
//! - **Scene settings**: a typed, alias-tolerant schema for the parameter
//!   payloads pushed by the simulation/UI process
//! - **Post effects**: bloom, SSAO, depth of field and motion blur with
//!   capability probing and a passthrough fallback
//! - **WGSL shader library** composed at pipeline-build time, a `wgpu`
//!   post-process chain, and a CPU reference implementation of every pass
//!
//! ## Quick Start
//!
//! ```rust
//! use pneumo_3d::prelude::*;
//! use serde_json::json;
//!
//! let mut view = SceneView::new();
//! view.initialize(&Capabilities::all());
//!
//! let summary = view.apply_batch(&json!({
//!     "effects": { "bloom_enabled": true, "bloom_intensity": 0.42 },
//!     "geometry": { "lever_length": 800.0 },
//! }));
//! assert_eq!(summary.sections, vec!["geometry", "effects"]);
//!
//! let frame = view.frame();
//! for corner in &frame.corners {
//!     assert!(corner.geometry.rod_length_error < 1.0);
//! }
//! ```

// Error types
pub mod error;

// Math utilities
pub mod math;

// Suspension corner kinematics
pub mod suspension;

// Inbound parameter payload schema
pub mod settings;

// Post effects, shaders and GPU chain
pub mod render;

// Scene state owner
pub mod view;

// Prelude for common imports
pub mod prelude;

// Re-export core types at crate root
pub use error::{Result, ViewError};
pub use render::{
    Bloom, Capabilities, CapabilityProbe, DepthOfField, EffectKind, FrameBuffers, MotionBlur,
    PassMode, PostEffect, PostEffectChain, Ssao, StageState, TextureInput,
};
pub use settings::{ApplySummary, SceneSettings, SectionReader};
pub use suspension::{
    solve_corner, Corner, CornerConfig, CornerConstants, CornerGeometry, CornerInput,
    PistonPositions, RigLayout, SuspensionRig, ToleranceMonitor,
};
pub use view::{CornerFrame, FrameSnapshot, SceneView};
