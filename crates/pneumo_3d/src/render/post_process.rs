//! Post effect state machine and chain

use super::capabilities::{CapabilityProbe, TextureInput};
use super::cpu::FrameBuffers;
use super::effects::{Bloom, DepthOfField, MotionBlur, Ssao};
use super::shaders::ShaderId;
use super::ViewParams;
use crate::settings::SectionReader;
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// The four screen-space effects
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    Ssao,
    Bloom,
    DepthOfField,
    MotionBlur,
}

impl EffectKind {
    /// Chain order
    pub const ALL: [EffectKind; 4] = [
        EffectKind::Ssao,
        EffectKind::Bloom,
        EffectKind::DepthOfField,
        EffectKind::MotionBlur,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EffectKind::Ssao => "ssao",
            EffectKind::Bloom => "bloom",
            EffectKind::DepthOfField => "depth_of_field",
            EffectKind::MotionBlur => "motion_blur",
        }
    }

    pub fn from_name(name: &str) -> Option<EffectKind> {
        match name {
            "ssao" => Some(EffectKind::Ssao),
            "bloom" => Some(EffectKind::Bloom),
            "depth_of_field" | "dof" => Some(EffectKind::DepthOfField),
            "motion_blur" => Some(EffectKind::MotionBlur),
            _ => None,
        }
    }

    /// Scene textures the full shader reads
    pub fn required_inputs(&self) -> &'static [TextureInput] {
        match self {
            EffectKind::Ssao => &[TextureInput::Depth, TextureInput::Normal],
            EffectKind::Bloom => &[],
            EffectKind::DepthOfField => &[TextureInput::Depth],
            EffectKind::MotionBlur => &[TextureInput::Velocity],
        }
    }

    pub fn shader_id(&self) -> ShaderId {
        match self {
            EffectKind::Ssao => ShaderId::Ssao,
            EffectKind::Bloom => ShaderId::Bloom,
            EffectKind::DepthOfField => ShaderId::DepthOfField,
            EffectKind::MotionBlur => ShaderId::MotionBlur,
        }
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Capability state of one effect
///
/// `Uninitialized` moves to `Active` or `Fallback` on the first probe and
/// never changes again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum StageState {
    Uninitialized,
    Active,
    Fallback { missing: TextureInput },
}

/// Which shader a stage runs this frame
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PassMode {
    Full,
    Passthrough,
}

/// Enabled flag and capability state shared by every effect
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EffectStage {
    kind: EffectKind,
    pub enabled: bool,
    state: StageState,
}

impl EffectStage {
    pub fn new(kind: EffectKind, enabled: bool) -> Self {
        Self {
            kind,
            enabled,
            state: StageState::Uninitialized,
        }
    }

    pub fn kind(&self) -> EffectKind {
        self.kind
    }

    pub fn state(&self) -> StageState {
        self.state
    }

    /// Probe the required inputs once
    ///
    /// Later calls return the settled state without probing again.
    pub fn probe(&mut self, probe: &dyn CapabilityProbe) -> StageState {
        if self.state != StageState::Uninitialized {
            return self.state;
        }

        for input in self.kind.required_inputs() {
            if let Err(err) = probe.probe(*input) {
                warn!(
                    effect = self.kind.name(),
                    error = %err,
                    "input texture unavailable, effect renders as passthrough"
                );
                self.state = StageState::Fallback { missing: *input };
                return self.state;
            }
        }

        debug!(effect = self.kind.name(), "effect active");
        self.state = StageState::Active;
        self.state
    }

    pub fn fallback_active(&self) -> bool {
        matches!(self.state, StageState::Fallback { .. })
    }

    /// Full shader only when probed active and enabled
    pub fn pass_mode(&self) -> PassMode {
        match self.state {
            StageState::Active if self.enabled => PassMode::Full,
            _ => PassMode::Passthrough,
        }
    }

    /// One-line status for logs and tools
    pub fn diagnostic(&self) -> String {
        let toggle = if self.enabled { "enabled" } else { "disabled" };
        match self.state {
            StageState::Uninitialized => format!("{}: not probed ({})", self.kind, toggle),
            StageState::Active => format!("{}: active ({})", self.kind, toggle),
            StageState::Fallback { missing } => {
                format!("{}: passthrough, {} texture unavailable", self.kind, missing)
            }
        }
    }
}

/// A screen-space effect with its parameters
pub trait PostEffect: Send + Sync {
    fn stage(&self) -> &EffectStage;

    fn stage_mut(&mut self) -> &mut EffectStage;

    fn kind(&self) -> EffectKind {
        self.stage().kind()
    }

    fn name(&self) -> &'static str {
        self.kind().name()
    }

    fn is_enabled(&self) -> bool {
        self.stage().enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.stage_mut().enabled = enabled;
    }

    fn pass_mode(&self) -> PassMode {
        self.stage().pass_mode()
    }

    /// Read this effect's fields from the `effects` section
    fn apply_settings(&mut self, reader: &SectionReader) -> usize;

    /// Uniform block for the full shader at binding 2
    fn uniform_bytes(&self, width: u32, height: u32, view: &ViewParams) -> Vec<u8>;

    /// Full effect on the CPU
    fn process_cpu(&self, frame: &FrameBuffers, view: &ViewParams) -> Vec<[f32; 4]>;

    /// What the stage outputs for the current pass mode
    fn render_cpu(&self, frame: &FrameBuffers, view: &ViewParams) -> Vec<[f32; 4]> {
        match self.pass_mode() {
            PassMode::Full => self.process_cpu(frame, view),
            PassMode::Passthrough => frame.color.clone(),
        }
    }
}

/// The fixed effect chain
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PostEffectChain {
    pub ssao: Ssao,
    pub bloom: Bloom,
    pub depth_of_field: DepthOfField,
    pub motion_blur: MotionBlur,
}

impl PostEffectChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Effects in chain order
    pub fn effects(&self) -> [&dyn PostEffect; 4] {
        [
            &self.ssao,
            &self.bloom,
            &self.depth_of_field,
            &self.motion_blur,
        ]
    }

    pub fn effects_mut(&mut self) -> [&mut dyn PostEffect; 4] {
        [
            &mut self.ssao,
            &mut self.bloom,
            &mut self.depth_of_field,
            &mut self.motion_blur,
        ]
    }

    pub fn get(&self, kind: EffectKind) -> &dyn PostEffect {
        match kind {
            EffectKind::Ssao => &self.ssao,
            EffectKind::Bloom => &self.bloom,
            EffectKind::DepthOfField => &self.depth_of_field,
            EffectKind::MotionBlur => &self.motion_blur,
        }
    }

    pub fn get_mut(&mut self, kind: EffectKind) -> &mut dyn PostEffect {
        match kind {
            EffectKind::Ssao => &mut self.ssao,
            EffectKind::Bloom => &mut self.bloom,
            EffectKind::DepthOfField => &mut self.depth_of_field,
            EffectKind::MotionBlur => &mut self.motion_blur,
        }
    }

    /// Probe every stage once
    pub fn probe(&mut self, probe: &dyn CapabilityProbe) {
        for effect in self.effects_mut() {
            effect.stage_mut().probe(probe);
        }
    }

    pub fn is_probed(&self) -> bool {
        self.effects()
            .iter()
            .all(|e| e.stage().state() != StageState::Uninitialized)
    }

    pub fn apply_settings(&mut self, reader: &SectionReader) -> usize {
        self.effects_mut()
            .into_iter()
            .map(|effect| effect.apply_settings(reader))
            .sum()
    }

    pub fn pass_modes(&self) -> [(EffectKind, PassMode); 4] {
        self.effects().map(|e| (e.kind(), e.pass_mode()))
    }

    pub fn diagnostics(&self) -> Vec<String> {
        self.effects().iter().map(|e| e.stage().diagnostic()).collect()
    }

    /// Run the chain on the CPU; auxiliary planes are shared by all stages
    pub fn render_cpu(&self, frame: &FrameBuffers, view: &ViewParams) -> Vec<[f32; 4]> {
        let mut current = frame.clone();
        for effect in self.effects() {
            current.color = effect.render_cpu(&current, view);
        }
        current.color
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Capabilities;
    use serde_json::json;
    use std::cell::Cell;

    struct CountingProbe {
        calls: Cell<usize>,
    }

    impl CapabilityProbe for CountingProbe {
        fn probe(&self, input: TextureInput) -> Result<(), crate::render::ProbeError> {
            self.calls.set(self.calls.get() + 1);
            Capabilities::none().probe(input)
        }
    }

    #[test]
    fn test_probe_runs_once() {
        let probe = CountingProbe { calls: Cell::new(0) };
        let mut stage = EffectStage::new(EffectKind::Ssao, true);

        let state = stage.probe(&probe);
        assert_eq!(
            state,
            StageState::Fallback {
                missing: TextureInput::Depth
            }
        );
        stage.probe(&Capabilities::all());
        assert_eq!(probe.calls.get(), 1);
        assert!(stage.fallback_active());
    }

    #[test]
    fn test_pass_modes() {
        let mut stage = EffectStage::new(EffectKind::Bloom, true);
        assert_eq!(stage.pass_mode(), PassMode::Passthrough);

        stage.probe(&Capabilities::none());
        assert_eq!(stage.state(), StageState::Active);
        assert_eq!(stage.pass_mode(), PassMode::Full);

        stage.enabled = false;
        assert_eq!(stage.pass_mode(), PassMode::Passthrough);
    }

    #[test]
    fn test_fallback_ignores_enabled() {
        let mut stage = EffectStage::new(EffectKind::MotionBlur, false);
        stage.probe(&Capabilities::all().with_velocity(false));
        stage.enabled = true;
        assert_eq!(stage.pass_mode(), PassMode::Passthrough);
        assert!(stage.diagnostic().contains("velocity texture unavailable"));
    }

    #[test]
    fn test_chain_order_and_probe() {
        let mut chain = PostEffectChain::new();
        let kinds: Vec<EffectKind> = chain.effects().iter().map(|e| e.kind()).collect();
        assert_eq!(kinds, EffectKind::ALL.to_vec());

        assert!(!chain.is_probed());
        chain.probe(&Capabilities::all().with_depth(false));
        assert!(chain.is_probed());
        assert!(chain.ssao.stage().fallback_active());
        assert!(chain.depth_of_field.stage().fallback_active());
        assert!(!chain.bloom.stage().fallback_active());
        assert!(!chain.motion_blur.stage().fallback_active());
    }

    #[test]
    fn test_chain_passthrough_when_nothing_enabled() {
        let mut chain = PostEffectChain::new();
        chain.probe(&Capabilities::all());
        for effect in chain.effects_mut() {
            effect.set_enabled(false);
        }

        let frame = FrameBuffers::from_fn(4, 3, |x, y| [x as f32 * 0.2, y as f32 * 0.3, 0.5, 1.0]);
        let out = chain.render_cpu(&frame, &ViewParams::default());
        assert_eq!(out, frame.color);
    }

    #[test]
    fn test_chain_apply_settings() {
        let mut chain = PostEffectChain::new();
        let payload = json!({
            "bloom": { "enabled": false, "intensity": 0.9 },
            "ssaoSamples": 0,
            "motion_blur": true,
        });
        let n = chain.apply_settings(&SectionReader::new(&payload));

        assert_eq!(n, 4);
        assert!(!chain.bloom.is_enabled());
        assert_eq!(chain.bloom.intensity, 0.9);
        assert_eq!(chain.ssao.effective_samples(), 1);
        assert!(chain.motion_blur.is_enabled());
    }
}
