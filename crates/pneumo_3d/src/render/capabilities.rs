//! Input texture capability probing

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Auxiliary scene texture an effect may read
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextureInput {
    Depth,
    Normal,
    Velocity,
}

impl TextureInput {
    pub const ALL: [TextureInput; 3] = [
        TextureInput::Depth,
        TextureInput::Normal,
        TextureInput::Velocity,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TextureInput::Depth => "depth",
            TextureInput::Normal => "normal",
            TextureInput::Velocity => "velocity",
        }
    }

    /// Format the host renders this input into
    pub fn format(&self) -> wgpu::TextureFormat {
        match self {
            TextureInput::Depth => wgpu::TextureFormat::Depth32Float,
            TextureInput::Normal => wgpu::TextureFormat::Rgba16Float,
            TextureInput::Velocity => wgpu::TextureFormat::Rg16Float,
        }
    }

    /// Bind group slot in the effect shaders
    pub fn binding(&self) -> u32 {
        match self {
            TextureInput::Depth => 3,
            TextureInput::Normal => 4,
            TextureInput::Velocity => 5,
        }
    }

    /// Sample type declared in the bind group layout
    pub fn sample_type(&self) -> wgpu::TextureSampleType {
        match self {
            TextureInput::Depth => wgpu::TextureSampleType::Depth,
            TextureInput::Normal | TextureInput::Velocity => {
                wgpu::TextureSampleType::Float { filterable: false }
            }
        }
    }
}

impl fmt::Display for TextureInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why an input texture cannot be used
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProbeError {
    #[error("{0} texture is not provided by the host renderer")]
    Unavailable(TextureInput),

    #[error("{input} texture format {format:?} cannot be both rendered and sampled")]
    Unsupported {
        input: TextureInput,
        format: wgpu::TextureFormat,
    },
}

/// One-shot query for input texture availability
pub trait CapabilityProbe {
    fn probe(&self, input: TextureInput) -> Result<(), ProbeError>;
}

/// Host-declared set of available input textures
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub depth: bool,
    pub normal: bool,
    pub velocity: bool,
}

impl Capabilities {
    pub fn all() -> Self {
        Self {
            depth: true,
            normal: true,
            velocity: true,
        }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_depth(mut self, available: bool) -> Self {
        self.depth = available;
        self
    }

    pub fn with_normal(mut self, available: bool) -> Self {
        self.normal = available;
        self
    }

    pub fn with_velocity(mut self, available: bool) -> Self {
        self.velocity = available;
        self
    }

    pub fn has(&self, input: TextureInput) -> bool {
        match input {
            TextureInput::Depth => self.depth,
            TextureInput::Normal => self.normal,
            TextureInput::Velocity => self.velocity,
        }
    }

    /// Collect the answers of any probe into a plain set
    pub fn detect(probe: &dyn CapabilityProbe) -> Self {
        Self {
            depth: probe.probe(TextureInput::Depth).is_ok(),
            normal: probe.probe(TextureInput::Normal).is_ok(),
            velocity: probe.probe(TextureInput::Velocity).is_ok(),
        }
    }
}

impl CapabilityProbe for Capabilities {
    fn probe(&self, input: TextureInput) -> Result<(), ProbeError> {
        if self.has(input) {
            Ok(())
        } else {
            Err(ProbeError::Unavailable(input))
        }
    }
}

impl CapabilityProbe for wgpu::Adapter {
    fn probe(&self, input: TextureInput) -> Result<(), ProbeError> {
        let format = input.format();
        let features = self.get_texture_format_features(format);
        let needed = wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING;

        if features.allowed_usages.contains(needed) {
            Ok(())
        } else {
            Err(ProbeError::Unsupported { input, format })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_capabilities() {
        let caps = Capabilities::all().with_normal(false);
        assert!(caps.probe(TextureInput::Depth).is_ok());
        assert_eq!(
            caps.probe(TextureInput::Normal),
            Err(ProbeError::Unavailable(TextureInput::Normal))
        );
        assert_eq!(Capabilities::detect(&caps), caps);
    }

    #[test]
    fn test_error_message_names_input() {
        let err = Capabilities::none().probe(TextureInput::Velocity).unwrap_err();
        assert!(err.to_string().starts_with("velocity texture"));
    }

    #[test]
    fn test_bindings_are_distinct() {
        let bindings: Vec<u32> = TextureInput::ALL.iter().map(|i| i.binding()).collect();
        assert_eq!(bindings, vec![3, 4, 5]);
    }
}
