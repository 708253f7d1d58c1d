//! `pneumo.toml` handling
//!
//! The file declares which scene textures the host renderer provides and an
//! initial scene payload with the same sections as a batch update:
//!
//! ```toml
//! [capabilities]
//! velocity = false
//!
//! [scene.geometry]
//! lever_length = 800.0
//!
//! [scene.effects.bloom]
//! enabled = true
//! intensity = 0.4
//! ```

use anyhow::{Context, Result};
use pneumo_3d::Capabilities;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

pub const CONFIG_FILE: &str = "pneumo.toml";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct PneumoConfig {
    #[serde(default)]
    pub capabilities: CapabilitiesConfig,
    /// Initial scene payload
    #[serde(default)]
    pub scene: toml::Table,
}

/// Scene textures the host renderer provides
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct CapabilitiesConfig {
    #[serde(default = "default_true")]
    pub depth: bool,
    #[serde(default = "default_true")]
    pub normal: bool,
    #[serde(default = "default_true")]
    pub velocity: bool,
}

fn default_true() -> bool {
    true
}

impl Default for CapabilitiesConfig {
    fn default() -> Self {
        Self {
            depth: true,
            normal: true,
            velocity: true,
        }
    }
}

impl From<CapabilitiesConfig> for Capabilities {
    fn from(config: CapabilitiesConfig) -> Self {
        Capabilities::none()
            .with_depth(config.depth)
            .with_normal(config.normal)
            .with_velocity(config.velocity)
    }
}

impl PneumoConfig {
    /// Load from an explicit path
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Load `pneumo.toml` from a directory, or defaults when there is none
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            debug!("no {} in {}, using defaults", CONFIG_FILE, dir.display());
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities.into()
    }

    /// The `[scene]` table as a batch payload
    pub fn payload(&self) -> Result<serde_json::Value> {
        serde_json::to_value(&self.scene).context("Failed to convert scene table to JSON")
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pneumo_3d::SceneView;

    const SAMPLE: &str = r#"
[capabilities]
velocity = false

[scene.geometry]
lever_length = 750.0

[scene.effects.bloom]
enabled = true
intensity = 0.42
"#;

    #[test]
    fn test_parse_sample() {
        let config = PneumoConfig::parse(SAMPLE).unwrap();
        let caps = config.capabilities();
        assert!(caps.depth && caps.normal);
        assert!(!caps.velocity);

        let payload = config.payload().unwrap();
        assert_eq!(payload["geometry"]["lever_length"], 750.0);
        assert_eq!(payload["effects"]["bloom"]["intensity"], 0.42);
    }

    #[test]
    fn test_payload_drives_scene() {
        let config = PneumoConfig::parse(SAMPLE).unwrap();
        let mut view = SceneView::new();
        let summary = view.apply_batch(&config.payload().unwrap());

        assert_eq!(summary.sections, vec!["geometry", "effects"]);
        assert_eq!(view.settings().geometry.lever_length, 750.0);
        assert_eq!(view.effects().bloom.intensity, 0.42);
    }

    #[test]
    fn test_empty_config_defaults() {
        let config = PneumoConfig::parse("").unwrap();
        assert_eq!(config.capabilities(), Capabilities::all());
        assert!(config.scene.is_empty());
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(PneumoConfig::parse("[capabilities\ndepth = ").is_err());
        assert!(PneumoConfig::parse("[capabilities]\ndepth = 3").is_err());
    }

    #[test]
    fn test_missing_dir_file_uses_defaults() {
        let dir = std::env::temp_dir().join("pneumo_cli_config_test_missing");
        let config = PneumoConfig::load_from_dir(&dir).unwrap();
        assert_eq!(config.capabilities(), Capabilities::all());
    }

    #[test]
    fn test_round_trip_keeps_scene() {
        let config = PneumoConfig::parse(SAMPLE).unwrap();
        let text = config.to_toml().unwrap();
        let again = PneumoConfig::parse(&text).unwrap();
        assert_eq!(again.scene, config.scene);
        assert!(!again.capabilities.velocity);
    }
}
