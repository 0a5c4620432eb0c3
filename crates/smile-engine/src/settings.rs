//! Engine settings

use serde::Deserialize;
use smile_core::{ClearColor, Result, SmileError};
use smile_physics::{CadenceParams, OscillatorParams};
use std::path::Path;

/// Everything the context needs besides a backend
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SmileSettings {
    pub physics: OscillatorParams,
    pub cadence: CadenceParams,
    pub clear_color: ClearColor,
    /// Asset name of the sprite image, resolved by the backend
    pub sprite_asset: String,
}

impl Default for SmileSettings {
    fn default() -> Self {
        Self {
            physics: OscillatorParams::default(),
            cadence: CadenceParams::default(),
            clear_color: ClearColor::default(),
            sprite_asset: "textures/smiley-face.png".to_string(),
        }
    }
}

impl SmileSettings {
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| SmileError::InvalidInput(format!("bad settings: {}", e)))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SmileError::InvalidInput(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = SmileSettings::default();
        assert_eq!(settings.sprite_asset, "textures/smiley-face.png");
        assert_eq!(settings.clear_color, ClearColor::new(0.23, 0.39, 0.51));
        assert_eq!(settings.physics.floor_y, -0.75);
        assert_eq!(settings.cadence.substeps, 1000);
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(SmileSettings::from_toml("").unwrap(), SmileSettings::default());
    }

    #[test]
    fn test_nested_overrides() {
        let toml = r#"
sprite_asset = "sprites/ball.png"
clear_color = { r = 0.0, g = 0.0, b = 0.0 }

[physics]
stiffness = 1200.0

[cadence]
warmup = 0.0
"#;
        let settings = SmileSettings::from_toml(toml).unwrap();
        assert_eq!(settings.sprite_asset, "sprites/ball.png");
        assert_eq!(settings.physics.stiffness, 1200.0);
        assert_eq!(settings.physics.damping, 3.0);
        assert_eq!(settings.cadence.warmup, 0.0);
        assert_eq!(settings.cadence.substeps, 1000);
    }

    #[test]
    fn test_malformed_toml() {
        let err = SmileSettings::from_toml("physics = 3").unwrap_err();
        assert!(matches!(err, SmileError::InvalidInput(_)));
    }
}
