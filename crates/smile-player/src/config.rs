//! Player configuration file

use anyhow::{Context, Result};
use serde::Deserialize;
use smile_engine::{DirectoryAssets, SmileSettings};
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 600,
            height: 800,
            title: "Smile".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Directory asset names are resolved against
    pub root: String,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            root: "assets".to_string(),
        }
    }
}

/// Top-level `smile.toml`
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub window: WindowConfig,
    pub assets: AssetConfig,
    pub engine: SmileSettings,
}

impl PlayerConfig {
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse player config")
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("In {}", path.display()))
    }

    pub fn asset_directory(&self) -> DirectoryAssets {
        DirectoryAssets::new(&self.assets.root)
    }
}
