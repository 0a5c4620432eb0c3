//! Asset lookup on disk

use smile_core::{Result, SmileError};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Resolves asset names against a root directory
#[derive(Clone, Debug)]
pub struct DirectoryAssets {
    root: PathBuf,
}

impl DirectoryAssets {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of an asset; names may not escape the root
    pub fn path_for(&self, name: &str) -> Result<PathBuf> {
        let relative = Path::new(name);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(SmileError::InvalidInput(format!(
                "asset name '{}' must be relative to the asset root",
                name
            )));
        }
        Ok(self.root.join(relative))
    }

    /// Read an asset's bytes
    pub fn load(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.path_for(name)?;
        fs::read(&path).map_err(|e| {
            log::error!("Failed to read asset {}: {}", path.display(), e);
            SmileError::InvalidInput(format!("cannot read asset '{}': {}", name, e))
        })
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).map(|p| p.is_file()).unwrap_or(false)
    }
}
