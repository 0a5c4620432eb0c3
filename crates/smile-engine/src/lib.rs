//! Smile Engine - Resource lifecycle around the bouncing sprite
//!
//! - `GraphicsBackend` - the primitive operations a platform renderer provides
//! - `SmileContext` - the Unloaded / Loaded / Ready state machine driving simulation and drawing
//! - `SmileSettings` - TOML-loadable tuning shared by every backend
//! - `DirectoryAssets` - asset lookup under a root directory
//! - `MemoryBackend` - a CPU-only backend that records what it is asked to do

mod assets;
mod backend;
mod context;
mod memory;
mod pending;
mod settings;

pub use assets::DirectoryAssets;
pub use backend::{check_commit_range, GraphicsBackend};
pub use context::{Resources, SmileContext, INDEX_COUNT, INSTANCE_COUNT};
pub use memory::{DrawCommand, FrameRecord, MemoryBackend, MemoryBuffer, MemoryStats, MemoryTexture};
pub use settings::SmileSettings;
