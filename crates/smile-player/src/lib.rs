//! Smile Player - drives the sprite engine
//!
//! - `PlayerApp` - winit application presenting frames to a window
//! - `run_offscreen` - renders a fixed number of frames and saves a screenshot
//! - `run_dry` - runs the same lifecycle on the CPU-only backend

mod config;
mod offscreen;
mod player_app;

pub use config::{AssetConfig, PlayerConfig, WindowConfig};
pub use offscreen::{run_dry, run_offscreen, DryRunSummary, FRAME_TIME};
pub use player_app::PlayerApp;
