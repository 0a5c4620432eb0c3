//! Smile Core - Foundational types for the Smile sprite engine
//!
//! This crate provides the types that all other Smile crates depend on:
//! - `SmileError` and `ResultCode` - the error taxonomy and its stable names
//! - `Vertex`, `GeomInstance` - GPU buffer layouts for the sprite quad
//! - `BufferKind`, `ResourceState` - backend buffer usage and resource lifecycle
//! - `ClearColor` - background colour shared by settings and backends

mod error;
mod types;

pub use error::{ResultCode, SmileError, Result};
pub use types::{BufferKind, ClearColor, GeomInstance, ResourceState, Vertex, QUAD_INDICES};
