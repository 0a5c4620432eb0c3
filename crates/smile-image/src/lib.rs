//! Smile Image - Pixel codec for sprite textures
//!
//! Decodes PNG files into a small set of canonical pixel formats and
//! converts between them:
//! - `PixelFormat` - the canonical formats and their channel bit widths
//! - `ChannelSet` - one pixel split into channels, with packing to and from bytes
//! - `RasterImage` - an owned, row-addressable pixel buffer (bottom row first)
//! - `decode` - PNG bytes to a `RasterImage`
//! - `convert` - re-encode a `RasterImage` in another format

mod color;
mod convert;
mod format;
mod png;
mod raster;

pub use color::ChannelSet;
pub use convert::convert;
pub use format::PixelFormat;
pub use png::{decode, PngHeader, PNG_SIGNATURE};
pub use raster::RasterImage;
