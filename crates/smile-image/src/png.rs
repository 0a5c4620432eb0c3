//! PNG decoding into canonical formats
//!
//! Bitstream decoding is delegated to the `image` crate; this module reads the
//! chunk headers it needs to pick a canonical format, strips 16-bit samples,
//! flattens transparency over the file's background colour where the colour
//! type carries no alpha channel, and stores rows bottom first.

use crate::format::PixelFormat;
use crate::raster::RasterImage;
use image::{DynamicImage, ImageError, ImageFormat};
use smile_core::{Result, SmileError};

/// The eight bytes every PNG file starts with
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

const COLOR_GRAY: u8 = 0;
const COLOR_RGB: u8 = 2;
const COLOR_PALETTE: u8 = 3;
const COLOR_GRAY_ALPHA: u8 = 4;
const COLOR_RGBA: u8 = 6;

/// Header information gathered from the chunks preceding the image data
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PngHeader {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: u8,
    pub palette: Vec<[u8; 3]>,
    pub has_transparency: bool,
    /// Raw `bKGD` payload, interpreted according to `color_type`
    pub background: Option<Vec<u8>>,
}

impl PngHeader {
    /// Walk the chunk list up to the first `IDAT`
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        check_signature(bytes)?;

        let mut header = PngHeader::default();
        let mut seen_ihdr = false;
        let mut pos = PNG_SIGNATURE.len();

        loop {
            let head = bytes
                .get(pos..pos + 8)
                .ok_or_else(|| SmileError::LogicError("truncated PNG chunk header".into()))?;
            let len = u32::from_be_bytes([head[0], head[1], head[2], head[3]]) as usize;
            let kind = [head[4], head[5], head[6], head[7]];
            let body = bytes
                .get(pos + 8..pos + 8 + len)
                .ok_or_else(|| SmileError::LogicError("truncated PNG chunk".into()))?;

            match &kind {
                b"IHDR" => {
                    if body.len() < 13 {
                        return Err(SmileError::LogicError("short IHDR chunk".into()));
                    }
                    header.width = u32::from_be_bytes([body[0], body[1], body[2], body[3]]);
                    header.height = u32::from_be_bytes([body[4], body[5], body[6], body[7]]);
                    header.bit_depth = body[8];
                    header.color_type = body[9];
                    seen_ihdr = true;
                }
                b"PLTE" => {
                    header.palette = body
                        .chunks_exact(3)
                        .map(|c| [c[0], c[1], c[2]])
                        .collect();
                }
                b"tRNS" => header.has_transparency = true,
                b"bKGD" => header.background = Some(body.to_vec()),
                b"IDAT" | b"IEND" => break,
                _ => {}
            }

            // length, type, payload, CRC
            pos += 12 + len;
        }

        if !seen_ihdr {
            return Err(SmileError::LogicError("PNG has no IHDR chunk".into()));
        }
        Ok(header)
    }

    /// Canonical format produced for this colour type
    pub fn target_format(&self) -> Result<PixelFormat> {
        match self.color_type {
            COLOR_GRAY => Ok(PixelFormat::A8),
            COLOR_RGB | COLOR_PALETTE => Ok(PixelFormat::R8G8B8),
            COLOR_GRAY_ALPHA | COLOR_RGBA => Ok(PixelFormat::R8G8B8A8),
            other => Err(SmileError::InvalidInput(format!(
                "unknown PNG colour type {}",
                other
            ))),
        }
    }

    /// Background colour at 8 bits per channel; opaque black when the file has none
    pub fn background_rgb(&self) -> [u8; 3] {
        let Some(raw) = &self.background else {
            return [0, 0, 0];
        };
        let sample = |i: usize| -> u8 {
            let v = match raw.get(i * 2..i * 2 + 2) {
                Some(b) => u16::from_be_bytes([b[0], b[1]]),
                None => return 0,
            };
            match self.bit_depth {
                16 => (v >> 8) as u8,
                d @ 1..=7 => {
                    let max = (1u16 << d) - 1;
                    ((v.min(max) as u32 * 255) / max as u32) as u8
                }
                _ => v.min(255) as u8,
            }
        };
        match self.color_type {
            COLOR_PALETTE => raw
                .first()
                .and_then(|&i| self.palette.get(i as usize).copied())
                .unwrap_or([0, 0, 0]),
            COLOR_GRAY | COLOR_GRAY_ALPHA => {
                let g = sample(0);
                [g, g, g]
            }
            _ => [sample(0), sample(1), sample(2)],
        }
    }
}

fn check_signature(bytes: &[u8]) -> Result<()> {
    if bytes.len() < PNG_SIGNATURE.len() || bytes[..PNG_SIGNATURE.len()] != PNG_SIGNATURE {
        return Err(SmileError::InvalidInput("missing PNG signature".into()));
    }
    Ok(())
}

fn map_image_error(err: ImageError) -> SmileError {
    match err {
        ImageError::Limits(e) => SmileError::MemError(e.to_string()),
        ImageError::Decoding(e) => SmileError::LogicError(e.to_string()),
        ImageError::IoError(e) => SmileError::LogicError(e.to_string()),
        ImageError::Unsupported(e) => SmileError::InvalidInput(e.to_string()),
        other => SmileError::InternalError(other.to_string()),
    }
}

fn strip_16(samples: &[u16]) -> Vec<u8> {
    samples.iter().map(|&s| (s >> 8) as u8).collect()
}

/// Decoded samples at 8 bits each, with the channel count per pixel
fn into_8bit_samples(img: DynamicImage) -> Result<(usize, Vec<u8>)> {
    Ok(match img {
        DynamicImage::ImageLuma8(b) => (1, b.into_raw()),
        DynamicImage::ImageLumaA8(b) => (2, b.into_raw()),
        DynamicImage::ImageRgb8(b) => (3, b.into_raw()),
        DynamicImage::ImageRgba8(b) => (4, b.into_raw()),
        DynamicImage::ImageLuma16(b) => (1, strip_16(b.as_raw())),
        DynamicImage::ImageLumaA16(b) => (2, strip_16(b.as_raw())),
        DynamicImage::ImageRgb16(b) => (3, strip_16(b.as_raw())),
        DynamicImage::ImageRgba16(b) => (4, strip_16(b.as_raw())),
        other => {
            return Err(SmileError::InvalidInput(format!(
                "cannot reduce {:?} samples to 8 bits",
                other.color()
            )))
        }
    })
}

fn blend(fg: u8, bg: u8, alpha: u8) -> u8 {
    let a = alpha as u32;
    ((fg as u32 * a + bg as u32 * (255 - a) + 127) / 255) as u8
}

/// Decode PNG bytes into a canonical image stored bottom row first
pub fn decode(bytes: &[u8]) -> Result<RasterImage> {
    let header = PngHeader::parse(bytes)?;
    let format = header.target_format()?;

    let decoded = image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .map_err(map_image_error)?;
    let (width, height) = (decoded.width(), decoded.height());
    let (channels, samples) = into_8bit_samples(decoded)?;
    let background = header.background_rgb();

    log::debug!(
        "Decoded PNG {}x{} (colour type {}, depth {}, tRNS {}) as {}",
        width,
        height,
        header.color_type,
        header.bit_depth,
        header.has_transparency,
        format
    );

    let mut out = RasterImage::new(width, height, format)?;
    let src_row = width as usize * channels;
    if samples.len() < src_row * height as usize {
        return Err(SmileError::InternalError(format!(
            "decoder returned {} samples for a {}x{} image",
            samples.len(),
            width,
            height
        )));
    }

    for (y, row) in samples.chunks_exact(src_row.max(1)).take(height as usize).enumerate() {
        let dst = out.row_mut(height - 1 - y as u32)?;
        for (px, d) in row
            .chunks_exact(channels)
            .zip(dst.chunks_exact_mut(format.pixel_size()))
        {
            let (rgb, alpha) = match px {
                [g] => ([*g, *g, *g], u8::MAX),
                [g, a] => ([*g, *g, *g], *a),
                [r, g, b] => ([*r, *g, *b], u8::MAX),
                [r, g, b, a] => ([*r, *g, *b], *a),
                _ => {
                    return Err(SmileError::InternalError(format!(
                        "unexpected {}-channel pixel",
                        channels
                    )))
                }
            };
            match format {
                PixelFormat::R8G8B8A8 => d.copy_from_slice(&[rgb[0], rgb[1], rgb[2], alpha]),
                PixelFormat::R8G8B8 => {
                    for c in 0..3 {
                        d[c] = blend(rgb[c], background[c], alpha);
                    }
                }
                _ => d[0] = blend(rgb[0], background[0], alpha),
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayAlphaImage, GrayImage, ImageBuffer, Luma, RgbImage, RgbaImage};
    use std::io::Cursor;

    fn encode(img: DynamicImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    /// Encode raw samples with the `png` crate, optionally adding PLTE, tRNS and bKGD
    fn encode_raw(
        (width, height): (u32, u32),
        color: png::ColorType,
        depth: png::BitDepth,
        data: &[u8],
        palette: Option<&[u8]>,
        trns: Option<&[u8]>,
        background: Option<&[u8]>,
    ) -> Vec<u8> {
        let mut bytes = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut bytes, width, height);
            encoder.set_color(color);
            encoder.set_depth(depth);
            if let Some(palette) = palette {
                encoder.set_palette(palette.to_vec());
            }
            if let Some(trns) = trns {
                encoder.set_trns(trns.to_vec());
            }
            let mut writer = encoder.write_header().unwrap();
            if let Some(background) = background {
                writer
                    .write_chunk(png::chunk::ChunkType(*b"bKGD"), background)
                    .unwrap();
            }
            writer.write_image_data(data).unwrap();
        }
        bytes
    }

    #[test]
    fn test_rejects_missing_signature() {
        let err = decode(b"GIF89a not a png").unwrap_err();
        assert!(matches!(err, SmileError::InvalidInput(_)));
        assert!(matches!(decode(&[]), Err(SmileError::InvalidInput(_))));
    }

    #[test]
    fn test_truncated_chunks_are_logic_errors() {
        let mut bytes = PNG_SIGNATURE.to_vec();
        bytes.extend_from_slice(&[0, 0, 0, 13, b'I', b'H']);
        assert!(matches!(decode(&bytes), Err(SmileError::LogicError(_))));
    }

    #[test]
    fn test_gray_decodes_to_a8_bottom_row_first() {
        let img = GrayImage::from_raw(2, 2, vec![10, 20, 30, 40]).unwrap();
        let out = decode(&encode(DynamicImage::ImageLuma8(img))).unwrap();
        assert_eq!(out.format(), PixelFormat::A8);
        assert_eq!(out.row_stride(), 2);
        assert_eq!(out.data(), &[30, 40, 10, 20]);
    }

    #[test]
    fn test_rgba_keeps_alpha() {
        let img = RgbaImage::from_raw(1, 2, vec![1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        let out = decode(&encode(DynamicImage::ImageRgba8(img))).unwrap();
        assert_eq!(out.format(), PixelFormat::R8G8B8A8);
        assert_eq!(out.data(), &[5, 6, 7, 8, 1, 2, 3, 4]);
    }

    #[test]
    fn test_gray_alpha_becomes_rgba() {
        let img = GrayAlphaImage::from_raw(1, 1, vec![90, 17]).unwrap();
        let out = decode(&encode(DynamicImage::ImageLumaA8(img))).unwrap();
        assert_eq!(out.format(), PixelFormat::R8G8B8A8);
        assert_eq!(out.data(), &[90, 90, 90, 17]);
    }

    #[test]
    fn test_sixteen_bit_is_stripped() {
        let img: ImageBuffer<Luma<u16>, Vec<u16>> =
            ImageBuffer::from_raw(2, 1, vec![0xABCD, 0x0102]).unwrap();
        let out = decode(&encode(DynamicImage::ImageLuma16(img))).unwrap();
        assert_eq!(out.format(), PixelFormat::A8);
        assert_eq!(out.data(), &[0xAB, 0x01]);
    }

    #[test]
    fn test_rgb_transparency_flattened_over_background() {
        let png = encode_raw(
            (2, 1),
            png::ColorType::Rgb,
            png::BitDepth::Eight,
            &[10, 20, 30, 40, 50, 60],
            None,
            Some(&[0, 10, 0, 20, 0, 30]),
            Some(&[0, 200, 0, 100, 0, 50]),
        );

        let header = PngHeader::parse(&png).unwrap();
        assert!(header.has_transparency);
        assert_eq!(header.background_rgb(), [200, 100, 50]);

        let out = decode(&png).unwrap();
        assert_eq!(out.format(), PixelFormat::R8G8B8);
        assert_eq!(out.data(), &[200, 100, 50, 40, 50, 60]);
    }

    #[test]
    fn test_palette_decodes_to_rgb() {
        let png = encode_raw(
            (2, 1),
            png::ColorType::Indexed,
            png::BitDepth::Eight,
            &[1, 0],
            Some(&[255, 0, 0, 0, 255, 0]),
            None,
            None,
        );
        let header = PngHeader::parse(&png).unwrap();
        assert_eq!(header.palette, vec![[255, 0, 0], [0, 255, 0]]);

        let out = decode(&png).unwrap();
        assert_eq!(out.format(), PixelFormat::R8G8B8);
        assert_eq!(out.data(), &[0, 255, 0, 255, 0, 0]);
    }

    #[test]
    fn test_palette_transparency_composited() {
        let palette = [255, 0, 0, 0, 255, 0];
        // Entry 0 is fully transparent, entry 1 defaults to opaque
        let over_black = encode_raw(
            (2, 1),
            png::ColorType::Indexed,
            png::BitDepth::Eight,
            &[0, 1],
            Some(&palette),
            Some(&[0]),
            None,
        );
        let out = decode(&over_black).unwrap();
        assert_eq!(out.format(), PixelFormat::R8G8B8);
        assert_eq!(out.data(), &[0, 0, 0, 0, 255, 0]);

        let over_green = encode_raw(
            (2, 1),
            png::ColorType::Indexed,
            png::BitDepth::Eight,
            &[0, 1],
            Some(&palette),
            Some(&[0]),
            Some(&[1]),
        );
        assert_eq!(PngHeader::parse(&over_green).unwrap().background_rgb(), [0, 255, 0]);
        assert_eq!(decode(&over_green).unwrap().data(), &[0, 255, 0, 0, 255, 0]);
    }

    #[test]
    fn test_sub_byte_gray_expands_to_a8() {
        let png = encode_raw(
            (4, 1),
            png::ColorType::Grayscale,
            png::BitDepth::One,
            &[0b1010_0000],
            None,
            None,
            None,
        );
        assert_eq!(PngHeader::parse(&png).unwrap().bit_depth, 1);

        let out = decode(&png).unwrap();
        assert_eq!(out.format(), PixelFormat::A8);
        assert_eq!(out.data(), &[255, 0, 255, 0]);
    }

    #[test]
    fn test_gray_transparency_flattened() {
        let png = encode_raw(
            (2, 1),
            png::ColorType::Grayscale,
            png::BitDepth::Eight,
            &[50, 200],
            None,
            Some(&[0, 50]),
            None,
        );
        let out = decode(&png).unwrap();
        assert_eq!(out.format(), PixelFormat::A8);
        assert_eq!(out.data(), &[0, 200]);
    }

    #[test]
    fn test_header_fields() {
        let img = RgbImage::from_raw(3, 5, vec![0; 45]).unwrap();
        let header = PngHeader::parse(&encode(DynamicImage::ImageRgb8(img))).unwrap();
        assert_eq!((header.width, header.height), (3, 5));
        assert_eq!(header.bit_depth, 8);
        assert_eq!(header.color_type, COLOR_RGB);
        assert_eq!(header.background_rgb(), [0, 0, 0]);
        assert_eq!(header.target_format().unwrap(), PixelFormat::R8G8B8);
    }
}
