//! Pixel format conversion

use crate::color::ChannelSet;
use crate::format::PixelFormat;
use crate::raster::RasterImage;
use smile_core::{Result, SmileError};

/// Re-encode `src` in `target`, leaving `src` untouched.
///
/// Equal formats return an identical copy. Grayscale expansion to RGBA and
/// luminance reduction from 8-bit RGB take dedicated paths; everything else
/// goes through a per-pixel `ChannelSet` load/set/save.
pub fn convert(src: &RasterImage, target: PixelFormat) -> Result<RasterImage> {
    let source = src.format();
    if !target.is_defined() || !source.is_defined() {
        return Err(SmileError::InvalidInput(format!(
            "cannot convert {} to {}",
            source, target
        )));
    }
    if source == target {
        return Ok(src.clone());
    }

    let mut dst = RasterImage::new(src.width(), src.height(), target)?;
    log::debug!(
        "Converting {}x{} image from {} to {}",
        src.width(),
        src.height(),
        source,
        target
    );

    match (source, target) {
        (PixelFormat::A8, PixelFormat::R8G8B8A8) => {
            for_each_pixel(src, &mut dst, |s, d| {
                d.copy_from_slice(&[s[0], s[0], s[0], u8::MAX]);
                Ok(())
            })?;
        }
        (s, PixelFormat::A8) if s.is_rgb8() => {
            for_each_pixel(src, &mut dst, |s, d| {
                d[0] = luminance(s[0], s[1], s[2]);
                Ok(())
            })?;
        }
        _ => {
            let mut from = ChannelSet::from_format(source);
            let mut to = ChannelSet::from_format(target);
            for_each_pixel(src, &mut dst, |s, d| {
                read_pixel(&mut from, source, s)?;
                to.set(from.r(), from.g(), from.b(), from.a());
                write_pixel(&to, target, d)
            })?;
        }
    }

    Ok(dst)
}

impl RasterImage {
    /// Convert in place. On failure the image keeps its previous contents.
    pub fn convert(&mut self, target: PixelFormat) -> Result<()> {
        if self.format() == target {
            return Ok(());
        }
        *self = convert(self, target)?;
        Ok(())
    }
}

/// ITU-R BT.601 luma, rounded to the nearest level
fn luminance(r: u8, g: u8, b: u8) -> u8 {
    let y = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
    y.round().clamp(0.0, 255.0) as u8
}

fn for_each_pixel<F>(src: &RasterImage, dst: &mut RasterImage, mut f: F) -> Result<()>
where
    F: FnMut(&[u8], &mut [u8]) -> Result<()>,
{
    let src_size = src.pixel_size();
    let dst_size = dst.pixel_size();
    for y in 0..src.height() {
        let src_row = src.row(y)?;
        let dst_row = dst.row_mut(y)?;
        if src_row.len() / src_size != dst_row.len() / dst_size {
            return Err(SmileError::InternalError(format!(
                "row {} width mismatch during conversion",
                y
            )));
        }
        for (s, d) in src_row
            .chunks_exact(src_size)
            .zip(dst_row.chunks_exact_mut(dst_size))
        {
            f(s, d)?;
        }
    }
    Ok(())
}

// Byte-ordered layouts keep R in the first byte, which is the packed word read big-endian.
fn read_pixel(channels: &mut ChannelSet, format: PixelFormat, bytes: &[u8]) -> Result<()> {
    if format.is_byte_ordered() {
        let mut word = [0u8; 4];
        let n = bytes.len().min(4);
        word[..n].copy_from_slice(&bytes[..n]);
        word[..n].reverse();
        channels.load(&word[..n])
    } else {
        channels.load(bytes)
    }
}

fn write_pixel(channels: &ChannelSet, format: PixelFormat, out: &mut [u8]) -> Result<()> {
    channels.save(out)?;
    if format.is_byte_ordered() {
        let n = channels.byte_size().min(out.len());
        out[..n].reverse();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(format: PixelFormat, width: u32, height: u32, data: Vec<u8>) -> RasterImage {
        let stride = width as usize * format.pixel_size();
        RasterImage::from_raw(data, width, height, stride, format).unwrap()
    }

    #[test]
    fn test_same_format_is_noop() {
        let src = image(PixelFormat::R5G6B5, 2, 1, vec![1, 2, 3, 4]);
        let out = convert(&src, PixelFormat::R5G6B5).unwrap();
        assert_eq!(out, src);

        let mut in_place = src.clone();
        in_place.convert(PixelFormat::R5G6B5).unwrap();
        assert_eq!(in_place, src);
    }

    #[test]
    fn test_gray_expands_to_opaque_rgba() {
        let src = image(PixelFormat::A8, 3, 1, vec![0, 128, 255]);
        let out = convert(&src, PixelFormat::R8G8B8A8).unwrap();
        assert_eq!(
            out.data(),
            &[0, 0, 0, 255, 128, 128, 128, 255, 255, 255, 255, 255]
        );
        assert_eq!(out.row_stride(), 12);
    }

    #[test]
    fn test_gray_survives_rgba_round_trip() {
        let values: Vec<u8> = (0..=255).collect();
        let src = image(PixelFormat::A8, 16, 16, values.clone());
        let rgba = convert(&src, PixelFormat::R8G8B8A8).unwrap();
        let back = convert(&rgba, PixelFormat::A8).unwrap();
        assert_eq!(back.data(), values.as_slice());
    }

    #[test]
    fn test_rgb_luminance() {
        let src = image(PixelFormat::R8G8B8, 3, 1, vec![255, 0, 0, 0, 255, 0, 0, 0, 255]);
        let out = convert(&src, PixelFormat::A8).unwrap();
        assert_eq!(out.data(), &[76, 150, 29]);
    }

    #[test]
    fn test_rgb_to_rgba_keeps_channel_order() {
        let src = image(PixelFormat::R8G8B8, 1, 1, vec![10, 20, 30]);
        let out = convert(&src, PixelFormat::R8G8B8A8).unwrap();
        assert_eq!(out.data(), &[10, 20, 30, 255]);
    }

    #[test]
    fn test_rgba_to_r5g6b5_saturates() {
        let src = image(PixelFormat::R8G8B8A8, 1, 1, vec![255, 40, 3, 255]);
        let out = convert(&src, PixelFormat::R5G6B5).unwrap();
        let word = u16::from_le_bytes([out.data()[0], out.data()[1]]);
        assert_eq!(word >> 11, 31);
        assert_eq!((word >> 5) & 0x3F, 40);
        assert_eq!(word & 0x1F, 3);
    }

    #[test]
    fn test_padded_source_rows() {
        let src = RasterImage::from_raw(vec![7, 0, 9, 0], 1, 2, 2, PixelFormat::A8).unwrap();
        let out = convert(&src, PixelFormat::R8G8B8A8).unwrap();
        assert_eq!(out.data(), &[7, 7, 7, 255, 9, 9, 9, 255]);
    }

    #[test]
    fn test_failed_convert_leaves_image_untouched() {
        let mut img = image(PixelFormat::A8, 2, 1, vec![1, 2]);
        let err = img.convert(PixelFormat::Undefined).unwrap_err();
        assert!(matches!(err, SmileError::InvalidInput(_)));
        assert_eq!(img.format(), PixelFormat::A8);
        assert_eq!(img.data(), &[1, 2]);
    }
}
