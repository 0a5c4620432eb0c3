//! Owned pixel buffers

use crate::format::PixelFormat;
use smile_core::{Result, SmileError};

/// A decoded image: `height` rows of `row_stride` bytes, bottom row first
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterImage {
    data: Vec<u8>,
    width: u32,
    height: u32,
    row_stride: usize,
    format: PixelFormat,
}

/// Reserve a zeroed buffer, reporting allocation failure instead of aborting
pub(crate) fn alloc_zeroed(len: usize) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|e| SmileError::MemError(format!("cannot allocate {} bytes: {}", len, e)))?;
    data.resize(len, 0);
    Ok(data)
}

impl RasterImage {
    /// Allocate a zero-filled image with tightly packed rows
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Result<Self> {
        if !format.is_defined() {
            return Err(SmileError::InvalidInput(
                "cannot allocate an image of undefined format".into(),
            ));
        }
        let row_stride = width as usize * format.pixel_size();
        let len = row_stride
            .checked_mul(height as usize)
            .ok_or_else(|| SmileError::MemError(format!("image {}x{} too large", width, height)))?;
        Ok(Self {
            data: alloc_zeroed(len)?,
            width,
            height,
            row_stride,
            format,
        })
    }

    /// Wrap existing bytes, checking that they cover the declared geometry
    pub fn from_raw(
        data: Vec<u8>,
        width: u32,
        height: u32,
        row_stride: usize,
        format: PixelFormat,
    ) -> Result<Self> {
        if !format.is_defined() {
            return Err(SmileError::InvalidInput("undefined pixel format".into()));
        }
        let row_bytes = width as usize * format.pixel_size();
        if row_stride < row_bytes {
            return Err(SmileError::InvalidInput(format!(
                "row stride {} is shorter than a {}-pixel {} row",
                row_stride, width, format
            )));
        }
        let needed = match height {
            0 => 0,
            h => row_stride * (h as usize - 1) + row_bytes,
        };
        if data.len() < needed {
            return Err(SmileError::InvalidInput(format!(
                "{} bytes cannot hold a {}x{} {} image",
                data.len(),
                width,
                height,
                format
            )));
        }
        Ok(Self {
            data,
            width,
            height,
            row_stride,
            format,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn row_stride(&self) -> usize {
        self.row_stride
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn pixel_size(&self) -> usize {
        self.format.pixel_size()
    }

    /// Size of the backing buffer in bytes
    pub fn total_size(&self) -> usize {
        self.data.len()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Pixel bytes of row `y` (row 0 is the bottom of the picture)
    pub fn row(&self, y: u32) -> Result<&[u8]> {
        let start = self.row_offset(y)?;
        let len = self.width as usize * self.pixel_size();
        self.data
            .get(start..start + len)
            .ok_or_else(|| SmileError::InternalError(format!("row {} outside image buffer", y)))
    }

    pub fn row_mut(&mut self, y: u32) -> Result<&mut [u8]> {
        let start = self.row_offset(y)?;
        let len = self.width as usize * self.pixel_size();
        self.data
            .get_mut(start..start + len)
            .ok_or_else(|| SmileError::InternalError(format!("row {} outside image buffer", y)))
    }

    pub fn pixel(&self, x: u32, y: u32) -> Result<&[u8]> {
        if x >= self.width {
            return Err(SmileError::InvalidInput(format!(
                "column {} outside {}-pixel row",
                x, self.width
            )));
        }
        let size = self.pixel_size();
        let row = self.row(y)?;
        let start = x as usize * size;
        Ok(&row[start..start + size])
    }

    /// Copy rows into a tightly packed buffer, dropping any stride padding
    pub fn to_tight(&self) -> Result<Vec<u8>> {
        let row_bytes = self.width as usize * self.pixel_size();
        let mut out = alloc_zeroed(row_bytes * self.height as usize)?;
        for y in 0..self.height {
            let start = y as usize * row_bytes;
            out[start..start + row_bytes].copy_from_slice(self.row(y)?);
        }
        Ok(out)
    }

    fn row_offset(&self, y: u32) -> Result<usize> {
        if y >= self.height {
            return Err(SmileError::InvalidInput(format!(
                "row {} outside {}-row image",
                y, self.height
            )));
        }
        Ok(y as usize * self.row_stride)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_tight_and_zeroed() {
        let img = RasterImage::new(3, 2, PixelFormat::R8G8B8).unwrap();
        assert_eq!(img.row_stride(), 9);
        assert_eq!(img.total_size(), 18);
        assert!(img.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_padded_rows() {
        let data = vec![1, 2, 0, 0, 3, 4, 0, 0];
        let img = RasterImage::from_raw(data, 2, 2, 4, PixelFormat::A8).unwrap();
        assert_eq!(img.row(1).unwrap(), &[3, 4]);
        assert_eq!(img.pixel(1, 0).unwrap(), &[2]);
        assert_eq!(img.to_tight().unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_from_raw_rejects_short_buffers() {
        let err = RasterImage::from_raw(vec![0; 7], 2, 1, 8, PixelFormat::R8G8B8A8).unwrap_err();
        assert!(matches!(err, SmileError::InvalidInput(_)));

        let err = RasterImage::from_raw(vec![0; 64], 4, 1, 8, PixelFormat::R8G8B8A8).unwrap_err();
        assert!(matches!(err, SmileError::InvalidInput(_)));
    }

    #[test]
    fn test_out_of_range_access() {
        let img = RasterImage::new(2, 2, PixelFormat::A8).unwrap();
        assert!(img.row(2).is_err());
        assert!(img.pixel(2, 0).is_err());
        assert!(RasterImage::new(1, 1, PixelFormat::Undefined).is_err());
    }
}
