//! Canonical pixel formats

/// A packed pixel layout with at most 32 bits per pixel
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    #[default]
    Undefined,
    R8G8B8A8,
    R8G8B8,
    R8G8B8X8,
    R4G4B4A4,
    R5G6B5,
    A8,
}

impl PixelFormat {
    pub const ALL: [PixelFormat; 6] = [
        PixelFormat::R8G8B8A8,
        PixelFormat::R8G8B8,
        PixelFormat::R8G8B8X8,
        PixelFormat::R4G4B4A4,
        PixelFormat::R5G6B5,
        PixelFormat::A8,
    ];

    /// Bit widths of the R, G, B and A channels
    pub fn channel_bits(&self) -> [u8; 4] {
        match self {
            PixelFormat::R8G8B8A8 | PixelFormat::R8G8B8X8 => [8, 8, 8, 8],
            PixelFormat::R8G8B8 => [8, 8, 8, 0],
            PixelFormat::R4G4B4A4 => [4, 4, 4, 4],
            PixelFormat::R5G6B5 => [5, 6, 5, 0],
            PixelFormat::A8 => [0, 0, 0, 8],
            PixelFormat::Undefined => [0, 0, 0, 0],
        }
    }

    pub fn bits_per_pixel(&self) -> u32 {
        self.channel_bits().iter().map(|&b| b as u32).sum()
    }

    /// Bytes occupied by one pixel
    pub fn pixel_size(&self) -> usize {
        self.bits_per_pixel().div_ceil(8) as usize
    }

    pub fn is_defined(&self) -> bool {
        *self != PixelFormat::Undefined
    }

    /// Layouts whose channels are whole bytes, stored in channel order (R first).
    ///
    /// Sub-byte layouts are instead stored as little-endian words with R in the high bits.
    pub fn is_byte_ordered(&self) -> bool {
        self.is_defined() && self.channel_bits().iter().all(|&b| b == 0 || b == 8)
    }

    /// The 8-bit RGB layouts, which share a byte order for their first three channels
    pub fn is_rgb8(&self) -> bool {
        matches!(
            self,
            PixelFormat::R8G8B8 | PixelFormat::R8G8B8A8 | PixelFormat::R8G8B8X8
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PixelFormat::Undefined => "Undefined",
            PixelFormat::R8G8B8A8 => "R8G8B8A8",
            PixelFormat::R8G8B8 => "R8G8B8",
            PixelFormat::R8G8B8X8 => "R8G8B8X8",
            PixelFormat::R4G4B4A4 => "R4G4B4A4",
            PixelFormat::R5G6B5 => "R5G6B5",
            PixelFormat::A8 => "A8",
        }
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_sizes() {
        assert_eq!(PixelFormat::R8G8B8A8.pixel_size(), 4);
        assert_eq!(PixelFormat::R8G8B8X8.pixel_size(), 4);
        assert_eq!(PixelFormat::R8G8B8.pixel_size(), 3);
        assert_eq!(PixelFormat::R4G4B4A4.pixel_size(), 2);
        assert_eq!(PixelFormat::R5G6B5.pixel_size(), 2);
        assert_eq!(PixelFormat::A8.pixel_size(), 1);
        assert_eq!(PixelFormat::Undefined.pixel_size(), 0);
    }

    #[test]
    fn test_byte_ordered_layouts() {
        assert!(PixelFormat::R8G8B8A8.is_byte_ordered());
        assert!(PixelFormat::R8G8B8.is_byte_ordered());
        assert!(PixelFormat::A8.is_byte_ordered());
        assert!(!PixelFormat::R5G6B5.is_byte_ordered());
        assert!(!PixelFormat::R4G4B4A4.is_byte_ordered());
        assert!(!PixelFormat::Undefined.is_byte_ordered());
    }

    #[test]
    fn test_all_formats_fit_in_32_bits() {
        for format in PixelFormat::ALL {
            let bits = format.bits_per_pixel();
            assert!(bits > 0 && bits <= 32, "{} has {} bits", format, bits);
        }
    }
}
