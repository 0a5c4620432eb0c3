//! Single-pixel channel model and bit packing

use crate::format::PixelFormat;
use smile_core::{Result, SmileError};

/// One pixel split into R, G, B and A values, together with the bit width of each channel.
///
/// Values are stored as 8-bit numbers but never exceed what their channel can hold.
/// A layout without alpha bits always reads as fully opaque.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelSet {
    r: u8,
    g: u8,
    b: u8,
    a: u8,
    bits: [u8; 4],
}

fn channel_max(bits: u8) -> u8 {
    if bits >= 8 {
        u8::MAX
    } else {
        ((1u16 << bits) - 1) as u8
    }
}

fn channel_mask(bits: u8) -> u64 {
    (1u64 << bits) - 1
}

impl ChannelSet {
    /// An all-zero pixel with the given R, G, B, A bit widths
    pub fn new(bits: [u8; 4]) -> Self {
        let a = if bits[3] == 0 { u8::MAX } else { 0 };
        Self {
            r: 0,
            g: 0,
            b: 0,
            a,
            bits,
        }
    }

    pub fn from_format(format: PixelFormat) -> Self {
        Self::new(format.channel_bits())
    }

    pub fn bits(&self) -> [u8; 4] {
        self.bits
    }

    pub fn total_bits(&self) -> u32 {
        self.bits.iter().map(|&b| b as u32).sum()
    }

    /// Bytes needed to hold one packed pixel
    pub fn byte_size(&self) -> usize {
        self.total_bits().div_ceil(8) as usize
    }

    pub fn is_valid(&self) -> bool {
        let total = self.total_bits();
        total > 0 && total <= 32 && self.bits.iter().all(|&b| b <= 8)
    }

    pub fn r(&self) -> u8 {
        self.r
    }

    pub fn g(&self) -> u8 {
        self.g
    }

    pub fn b(&self) -> u8 {
        self.b
    }

    pub fn a(&self) -> u8 {
        self.a
    }

    pub fn rgba(&self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Store channel values, saturating each at its channel's maximum
    pub fn set(&mut self, r: u8, g: u8, b: u8, a: u8) {
        self.r = r.min(channel_max(self.bits[0]));
        self.g = g.min(channel_max(self.bits[1]));
        self.b = b.min(channel_max(self.bits[2]));
        self.a = if self.bits[3] == 0 {
            u8::MAX
        } else {
            a.min(channel_max(self.bits[3]))
        };
    }

    fn validate(&self) -> Result<()> {
        if !self.is_valid() {
            return Err(SmileError::InvalidInput(format!(
                "unsupported channel widths {:?}",
                self.bits
            )));
        }
        Ok(())
    }

    fn packed(&self) -> u64 {
        let [_, gb, bb, ab] = self.bits.map(|b| b as u32);
        let stored = |value: u8, bits: u8| value as u64 & channel_mask(bits);
        (stored(self.r, self.bits[0]) << (gb + bb + ab))
            | (stored(self.g, self.bits[1]) << (bb + ab))
            | (stored(self.b, self.bits[2]) << ab)
            | stored(self.a, self.bits[3])
    }

    /// Pack into the first `byte_size()` bytes of `out`, little-endian, R most significant
    pub fn save(&self, out: &mut [u8]) -> Result<()> {
        self.validate()?;
        let size = self.byte_size();
        let available = out.len();
        let dst = out.get_mut(..size).ok_or_else(|| {
            SmileError::InvalidInput(format!(
                "pixel needs {} bytes, destination has {}",
                size, available
            ))
        })?;
        dst.copy_from_slice(&self.packed().to_le_bytes()[..size]);
        Ok(())
    }

    /// Unpack from the first `byte_size()` bytes of `data`
    pub fn load(&mut self, data: &[u8]) -> Result<()> {
        self.validate()?;
        let size = self.byte_size();
        let src = data.get(..size).ok_or_else(|| {
            SmileError::InvalidInput(format!(
                "pixel needs {} bytes, source has {}",
                size,
                data.len()
            ))
        })?;

        let mut raw = [0u8; 8];
        raw[..size].copy_from_slice(src);
        let packed = u64::from_le_bytes(raw);

        let [_, gb, bb, ab] = self.bits.map(|b| b as u32);
        let field = |shift: u32, bits: u8| ((packed >> shift) & channel_mask(bits)) as u8;

        self.a = if ab == 0 { u8::MAX } else { field(0, self.bits[3]) };
        self.b = field(ab, self.bits[2]);
        self.g = field(bb + ab, self.bits[1]);
        self.r = field(gb + bb + ab, self.bits[0]);
        Ok(())
    }
}
