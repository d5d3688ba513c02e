//! Texel packing/unpacking for the formats the device can address directly.
//!
//! Compressed blocks are opaque here; only their layout dimensions are known.

use super::Format;

impl Format {
    /// Bytes per texel, or per block for compressed formats.
    pub fn texel_bytes(self) -> usize {
        match self {
            Self::R8 => 1,
            Self::Rg8 | Self::Rgb565 | Self::Rgba4 | Self::Rgba5551 | Self::Depth16 => 2,
            Self::Rgba8 | Self::Depth24Stencil8 => 4,
            Self::Compressed { block_bytes, .. } => block_bytes as usize,
        }
    }

    pub fn is_depth(self) -> bool {
        matches!(self, Self::Depth16 | Self::Depth24Stencil8)
    }

    /// Block extent in texels; `(1, 1)` for uncompressed formats.
    pub fn block_extent(self) -> (u32, u32) {
        match self {
            Self::Compressed {
                block_width,
                block_height,
                ..
            } => (block_width as u32, block_height as u32),
            _ => (1, 1),
        }
    }

    /// Tight byte length of one row of `width` texels (one row of blocks for
    /// compressed formats).
    pub fn row_bytes(self, width: u32) -> usize {
        let (bw, _) = self.block_extent();
        (width.div_ceil(bw) as usize) * self.texel_bytes()
    }

    /// Number of addressable rows for `height` texels.
    pub fn rows(self, height: u32) -> usize {
        let (_, bh) = self.block_extent();
        height.div_ceil(bh) as usize
    }

    /// Decodes one texel into normalized RGBA. Depth and compressed formats
    /// decode to transparent black.
    pub fn unpack(self, texel: &[u8]) -> [f32; 4] {
        match self {
            Self::R8 => [unorm8(texel[0]), 0.0, 0.0, 1.0],
            Self::Rg8 => [unorm8(texel[0]), unorm8(texel[1]), 0.0, 1.0],
            Self::Rgba8 => [
                unorm8(texel[0]),
                unorm8(texel[1]),
                unorm8(texel[2]),
                unorm8(texel[3]),
            ],
            Self::Rgb565 => {
                let v = u16::from_le_bytes([texel[0], texel[1]]);
                [
                    unorm(v >> 11, 31),
                    unorm((v >> 5) & 0x3F, 63),
                    unorm(v & 0x1F, 31),
                    1.0,
                ]
            }
            Self::Rgba4 => {
                let v = u16::from_le_bytes([texel[0], texel[1]]);
                [
                    unorm(v >> 12, 15),
                    unorm((v >> 8) & 0xF, 15),
                    unorm((v >> 4) & 0xF, 15),
                    unorm(v & 0xF, 15),
                ]
            }
            Self::Rgba5551 => {
                let v = u16::from_le_bytes([texel[0], texel[1]]);
                [
                    unorm(v >> 11, 31),
                    unorm((v >> 6) & 0x1F, 31),
                    unorm((v >> 1) & 0x1F, 31),
                    (v & 1) as f32,
                ]
            }
            Self::Depth16 | Self::Depth24Stencil8 | Self::Compressed { .. } => [0.0; 4],
        }
    }

    /// Encodes normalized RGBA into one texel. No-op for depth and
    /// compressed formats.
    pub fn pack(self, rgba: [f32; 4], out: &mut [u8]) {
        match self {
            Self::R8 => out[0] = to_unorm8(rgba[0]),
            Self::Rg8 => {
                out[0] = to_unorm8(rgba[0]);
                out[1] = to_unorm8(rgba[1]);
            }
            Self::Rgba8 => {
                for (dst, src) in out[..4].iter_mut().zip(rgba) {
                    *dst = to_unorm8(src);
                }
            }
            Self::Rgb565 => {
                let v = (to_unorm(rgba[0], 31) << 11)
                    | (to_unorm(rgba[1], 63) << 5)
                    | to_unorm(rgba[2], 31);
                out[..2].copy_from_slice(&v.to_le_bytes());
            }
            Self::Rgba4 => {
                let v = (to_unorm(rgba[0], 15) << 12)
                    | (to_unorm(rgba[1], 15) << 8)
                    | (to_unorm(rgba[2], 15) << 4)
                    | to_unorm(rgba[3], 15);
                out[..2].copy_from_slice(&v.to_le_bytes());
            }
            Self::Rgba5551 => {
                let v = (to_unorm(rgba[0], 31) << 11)
                    | (to_unorm(rgba[1], 31) << 6)
                    | (to_unorm(rgba[2], 31) << 1)
                    | if rgba[3] >= 0.5 { 1 } else { 0 };
                out[..2].copy_from_slice(&v.to_le_bytes());
            }
            Self::Depth16 | Self::Depth24Stencil8 | Self::Compressed { .. } => {}
        }
    }
}

fn unorm8(v: u8) -> f32 {
    v as f32 / 255.0
}

fn unorm(v: u16, max: u16) -> f32 {
    v as f32 / max as f32
}

fn to_unorm8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}

fn to_unorm(v: f32, max: u16) -> u16 {
    (v.clamp(0.0, 1.0) * max as f32 + 0.5) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgba8_pack_unpack() {
        let mut texel = [0u8; 4];
        Format::Rgba8.pack([0.2, 0.4, 0.6, 1.0], &mut texel);
        let rgba = Format::Rgba8.unpack(&texel);
        for (a, b) in rgba.iter().zip([0.2, 0.4, 0.6, 1.0]) {
            assert!((a - b).abs() < 1.0 / 255.0);
        }
    }

    #[test]
    fn block_rows_round_up() {
        let astc = Format::Compressed {
            block_width: 6,
            block_height: 5,
            block_bytes: 16,
        };
        assert_eq!(astc.row_bytes(13), 3 * 16);
        assert_eq!(astc.rows(11), 3);
    }
}
