//! GL enumerant translation tables.
//!
//! Unknown values resolve to the most compatible default (compare → always
//! pass, filter → linear, wrap → repeat) with a warning, except where the
//! caller needs a hard "unsupported" answer: pixel transfer descriptions and
//! compressed-format lookups return `None` so resource creation can be
//! skipped.

use crate::glenum as gl;
use crate::soft;

pub fn map_compare_func(func: u32) -> soft::CompareOp {
    match func {
        gl::NEVER => soft::CompareOp::Never,
        gl::LESS => soft::CompareOp::Less,
        gl::EQUAL => soft::CompareOp::Equal,
        gl::LEQUAL => soft::CompareOp::LessEqual,
        gl::GREATER => soft::CompareOp::Greater,
        gl::NOTEQUAL => soft::CompareOp::NotEqual,
        gl::GEQUAL => soft::CompareOp::GreaterEqual,
        gl::ALWAYS => soft::CompareOp::Always,
        other => {
            log::warn!("unknown compare function 0x{:04X}, using ALWAYS", other);
            soft::CompareOp::Always
        }
    }
}

pub fn map_stencil_op(op: u32) -> soft::StencilOp {
    match op {
        gl::KEEP => soft::StencilOp::Keep,
        gl::ZERO => soft::StencilOp::Zero,
        gl::REPLACE => soft::StencilOp::Replace,
        gl::INCR => soft::StencilOp::IncrementClamp,
        gl::DECR => soft::StencilOp::DecrementClamp,
        gl::INVERT => soft::StencilOp::Invert,
        gl::INCR_WRAP => soft::StencilOp::IncrementWrap,
        gl::DECR_WRAP => soft::StencilOp::DecrementWrap,
        other => {
            log::warn!("unknown stencil op 0x{:04X}, using KEEP", other);
            soft::StencilOp::Keep
        }
    }
}

pub fn map_blend_factor(factor: u32) -> soft::BlendFactor {
    match factor {
        gl::ZERO => soft::BlendFactor::Zero,
        gl::ONE => soft::BlendFactor::One,
        gl::SRC_COLOR => soft::BlendFactor::Src,
        gl::ONE_MINUS_SRC_COLOR => soft::BlendFactor::OneMinusSrc,
        gl::SRC_ALPHA => soft::BlendFactor::SrcAlpha,
        gl::ONE_MINUS_SRC_ALPHA => soft::BlendFactor::OneMinusSrcAlpha,
        gl::DST_COLOR => soft::BlendFactor::Dst,
        gl::ONE_MINUS_DST_COLOR => soft::BlendFactor::OneMinusDst,
        gl::DST_ALPHA => soft::BlendFactor::DstAlpha,
        gl::ONE_MINUS_DST_ALPHA => soft::BlendFactor::OneMinusDstAlpha,
        gl::SRC_ALPHA_SATURATE => soft::BlendFactor::SrcAlphaSaturated,
        gl::CONSTANT_COLOR => soft::BlendFactor::Constant,
        gl::ONE_MINUS_CONSTANT_COLOR => soft::BlendFactor::OneMinusConstant,
        gl::CONSTANT_ALPHA => soft::BlendFactor::ConstantAlpha,
        gl::ONE_MINUS_CONSTANT_ALPHA => soft::BlendFactor::OneMinusConstantAlpha,
        other => {
            log::warn!("unknown blend factor 0x{:04X}, using ONE", other);
            soft::BlendFactor::One
        }
    }
}

pub fn map_blend_equation(equation: u32) -> soft::BlendOp {
    match equation {
        gl::FUNC_ADD => soft::BlendOp::Add,
        gl::FUNC_SUBTRACT => soft::BlendOp::Subtract,
        gl::FUNC_REVERSE_SUBTRACT => soft::BlendOp::ReverseSubtract,
        gl::MIN => soft::BlendOp::Min,
        gl::MAX => soft::BlendOp::Max,
        other => {
            log::warn!("unknown blend equation 0x{:04X}, using ADD", other);
            soft::BlendOp::Add
        }
    }
}

pub fn map_cull(enabled: bool, face: u32) -> soft::CullMode {
    if !enabled {
        return soft::CullMode::None;
    }
    match face {
        gl::FRONT => soft::CullMode::Front,
        gl::BACK => soft::CullMode::Back,
        gl::FRONT_AND_BACK => soft::CullMode::FrontAndBack,
        other => {
            log::warn!("unknown cull face 0x{:04X}, using BACK", other);
            soft::CullMode::Back
        }
    }
}

pub fn map_front_face(winding: u32) -> soft::FrontFace {
    match winding {
        gl::CW => soft::FrontFace::Cw,
        _ => soft::FrontFace::Ccw,
    }
}

pub fn map_primitive(mode: u32) -> soft::Primitive {
    match mode {
        gl::POINTS => soft::Primitive::Points,
        gl::LINES => soft::Primitive::Lines,
        gl::LINE_LOOP => soft::Primitive::LineLoop,
        gl::LINE_STRIP => soft::Primitive::LineStrip,
        gl::TRIANGLES => soft::Primitive::Triangles,
        gl::TRIANGLE_STRIP => soft::Primitive::TriangleStrip,
        gl::TRIANGLE_FAN => soft::Primitive::TriangleFan,
        other => {
            log::warn!("unknown primitive mode 0x{:04X}, using TRIANGLES", other);
            soft::Primitive::Triangles
        }
    }
}

pub fn map_index_type(ty: u32) -> Option<(soft::IndexType, usize)> {
    match ty {
        gl::UNSIGNED_BYTE => Some((soft::IndexType::U8, 1)),
        gl::UNSIGNED_SHORT => Some((soft::IndexType::U16, 2)),
        gl::UNSIGNED_INT => Some((soft::IndexType::U32, 4)),
        _ => None,
    }
}

//=============================================================================
// Samplers
//=============================================================================

/// Decoded minification filter: base filter plus the mip filter, if any.
pub fn map_min_filter(filter: u32) -> (soft::FilterMode, Option<soft::FilterMode>) {
    match filter {
        gl::NEAREST => (soft::FilterMode::Nearest, None),
        gl::LINEAR => (soft::FilterMode::Linear, None),
        gl::NEAREST_MIPMAP_NEAREST => (soft::FilterMode::Nearest, Some(soft::FilterMode::Nearest)),
        gl::LINEAR_MIPMAP_NEAREST => (soft::FilterMode::Linear, Some(soft::FilterMode::Nearest)),
        gl::NEAREST_MIPMAP_LINEAR => (soft::FilterMode::Nearest, Some(soft::FilterMode::Linear)),
        gl::LINEAR_MIPMAP_LINEAR => (soft::FilterMode::Linear, Some(soft::FilterMode::Linear)),
        other => {
            log::warn!("unknown min filter 0x{:04X}, using LINEAR", other);
            (soft::FilterMode::Linear, None)
        }
    }
}

pub fn map_mag_filter(filter: u32) -> soft::FilterMode {
    match filter {
        gl::NEAREST => soft::FilterMode::Nearest,
        gl::LINEAR => soft::FilterMode::Linear,
        other => {
            log::warn!("unknown mag filter 0x{:04X}, using LINEAR", other);
            soft::FilterMode::Linear
        }
    }
}

pub fn map_wrap(wrap: u32) -> soft::WrapMode {
    match wrap {
        gl::REPEAT => soft::WrapMode::Repeat,
        gl::MIRRORED_REPEAT => soft::WrapMode::MirrorRepeat,
        gl::CLAMP_TO_EDGE => soft::WrapMode::ClampToEdge,
        other => {
            log::warn!("unknown wrap mode 0x{:04X}, using REPEAT", other);
            soft::WrapMode::Repeat
        }
    }
}

//=============================================================================
// Pixel transfer
//=============================================================================

/// How one source texel becomes one native texel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Expand {
    /// Source bytes copied through unchanged.
    None,
    /// 3-byte RGB widened to RGBA with alpha = 255. There is no native
    /// 3-channel format.
    RgbToRgba,
}

/// Upload description derived from a GL `(format, type)` pair.
#[derive(Clone, Copy, Debug)]
pub struct PixelTransfer {
    pub native: soft::Format,
    /// Bytes per texel in the caller's data.
    pub source_texel_bytes: usize,
    pub expand: Expand,
    /// Sampling-time channel correction; the stored data is never widened
    /// for luminance/alpha formats.
    pub swizzle: [soft::Swizzle; 4],
}

pub fn map_pixel_transfer(format: u32, ty: u32) -> Option<PixelTransfer> {
    use soft::Swizzle as Sw;
    let transfer = match (format, ty) {
        (gl::RGBA, gl::UNSIGNED_BYTE) => PixelTransfer {
            native: soft::Format::Rgba8,
            source_texel_bytes: 4,
            expand: Expand::None,
            swizzle: Sw::IDENTITY,
        },
        (gl::RGB, gl::UNSIGNED_BYTE) => PixelTransfer {
            native: soft::Format::Rgba8,
            source_texel_bytes: 3,
            expand: Expand::RgbToRgba,
            swizzle: Sw::IDENTITY,
        },
        (gl::LUMINANCE, gl::UNSIGNED_BYTE) => PixelTransfer {
            native: soft::Format::R8,
            source_texel_bytes: 1,
            expand: Expand::None,
            swizzle: [Sw::R, Sw::R, Sw::R, Sw::One],
        },
        (gl::LUMINANCE_ALPHA, gl::UNSIGNED_BYTE) => PixelTransfer {
            native: soft::Format::Rg8,
            source_texel_bytes: 2,
            expand: Expand::None,
            swizzle: [Sw::R, Sw::R, Sw::R, Sw::G],
        },
        (gl::ALPHA, gl::UNSIGNED_BYTE) => PixelTransfer {
            native: soft::Format::R8,
            source_texel_bytes: 1,
            expand: Expand::None,
            swizzle: [Sw::Zero, Sw::Zero, Sw::Zero, Sw::R],
        },
        (gl::RGB, gl::UNSIGNED_SHORT_5_6_5) => PixelTransfer {
            native: soft::Format::Rgb565,
            source_texel_bytes: 2,
            expand: Expand::None,
            swizzle: Sw::IDENTITY,
        },
        (gl::RGBA, gl::UNSIGNED_SHORT_4_4_4_4) => PixelTransfer {
            native: soft::Format::Rgba4,
            source_texel_bytes: 2,
            expand: Expand::None,
            swizzle: Sw::IDENTITY,
        },
        (gl::RGBA, gl::UNSIGNED_SHORT_5_5_5_1) => PixelTransfer {
            native: soft::Format::Rgba5551,
            source_texel_bytes: 2,
            expand: Expand::None,
            swizzle: Sw::IDENTITY,
        },
        _ => return None,
    };
    Some(transfer)
}

pub fn map_renderbuffer_format(internal: u32) -> Option<soft::Format> {
    match internal {
        gl::RGBA8 => Some(soft::Format::Rgba8),
        gl::RGBA4 => Some(soft::Format::Rgba4),
        gl::RGB5_A1 => Some(soft::Format::Rgba5551),
        gl::RGB565 => Some(soft::Format::Rgb565),
        gl::DEPTH_COMPONENT16 => Some(soft::Format::Depth16),
        gl::DEPTH24_STENCIL8 | gl::STENCIL_INDEX8 => Some(soft::Format::Depth24Stencil8),
        _ => None,
    }
}

//=============================================================================
// Vertex attributes
//=============================================================================

/// Derives the native attribute format and the per-vertex byte size from a
/// GL `(size, type, normalized)` triple.
pub fn map_attrib_format(size: u32, ty: u32, normalized: bool) -> Option<(soft::AttribFormat, usize)> {
    if size == 0 || size > 4 {
        return None;
    }
    let (native_ty, bytes) = match ty {
        gl::BYTE => (soft::AttribType::I8, 1),
        gl::UNSIGNED_BYTE => (soft::AttribType::U8, 1),
        gl::SHORT => (soft::AttribType::I16, 2),
        gl::UNSIGNED_SHORT => (soft::AttribType::U16, 2),
        gl::FLOAT => (soft::AttribType::F32, 4),
        _ => return None,
    };
    Some((
        soft::AttribFormat {
            components: size as u8,
            ty: native_ty,
            normalized,
        },
        bytes * size as usize,
    ))
}

//=============================================================================
// Compressed formats
//=============================================================================

/// Block geometry for one recognized compressed internal format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockFormat {
    pub block_width: u8,
    pub block_height: u8,
    pub block_bytes: u8,
}

impl BlockFormat {
    pub fn native(self) -> soft::Format {
        soft::Format::Compressed {
            block_width: self.block_width,
            block_height: self.block_height,
            block_bytes: self.block_bytes,
        }
    }

    /// Byte size of a full `width` x `height` level.
    pub fn level_bytes(self, width: u32, height: u32) -> usize {
        let bx = width.div_ceil(self.block_width as u32) as usize;
        let by = height.div_ceil(self.block_height as u32) as usize;
        bx * by * self.block_bytes as usize
    }
}

const fn bf(block_width: u8, block_height: u8, block_bytes: u8) -> BlockFormat {
    BlockFormat {
        block_width,
        block_height,
        block_bytes,
    }
}

/// All recognized compressed internal formats. Anything missing here is an
/// unsupported format and fails resource creation.
const COMPRESSED_FORMATS: &[(u32, BlockFormat)] = &[
    // S3TC
    (gl::COMPRESSED_RGB_S3TC_DXT1, bf(4, 4, 8)),
    (gl::COMPRESSED_RGBA_S3TC_DXT1, bf(4, 4, 8)),
    (gl::COMPRESSED_RGBA_S3TC_DXT3, bf(4, 4, 16)),
    (gl::COMPRESSED_RGBA_S3TC_DXT5, bf(4, 4, 16)),
    (gl::COMPRESSED_SRGB_S3TC_DXT1, bf(4, 4, 8)),
    (gl::COMPRESSED_SRGB_ALPHA_S3TC_DXT1, bf(4, 4, 8)),
    (gl::COMPRESSED_SRGB_ALPHA_S3TC_DXT3, bf(4, 4, 16)),
    (gl::COMPRESSED_SRGB_ALPHA_S3TC_DXT5, bf(4, 4, 16)),
    // RGTC
    (gl::COMPRESSED_RED_RGTC1, bf(4, 4, 8)),
    (gl::COMPRESSED_SIGNED_RED_RGTC1, bf(4, 4, 8)),
    (gl::COMPRESSED_RG_RGTC2, bf(4, 4, 16)),
    (gl::COMPRESSED_SIGNED_RG_RGTC2, bf(4, 4, 16)),
    // BPTC
    (gl::COMPRESSED_RGBA_BPTC_UNORM, bf(4, 4, 16)),
    (gl::COMPRESSED_SRGB_ALPHA_BPTC_UNORM, bf(4, 4, 16)),
    (gl::COMPRESSED_RGB_BPTC_SIGNED_FLOAT, bf(4, 4, 16)),
    (gl::COMPRESSED_RGB_BPTC_UNSIGNED_FLOAT, bf(4, 4, 16)),
    // EAC
    (gl::COMPRESSED_R11_EAC, bf(4, 4, 8)),
    (gl::COMPRESSED_SIGNED_R11_EAC, bf(4, 4, 8)),
    (gl::COMPRESSED_RG11_EAC, bf(4, 4, 16)),
    (gl::COMPRESSED_SIGNED_RG11_EAC, bf(4, 4, 16)),
    // ETC2
    (gl::COMPRESSED_RGB8_ETC2, bf(4, 4, 8)),
    (gl::COMPRESSED_SRGB8_ETC2, bf(4, 4, 8)),
    (gl::COMPRESSED_RGB8_PUNCHTHROUGH_ALPHA1_ETC2, bf(4, 4, 8)),
    (gl::COMPRESSED_SRGB8_PUNCHTHROUGH_ALPHA1_ETC2, bf(4, 4, 8)),
    (gl::COMPRESSED_RGBA8_ETC2_EAC, bf(4, 4, 16)),
    (gl::COMPRESSED_SRGB8_ALPHA8_ETC2_EAC, bf(4, 4, 16)),
    // ASTC LDR, 14 block shapes
    (gl::COMPRESSED_RGBA_ASTC_4X4, bf(4, 4, 16)),
    (gl::COMPRESSED_RGBA_ASTC_5X4, bf(5, 4, 16)),
    (gl::COMPRESSED_RGBA_ASTC_5X5, bf(5, 5, 16)),
    (gl::COMPRESSED_RGBA_ASTC_6X5, bf(6, 5, 16)),
    (gl::COMPRESSED_RGBA_ASTC_6X6, bf(6, 6, 16)),
    (gl::COMPRESSED_RGBA_ASTC_8X5, bf(8, 5, 16)),
    (gl::COMPRESSED_RGBA_ASTC_8X6, bf(8, 6, 16)),
    (gl::COMPRESSED_RGBA_ASTC_8X8, bf(8, 8, 16)),
    (gl::COMPRESSED_RGBA_ASTC_10X5, bf(10, 5, 16)),
    (gl::COMPRESSED_RGBA_ASTC_10X6, bf(10, 6, 16)),
    (gl::COMPRESSED_RGBA_ASTC_10X8, bf(10, 8, 16)),
    (gl::COMPRESSED_RGBA_ASTC_10X10, bf(10, 10, 16)),
    (gl::COMPRESSED_RGBA_ASTC_12X10, bf(12, 10, 16)),
    (gl::COMPRESSED_RGBA_ASTC_12X12, bf(12, 12, 16)),
    // ASTC sRGB twins
    (gl::COMPRESSED_SRGB8_ALPHA8_ASTC_4X4, bf(4, 4, 16)),
    (gl::COMPRESSED_SRGB8_ALPHA8_ASTC_5X4, bf(5, 4, 16)),
    (gl::COMPRESSED_SRGB8_ALPHA8_ASTC_5X5, bf(5, 5, 16)),
    (gl::COMPRESSED_SRGB8_ALPHA8_ASTC_6X5, bf(6, 5, 16)),
    (gl::COMPRESSED_SRGB8_ALPHA8_ASTC_6X6, bf(6, 6, 16)),
    (gl::COMPRESSED_SRGB8_ALPHA8_ASTC_8X5, bf(8, 5, 16)),
    (gl::COMPRESSED_SRGB8_ALPHA8_ASTC_8X6, bf(8, 6, 16)),
    (gl::COMPRESSED_SRGB8_ALPHA8_ASTC_8X8, bf(8, 8, 16)),
    (gl::COMPRESSED_SRGB8_ALPHA8_ASTC_10X5, bf(10, 5, 16)),
    (gl::COMPRESSED_SRGB8_ALPHA8_ASTC_10X6, bf(10, 6, 16)),
    (gl::COMPRESSED_SRGB8_ALPHA8_ASTC_10X8, bf(10, 8, 16)),
    (gl::COMPRESSED_SRGB8_ALPHA8_ASTC_10X10, bf(10, 10, 16)),
    (gl::COMPRESSED_SRGB8_ALPHA8_ASTC_12X10, bf(12, 10, 16)),
    (gl::COMPRESSED_SRGB8_ALPHA8_ASTC_12X12, bf(12, 12, 16)),
];

pub fn compressed_format_info(internal: u32) -> Option<BlockFormat> {
    COMPRESSED_FORMATS
        .iter()
        .find(|(code, _)| *code == internal)
        .map(|&(_, info)| info)
}

/// Mip chain depth for a full chain down to 1x1.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_compare_is_always_pass() {
        assert_eq!(map_compare_func(0xDEAD), soft::CompareOp::Always);
    }

    #[test]
    fn unknown_sampler_values_fall_back_to_linear_repeat() {
        assert_eq!(map_min_filter(0x1234).0, soft::FilterMode::Linear);
        assert_eq!(map_mag_filter(0x1234), soft::FilterMode::Linear);
        assert_eq!(map_wrap(0x1234), soft::WrapMode::Repeat);
    }

    #[test]
    fn compressed_table_has_no_duplicates() {
        for (i, (code, _)) in COMPRESSED_FORMATS.iter().enumerate() {
            assert!(
                !COMPRESSED_FORMATS[i + 1..].iter().any(|(c, _)| c == code),
                "duplicate compressed format 0x{:04X}",
                code
            );
        }
    }

    #[test]
    fn unknown_compressed_format_is_rejected() {
        assert!(compressed_format_info(0xBEEF).is_none());
        let astc = compressed_format_info(crate::glenum::COMPRESSED_RGBA_ASTC_12X12).unwrap();
        assert_eq!((astc.block_width, astc.block_height), (12, 12));
        assert_eq!(astc.level_bytes(25, 25), 3 * 3 * 16);
    }

    #[test]
    fn rgb_expands_to_four_channels() {
        let t = map_pixel_transfer(crate::glenum::RGB, crate::glenum::UNSIGNED_BYTE).unwrap();
        assert_eq!(t.native, soft::Format::Rgba8);
        assert_eq!(t.source_texel_bytes, 3);
        assert_eq!(t.expand, Expand::RgbToRgba);
    }

    #[test]
    fn mip_chain_depth() {
        assert_eq!(mip_level_count(1, 1), 1);
        assert_eq!(mip_level_count(256, 256), 9);
        assert_eq!(mip_level_count(640, 480), 10);
    }
}
