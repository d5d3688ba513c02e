//! GL enumerant values understood by the translation tables.
//!
//! The validation layer above passes these through untouched; everything
//! here is decoded in `convert` and nowhere else.

#![allow(missing_docs)]

// Primitive modes
pub const POINTS: u32 = 0x0000;
pub const LINES: u32 = 0x0001;
pub const LINE_LOOP: u32 = 0x0002;
pub const LINE_STRIP: u32 = 0x0003;
pub const TRIANGLES: u32 = 0x0004;
pub const TRIANGLE_STRIP: u32 = 0x0005;
pub const TRIANGLE_FAN: u32 = 0x0006;

// Component types
pub const BYTE: u32 = 0x1400;
pub const UNSIGNED_BYTE: u32 = 0x1401;
pub const SHORT: u32 = 0x1402;
pub const UNSIGNED_SHORT: u32 = 0x1403;
pub const INT: u32 = 0x1404;
pub const UNSIGNED_INT: u32 = 0x1405;
pub const FLOAT: u32 = 0x1406;

// Pixel formats
pub const ALPHA: u32 = 0x1906;
pub const RGB: u32 = 0x1907;
pub const RGBA: u32 = 0x1908;
pub const LUMINANCE: u32 = 0x1909;
pub const LUMINANCE_ALPHA: u32 = 0x190A;

// Packed pixel types
pub const UNSIGNED_SHORT_4_4_4_4: u32 = 0x8033;
pub const UNSIGNED_SHORT_5_5_5_1: u32 = 0x8034;
pub const UNSIGNED_SHORT_5_6_5: u32 = 0x8363;

// Compare functions
pub const NEVER: u32 = 0x0200;
pub const LESS: u32 = 0x0201;
pub const EQUAL: u32 = 0x0202;
pub const LEQUAL: u32 = 0x0203;
pub const GREATER: u32 = 0x0204;
pub const NOTEQUAL: u32 = 0x0205;
pub const GEQUAL: u32 = 0x0206;
pub const ALWAYS: u32 = 0x0207;

// Stencil operations
pub const ZERO: u32 = 0x0000;
pub const ONE: u32 = 0x0001;
pub const KEEP: u32 = 0x1E00;
pub const REPLACE: u32 = 0x1E01;
pub const INCR: u32 = 0x1E02;
pub const DECR: u32 = 0x1E03;
pub const INVERT: u32 = 0x150A;
pub const INCR_WRAP: u32 = 0x8507;
pub const DECR_WRAP: u32 = 0x8508;

// Blend factors (ZERO/ONE shared with stencil ops above)
pub const SRC_COLOR: u32 = 0x0300;
pub const ONE_MINUS_SRC_COLOR: u32 = 0x0301;
pub const SRC_ALPHA: u32 = 0x0302;
pub const ONE_MINUS_SRC_ALPHA: u32 = 0x0303;
pub const DST_ALPHA: u32 = 0x0304;
pub const ONE_MINUS_DST_ALPHA: u32 = 0x0305;
pub const DST_COLOR: u32 = 0x0306;
pub const ONE_MINUS_DST_COLOR: u32 = 0x0307;
pub const SRC_ALPHA_SATURATE: u32 = 0x0308;
pub const CONSTANT_COLOR: u32 = 0x8001;
pub const ONE_MINUS_CONSTANT_COLOR: u32 = 0x8002;
pub const CONSTANT_ALPHA: u32 = 0x8003;
pub const ONE_MINUS_CONSTANT_ALPHA: u32 = 0x8004;

// Blend equations
pub const FUNC_ADD: u32 = 0x8006;
pub const MIN: u32 = 0x8007;
pub const MAX: u32 = 0x8008;
pub const FUNC_SUBTRACT: u32 = 0x800A;
pub const FUNC_REVERSE_SUBTRACT: u32 = 0x800B;

// Filters
pub const NEAREST: u32 = 0x2600;
pub const LINEAR: u32 = 0x2601;
pub const NEAREST_MIPMAP_NEAREST: u32 = 0x2700;
pub const LINEAR_MIPMAP_NEAREST: u32 = 0x2701;
pub const NEAREST_MIPMAP_LINEAR: u32 = 0x2702;
pub const LINEAR_MIPMAP_LINEAR: u32 = 0x2703;

// Wrap modes
pub const REPEAT: u32 = 0x2901;
pub const CLAMP_TO_EDGE: u32 = 0x812F;
pub const MIRRORED_REPEAT: u32 = 0x8370;

// Face culling / winding
pub const CW: u32 = 0x0900;
pub const CCW: u32 = 0x0901;
pub const FRONT: u32 = 0x0404;
pub const BACK: u32 = 0x0405;
pub const FRONT_AND_BACK: u32 = 0x0408;

// Buffer usage hints
pub const STREAM_DRAW: u32 = 0x88E0;
pub const STATIC_DRAW: u32 = 0x88E4;
pub const DYNAMIC_DRAW: u32 = 0x88E8;

// Renderbuffer internal formats
pub const RGB565: u32 = 0x8D62;
pub const RGBA4: u32 = 0x8056;
pub const RGB5_A1: u32 = 0x8057;
pub const RGBA8: u32 = 0x8058;
pub const DEPTH_COMPONENT16: u32 = 0x81A5;
pub const DEPTH24_STENCIL8: u32 = 0x88F0;
pub const STENCIL_INDEX8: u32 = 0x8D48;

// S3TC
pub const COMPRESSED_RGB_S3TC_DXT1: u32 = 0x83F0;
pub const COMPRESSED_RGBA_S3TC_DXT1: u32 = 0x83F1;
pub const COMPRESSED_RGBA_S3TC_DXT3: u32 = 0x83F2;
pub const COMPRESSED_RGBA_S3TC_DXT5: u32 = 0x83F3;
pub const COMPRESSED_SRGB_S3TC_DXT1: u32 = 0x8C4C;
pub const COMPRESSED_SRGB_ALPHA_S3TC_DXT1: u32 = 0x8C4D;
pub const COMPRESSED_SRGB_ALPHA_S3TC_DXT3: u32 = 0x8C4E;
pub const COMPRESSED_SRGB_ALPHA_S3TC_DXT5: u32 = 0x8C4F;

// RGTC
pub const COMPRESSED_RED_RGTC1: u32 = 0x8DBB;
pub const COMPRESSED_SIGNED_RED_RGTC1: u32 = 0x8DBC;
pub const COMPRESSED_RG_RGTC2: u32 = 0x8DBD;
pub const COMPRESSED_SIGNED_RG_RGTC2: u32 = 0x8DBE;

// BPTC
pub const COMPRESSED_RGBA_BPTC_UNORM: u32 = 0x8E8C;
pub const COMPRESSED_SRGB_ALPHA_BPTC_UNORM: u32 = 0x8E8D;
pub const COMPRESSED_RGB_BPTC_SIGNED_FLOAT: u32 = 0x8E8E;
pub const COMPRESSED_RGB_BPTC_UNSIGNED_FLOAT: u32 = 0x8E8F;

// EAC
pub const COMPRESSED_R11_EAC: u32 = 0x9270;
pub const COMPRESSED_SIGNED_R11_EAC: u32 = 0x9271;
pub const COMPRESSED_RG11_EAC: u32 = 0x9272;
pub const COMPRESSED_SIGNED_RG11_EAC: u32 = 0x9273;

// ETC2
pub const COMPRESSED_RGB8_ETC2: u32 = 0x9274;
pub const COMPRESSED_SRGB8_ETC2: u32 = 0x9275;
pub const COMPRESSED_RGB8_PUNCHTHROUGH_ALPHA1_ETC2: u32 = 0x9276;
pub const COMPRESSED_SRGB8_PUNCHTHROUGH_ALPHA1_ETC2: u32 = 0x9277;
pub const COMPRESSED_RGBA8_ETC2_EAC: u32 = 0x9278;
pub const COMPRESSED_SRGB8_ALPHA8_ETC2_EAC: u32 = 0x9279;

// ASTC, the 14 LDR block shapes plus their sRGB twins
pub const COMPRESSED_RGBA_ASTC_4X4: u32 = 0x93B0;
pub const COMPRESSED_RGBA_ASTC_5X4: u32 = 0x93B1;
pub const COMPRESSED_RGBA_ASTC_5X5: u32 = 0x93B2;
pub const COMPRESSED_RGBA_ASTC_6X5: u32 = 0x93B3;
pub const COMPRESSED_RGBA_ASTC_6X6: u32 = 0x93B4;
pub const COMPRESSED_RGBA_ASTC_8X5: u32 = 0x93B5;
pub const COMPRESSED_RGBA_ASTC_8X6: u32 = 0x93B6;
pub const COMPRESSED_RGBA_ASTC_8X8: u32 = 0x93B7;
pub const COMPRESSED_RGBA_ASTC_10X5: u32 = 0x93B8;
pub const COMPRESSED_RGBA_ASTC_10X6: u32 = 0x93B9;
pub const COMPRESSED_RGBA_ASTC_10X8: u32 = 0x93BA;
pub const COMPRESSED_RGBA_ASTC_10X10: u32 = 0x93BB;
pub const COMPRESSED_RGBA_ASTC_12X10: u32 = 0x93BC;
pub const COMPRESSED_RGBA_ASTC_12X12: u32 = 0x93BD;
pub const COMPRESSED_SRGB8_ALPHA8_ASTC_4X4: u32 = 0x93D0;
pub const COMPRESSED_SRGB8_ALPHA8_ASTC_5X4: u32 = 0x93D1;
pub const COMPRESSED_SRGB8_ALPHA8_ASTC_5X5: u32 = 0x93D2;
pub const COMPRESSED_SRGB8_ALPHA8_ASTC_6X5: u32 = 0x93D3;
pub const COMPRESSED_SRGB8_ALPHA8_ASTC_6X6: u32 = 0x93D4;
pub const COMPRESSED_SRGB8_ALPHA8_ASTC_8X5: u32 = 0x93D5;
pub const COMPRESSED_SRGB8_ALPHA8_ASTC_8X6: u32 = 0x93D6;
pub const COMPRESSED_SRGB8_ALPHA8_ASTC_8X8: u32 = 0x93D7;
pub const COMPRESSED_SRGB8_ALPHA8_ASTC_10X5: u32 = 0x93D8;
pub const COMPRESSED_SRGB8_ALPHA8_ASTC_10X6: u32 = 0x93D9;
pub const COMPRESSED_SRGB8_ALPHA8_ASTC_10X8: u32 = 0x93DA;
pub const COMPRESSED_SRGB8_ALPHA8_ASTC_10X10: u32 = 0x93DB;
pub const COMPRESSED_SRGB8_ALPHA8_ASTC_12X10: u32 = 0x93DC;
pub const COMPRESSED_SRGB8_ALPHA8_ASTC_12X12: u32 = 0x93DD;
