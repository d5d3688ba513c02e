//! GL-style immediate-mode rendering layered on an explicit, handle-based
//! command-buffer device.
//!
//! The [`Context`] owns every device object: four fixed memory regions carved
//! at init time, three pipelined frame slots guarded by fences, and pools of
//! buffers, textures, shaders, programs and framebuffers addressed by
//! generational handles. Calls record into the current slot's command buffer;
//! nothing reaches the queue until `end_frame`, `flush` or `finish`.
//!
//! The error policy is GL's: invalid calls are silent no-ops (logged at debug
//! level), resource exhaustion drops the operation with an error log, and a
//! dead queue turns every later submit into a no-op.

#![allow(clippy::new_without_default)]

mod arena;
mod buffer;
mod context;
mod convert;
mod draw;
mod frame;
mod framebuffer;
pub mod glenum;
mod shader;
pub mod soft;
mod state;
mod texture;
pub mod traits;

pub use context::{Context, ContextDesc, DisplayDesc, InitError, RegionDesc};
pub use shader::encode_shader_binary;

use slotmap::new_key_type;

/// Frame slots cycled by `acquire_frame`; each owns a command buffer, a client
/// data region and a display color image.
pub const FRAME_SLOT_COUNT: usize = 3;
/// Uniform binding slots per shader stage.
pub const MAX_UNIFORM_BINDINGS: usize = 16;
pub const MAX_TEXTURE_UNITS: usize = 16;
pub const MAX_VERTEX_ATTRIBS: usize = 16;

/// Placement granularity for shader microcode in the code region.
pub const CODE_ALIGN: usize = 256;
/// Placement granularity for uniform data.
pub const UNIFORM_ALIGN: usize = 256;
/// Placement granularity for vertex/index/staging data.
pub const DATA_ALIGN: usize = 64;

pub(crate) fn align_up(value: usize, align: usize) -> usize {
    debug_assert!(align.is_power_of_two());
    (value + align - 1) & !(align - 1)
}

new_key_type! {
    pub struct BufferHandle;
    pub struct TextureHandle;
    pub struct ShaderHandle;
    pub struct ProgramHandle;
    pub struct FramebufferHandle;
    pub struct RenderbufferHandle;
}

bitflags::bitflags! {
    /// Target selection for [`traits::DrawDevice::clear`].
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ClearMask: u32 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
        const STENCIL = 1 << 2;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Blend configuration in raw GL enumerant form; decoding happens when the
/// equivalent device state is recorded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlendState {
    pub enabled: bool,
    pub src_rgb: u32,
    pub dst_rgb: u32,
    pub src_alpha: u32,
    pub dst_alpha: u32,
    pub equation_rgb: u32,
    pub equation_alpha: u32,
}

impl Default for BlendState {
    fn default() -> Self {
        Self {
            enabled: false,
            src_rgb: glenum::ONE,
            dst_rgb: glenum::ZERO,
            src_alpha: glenum::ONE,
            dst_alpha: glenum::ZERO,
            equation_rgb: glenum::FUNC_ADD,
            equation_alpha: glenum::FUNC_ADD,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DepthState {
    pub test_enabled: bool,
    pub write_enabled: bool,
    pub func: u32,
}

impl Default for DepthState {
    fn default() -> Self {
        Self {
            test_enabled: false,
            write_enabled: true,
            func: glenum::LESS,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StencilFaceState {
    pub func: u32,
    pub reference: i32,
    pub compare_mask: u32,
    pub write_mask: u32,
    pub fail_op: u32,
    pub depth_fail_op: u32,
    pub pass_op: u32,
}

impl Default for StencilFaceState {
    fn default() -> Self {
        Self {
            func: glenum::ALWAYS,
            reference: 0,
            compare_mask: !0,
            write_mask: !0,
            fail_op: glenum::KEEP,
            depth_fail_op: glenum::KEEP,
            pass_op: glenum::KEEP,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StencilState {
    pub test_enabled: bool,
    pub front: StencilFaceState,
    pub back: StencilFaceState,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorMask {
    pub red: bool,
    pub green: bool,
    pub blue: bool,
    pub alpha: bool,
}

impl Default for ColorMask {
    fn default() -> Self {
        Self {
            red: true,
            green: true,
            blue: true,
            alpha: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SamplerParams {
    pub min_filter: u32,
    pub mag_filter: u32,
    pub wrap_s: u32,
    pub wrap_t: u32,
}

impl Default for SamplerParams {
    fn default() -> Self {
        Self {
            min_filter: glenum::NEAREST_MIPMAP_LINEAR,
            mag_filter: glenum::LINEAR,
            wrap_s: glenum::REPEAT,
            wrap_t: glenum::REPEAT,
        }
    }
}

/// Texture image target: the 2D plane, or one face of a cube map (0..6 in
/// +X, -X, +Y, -Y, +Z, -Z order).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TexTarget {
    TwoD,
    CubeFace(u8),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttachmentPoint {
    Color,
    Depth,
    Stencil,
}

/// Where one vertex attribute reads from.
#[derive(Clone, Copy, Debug)]
pub enum AttribSource<'a> {
    Buffer {
        buffer: BufferHandle,
        offset: usize,
    },
    /// Client-memory array, staged into the frame slot's data region when
    /// the attribute set is recorded.
    Client(&'a [u8]),
}

#[derive(Clone, Copy, Debug)]
pub struct VertexAttrib<'a> {
    pub location: u32,
    pub size: u32,
    pub ty: u32,
    pub normalized: bool,
    /// Byte stride between vertices; 0 means tightly packed.
    pub stride: u32,
    pub source: AttribSource<'a>,
}

#[derive(Clone, Copy, Debug)]
pub enum IndexSource<'a> {
    Buffer {
        buffer: BufferHandle,
        offset: usize,
    },
    Client(&'a [u8]),
}
