//! The explicit command-buffer device targeted by the translation core.
//!
//! This is the one lower-level API the core produces command streams for:
//! handle-based objects, caller-managed memory blocks, recorded command
//! buffers, fences, and explicit cache barriers. The implementation executes
//! transfer, clear and blit commands synchronously against block memory and
//! keeps a per-submission trace, so every ordering and capture rule of the
//! layer above is observable.

mod exec;
mod pixel;

use crate::align_up;
use slotmap::{new_key_type, Key, KeyData, SlotMap};
use std::ops::Range;

pub use exec::{DrawTrace, Submission, TextureTrace, UniformTrace};

new_key_type! {
    /// Key for a device memory block.
    pub struct MemBlockKey;
    /// Key for an image bound to block memory.
    pub struct ImageKey;
    /// Key for a command buffer.
    pub struct CmdBufKey;
    /// Key for a submission fence.
    pub struct FenceKey;
}

/// Row pitch granularity required for buffer/image transfers.
pub const ROW_PITCH_ALIGN: usize = 64;
/// Placement granularity for images inside a memory block.
pub const IMAGE_ALIGN: usize = 512;

bitflags::bitflags! {
    /// Caches named by a [`Command::Barrier`].
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct CacheFlags: u32 {
        const IMAGE = 1 << 0;
        const DESCRIPTOR = 1 << 1;
        const CODE = 1 << 2;
    }
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct MemBlockFlags: u32 {
        const CPU_VISIBLE = 1 << 0;
        const CODE = 1 << 1;
        const IMAGE = 1 << 2;
    }
}

bitflags::bitflags! {
    /// Per-channel color write mask.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ColorWrites: u32 {
        const RED = 1 << 0;
        const GREEN = 1 << 1;
        const BLUE = 1 << 2;
        const ALPHA = 1 << 3;
    }
}

//=============================================================================
// Formats & images
//=============================================================================

/// Native texel formats. There is deliberately no 3-channel entry; the layer
/// above expands those on upload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    R8,
    Rg8,
    Rgba8,
    Rgb565,
    Rgba4,
    Rgba5551,
    Depth16,
    Depth24Stencil8,
    /// Block-compressed data copied verbatim; the device never decodes it.
    Compressed {
        block_width: u8,
        block_height: u8,
        block_bytes: u8,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageDesc {
    pub width: u32,
    pub height: u32,
    pub mip_levels: u32,
    pub layers: u32,
    pub format: Format,
}

#[derive(Clone, Debug)]
struct MipLayout {
    offset: usize,
    row_pitch: usize,
    rows: usize,
    width: u32,
    height: u32,
    slice_size: usize,
}

/// Linear placement of an image inside its memory block: mip-major, with
/// `layers` consecutive slices per mip and rows padded to [`ROW_PITCH_ALIGN`].
#[derive(Clone, Debug)]
pub struct ImageLayout {
    mips: Vec<MipLayout>,
    layers: u32,
    total_size: usize,
}

impl ImageLayout {
    pub fn new(desc: &ImageDesc) -> Self {
        let mut mips = Vec::with_capacity(desc.mip_levels as usize);
        let mut offset = 0usize;
        for level in 0..desc.mip_levels {
            let width = (desc.width >> level).max(1);
            let height = (desc.height >> level).max(1);
            let row_pitch = align_up(desc.format.row_bytes(width), ROW_PITCH_ALIGN);
            let rows = desc.format.rows(height);
            let slice_size = row_pitch * rows;
            mips.push(MipLayout {
                offset,
                row_pitch,
                rows,
                width,
                height,
                slice_size,
            });
            offset += slice_size * desc.layers as usize;
        }
        Self {
            mips,
            layers: desc.layers,
            total_size: offset,
        }
    }

    pub fn total_size(&self) -> usize {
        self.total_size
    }

    pub fn alignment(&self) -> usize {
        IMAGE_ALIGN
    }

    pub fn mip_extent(&self, level: u32) -> (u32, u32) {
        let mip = &self.mips[level as usize];
        (mip.width, mip.height)
    }

    pub fn mip_row_pitch(&self, level: u32) -> usize {
        self.mips[level as usize].row_pitch
    }

    fn slice_offset(&self, level: u32, layer: u32) -> usize {
        let mip = &self.mips[level as usize];
        debug_assert!(layer < self.layers);
        mip.offset + mip.slice_size * layer as usize
    }
}

struct ImageEntry {
    desc: ImageDesc,
    layout: ImageLayout,
    block: MemBlockKey,
    offset: usize,
}

/// A render-target or copy-target subresource.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderTarget {
    pub image: ImageKey,
    pub mip_level: u32,
    pub layer: u32,
}

//=============================================================================
// Shaders
//=============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub const COUNT: usize = 2;

    pub fn index(self) -> usize {
        match self {
            Self::Vertex => 0,
            Self::Fragment => 1,
        }
    }
}

/// A caller-held shader value referencing microcode that stays resident in a
/// code memory block. Plain data on purpose: holders copy it freely, and a
/// copy stays valid for as long as the code region does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Shader {
    pub stage: ShaderStage,
    pub block: MemBlockKey,
    pub offset: usize,
    pub size: usize,
}

//=============================================================================
// Pipeline state
//=============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StencilOp {
    Keep,
    Zero,
    Replace,
    IncrementClamp,
    DecrementClamp,
    Invert,
    IncrementWrap,
    DecrementWrap,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlendFactor {
    Zero,
    One,
    Src,
    OneMinusSrc,
    SrcAlpha,
    OneMinusSrcAlpha,
    Dst,
    OneMinusDst,
    DstAlpha,
    OneMinusDstAlpha,
    SrcAlphaSaturated,
    Constant,
    OneMinusConstant,
    ConstantAlpha,
    OneMinusConstantAlpha,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlendOp {
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CullMode {
    None,
    Front,
    Back,
    FrontAndBack,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrontFace {
    Ccw,
    Cw,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterMode {
    Nearest,
    Linear,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WrapMode {
    Repeat,
    MirrorRepeat,
    ClampToEdge,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlendComponent {
    pub src: BlendFactor,
    pub dst: BlendFactor,
    pub op: BlendOp,
}

impl Default for BlendComponent {
    fn default() -> Self {
        Self {
            src: BlendFactor::One,
            dst: BlendFactor::Zero,
            op: BlendOp::Add,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorState {
    pub blend_enabled: bool,
    pub color: BlendComponent,
    pub alpha: BlendComponent,
    pub write_mask: ColorWrites,
}

impl Default for ColorState {
    fn default() -> Self {
        Self {
            blend_enabled: false,
            color: BlendComponent::default(),
            alpha: BlendComponent::default(),
            write_mask: ColorWrites::all(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StencilFace {
    pub compare: CompareOp,
    pub reference: u32,
    pub compare_mask: u32,
    pub write_mask: u32,
    pub fail_op: StencilOp,
    pub depth_fail_op: StencilOp,
    pub pass_op: StencilOp,
}

impl Default for StencilFace {
    fn default() -> Self {
        Self {
            compare: CompareOp::Always,
            reference: 0,
            compare_mask: !0,
            write_mask: !0,
            fail_op: StencilOp::Keep,
            depth_fail_op: StencilOp::Keep,
            pass_op: StencilOp::Keep,
        }
    }
}

/// Depth and stencil state bound as one object. The device has no separate
/// depth-only or stencil-only bind; partial updates are composed by the
/// caller.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DepthStencilState {
    pub depth_test: bool,
    pub depth_write: bool,
    pub depth_compare: CompareOp,
    pub stencil_test: bool,
    pub front: StencilFace,
    pub back: StencilFace,
}

impl Default for DepthStencilState {
    fn default() -> Self {
        Self {
            depth_test: false,
            depth_write: true,
            depth_compare: CompareOp::Less,
            stencil_test: false,
            front: StencilFace::default(),
            back: StencilFace::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RasterState {
    pub cull: CullMode,
    pub front_face: FrontFace,
    pub depth_bias_constant: f32,
    pub depth_bias_slope: f32,
    pub line_width: f32,
}

impl Default for RasterState {
    fn default() -> Self {
        Self {
            cull: CullMode::None,
            front_face: FrontFace::Ccw,
            depth_bias_constant: 0.0,
            depth_bias_slope: 0.0,
            line_width: 1.0,
        }
    }
}

//=============================================================================
// Vertex input
//=============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttribType {
    I8,
    U8,
    I16,
    U16,
    F32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttribFormat {
    pub components: u8,
    pub ty: AttribType,
    pub normalized: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexAttrib {
    pub location: u32,
    pub block: MemBlockKey,
    pub offset: usize,
    pub stride: u32,
    pub format: AttribFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexType {
    U8,
    U16,
    U32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Primitive {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

//=============================================================================
// Descriptors
//=============================================================================

pub const IMAGE_DESCRIPTOR_SIZE: usize = 32;
pub const SAMPLER_DESCRIPTOR_SIZE: usize = 32;

/// Channel sources for the sampling-time swizzle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum Swizzle {
    R = 0,
    G = 1,
    B = 2,
    A = 3,
    Zero = 4,
    One = 5,
}

impl Swizzle {
    pub const IDENTITY: [Swizzle; 4] = [Swizzle::R, Swizzle::G, Swizzle::B, Swizzle::A];

    fn from_u32(raw: u32) -> Self {
        match raw {
            0 => Self::R,
            1 => Self::G,
            2 => Self::B,
            3 => Self::A,
            4 => Self::Zero,
            _ => Self::One,
        }
    }
}

/// Fixed-format image descriptor record, written by the caller into the
/// descriptor table block and interpreted by the device at sampling time.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ImageDescriptor {
    image_bits: u64,
    swizzle: [u32; 4],
    mip_count: u32,
    reserved: u32,
}

impl ImageDescriptor {
    pub fn new(image: ImageKey, swizzle: [Swizzle; 4], mip_count: u32) -> Self {
        Self {
            image_bits: image.data().as_ffi(),
            swizzle: swizzle.map(|s| s as u32),
            mip_count,
            reserved: 0,
        }
    }

    pub fn image(&self) -> ImageKey {
        ImageKey::from(KeyData::from_ffi(self.image_bits))
    }

    pub fn swizzle(&self) -> [Swizzle; 4] {
        self.swizzle.map(Swizzle::from_u32)
    }

    pub fn mip_count(&self) -> u32 {
        self.mip_count
    }
}

/// Fixed-format sampler descriptor record.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SamplerDescriptor {
    min_filter: u32,
    mag_filter: u32,
    mip_filter: u32,
    wrap_u: u32,
    wrap_v: u32,
    reserved: [u32; 3],
}

impl SamplerDescriptor {
    pub fn new(
        min_filter: FilterMode,
        mag_filter: FilterMode,
        mip_filter: Option<FilterMode>,
        wrap_u: WrapMode,
        wrap_v: WrapMode,
    ) -> Self {
        let filter = |f: FilterMode| match f {
            FilterMode::Nearest => 0,
            FilterMode::Linear => 1,
        };
        let wrap = |w: WrapMode| match w {
            WrapMode::Repeat => 0,
            WrapMode::MirrorRepeat => 1,
            WrapMode::ClampToEdge => 2,
        };
        Self {
            min_filter: filter(min_filter),
            mag_filter: filter(mag_filter),
            mip_filter: mip_filter.map_or(!0, filter),
            wrap_u: wrap(wrap_u),
            wrap_v: wrap(wrap_v),
            reserved: [0; 3],
        }
    }

    pub fn min_filter(&self) -> FilterMode {
        if self.min_filter == 0 {
            FilterMode::Nearest
        } else {
            FilterMode::Linear
        }
    }

    pub fn mag_filter(&self) -> FilterMode {
        if self.mag_filter == 0 {
            FilterMode::Nearest
        } else {
            FilterMode::Linear
        }
    }

    pub fn wrap_u(&self) -> WrapMode {
        match self.wrap_u {
            0 => WrapMode::Repeat,
            1 => WrapMode::MirrorRepeat,
            _ => WrapMode::ClampToEdge,
        }
    }

    pub fn wrap_v(&self) -> WrapMode {
        match self.wrap_v {
            0 => WrapMode::Repeat,
            1 => WrapMode::MirrorRepeat,
            _ => WrapMode::ClampToEdge,
        }
    }
}

//=============================================================================
// Commands
//=============================================================================

/// Recorded commands. Transfer, clear and blit entries take effect at submit
/// time; draws are traced with their captured state.
#[derive(Clone, Debug)]
pub enum Command {
    BindRenderTargets {
        color: Option<RenderTarget>,
        depth: Option<RenderTarget>,
    },
    SetViewport {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },
    SetScissor {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },
    BindColorState(ColorState),
    BindDepthStencilState(DepthStencilState),
    BindRasterState(RasterState),
    SetBlendColor([f32; 4]),
    ClearColor {
        value: [f32; 4],
    },
    ClearDepthStencil {
        depth: Option<f32>,
        stencil: Option<u32>,
    },
    BindShaders {
        vertex: Option<Shader>,
        fragment: Option<Shader>,
    },
    /// Embeds `data` (a range of the command buffer's plain-data stream) as
    /// the uniform payload for `slot` of `stage`.
    PushUniforms {
        stage: ShaderStage,
        slot: u32,
        data: Range<usize>,
    },
    BindDescriptorSets {
        block: MemBlockKey,
        image_offset: usize,
        image_count: u32,
        sampler_offset: usize,
        sampler_count: u32,
    },
    BindTexture {
        unit: u32,
        image_index: u32,
        sampler_index: u32,
    },
    BindVertexAttribs(Vec<VertexAttrib>),
    BindIndexBuffer {
        block: MemBlockKey,
        offset: usize,
        index_type: IndexType,
    },
    Draw {
        primitive: Primitive,
        first: u32,
        count: u32,
    },
    DrawIndexed {
        primitive: Primitive,
        count: u32,
    },
    CopyBufferToImage {
        block: MemBlockKey,
        offset: usize,
        row_pitch: usize,
        image: ImageKey,
        mip_level: u32,
        layer: u32,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    CopyImageToBuffer {
        image: ImageKey,
        mip_level: u32,
        layer: u32,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        block: MemBlockKey,
        offset: usize,
        row_pitch: usize,
    },
    BlitMip {
        image: ImageKey,
        src_level: u32,
        dst_level: u32,
        layer: u32,
        filter: FilterMode,
    },
    Barrier(CacheFlags),
}

//=============================================================================
// Device
//=============================================================================

#[derive(Debug)]
pub struct QueueError;

impl std::fmt::Display for QueueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GPU queue is in a persistent error state")
    }
}

impl std::error::Error for QueueError {}

struct Block {
    data: Vec<u8>,
    #[allow(dead_code)]
    flags: MemBlockFlags,
}

struct CmdBuf {
    commands: Vec<Command>,
    plain_data: Vec<u8>,
    /// Fence armed by the latest submit of this buffer. Recording or
    /// resetting before that fence clears is a caller bug.
    pending_fence: Option<FenceKey>,
}

struct Fence {
    signaled: bool,
}

pub struct Device {
    blocks: SlotMap<MemBlockKey, Block>,
    images: SlotMap<ImageKey, ImageEntry>,
    cmdbufs: SlotMap<CmdBufKey, CmdBuf>,
    fences: SlotMap<FenceKey, Fence>,
    submissions: Vec<Submission>,
    presented: Vec<ImageKey>,
    error_state: bool,
}

impl Default for Device {
    fn default() -> Self {
        Self::new()
    }
}

impl Device {
    pub fn new() -> Self {
        Self {
            blocks: SlotMap::with_key(),
            images: SlotMap::with_key(),
            cmdbufs: SlotMap::with_key(),
            fences: SlotMap::with_key(),
            submissions: Vec::new(),
            presented: Vec::new(),
            error_state: false,
        }
    }

    //-------------------------------------------------------------- memory

    pub fn create_memblock(&mut self, size: usize, flags: MemBlockFlags) -> MemBlockKey {
        self.blocks.insert(Block {
            data: vec![0; size],
            flags,
        })
    }

    pub fn destroy_memblock(&mut self, block: MemBlockKey) {
        self.blocks.remove(block);
    }

    pub fn block_size(&self, block: MemBlockKey) -> Option<usize> {
        self.blocks.get(block).map(|b| b.data.len())
    }

    pub fn block_data(&self, block: MemBlockKey) -> Option<&[u8]> {
        self.blocks.get(block).map(|b| b.data.as_slice())
    }

    pub fn block_data_mut(&mut self, block: MemBlockKey) -> Option<&mut [u8]> {
        self.blocks.get_mut(block).map(|b| b.data.as_mut_slice())
    }

    //-------------------------------------------------------------- images

    pub fn create_image(&mut self, desc: ImageDesc, block: MemBlockKey, offset: usize) -> ImageKey {
        let layout = ImageLayout::new(&desc);
        let block_len = self.block_size(block).unwrap_or(0);
        assert!(
            offset % IMAGE_ALIGN == 0 && offset + layout.total_size() <= block_len,
            "image placement outside its memory block"
        );
        self.images.insert(ImageEntry {
            desc,
            layout,
            block,
            offset,
        })
    }

    pub fn destroy_image(&mut self, image: ImageKey) {
        self.images.remove(image);
    }

    pub fn image_desc(&self, image: ImageKey) -> Option<&ImageDesc> {
        self.images.get(image).map(|i| &i.desc)
    }

    pub fn image_layout(&self, image: ImageKey) -> Option<&ImageLayout> {
        self.images.get(image).map(|i| &i.layout)
    }

    //-------------------------------------------------------------- shaders

    /// Initializes a caller-held shader value over microcode previously
    /// placed in a code block. Returns `None` if the range does not fit.
    pub fn init_shader(
        &self,
        stage: ShaderStage,
        block: MemBlockKey,
        offset: usize,
        size: usize,
    ) -> Option<Shader> {
        let len = self.block_size(block)?;
        if size == 0 || offset + size > len {
            return None;
        }
        Some(Shader {
            stage,
            block,
            offset,
            size,
        })
    }

    //-------------------------------------------------------------- commands

    pub fn create_cmdbuf(&mut self) -> CmdBufKey {
        self.cmdbufs.insert(CmdBuf {
            commands: Vec::new(),
            plain_data: Vec::new(),
            pending_fence: None,
        })
    }

    pub fn destroy_cmdbuf(&mut self, buf: CmdBufKey) {
        self.cmdbufs.remove(buf);
    }

    /// Reopens a command buffer for recording. The caller must have waited
    /// the fence from the previous submit first.
    pub fn reset_cmdbuf(&mut self, buf: CmdBufKey) {
        let signaled = self.pending_fence_signaled(buf);
        if let Some(entry) = self.cmdbufs.get_mut(buf) {
            debug_assert!(signaled, "command buffer reset before its fence cleared");
            entry.commands.clear();
            entry.plain_data.clear();
            entry.pending_fence = None;
        }
    }

    pub fn record(&mut self, buf: CmdBufKey, command: Command) {
        let signaled = self.pending_fence_signaled(buf);
        if let Some(entry) = self.cmdbufs.get_mut(buf) {
            debug_assert!(
                entry.pending_fence.is_none() || signaled,
                "recording into a command buffer still owned by the GPU"
            );
            entry.commands.push(command);
        }
    }

    /// Appends bytes to the buffer's plain-data stream, returning the range
    /// for use in [`Command::PushUniforms`].
    pub fn push_data(&mut self, buf: CmdBufKey, data: &[u8]) -> Range<usize> {
        match self.cmdbufs.get_mut(buf) {
            Some(entry) => {
                let start = entry.plain_data.len();
                entry.plain_data.extend_from_slice(data);
                start..start + data.len()
            }
            None => 0..0,
        }
    }

    fn pending_fence_signaled(&self, buf: CmdBufKey) -> bool {
        match self.cmdbufs.get(buf).and_then(|e| e.pending_fence) {
            Some(fence) => self.fences.get(fence).is_none_or(|f| f.signaled),
            None => true,
        }
    }

    //-------------------------------------------------------------- queue

    /// Submits a command buffer. Transfer, clear and blit commands execute
    /// against block memory; the returned fence stays pending until waited.
    pub fn submit(&mut self, buf: CmdBufKey) -> Result<FenceKey, QueueError> {
        if self.error_state {
            return Err(QueueError);
        }
        let (commands, plain_data) = match self.cmdbufs.get_mut(buf) {
            Some(entry) => (
                std::mem::take(&mut entry.commands),
                std::mem::take(&mut entry.plain_data),
            ),
            None => return Err(QueueError),
        };
        let outcome = exec::execute(&mut self.blocks, &self.images, &commands, &plain_data);
        let fence = self.fences.insert(Fence { signaled: false });
        if let Some(entry) = self.cmdbufs.get_mut(buf) {
            entry.pending_fence = Some(fence);
        }
        self.submissions.push(Submission {
            fence,
            commands,
            plain_data,
            draws: outcome.draws,
            barrier_count: outcome.barrier_count,
            barrier_flags: outcome.barrier_flags,
        });
        Ok(fence)
    }

    /// Blocks until the submission guarded by `fence` retires. Submissions
    /// retire in order, so all earlier fences clear too.
    pub fn wait_fence(&mut self, fence: FenceKey) {
        let mut found = false;
        for submission in &self.submissions {
            if let Some(entry) = self.fences.get_mut(submission.fence) {
                entry.signaled = true;
            }
            if submission.fence == fence {
                found = true;
                break;
            }
        }
        if !found {
            if let Some(entry) = self.fences.get_mut(fence) {
                entry.signaled = true;
            }
        }
    }

    pub fn fence_signaled(&self, fence: FenceKey) -> bool {
        self.fences.get(fence).is_none_or(|f| f.signaled)
    }

    pub fn wait_idle(&mut self) {
        for (_, fence) in self.fences.iter_mut() {
            fence.signaled = true;
        }
    }

    pub fn present(&mut self, image: ImageKey) -> Result<(), QueueError> {
        if self.error_state {
            return Err(QueueError);
        }
        self.presented.push(image);
        Ok(())
    }

    pub fn queue_error(&self) -> bool {
        self.error_state
    }

    /// Forces the queue into its persistent error state. Diagnostic hook;
    /// the real device enters it on its own.
    pub fn poison_queue(&mut self) {
        self.error_state = true;
    }

    //-------------------------------------------------------------- trace

    pub fn submissions(&self) -> &[Submission] {
        &self.submissions
    }

    pub fn presented(&self) -> &[ImageKey] {
        &self.presented
    }
}
