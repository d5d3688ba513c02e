//! Context creation: memory region carving, display surface images and the
//! frame slot ring.

use crate::arena::Arena;
use crate::frame::{FrameSlot, SlotPhase};
use crate::soft::{self, MemBlockFlags, MemBlockKey};
use crate::state::StateCache;
use crate::{
    align_up, BufferHandle, FramebufferHandle, ProgramHandle, RenderbufferHandle, ShaderHandle,
    TextureHandle, CODE_ALIGN, DATA_ALIGN, FRAME_SLOT_COUNT, MAX_TEXTURE_UNITS, UNIFORM_ALIGN,
};
use slotmap::SlotMap;

//=============================================================================
// Init Error
//=============================================================================

#[derive(Debug)]
pub struct InitError(pub String);

impl std::fmt::Display for InitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for InitError {}

//=============================================================================
// Descriptors
//=============================================================================

/// Display surface configuration. One color image per frame slot plus an
/// optional shared depth-stencil image back the default framebuffer.
#[derive(Clone, Copy, Debug)]
pub struct DisplayDesc {
    pub width: u32,
    pub height: u32,
    pub depth_stencil: bool,
}

impl Default for DisplayDesc {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            depth_stencil: true,
        }
    }
}

/// Sizes of the fixed memory regions, set once at init.
#[derive(Clone, Copy, Debug)]
pub struct RegionDesc {
    /// Shader microcode. Append-only.
    pub code_size: usize,
    /// Buffer objects. Append-only.
    pub static_size: usize,
    /// Per-slot staging for client arrays, uploads and readback. Reset when
    /// the slot's fence clears.
    pub client_slot_size: usize,
    /// Uniform capture. Rebuilt from live bindings at every slot rotation.
    pub uniform_size: usize,
    /// Image storage for textures, renderbuffer-free display surfaces and
    /// mip chains. Append-only.
    pub texture_size: usize,
    pub image_descriptors: u32,
    pub sampler_descriptors: u32,
}

impl Default for RegionDesc {
    fn default() -> Self {
        Self {
            code_size: 256 << 10,
            static_size: 8 << 20,
            client_slot_size: 2 << 20,
            uniform_size: 512 << 10,
            texture_size: 32 << 20,
            image_descriptors: 1024,
            sampler_descriptors: 256,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ContextDesc {
    pub display: DisplayDesc,
    pub regions: RegionDesc,
}

//=============================================================================
// Context
//=============================================================================

pub struct Context {
    pub(crate) device: soft::Device,
    pub(crate) display: DisplayDesc,

    pub(crate) code_block: MemBlockKey,
    pub(crate) data_block: MemBlockKey,
    pub(crate) texture_block: MemBlockKey,
    pub(crate) descriptor_block: MemBlockKey,

    pub(crate) code_arena: Arena,
    pub(crate) static_arena: Arena,
    pub(crate) uniform_arena: Arena,
    pub(crate) texture_arena: Arena,

    pub(crate) image_descriptor_count: u32,
    pub(crate) sampler_descriptor_count: u32,
    pub(crate) image_descriptor_capacity: u32,
    pub(crate) sampler_descriptor_capacity: u32,
    pub(crate) sampler_table_base: usize,

    pub(crate) slots: [FrameSlot; FRAME_SLOT_COUNT],
    pub(crate) depth_image: Option<soft::ImageKey>,
    pub(crate) frame_index: u64,
    pub(crate) queue_dead: bool,

    pub(crate) buffers: SlotMap<BufferHandle, crate::buffer::BufferEntry>,
    pub(crate) textures: SlotMap<TextureHandle, crate::texture::TextureEntry>,
    pub(crate) shaders: SlotMap<ShaderHandle, crate::shader::ShaderEntry>,
    pub(crate) programs: SlotMap<ProgramHandle, crate::shader::ProgramEntry>,
    pub(crate) framebuffers: SlotMap<FramebufferHandle, crate::framebuffer::FramebufferEntry>,
    pub(crate) renderbuffers: SlotMap<RenderbufferHandle, crate::framebuffer::RenderbufferEntry>,

    pub(crate) state: StateCache,
    pub(crate) bound_program: Option<ProgramHandle>,
    pub(crate) bound_framebuffer: Option<FramebufferHandle>,
    pub(crate) texture_units: [Option<TextureHandle>; MAX_TEXTURE_UNITS],
    pub(crate) bound_attribs: Vec<soft::VertexAttrib>,
}

impl Context {
    pub fn init(desc: ContextDesc) -> Result<Self, InitError> {
        if desc.display.width == 0 || desc.display.height == 0 {
            return Err(InitError("display extent must be non-zero".to_string()));
        }
        let regions = desc.regions;
        if regions.code_size == 0
            || regions.static_size == 0
            || regions.client_slot_size == 0
            || regions.uniform_size == 0
        {
            return Err(InitError("memory regions must be non-zero".to_string()));
        }

        let mut device = soft::Device::new();

        let code_block = device.create_memblock(
            align_up(regions.code_size, CODE_ALIGN),
            MemBlockFlags::CPU_VISIBLE | MemBlockFlags::CODE,
        );

        // Data block layout: [static | client x slots | uniform], each region
        // base aligned to the uniform granularity.
        let static_base = 0usize;
        let mut cursor = align_up(regions.static_size, UNIFORM_ALIGN);
        let mut client_bases = [0usize; FRAME_SLOT_COUNT];
        for base in client_bases.iter_mut() {
            *base = cursor;
            cursor += align_up(regions.client_slot_size, UNIFORM_ALIGN);
        }
        let uniform_base = cursor;
        cursor += align_up(regions.uniform_size, UNIFORM_ALIGN);
        let data_block = device.create_memblock(cursor, MemBlockFlags::CPU_VISIBLE);

        let static_arena = Arena::new(data_block, static_base, regions.static_size, DATA_ALIGN, "static");
        let uniform_arena = Arena::new(data_block, uniform_base, regions.uniform_size, UNIFORM_ALIGN, "uniform");

        let texture_block = device.create_memblock(
            align_up(regions.texture_size, soft::IMAGE_ALIGN),
            MemBlockFlags::IMAGE,
        );
        let mut texture_arena = Arena::new(
            texture_block,
            0,
            regions.texture_size,
            soft::IMAGE_ALIGN,
            "texture",
        );

        let image_table_size = regions.image_descriptors as usize * soft::IMAGE_DESCRIPTOR_SIZE;
        let sampler_table_size = regions.sampler_descriptors as usize * soft::SAMPLER_DESCRIPTOR_SIZE;
        let descriptor_block =
            device.create_memblock(image_table_size + sampler_table_size, MemBlockFlags::CPU_VISIBLE);

        // Display surface images come out of the texture region like any
        // other image.
        let surface_desc = soft::ImageDesc {
            width: desc.display.width,
            height: desc.display.height,
            mip_levels: 1,
            layers: 1,
            format: soft::Format::Rgba8,
        };
        let mut make_surface = |device: &mut soft::Device, arena: &mut Arena, desc: soft::ImageDesc| {
            let layout = soft::ImageLayout::new(&desc);
            let offset = arena
                .allocate_aligned(layout.total_size(), layout.alignment())
                .ok_or_else(|| InitError("texture region too small for the display surface".to_string()))?;
            Ok::<_, InitError>(device.create_image(desc, texture_block, offset))
        };

        let mut slot_colors = [soft::ImageKey::default(); FRAME_SLOT_COUNT];
        for color in slot_colors.iter_mut() {
            *color = make_surface(&mut device, &mut texture_arena, surface_desc)?;
        }
        let depth_image = if desc.display.depth_stencil {
            Some(make_surface(
                &mut device,
                &mut texture_arena,
                soft::ImageDesc {
                    format: soft::Format::Depth24Stencil8,
                    ..surface_desc
                },
            )?)
        } else {
            None
        };

        let slots = std::array::from_fn(|i| FrameSlot {
            cmdbuf: device.create_cmdbuf(),
            fence: None,
            color: slot_colors[i],
            client: Arena::new(data_block, client_bases[i], regions.client_slot_size, DATA_ALIGN, "client"),
            phase: SlotPhase::Idle,
        });

        let mut context = Self {
            device,
            display: desc.display,
            code_block,
            data_block,
            texture_block,
            descriptor_block,
            code_arena: Arena::new(code_block, 0, regions.code_size, CODE_ALIGN, "code"),
            static_arena,
            uniform_arena,
            texture_arena,
            image_descriptor_count: 0,
            sampler_descriptor_count: 0,
            image_descriptor_capacity: regions.image_descriptors,
            sampler_descriptor_capacity: regions.sampler_descriptors,
            sampler_table_base: image_table_size,
            slots,
            depth_image,
            frame_index: 0,
            queue_dead: false,
            buffers: SlotMap::with_key(),
            textures: SlotMap::with_key(),
            shaders: SlotMap::with_key(),
            programs: SlotMap::with_key(),
            framebuffers: SlotMap::with_key(),
            renderbuffers: SlotMap::with_key(),
            state: StateCache::new(desc.display.width, desc.display.height),
            bound_program: None,
            bound_framebuffer: None,
            texture_units: [None; MAX_TEXTURE_UNITS],
            bound_attribs: Vec::new(),
        };
        context.begin_slot();
        log::info!(
            "context up: {}x{} display, {} frame slots",
            desc.display.width,
            desc.display.height,
            FRAME_SLOT_COUNT
        );
        Ok(context)
    }

    /// Drains the queue and releases every device object.
    pub fn shutdown(mut self) {
        self.device.wait_idle();
        for (_, entry) in self.renderbuffers.drain() {
            if let Some(image) = entry.image {
                self.device.destroy_image(image);
            }
            if let Some(block) = entry.block {
                self.device.destroy_memblock(block);
            }
        }
        for slot in &self.slots {
            self.device.destroy_cmdbuf(slot.cmdbuf);
        }
        self.device.destroy_memblock(self.code_block);
        self.device.destroy_memblock(self.data_block);
        self.device.destroy_memblock(self.texture_block);
        self.device.destroy_memblock(self.descriptor_block);
    }

    //-------------------------------------------------------------- recording

    pub(crate) fn slot_index(&self) -> usize {
        (self.frame_index % FRAME_SLOT_COUNT as u64) as usize
    }

    pub(crate) fn cur_cmdbuf(&self) -> soft::CmdBufKey {
        self.slots[self.slot_index()].cmdbuf
    }

    pub(crate) fn record(&mut self, command: soft::Command) {
        let buf = self.cur_cmdbuf();
        self.device.record(buf, command);
    }

    //-------------------------------------------------------------- descriptors

    pub(crate) fn alloc_image_descriptor(&mut self) -> Option<u32> {
        if self.image_descriptor_count == self.image_descriptor_capacity {
            log::error!("image descriptor table exhausted");
            return None;
        }
        let index = self.image_descriptor_count;
        self.image_descriptor_count += 1;
        Some(index)
    }

    pub(crate) fn alloc_sampler_descriptor(&mut self) -> Option<u32> {
        if self.sampler_descriptor_count == self.sampler_descriptor_capacity {
            log::error!("sampler descriptor table exhausted");
            return None;
        }
        let index = self.sampler_descriptor_count;
        self.sampler_descriptor_count += 1;
        Some(index)
    }

    pub(crate) fn write_image_descriptor(&mut self, index: u32, descriptor: soft::ImageDescriptor) {
        let at = index as usize * soft::IMAGE_DESCRIPTOR_SIZE;
        if let Some(data) = self.device.block_data_mut(self.descriptor_block) {
            data[at..at + soft::IMAGE_DESCRIPTOR_SIZE]
                .copy_from_slice(bytemuck::bytes_of(&descriptor));
        }
    }

    pub(crate) fn write_sampler_descriptor(&mut self, index: u32, descriptor: soft::SamplerDescriptor) {
        let at = self.sampler_table_base + index as usize * soft::SAMPLER_DESCRIPTOR_SIZE;
        if let Some(data) = self.device.block_data_mut(self.descriptor_block) {
            data[at..at + soft::SAMPLER_DESCRIPTOR_SIZE]
                .copy_from_slice(bytemuck::bytes_of(&descriptor));
        }
    }

    //-------------------------------------------------------------- inspection

    /// The software device, for observing submissions in tests and tools.
    pub fn device(&self) -> &soft::Device {
        &self.device
    }

    /// The memory block backing the static, client and uniform regions.
    pub fn data_block(&self) -> soft::MemBlockKey {
        self.data_block
    }

    /// Diagnostic hook: forces the queue into its persistent error state.
    pub fn poison_queue(&mut self) {
        self.device.poison_queue();
    }

    pub fn display_extent(&self) -> (u32, u32) {
        (self.display.width, self.display.height)
    }
}
