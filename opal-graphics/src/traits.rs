//! Capability traits implemented by [`Context`](crate::Context).
//!
//! Each impl is exposed as inherent methods as well, so callers can use the
//! context directly or stay generic over a device.

use crate::{
    AttachmentPoint, BlendState, BufferHandle, ClearMask, ColorMask, DepthState,
    FramebufferHandle, IndexSource, ProgramHandle, RenderbufferHandle, SamplerParams,
    ShaderHandle, StencilState, TexTarget, TextureHandle, VertexAttrib,
};
use crate::soft::ShaderStage;

/// Frame pipelining and queue control.
///
/// A full frame turn is `end_frame`, `present_frame`, `acquire_frame`,
/// `wait_slot_fence`, `begin_frame`. The boundary operations are separate so
/// the layer above can present independently of submission, or reopen a slot
/// without presenting at all.
pub trait FrameDevice {
    /// Closes the current slot's recording and submits its command buffer.
    fn end_frame(&mut self);
    /// Presents the color image of the slot just submitted. A no-op unless
    /// the current slot holds a submitted frame.
    fn present_frame(&mut self);
    /// Rotates to the next frame slot.
    fn acquire_frame(&mut self);
    /// Blocks until the current slot's previous frame retires, then reclaims
    /// its command buffer and client data region and rebuilds the uniform
    /// region from live bindings.
    fn wait_slot_fence(&mut self);
    /// Reopens the current slot for recording, replaying all bound state
    /// into its fresh command buffer.
    fn begin_frame(&mut self);
    /// Submits accumulated commands without presenting and reopens the slot
    /// for recording, reapplying all bound state.
    fn flush(&mut self);
    /// [`flush`](Self::flush), then blocks until the queue drains.
    fn finish(&mut self);
    /// Records an image/descriptor cache barrier.
    fn texture_barrier(&mut self);
    /// True once the queue has entered its persistent error state; all later
    /// submits are dropped.
    fn queue_error(&self) -> bool;
    fn frame_index(&self) -> u64;
}

/// Fixed-function render state. Values arrive in raw GL enumerant form and
/// are decoded when recorded.
pub trait StateDevice {
    fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32);
    fn set_scissor(&mut self, enabled: bool, x: i32, y: i32, width: u32, height: u32);
    fn set_blend(&mut self, blend: BlendState);
    fn set_blend_color(&mut self, color: [f32; 4]);
    fn set_depth(&mut self, depth: DepthState);
    fn set_stencil(&mut self, stencil: StencilState);
    fn set_cull(&mut self, enabled: bool, face: u32);
    fn set_front_face(&mut self, winding: u32);
    fn set_color_mask(&mut self, mask: ColorMask);
    fn set_depth_bias(&mut self, constant: f32, slope: f32);
    fn set_line_width(&mut self, width: f32);
}

/// Vertex/index buffer objects living in the static data region.
pub trait BufferDevice {
    fn create_buffer(&mut self) -> BufferHandle;
    fn delete_buffer(&mut self, buffer: BufferHandle);
    /// Replaces the buffer's contents. Storage is a fresh region allocation;
    /// in-flight frames keep reading the old bytes.
    fn buffer_data(&mut self, buffer: BufferHandle, data: &[u8], usage: u32);
    fn buffer_sub_data(&mut self, buffer: BufferHandle, offset: usize, data: &[u8]);
}

/// Texture objects, uploads and sampling state.
pub trait TextureDevice {
    fn create_texture(&mut self) -> TextureHandle;
    fn delete_texture(&mut self, texture: TextureHandle);
    #[allow(clippy::too_many_arguments)]
    fn texture_image_2d(
        &mut self,
        texture: TextureHandle,
        target: TexTarget,
        level: u32,
        width: u32,
        height: u32,
        format: u32,
        ty: u32,
        data: Option<&[u8]>,
    );
    #[allow(clippy::too_many_arguments)]
    fn texture_sub_image_2d(
        &mut self,
        texture: TextureHandle,
        target: TexTarget,
        level: u32,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        format: u32,
        ty: u32,
        data: &[u8],
    );
    #[allow(clippy::too_many_arguments)]
    fn compressed_texture_image_2d(
        &mut self,
        texture: TextureHandle,
        target: TexTarget,
        level: u32,
        internal_format: u32,
        width: u32,
        height: u32,
        data: &[u8],
    );
    #[allow(clippy::too_many_arguments)]
    fn compressed_texture_sub_image_2d(
        &mut self,
        texture: TextureHandle,
        target: TexTarget,
        level: u32,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        data: &[u8],
    );
    fn texture_parameters(&mut self, texture: TextureHandle, params: SamplerParams);
    fn bind_texture(&mut self, unit: u32, texture: Option<TextureHandle>);
    fn generate_mipmaps(&mut self, texture: TextureHandle);
    /// Copies a region of the bound framebuffer into a texture level through
    /// a CPU round trip: drain the queue, read the attachment back, convert,
    /// and re-upload.
    #[allow(clippy::too_many_arguments)]
    fn copy_framebuffer_to_texture(
        &mut self,
        texture: TextureHandle,
        target: TexTarget,
        level: u32,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    );
}

/// Precompiled shader binaries, program linking and uniform capture.
pub trait ShaderDevice {
    /// Parses a shader binary, places its microcode in the code region and
    /// returns a handle. `None` when the container is malformed or the code
    /// region is exhausted.
    fn load_shader_binary(&mut self, data: &[u8]) -> Option<ShaderHandle>;
    fn delete_shader(&mut self, shader: ShaderHandle);
    /// Links a vertex and a fragment shader. The program copies the shader
    /// values, so deleting either shader afterwards does not unlink it.
    fn link_program(&mut self, vertex: ShaderHandle, fragment: ShaderHandle) -> ProgramHandle;
    fn delete_program(&mut self, program: ProgramHandle);
    fn bind_program(&mut self, program: Option<ProgramHandle>);
    /// Declares a uniform binding slot of `size` bytes on a program.
    fn uniform_allocate(&mut self, program: ProgramHandle, stage: ShaderStage, slot: u32, size: usize);
    /// Writes into a declared binding. Each write captures at a fresh region
    /// offset, so draws already recorded keep the values they saw.
    fn uniform_write(
        &mut self,
        program: ProgramHandle,
        stage: ShaderStage,
        slot: u32,
        offset: usize,
        data: &[u8],
    );
}

/// Framebuffer and renderbuffer objects, plus readback.
pub trait FramebufferDevice {
    fn create_framebuffer(&mut self) -> FramebufferHandle;
    fn delete_framebuffer(&mut self, framebuffer: FramebufferHandle);
    /// `None` selects the default (display) framebuffer. Always records a
    /// cache barrier; retargets rendering only when the selection is
    /// complete.
    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferHandle>);
    fn framebuffer_texture(
        &mut self,
        attachment: AttachmentPoint,
        texture: TextureHandle,
        target: TexTarget,
        level: u32,
    );
    fn framebuffer_renderbuffer(
        &mut self,
        attachment: AttachmentPoint,
        renderbuffer: RenderbufferHandle,
    );
    fn framebuffer_complete(&self) -> bool;
    fn create_renderbuffer(&mut self) -> RenderbufferHandle;
    fn delete_renderbuffer(&mut self, renderbuffer: RenderbufferHandle);
    /// (Re)allocates renderbuffer storage in a dedicated memory block. This
    /// is the one resource whose memory is actually released on delete.
    fn renderbuffer_storage(&mut self, renderbuffer: RenderbufferHandle, internal_format: u32, width: u32, height: u32);
    /// Drains the queue and returns the region as tightly packed RGBA8,
    /// bottom row first.
    fn read_pixels(&mut self, x: u32, y: u32, width: u32, height: u32) -> Vec<u8>;
}

/// Draw call assembly.
pub trait DrawDevice {
    /// Records the active attribute set. Client-memory arrays are staged
    /// into the current slot's data region immediately.
    fn set_vertex_attribs(&mut self, attribs: &[VertexAttrib]);
    fn draw_arrays(&mut self, mode: u32, first: u32, count: u32);
    fn draw_elements(&mut self, mode: u32, count: u32, ty: u32, indices: IndexSource);
    fn clear(&mut self, mask: ClearMask, color: [f32; 4], depth: f32, stencil: u32);
}
