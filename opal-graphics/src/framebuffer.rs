//! Framebuffer and renderbuffer objects, render target resolution and pixel
//! readback.
//!
//! Switching framebuffers always records an image/descriptor cache barrier.
//! Rendering is retargeted only when the selection is complete; draws and
//! clears against an incomplete framebuffer are dropped by their own guards.
//!
//! Renderbuffers are the one resource with dedicated memory blocks, so
//! deleting one actually returns its storage.

use crate::soft::{self, CacheFlags, Command, RenderTarget};
use crate::{
    convert, AttachmentPoint, Context, FramebufferHandle, RenderbufferHandle, TexTarget,
    TextureHandle,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Attachment {
    Texture {
        texture: TextureHandle,
        layer: u32,
        level: u32,
    },
    Renderbuffer(RenderbufferHandle),
}

#[derive(Default)]
pub(crate) struct FramebufferEntry {
    pub color: Option<Attachment>,
    pub depth: Option<Attachment>,
    pub stencil: Option<Attachment>,
}

pub(crate) struct RenderbufferEntry {
    pub format: Option<soft::Format>,
    pub width: u32,
    pub height: u32,
    pub block: Option<soft::MemBlockKey>,
    pub image: Option<soft::ImageKey>,
}

/// A resolved color attachment, used for readback and the copy round trip.
#[derive(Clone, Copy)]
pub(crate) struct ColorSource {
    pub image: soft::ImageKey,
    pub mip_level: u32,
    pub layer: u32,
    pub format: soft::Format,
}

#[hidden_trait::expose]
impl crate::traits::FramebufferDevice for Context {
    fn create_framebuffer(&mut self) -> FramebufferHandle {
        self.framebuffers.insert(FramebufferEntry::default())
    }

    fn delete_framebuffer(&mut self, framebuffer: FramebufferHandle) {
        self.framebuffers.remove(framebuffer);
        if self.bound_framebuffer == Some(framebuffer) {
            self.bound_framebuffer = None;
            self.record(Command::Barrier(CacheFlags::IMAGE | CacheFlags::DESCRIPTOR));
            self.emit_render_targets();
        }
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferHandle>) {
        if let Some(handle) = framebuffer {
            if !self.framebuffers.contains_key(handle) {
                log::debug!("bind_framebuffer on a dead handle");
                return;
            }
        }
        // Anything rendered into the outgoing target set may be sampled
        // next; make those textures barrier before their first bind.
        self.mark_attachments_pending(self.bound_framebuffer);
        self.bound_framebuffer = framebuffer;
        self.record(Command::Barrier(CacheFlags::IMAGE | CacheFlags::DESCRIPTOR));
        self.emit_render_targets();
    }

    fn framebuffer_texture(
        &mut self,
        attachment: AttachmentPoint,
        texture: TextureHandle,
        target: TexTarget,
        level: u32,
    ) {
        let Some(handle) = self.bound_framebuffer else {
            log::debug!("framebuffer_texture without a bound framebuffer");
            return;
        };
        if !self.textures.contains_key(texture) {
            log::debug!("framebuffer_texture on a dead texture");
            return;
        }
        let layer = match target {
            TexTarget::TwoD => 0,
            TexTarget::CubeFace(face) if face < 6 => face as u32,
            TexTarget::CubeFace(_) => return,
        };
        let slot = Attachment::Texture {
            texture,
            layer,
            level,
        };
        if let Some(entry) = self.framebuffers.get_mut(handle) {
            match attachment {
                AttachmentPoint::Color => entry.color = Some(slot),
                AttachmentPoint::Depth => entry.depth = Some(slot),
                AttachmentPoint::Stencil => entry.stencil = Some(slot),
            }
        }
        self.emit_render_targets();
    }

    fn framebuffer_renderbuffer(
        &mut self,
        attachment: AttachmentPoint,
        renderbuffer: RenderbufferHandle,
    ) {
        let Some(handle) = self.bound_framebuffer else {
            log::debug!("framebuffer_renderbuffer without a bound framebuffer");
            return;
        };
        if !self.renderbuffers.contains_key(renderbuffer) {
            log::debug!("framebuffer_renderbuffer on a dead handle");
            return;
        }
        if let Some(entry) = self.framebuffers.get_mut(handle) {
            let slot = Attachment::Renderbuffer(renderbuffer);
            match attachment {
                AttachmentPoint::Color => entry.color = Some(slot),
                AttachmentPoint::Depth => entry.depth = Some(slot),
                AttachmentPoint::Stencil => entry.stencil = Some(slot),
            }
        }
        self.emit_render_targets();
    }

    fn framebuffer_complete(&self) -> bool {
        match self.bound_framebuffer {
            Some(handle) => self
                .framebuffers
                .get(handle)
                .is_some_and(|entry| self.entry_complete(entry)),
            None => true,
        }
    }

    fn create_renderbuffer(&mut self) -> RenderbufferHandle {
        self.renderbuffers.insert(RenderbufferEntry {
            format: None,
            width: 0,
            height: 0,
            block: None,
            image: None,
        })
    }

    fn delete_renderbuffer(&mut self, renderbuffer: RenderbufferHandle) {
        if let Some(entry) = self.renderbuffers.remove(renderbuffer) {
            if let Some(image) = entry.image {
                self.device.destroy_image(image);
            }
            if let Some(block) = entry.block {
                self.device.destroy_memblock(block);
            }
        }
    }

    fn renderbuffer_storage(
        &mut self,
        renderbuffer: RenderbufferHandle,
        internal_format: u32,
        width: u32,
        height: u32,
    ) {
        let Some(format) = convert::map_renderbuffer_format(internal_format) else {
            log::warn!("unsupported renderbuffer format 0x{:04X}", internal_format);
            return;
        };
        if width == 0 || height == 0 || !self.renderbuffers.contains_key(renderbuffer) {
            return;
        }
        let desc = soft::ImageDesc {
            width,
            height,
            mip_levels: 1,
            layers: 1,
            format,
        };
        let layout = soft::ImageLayout::new(&desc);
        let block = self
            .device
            .create_memblock(layout.total_size(), soft::MemBlockFlags::IMAGE);
        let image = self.device.create_image(desc, block, 0);
        let entry = &mut self.renderbuffers[renderbuffer];
        let old_image = entry.image.replace(image);
        let old_block = entry.block.replace(block);
        entry.format = Some(format);
        entry.width = width;
        entry.height = height;
        if let Some(old) = old_image {
            self.device.destroy_image(old);
        }
        if let Some(old) = old_block {
            self.device.destroy_memblock(old);
        }
        self.emit_render_targets();
    }

    fn read_pixels(&mut self, x: u32, y: u32, width: u32, height: u32) -> Vec<u8> {
        let Some(source) = self.current_color_source() else {
            return Vec::new();
        };
        let (src_w, src_h) = match self.device.image_layout(source.image) {
            Some(layout) => layout.mip_extent(source.mip_level),
            None => return Vec::new(),
        };
        if width == 0
            || height == 0
            || x as u64 + width as u64 > src_w as u64
            || y as u64 + height as u64 > src_h as u64
        {
            log::debug!("read_pixels region out of bounds");
            return Vec::new();
        }

        self.finish();

        let bpp = source.format.texel_bytes();
        let pitch = crate::align_up(width as usize * bpp, soft::ROW_PITCH_ALIGN);
        let Some(offset) = self.slots[self.slot_index()]
            .client
            .allocate_aligned(pitch * height as usize, soft::ROW_PITCH_ALIGN)
        else {
            return Vec::new();
        };
        self.record(Command::CopyImageToBuffer {
            image: source.image,
            mip_level: source.mip_level,
            layer: source.layer,
            x,
            // Bottom-left origin against top-down storage.
            y: src_h - y - height,
            width,
            height,
            block: self.data_block,
            offset,
            row_pitch: pitch,
        });
        self.finish();

        // Convert to tightly packed RGBA8, bottom row first.
        let mut out = vec![0u8; width as usize * height as usize * 4];
        if let Some(block) = self.device.block_data(self.data_block) {
            for row in 0..height as usize {
                let src_row = height as usize - 1 - row;
                let from = offset + src_row * pitch;
                for col in 0..width as usize {
                    let rgba = source
                        .format
                        .unpack(&block[from + col * bpp..from + (col + 1) * bpp]);
                    let to = (row * width as usize + col) * 4;
                    soft::Format::Rgba8.pack(rgba, &mut out[to..to + 4]);
                }
            }
        }
        out
    }
}

impl Context {
    fn resolve_attachment(&self, attachment: &Attachment) -> Option<(RenderTarget, soft::Format)> {
        match *attachment {
            Attachment::Texture {
                texture,
                layer,
                level,
            } => {
                let entry = self.textures.get(texture)?;
                let image = entry.image?;
                if level >= entry.levels || (layer > 0 && !entry.cube) {
                    return None;
                }
                Some((
                    RenderTarget {
                        image,
                        mip_level: level,
                        layer,
                    },
                    entry.format,
                ))
            }
            Attachment::Renderbuffer(renderbuffer) => {
                let entry = self.renderbuffers.get(renderbuffer)?;
                Some((
                    RenderTarget {
                        image: entry.image?,
                        mip_level: 0,
                        layer: 0,
                    },
                    entry.format?,
                ))
            }
        }
    }

    fn entry_complete(&self, entry: &FramebufferEntry) -> bool {
        let Some(color) = entry.color.as_ref().and_then(|a| self.resolve_attachment(a)) else {
            return false;
        };
        if color.1.is_depth() {
            return false;
        }
        let depth = match entry.depth.as_ref() {
            Some(attachment) => match self.resolve_attachment(attachment) {
                Some(resolved) if resolved.1.is_depth() => Some(resolved),
                _ => return false,
            },
            None => None,
        };
        if let Some(attachment) = entry.stencil.as_ref() {
            let Some(stencil) = self.resolve_attachment(attachment) else {
                return false;
            };
            if stencil.1 != soft::Format::Depth24Stencil8 {
                return false;
            }
            // Stencil rides the combined depth-stencil image; a separate
            // depth attachment must be the same subresource.
            if let Some(depth) = depth {
                if depth.0 != stencil.0 {
                    return false;
                }
            }
        }
        true
    }

    /// Resolves the active render targets: the bound framebuffer when it is
    /// complete, otherwise the display surface.
    pub(crate) fn current_render_targets(&self) -> (Option<RenderTarget>, Option<RenderTarget>) {
        if let Some(entry) = self.bound_framebuffer.and_then(|h| self.framebuffers.get(h)) {
            if self.entry_complete(entry) {
                let color = entry
                    .color
                    .as_ref()
                    .and_then(|a| self.resolve_attachment(a))
                    .map(|(target, _)| target);
                let depth = entry
                    .depth
                    .as_ref()
                    .or(entry.stencil.as_ref())
                    .and_then(|a| self.resolve_attachment(a))
                    .map(|(target, _)| target);
                return (color, depth);
            }
        }
        let color = Some(RenderTarget {
            image: self.slots[self.slot_index()].color,
            mip_level: 0,
            layer: 0,
        });
        let depth = self.depth_image.map(|image| RenderTarget {
            image,
            mip_level: 0,
            layer: 0,
        });
        (color, depth)
    }

    pub(crate) fn emit_render_targets(&mut self) {
        let (color, depth) = self.current_render_targets();
        self.record(Command::BindRenderTargets { color, depth });
    }

    pub(crate) fn current_color_source(&self) -> Option<ColorSource> {
        if let Some(entry) = self.bound_framebuffer.and_then(|h| self.framebuffers.get(h)) {
            if !self.entry_complete(entry) {
                return None;
            }
            let (target, format) = entry
                .color
                .as_ref()
                .and_then(|a| self.resolve_attachment(a))?;
            return Some(ColorSource {
                image: target.image,
                mip_level: target.mip_level,
                layer: target.layer,
                format,
            });
        }
        Some(ColorSource {
            image: self.slots[self.slot_index()].color,
            mip_level: 0,
            layer: 0,
            format: soft::Format::Rgba8,
        })
    }

    fn mark_attachments_pending(&mut self, framebuffer: Option<FramebufferHandle>) {
        let Some(entry) = framebuffer.and_then(|h| self.framebuffers.get(h)) else {
            return;
        };
        let attached: Vec<TextureHandle> = [&entry.color, &entry.depth, &entry.stencil]
            .into_iter()
            .filter_map(|a| match a {
                Some(Attachment::Texture { texture, .. }) => Some(*texture),
                _ => None,
            })
            .collect();
        for texture in attached {
            if let Some(entry) = self.textures.get_mut(texture) {
                entry.barrier_pending = true;
            }
        }
    }
}
