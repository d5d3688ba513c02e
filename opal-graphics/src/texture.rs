//! Texture objects: image storage, uploads, sampling state and the CPU
//! round trip for framebuffer-to-texture copies.
//!
//! Level 0 of a texture defines its image, allocated from the append-only
//! texture region with storage for the full mip chain. Cube maps are one
//! image with six layers; their descriptor is published only once every face
//! has been supplied, and binding an incomplete cube is a no-op.
//!
//! Upload data uses the GL convention: the first row is the bottom row and
//! sub-region coordinates have a bottom-left origin. Storage rows run
//! top-down, so uncompressed uploads are flipped while staging.

use crate::convert::{self, Expand};
use crate::soft::{self, CacheFlags, Command, Swizzle};
use crate::{Context, SamplerParams, TexTarget, TextureHandle, MAX_TEXTURE_UNITS};

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub(crate) struct FaceMask: u8 {
        const POS_X = 1 << 0;
        const NEG_X = 1 << 1;
        const POS_Y = 1 << 2;
        const NEG_Y = 1 << 3;
        const POS_Z = 1 << 4;
        const NEG_Z = 1 << 5;
    }
}

pub(crate) struct TextureEntry {
    pub width: u32,
    pub height: u32,
    pub levels: u32,
    pub format: soft::Format,
    /// Upload description for uncompressed textures.
    pub transfer: Option<convert::PixelTransfer>,
    pub compressed: Option<convert::BlockFormat>,
    pub gl_format: u32,
    pub gl_type: u32,
    pub params: SamplerParams,
    pub image: Option<soft::ImageKey>,
    pub image_index: Option<u32>,
    pub sampler_index: Option<u32>,
    pub cube: bool,
    pub faces: FaceMask,
    /// Set when the texture is (or was) a framebuffer attachment; sampling
    /// it needs an image cache barrier first.
    pub barrier_pending: bool,
    pub descriptor_ready: bool,
}

fn target_layer(target: TexTarget) -> Option<(bool, u32)> {
    match target {
        TexTarget::TwoD => Some((false, 0)),
        TexTarget::CubeFace(face) if face < 6 => Some((true, face as u32)),
        TexTarget::CubeFace(face) => {
            log::debug!("cube face {} out of range", face);
            None
        }
    }
}

#[hidden_trait::expose]
impl crate::traits::TextureDevice for Context {
    fn create_texture(&mut self) -> TextureHandle {
        let sampler_index = self.alloc_sampler_descriptor();
        let params = SamplerParams::default();
        if let Some(index) = sampler_index {
            let descriptor = sampler_descriptor(&params);
            self.write_sampler_descriptor(index, descriptor);
        }
        self.textures.insert(TextureEntry {
            width: 0,
            height: 0,
            levels: 0,
            format: soft::Format::Rgba8,
            transfer: None,
            compressed: None,
            gl_format: 0,
            gl_type: 0,
            params,
            image: None,
            image_index: None,
            sampler_index,
            cube: false,
            faces: FaceMask::empty(),
            barrier_pending: false,
            descriptor_ready: false,
        })
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        // Image storage stays behind in the append-only texture region.
        if let Some(entry) = self.textures.remove(texture) {
            if let Some(image) = entry.image {
                self.device.destroy_image(image);
            }
        }
        for unit in self.texture_units.iter_mut() {
            if *unit == Some(texture) {
                *unit = None;
            }
        }
    }

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
    ) {
        let Some((cube, layer)) = target_layer(target) else {
            return;
        };
        let Some(transfer) = convert::map_pixel_transfer(format, ty) else {
            log::warn!("unsupported pixel format 0x{:04X}/0x{:04X}", format, ty);
            return;
        };
        if !self.define_level(texture, cube, layer, level, width, height, transfer.native) {
            return;
        }
        if let Some(entry) = self.textures.get_mut(texture) {
            entry.transfer = Some(transfer);
            entry.compressed = None;
            entry.gl_format = format;
            entry.gl_type = ty;
        }
        if let Some(data) = data {
            self.upload_texels(texture, layer, level, 0, 0, width, height, transfer, data);
        }
        self.publish_descriptor(texture);
    }

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
    ) {
        let Some((cube, layer)) = target_layer(target) else {
            return;
        };
        let Some(entry) = self.textures.get(texture) else {
            return;
        };
        if entry.cube != cube || entry.image.is_none() || level >= entry.levels {
            log::debug!("texture_sub_image_2d without a defined level");
            return;
        }
        if entry.gl_format != format || entry.gl_type != ty {
            log::debug!("texture_sub_image_2d format mismatch");
            return;
        }
        let Some(transfer) = entry.transfer else {
            return;
        };
        let (lw, lh) = level_extent(entry.width, entry.height, level);
        if x as u64 + width as u64 > lw as u64 || y as u64 + height as u64 > lh as u64 {
            log::debug!("texture_sub_image_2d region out of bounds");
            return;
        }
        self.upload_texels(texture, layer, level, x, y, width, height, transfer, data);
    }

    fn compressed_texture_image_2d(
        &mut self,
        texture: TextureHandle,
        target: TexTarget,
        level: u32,
        internal_format: u32,
        width: u32,
        height: u32,
        data: &[u8],
    ) {
        let Some((cube, layer)) = target_layer(target) else {
            return;
        };
        let Some(info) = convert::compressed_format_info(internal_format) else {
            log::warn!("unsupported compressed format 0x{:04X}", internal_format);
            return;
        };
        if data.len() != info.level_bytes(width, height) {
            log::debug!(
                "compressed upload size mismatch: got {}, expected {}",
                data.len(),
                info.level_bytes(width, height)
            );
            return;
        }
        if !self.define_level(texture, cube, layer, level, width, height, info.native()) {
            return;
        }
        if let Some(entry) = self.textures.get_mut(texture) {
            entry.transfer = None;
            entry.compressed = Some(info);
            entry.gl_format = internal_format;
            entry.gl_type = 0;
        }
        self.upload_blocks(texture, layer, level, 0, 0, width, height, info, data);
        self.publish_descriptor(texture);
    }

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
    ) {
        let Some((cube, layer)) = target_layer(target) else {
            return;
        };
        let Some(entry) = self.textures.get(texture) else {
            return;
        };
        let Some(info) = entry.compressed else {
            log::debug!("compressed_texture_sub_image_2d on an uncompressed texture");
            return;
        };
        if entry.cube != cube || entry.image.is_none() || level >= entry.levels {
            return;
        }
        let (lw, lh) = level_extent(entry.width, entry.height, level);
        let (bw, bh) = (info.block_width as u32, info.block_height as u32);
        let (x1, y1) = (x as u64 + width as u64, y as u64 + height as u64);
        let aligned = x % bw == 0
            && y % bh == 0
            && (width % bw == 0 || x1 == lw as u64)
            && (height % bh == 0 || y1 == lh as u64);
        if !aligned || x1 > lw as u64 || y1 > lh as u64 {
            log::debug!("compressed sub-image region not block-aligned");
            return;
        }
        if data.len() != info.level_bytes(width, height) {
            log::debug!("compressed sub-image size mismatch");
            return;
        }
        self.upload_blocks(texture, layer, level, x, y, width, height, info, data);
    }

    fn texture_parameters(&mut self, texture: TextureHandle, params: SamplerParams) {
        let Some(entry) = self.textures.get_mut(texture) else {
            return;
        };
        entry.params = params;
        if let Some(index) = entry.sampler_index {
            let descriptor = sampler_descriptor(&params);
            self.write_sampler_descriptor(index, descriptor);
        }
    }

    fn bind_texture(&mut self, unit: u32, texture: Option<TextureHandle>) {
        if unit as usize >= MAX_TEXTURE_UNITS {
            log::debug!("texture unit {} out of range", unit);
            return;
        }
        let Some(handle) = texture else {
            self.texture_units[unit as usize] = None;
            self.record(Command::BindTexture {
                unit,
                image_index: !0,
                sampler_index: !0,
            });
            return;
        };
        let Some(entry) = self.textures.get_mut(handle) else {
            log::debug!("bind_texture on a dead handle");
            return;
        };
        if !entry.descriptor_ready {
            log::debug!("bind_texture on an incomplete texture");
            return;
        }
        let (image_index, sampler_index) = match (entry.image_index, entry.sampler_index) {
            (Some(i), Some(s)) => (i, s),
            _ => return,
        };
        let needs_barrier = entry.barrier_pending;
        entry.barrier_pending = false;
        if needs_barrier {
            self.record(Command::Barrier(CacheFlags::IMAGE | CacheFlags::DESCRIPTOR));
        }
        self.texture_units[unit as usize] = Some(handle);
        self.record(Command::BindTexture {
            unit,
            image_index,
            sampler_index,
        });
    }

    fn generate_mipmaps(&mut self, texture: TextureHandle) {
        let Some(entry) = self.textures.get(texture) else {
            return;
        };
        let Some(image) = entry.image else {
            return;
        };
        if entry.compressed.is_some() || entry.format.is_depth() {
            log::debug!("generate_mipmaps on a compressed or depth texture");
            return;
        }
        let levels = entry.levels;
        let layers = if entry.cube { 6 } else { 1 };
        for level in 1..levels {
            for layer in 0..layers {
                self.record(Command::BlitMip {
                    image,
                    src_level: level - 1,
                    dst_level: level,
                    layer,
                    filter: soft::FilterMode::Linear,
                });
            }
            // Each level reads the previous one.
            self.record(Command::Barrier(CacheFlags::IMAGE));
        }
        if let Some(entry) = self.textures.get_mut(texture) {
            entry.barrier_pending = true;
        }
    }

    fn copy_framebuffer_to_texture(
        &mut self,
        texture: TextureHandle,
        target: TexTarget,
        level: u32,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    ) {
        let Some((_, layer)) = target_layer(target) else {
            return;
        };
        let Some(source) = self.current_color_source() else {
            log::debug!("copy_framebuffer_to_texture without a color source");
            return;
        };
        let Some(entry) = self.textures.get(texture) else {
            return;
        };
        let Some(image) = entry.image else {
            log::debug!("copy_framebuffer_to_texture into an undefined texture");
            return;
        };
        if entry.compressed.is_some() || level >= entry.levels {
            return;
        }
        let dst_format = entry.format;
        let (lw, lh) = level_extent(entry.width, entry.height, level);
        if (lw, lh) != (width, height) {
            log::debug!("copy_framebuffer_to_texture extent mismatch");
            return;
        }
        let (src_w, src_h) = match self.device.image_layout(source.image) {
            Some(layout) => layout.mip_extent(source.mip_level),
            None => return,
        };
        if x as u64 + width as u64 > src_w as u64 || y as u64 + height as u64 > src_h as u64 {
            return;
        }

        // Phase 1: drain outstanding rendering to the source.
        self.finish();

        // Phase 2: read the source region back through the slot's client
        // region.
        let src_bpp = source.format.texel_bytes();
        let src_pitch = crate::align_up(width as usize * src_bpp, soft::ROW_PITCH_ALIGN);
        let Some(read_at) = self.slots[self.slot_index()]
            .client
            .allocate_aligned(src_pitch * height as usize, soft::ROW_PITCH_ALIGN)
        else {
            return;
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
            offset: read_at,
            row_pitch: src_pitch,
        });
        self.finish();

        // Convert on the CPU: repack into the destination's native format.
        // Source and destination storage both run top-down, so the row order
        // is preserved.
        let dst_bpp = dst_format.texel_bytes();
        let dst_row = width as usize * dst_bpp;
        let mut converted = vec![0u8; dst_row * height as usize];
        if let Some(block) = self.device.block_data(self.data_block) {
            for row in 0..height as usize {
                let from = read_at + row * src_pitch;
                for col in 0..width as usize {
                    let texel = &block[from + col * src_bpp..from + (col + 1) * src_bpp];
                    let rgba = source.format.unpack(texel);
                    let out = &mut converted[row * dst_row + col * dst_bpp..][..dst_bpp];
                    dst_format.pack(rgba, out);
                }
            }
        }

        // Phase 3: re-upload into the destination level.
        let Some(write_at) = self.stage_rows(&converted, dst_row, height as usize) else {
            return;
        };
        self.record(Command::CopyBufferToImage {
            block: self.data_block,
            offset: write_at.0,
            row_pitch: write_at.1,
            image,
            mip_level: level,
            layer,
            x: 0,
            y: 0,
            width,
            height,
        });
        if let Some(entry) = self.textures.get_mut(texture) {
            entry.barrier_pending = true;
        }
    }
}

fn level_extent(width: u32, height: u32, level: u32) -> (u32, u32) {
    ((width >> level).max(1), (height >> level).max(1))
}

fn sampler_descriptor(params: &SamplerParams) -> soft::SamplerDescriptor {
    let (min, mip) = convert::map_min_filter(params.min_filter);
    soft::SamplerDescriptor::new(
        min,
        convert::map_mag_filter(params.mag_filter),
        mip,
        convert::map_wrap(params.wrap_s),
        convert::map_wrap(params.wrap_t),
    )
}

impl Context {
    /// Ensures `level` of the texture exists with the given extent and
    /// format, creating the image (full mip chain) when level 0 is defined.
    /// Returns false when the call must be dropped.
    #[allow(clippy::too_many_arguments)]
    fn define_level(
        &mut self,
        texture: TextureHandle,
        cube: bool,
        layer: u32,
        level: u32,
        width: u32,
        height: u32,
        format: soft::Format,
    ) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        let Some(entry) = self.textures.get(texture) else {
            log::debug!("texture upload on a dead handle");
            return false;
        };
        if level == 0 {
            let matches = entry.image.is_some()
                && entry.cube == cube
                && entry.width == width
                && entry.height == height
                && entry.format == format;
            if !matches {
                // Cube storage comes into existence with whichever face
                // arrives first; the extent applies to all six.
                let levels = convert::mip_level_count(width, height);
                let desc = soft::ImageDesc {
                    width,
                    height,
                    mip_levels: levels,
                    layers: if cube { 6 } else { 1 },
                    format,
                };
                let layout = soft::ImageLayout::new(&desc);
                let Some(offset) = self
                    .texture_arena
                    .allocate_aligned(layout.total_size(), layout.alignment())
                else {
                    return false;
                };
                let image = self.device.create_image(desc, self.texture_block, offset);
                let image_index = match self.textures[texture].image_index {
                    Some(index) => Some(index),
                    None => self.alloc_image_descriptor(),
                };
                let entry = &mut self.textures[texture];
                if let Some(old) = entry.image.replace(image) {
                    self.device.destroy_image(old);
                }
                entry.width = width;
                entry.height = height;
                entry.levels = levels;
                entry.format = format;
                entry.cube = cube;
                entry.faces = FaceMask::empty();
                entry.image_index = image_index;
                entry.descriptor_ready = false;
            }
            let entry = &mut self.textures[texture];
            if cube {
                entry.faces |= FaceMask::from_bits_truncate(1 << layer);
            }
            true
        } else {
            let defined = entry.image.is_some()
                && entry.cube == cube
                && entry.format == format
                && level < entry.levels
                && (width, height) == level_extent(entry.width, entry.height, level);
            if !defined {
                log::debug!("mip upload without matching level 0 storage");
            }
            defined
        }
    }

    /// Publishes the image descriptor once the texture is complete: always
    /// for 2D, after all six faces for cube maps.
    fn publish_descriptor(&mut self, texture: TextureHandle) {
        let Some(entry) = self.textures.get(texture) else {
            return;
        };
        let complete = entry.image.is_some() && (!entry.cube || entry.faces == FaceMask::all());
        let (Some(image), Some(index)) = (entry.image, entry.image_index) else {
            return;
        };
        if !complete || entry.descriptor_ready {
            return;
        }
        let swizzle = entry
            .transfer
            .map(|t| t.swizzle)
            .unwrap_or(Swizzle::IDENTITY);
        let mip_count = entry.levels;
        self.write_image_descriptor(index, soft::ImageDescriptor::new(image, swizzle, mip_count));
        self.textures[texture].descriptor_ready = true;
    }

    /// Copies tightly packed rows into the slot's client region with the
    /// device row pitch, returning `(offset, pitch)`.
    fn stage_rows(&mut self, data: &[u8], row_bytes: usize, rows: usize) -> Option<(usize, usize)> {
        let pitch = crate::align_up(row_bytes, soft::ROW_PITCH_ALIGN);
        let offset = self.slots[self.slot_index()]
            .client
            .allocate_aligned(pitch * rows, soft::ROW_PITCH_ALIGN)?;
        let block = self.device.block_data_mut(self.data_block)?;
        for row in 0..rows {
            let from = row * row_bytes;
            let to = offset + row * pitch;
            block[to..to + row_bytes].copy_from_slice(&data[from..from + row_bytes]);
        }
        Some((offset, pitch))
    }

    /// [`stage_rows`](Self::stage_rows) with the row order reversed, for
    /// upload data whose first row is the bottom row.
    fn stage_rows_reversed(
        &mut self,
        data: &[u8],
        row_bytes: usize,
        rows: usize,
    ) -> Option<(usize, usize)> {
        let pitch = crate::align_up(row_bytes, soft::ROW_PITCH_ALIGN);
        let offset = self.slots[self.slot_index()]
            .client
            .allocate_aligned(pitch * rows, soft::ROW_PITCH_ALIGN)?;
        let block = self.device.block_data_mut(self.data_block)?;
        for row in 0..rows {
            let from = (rows - 1 - row) * row_bytes;
            let to = offset + row * pitch;
            block[to..to + row_bytes].copy_from_slice(&data[from..from + row_bytes]);
        }
        Some((offset, pitch))
    }

    /// Uncompressed upload: expand if needed, stage, record the copy.
    #[allow(clippy::too_many_arguments)]
    fn upload_texels(
        &mut self,
        texture: TextureHandle,
        layer: u32,
        level: u32,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        transfer: convert::PixelTransfer,
        data: &[u8],
    ) {
        let expected = transfer.source_texel_bytes * width as usize * height as usize;
        if data.len() < expected {
            log::debug!(
                "texture upload too small: got {}, expected {}",
                data.len(),
                expected
            );
            return;
        }
        let Some(entry) = self.textures.get(texture) else {
            return;
        };
        let Some(image) = entry.image else {
            return;
        };
        let (_, lh) = level_extent(entry.width, entry.height, level);
        let native_bpp = transfer.native.texel_bytes();
        let row_bytes = width as usize * native_bpp;
        let staged: std::borrow::Cow<[u8]> = match transfer.expand {
            Expand::None => std::borrow::Cow::Borrowed(&data[..expected]),
            Expand::RgbToRgba => {
                let mut out = vec![0u8; row_bytes * height as usize];
                for (src, dst) in data[..expected].chunks_exact(3).zip(out.chunks_exact_mut(4)) {
                    dst[..3].copy_from_slice(src);
                    dst[3] = 0xFF;
                }
                std::borrow::Cow::Owned(out)
            }
        };
        // Caller rows arrive bottom first; storage rows run top-down. The
        // first row of `data` lands at the bottom of the target region.
        let Some((offset, pitch)) = self.stage_rows_reversed(&staged, row_bytes, height as usize)
        else {
            return;
        };
        self.record(Command::CopyBufferToImage {
            block: self.data_block,
            offset,
            row_pitch: pitch,
            image,
            mip_level: level,
            layer,
            x,
            y: lh - y - height,
            width,
            height,
        });
        if let Some(entry) = self.textures.get_mut(texture) {
            entry.barrier_pending = true;
        }
    }

    /// Compressed upload: verbatim block rows, stage, record the copy.
    #[allow(clippy::too_many_arguments)]
    fn upload_blocks(
        &mut self,
        texture: TextureHandle,
        layer: u32,
        level: u32,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        info: convert::BlockFormat,
        data: &[u8],
    ) {
        let Some(image) = self.textures.get(texture).and_then(|e| e.image) else {
            return;
        };
        let row_bytes = width.div_ceil(info.block_width as u32) as usize * info.block_bytes as usize;
        let rows = height.div_ceil(info.block_height as u32) as usize;
        let Some((offset, pitch)) = self.stage_rows(data, row_bytes, rows) else {
            return;
        };
        self.record(Command::CopyBufferToImage {
            block: self.data_block,
            offset,
            row_pitch: pitch,
            image,
            mip_level: level,
            layer,
            x,
            y,
            width,
            height,
        });
        if let Some(entry) = self.textures.get_mut(texture) {
            entry.barrier_pending = true;
        }
    }

    /// Replays the texture unit bindings into a fresh command buffer.
    pub(crate) fn emit_texture_binds(&mut self) {
        for unit in 0..MAX_TEXTURE_UNITS as u32 {
            let Some(handle) = self.texture_units[unit as usize] else {
                continue;
            };
            let indices = self
                .textures
                .get(handle)
                .filter(|e| e.descriptor_ready)
                .and_then(|e| e.image_index.zip(e.sampler_index));
            if let Some((image_index, sampler_index)) = indices {
                self.record(Command::BindTexture {
                    unit,
                    image_index,
                    sampler_index,
                });
            }
        }
    }
}
