//! Submit-time command execution.
//!
//! Transfers, clears and blits mutate block memory directly. Draws are not
//! rasterized; each one is traced together with the state captured in the
//! command stream, which is what the synchronization and capture rules of
//! the layer above are verified against.

use super::{
    Block, CacheFlags, ColorState, ColorWrites, Command, FilterMode, ImageDescriptor, ImageEntry,
    ImageKey, MemBlockKey, Primitive, RenderTarget, SamplerDescriptor, Shader, ShaderStage,
    Swizzle, IMAGE_DESCRIPTOR_SIZE, SAMPLER_DESCRIPTOR_SIZE,
};
use slotmap::SlotMap;
use std::collections::BTreeMap;
use std::ops::Range;

/// One retired `submit` call, kept for inspection.
pub struct Submission {
    pub fence: super::FenceKey,
    pub commands: Vec<Command>,
    pub plain_data: Vec<u8>,
    pub draws: Vec<DrawTrace>,
    pub barrier_count: u32,
    pub barrier_flags: CacheFlags,
}

/// Uniform bytes as embedded in the command stream at record time.
#[derive(Clone, Debug, PartialEq)]
pub struct UniformTrace {
    pub stage: ShaderStage,
    pub slot: u32,
    pub data: Vec<u8>,
}

/// A texture binding resolved through the descriptor table at draw time.
#[derive(Clone, Debug)]
pub struct TextureTrace {
    pub unit: u32,
    pub image: ImageKey,
    pub swizzle: [Swizzle; 4],
    pub sampler: SamplerDescriptor,
}

/// State observed by one draw at execution time.
#[derive(Clone, Debug)]
pub struct DrawTrace {
    pub primitive: Primitive,
    pub vertex_count: u32,
    pub first: u32,
    pub indexed: bool,
    pub vertex_shader: Option<Shader>,
    pub fragment_shader: Option<Shader>,
    pub uniforms: Vec<UniformTrace>,
    pub textures: Vec<TextureTrace>,
}

pub(super) struct Outcome {
    pub draws: Vec<DrawTrace>,
    pub barrier_count: u32,
    pub barrier_flags: CacheFlags,
}

#[derive(Default)]
struct ExecState {
    color_target: Option<RenderTarget>,
    depth_target: Option<RenderTarget>,
    scissor: Option<(i32, i32, u32, u32)>,
    color_state: ColorState,
    shaders: [Option<Shader>; ShaderStage::COUNT],
    uniforms: BTreeMap<(usize, u32), Range<usize>>,
    descriptor_set: Option<DescriptorSet>,
    textures: BTreeMap<u32, (u32, u32)>,
}

#[derive(Clone, Copy)]
struct DescriptorSet {
    block: MemBlockKey,
    image_offset: usize,
    image_count: u32,
    sampler_offset: usize,
    sampler_count: u32,
}

pub(super) fn execute(
    blocks: &mut SlotMap<MemBlockKey, Block>,
    images: &SlotMap<ImageKey, ImageEntry>,
    commands: &[Command],
    plain_data: &[u8],
) -> Outcome {
    let mut state = ExecState::default();
    let mut outcome = Outcome {
        draws: Vec::new(),
        barrier_count: 0,
        barrier_flags: CacheFlags::empty(),
    };

    for command in commands {
        match *command {
            Command::BindRenderTargets { color, depth } => {
                state.color_target = color;
                state.depth_target = depth;
            }
            Command::SetViewport { .. } => {}
            Command::SetScissor {
                x,
                y,
                width,
                height,
            } => {
                state.scissor = Some((x, y, width, height));
            }
            Command::BindColorState(color_state) => state.color_state = color_state,
            Command::BindDepthStencilState(_)
            | Command::BindRasterState(_)
            | Command::SetBlendColor(_) => {}
            Command::ClearColor { value } => {
                clear_color(blocks, images, &state, value);
            }
            Command::ClearDepthStencil { depth, stencil } => {
                clear_depth_stencil(blocks, images, &state, depth, stencil);
            }
            Command::BindShaders { vertex, fragment } => {
                state.shaders[ShaderStage::Vertex.index()] = vertex;
                state.shaders[ShaderStage::Fragment.index()] = fragment;
            }
            Command::PushUniforms {
                stage,
                slot,
                ref data,
            } => {
                state.uniforms.insert((stage.index(), slot), data.clone());
            }
            Command::BindDescriptorSets {
                block,
                image_offset,
                image_count,
                sampler_offset,
                sampler_count,
            } => {
                state.descriptor_set = Some(DescriptorSet {
                    block,
                    image_offset,
                    image_count,
                    sampler_offset,
                    sampler_count,
                });
            }
            Command::BindTexture {
                unit,
                image_index,
                sampler_index,
            } => {
                state.textures.insert(unit, (image_index, sampler_index));
            }
            Command::BindVertexAttribs(_) | Command::BindIndexBuffer { .. } => {}
            Command::Draw {
                primitive,
                first,
                count,
            } => {
                outcome
                    .draws
                    .push(trace_draw(blocks, &state, plain_data, primitive, first, count, false));
            }
            Command::DrawIndexed { primitive, count } => {
                outcome
                    .draws
                    .push(trace_draw(blocks, &state, plain_data, primitive, 0, count, true));
            }
            Command::CopyBufferToImage {
                block,
                offset,
                row_pitch,
                image,
                mip_level,
                layer,
                x,
                y,
                width,
                height,
            } => {
                copy_buffer_to_image(
                    blocks, images, block, offset, row_pitch, image, mip_level, layer, x, y,
                    width, height,
                );
            }
            Command::CopyImageToBuffer {
                image,
                mip_level,
                layer,
                x,
                y,
                width,
                height,
                block,
                offset,
                row_pitch,
            } => {
                copy_image_to_buffer(
                    blocks, images, image, mip_level, layer, x, y, width, height, block, offset,
                    row_pitch,
                );
            }
            Command::BlitMip {
                image,
                src_level,
                dst_level,
                layer,
                filter,
            } => {
                blit_mip(blocks, images, image, src_level, dst_level, layer, filter);
            }
            Command::Barrier(flags) => {
                outcome.barrier_count += 1;
                outcome.barrier_flags |= flags;
            }
        }
    }
    outcome
}

//=============================================================================
// Draw tracing
//=============================================================================

fn trace_draw(
    blocks: &SlotMap<MemBlockKey, Block>,
    state: &ExecState,
    plain_data: &[u8],
    primitive: Primitive,
    first: u32,
    count: u32,
    indexed: bool,
) -> DrawTrace {
    let uniforms = state
        .uniforms
        .iter()
        .map(|(&(stage, slot), range)| UniformTrace {
            stage: if stage == 0 {
                ShaderStage::Vertex
            } else {
                ShaderStage::Fragment
            },
            slot,
            data: plain_data[range.clone()].to_vec(),
        })
        .collect();

    let mut textures = Vec::new();
    if let Some(set) = state.descriptor_set {
        if let Some(data) = blocks.get(set.block).map(|b| b.data.as_slice()) {
            for (&unit, &(image_index, sampler_index)) in &state.textures {
                if image_index >= set.image_count || sampler_index >= set.sampler_count {
                    continue;
                }
                let img_at = set.image_offset + image_index as usize * IMAGE_DESCRIPTOR_SIZE;
                let smp_at = set.sampler_offset + sampler_index as usize * SAMPLER_DESCRIPTOR_SIZE;
                let image_desc: ImageDescriptor =
                    bytemuck::pod_read_unaligned(&data[img_at..img_at + IMAGE_DESCRIPTOR_SIZE]);
                let sampler: SamplerDescriptor =
                    bytemuck::pod_read_unaligned(&data[smp_at..smp_at + SAMPLER_DESCRIPTOR_SIZE]);
                textures.push(TextureTrace {
                    unit,
                    image: image_desc.image(),
                    swizzle: image_desc.swizzle(),
                    sampler,
                });
            }
        }
    }

    DrawTrace {
        primitive,
        vertex_count: count,
        first,
        indexed,
        vertex_shader: state.shaders[ShaderStage::Vertex.index()],
        fragment_shader: state.shaders[ShaderStage::Fragment.index()],
        uniforms,
        textures,
    }
}

//=============================================================================
// Clears
//=============================================================================

/// Clips to the scissor rect. The scissor origin is the bottom-left corner
/// while rows are stored top-down, so the y range flips against the target
/// height.
fn clip_rect(
    scissor: Option<(i32, i32, u32, u32)>,
    width: u32,
    height: u32,
) -> (u32, u32, u32, u32) {
    match scissor {
        Some((sx, sy, sw, sh)) => {
            let x0 = sx.max(0) as u32;
            let x1 = (sx.saturating_add(sw as i32)).max(0) as u32;
            let wy0 = sy.max(0) as u32;
            let wy1 = (sy.saturating_add(sh as i32)).max(0) as u32;
            let y0 = height.saturating_sub(wy1.min(height));
            let y1 = height.saturating_sub(wy0.min(height));
            (x0.min(width), y0, x1.min(width), y1)
        }
        None => (0, 0, width, height),
    }
}

fn clear_color(
    blocks: &mut SlotMap<MemBlockKey, Block>,
    images: &SlotMap<ImageKey, ImageEntry>,
    state: &ExecState,
    value: [f32; 4],
) {
    let Some(target) = state.color_target else {
        return;
    };
    let Some(entry) = images.get(target.image) else {
        return;
    };
    let format = entry.desc.format;
    let (width, height) = entry.layout.mip_extent(target.mip_level);
    let (x0, y0, x1, y1) = clip_rect(state.scissor, width, height);
    let pitch = entry.layout.mip_row_pitch(target.mip_level);
    let base = entry.offset + entry.layout.slice_offset(target.mip_level, target.layer);
    let bpp = format.texel_bytes();
    let mask = state.color_state.write_mask;

    let Some(data) = blocks.get_mut(entry.block).map(|b| b.data.as_mut_slice()) else {
        return;
    };
    for y in y0..y1 {
        for x in x0..x1 {
            let at = base + y as usize * pitch + x as usize * bpp;
            let texel = &mut data[at..at + bpp];
            if mask == ColorWrites::all() {
                format.pack(value, texel);
            } else {
                let mut merged = format.unpack(texel);
                if mask.contains(ColorWrites::RED) {
                    merged[0] = value[0];
                }
                if mask.contains(ColorWrites::GREEN) {
                    merged[1] = value[1];
                }
                if mask.contains(ColorWrites::BLUE) {
                    merged[2] = value[2];
                }
                if mask.contains(ColorWrites::ALPHA) {
                    merged[3] = value[3];
                }
                format.pack(merged, texel);
            }
        }
    }
}

fn clear_depth_stencil(
    blocks: &mut SlotMap<MemBlockKey, Block>,
    images: &SlotMap<ImageKey, ImageEntry>,
    state: &ExecState,
    depth: Option<f32>,
    stencil: Option<u32>,
) {
    let Some(target) = state.depth_target else {
        return;
    };
    let Some(entry) = images.get(target.image) else {
        return;
    };
    let format = entry.desc.format;
    let (width, height) = entry.layout.mip_extent(target.mip_level);
    let (x0, y0, x1, y1) = clip_rect(state.scissor, width, height);
    let pitch = entry.layout.mip_row_pitch(target.mip_level);
    let base = entry.offset + entry.layout.slice_offset(target.mip_level, target.layer);

    let Some(data) = blocks.get_mut(entry.block).map(|b| b.data.as_mut_slice()) else {
        return;
    };
    for y in y0..y1 {
        for x in x0..x1 {
            match format {
                super::Format::Depth16 => {
                    if let Some(d) = depth {
                        let at = base + y as usize * pitch + x as usize * 2;
                        let v = (d.clamp(0.0, 1.0) * f32::from(u16::MAX)) as u16;
                        data[at..at + 2].copy_from_slice(&v.to_le_bytes());
                    }
                }
                super::Format::Depth24Stencil8 => {
                    let at = base + y as usize * pitch + x as usize * 4;
                    let mut bits = u32::from_le_bytes(data[at..at + 4].try_into().unwrap());
                    if let Some(d) = depth {
                        let v = (d.clamp(0.0, 1.0) * 0x00FF_FFFF as f32) as u32;
                        bits = (bits & 0xFF) | (v << 8);
                    }
                    if let Some(s) = stencil {
                        bits = (bits & !0xFF) | (s & 0xFF);
                    }
                    data[at..at + 4].copy_from_slice(&bits.to_le_bytes());
                }
                _ => return,
            }
        }
    }
}

//=============================================================================
// Transfers
//=============================================================================

#[allow(clippy::too_many_arguments)]
fn copy_buffer_to_image(
    blocks: &mut SlotMap<MemBlockKey, Block>,
    images: &SlotMap<ImageKey, ImageEntry>,
    src_block: MemBlockKey,
    src_offset: usize,
    src_pitch: usize,
    image: ImageKey,
    mip_level: u32,
    layer: u32,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
) {
    let Some(entry) = images.get(image) else {
        return;
    };
    let format = entry.desc.format;
    let (bw, bh) = format.block_extent();
    let row_bytes = format.row_bytes(width);
    let rows = format.rows(height);

    // Same slotmap on both sides of the copy; stage through a scratch vec.
    let staged: Vec<u8> = {
        let Some(src) = blocks.get(src_block).map(|b| b.data.as_slice()) else {
            return;
        };
        let mut staged = vec![0u8; row_bytes * rows];
        for row in 0..rows {
            let from = src_offset + row * src_pitch;
            if from + row_bytes > src.len() {
                return;
            }
            staged[row * row_bytes..(row + 1) * row_bytes]
                .copy_from_slice(&src[from..from + row_bytes]);
        }
        staged
    };

    let pitch = entry.layout.mip_row_pitch(mip_level);
    let base = entry.offset + entry.layout.slice_offset(mip_level, layer);
    let x_bytes = (x / bw) as usize * format.texel_bytes();
    let y_rows = (y / bh) as usize;
    let Some(dst) = blocks.get_mut(entry.block).map(|b| b.data.as_mut_slice()) else {
        return;
    };
    for row in 0..rows {
        let to = base + (y_rows + row) * pitch + x_bytes;
        dst[to..to + row_bytes].copy_from_slice(&staged[row * row_bytes..(row + 1) * row_bytes]);
    }
}

#[allow(clippy::too_many_arguments)]
fn copy_image_to_buffer(
    blocks: &mut SlotMap<MemBlockKey, Block>,
    images: &SlotMap<ImageKey, ImageEntry>,
    image: ImageKey,
    mip_level: u32,
    layer: u32,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    dst_block: MemBlockKey,
    dst_offset: usize,
    dst_pitch: usize,
) {
    let Some(entry) = images.get(image) else {
        return;
    };
    let format = entry.desc.format;
    let (bw, bh) = format.block_extent();
    let row_bytes = format.row_bytes(width);
    let rows = format.rows(height);
    let pitch = entry.layout.mip_row_pitch(mip_level);
    let base = entry.offset + entry.layout.slice_offset(mip_level, layer);
    let x_bytes = (x / bw) as usize * format.texel_bytes();
    let y_rows = (y / bh) as usize;

    let staged: Vec<u8> = {
        let Some(src) = blocks.get(entry.block).map(|b| b.data.as_slice()) else {
            return;
        };
        let mut staged = vec![0u8; row_bytes * rows];
        for row in 0..rows {
            let from = base + (y_rows + row) * pitch + x_bytes;
            staged[row * row_bytes..(row + 1) * row_bytes]
                .copy_from_slice(&src[from..from + row_bytes]);
        }
        staged
    };

    let Some(dst) = blocks.get_mut(dst_block).map(|b| b.data.as_mut_slice()) else {
        return;
    };
    for row in 0..rows {
        let to = dst_offset + row * dst_pitch;
        if to + row_bytes > dst.len() {
            return;
        }
        dst[to..to + row_bytes].copy_from_slice(&staged[row * row_bytes..(row + 1) * row_bytes]);
    }
}

//=============================================================================
// Mip blit
//=============================================================================

fn blit_mip(
    blocks: &mut SlotMap<MemBlockKey, Block>,
    images: &SlotMap<ImageKey, ImageEntry>,
    image: ImageKey,
    src_level: u32,
    dst_level: u32,
    layer: u32,
    filter: FilterMode,
) {
    let Some(entry) = images.get(image) else {
        return;
    };
    let format = entry.desc.format;
    if format.block_extent() != (1, 1) || format.is_depth() {
        return;
    }
    let bpp = format.texel_bytes();
    let (sw, sh) = entry.layout.mip_extent(src_level);
    let (dw, dh) = entry.layout.mip_extent(dst_level);
    let src_pitch = entry.layout.mip_row_pitch(src_level);
    let dst_pitch = entry.layout.mip_row_pitch(dst_level);
    let src_base = entry.offset + entry.layout.slice_offset(src_level, layer);
    let dst_base = entry.offset + entry.layout.slice_offset(dst_level, layer);

    // Source and destination live in the same block.
    let src: Vec<u8> = {
        let Some(data) = blocks.get(entry.block).map(|b| b.data.as_slice()) else {
            return;
        };
        data[src_base..src_base + src_pitch * sh as usize].to_vec()
    };
    let Some(dst) = blocks.get_mut(entry.block).map(|b| b.data.as_mut_slice()) else {
        return;
    };

    let sample = |x: u32, y: u32| -> [f32; 4] {
        let at = y as usize * src_pitch + x as usize * bpp;
        format.unpack(&src[at..at + bpp])
    };

    for dy in 0..dh {
        for dx in 0..dw {
            let rgba = match filter {
                FilterMode::Nearest => {
                    let sx = ((dx as f32 + 0.5) * sw as f32 / dw as f32) as u32;
                    let sy = ((dy as f32 + 0.5) * sh as f32 / dh as f32) as u32;
                    sample(sx.min(sw - 1), sy.min(sh - 1))
                }
                FilterMode::Linear => {
                    let fx = (dx as f32 + 0.5) * sw as f32 / dw as f32 - 0.5;
                    let fy = (dy as f32 + 0.5) * sh as f32 / dh as f32 - 0.5;
                    let x0 = fx.floor().max(0.0) as u32;
                    let y0 = fy.floor().max(0.0) as u32;
                    let x1 = (x0 + 1).min(sw - 1);
                    let y1 = (y0 + 1).min(sh - 1);
                    let tx = (fx - fx.floor()).clamp(0.0, 1.0);
                    let ty = (fy - fy.floor()).clamp(0.0, 1.0);
                    let mut rgba = [0.0f32; 4];
                    let corners = [
                        (sample(x0, y0), (1.0 - tx) * (1.0 - ty)),
                        (sample(x1, y0), tx * (1.0 - ty)),
                        (sample(x0, y1), (1.0 - tx) * ty),
                        (sample(x1, y1), tx * ty),
                    ];
                    for (texel, weight) in corners {
                        for (acc, v) in rgba.iter_mut().zip(texel) {
                            *acc += v * weight;
                        }
                    }
                    rgba
                }
            };
            let at = dst_base + dy as usize * dst_pitch + dx as usize * bpp;
            format.pack(rgba, &mut dst[at..at + bpp]);
        }
    }
}
