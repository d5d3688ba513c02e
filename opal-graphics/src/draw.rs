//! Draw call assembly and clears.
//!
//! Draws are dropped silently (with a debug log) unless a linked program is
//! bound, the active framebuffer is complete and the queue is alive. Client
//! arrays are staged into the current slot's data region at record time, so
//! the caller may reuse its memory immediately.

use crate::soft::{self, Command};
use crate::{
    convert, AttribSource, ClearMask, Context, IndexSource, VertexAttrib, MAX_VERTEX_ATTRIBS,
};

#[hidden_trait::expose]
impl crate::traits::DrawDevice for Context {
    fn set_vertex_attribs(&mut self, attribs: &[VertexAttrib]) {
        let mut resolved = Vec::with_capacity(attribs.len());
        for attrib in attribs {
            if attrib.location as usize >= MAX_VERTEX_ATTRIBS {
                log::debug!("attribute location {} out of range", attrib.location);
                continue;
            }
            let Some((format, vertex_bytes)) =
                convert::map_attrib_format(attrib.size, attrib.ty, attrib.normalized)
            else {
                log::debug!(
                    "unsupported attribute format: size {} type 0x{:04X}",
                    attrib.size,
                    attrib.ty
                );
                continue;
            };
            let stride = if attrib.stride == 0 {
                vertex_bytes as u32
            } else {
                attrib.stride
            };
            let (block, offset) = match attrib.source {
                AttribSource::Buffer { buffer, offset } => {
                    let Some((base, size)) = self.buffer_range(buffer) else {
                        log::debug!("attribute reads a buffer without storage");
                        continue;
                    };
                    if offset >= size {
                        continue;
                    }
                    (self.data_block, base + offset)
                }
                AttribSource::Client(data) => {
                    let Some(at) = self.stage_client(data) else {
                        continue;
                    };
                    (self.data_block, at)
                }
            };
            resolved.push(soft::VertexAttrib {
                location: attrib.location,
                block,
                offset,
                stride,
                format,
            });
        }
        self.bound_attribs = resolved.clone();
        self.record(Command::BindVertexAttribs(resolved));
    }

    fn draw_arrays(&mut self, mode: u32, first: u32, count: u32) {
        if count == 0 || !self.draw_ready() {
            return;
        }
        let primitive = convert::map_primitive(mode);
        self.record(Command::Draw {
            primitive,
            first,
            count,
        });
    }

    fn draw_elements(&mut self, mode: u32, count: u32, ty: u32, indices: IndexSource) {
        if count == 0 || !self.draw_ready() {
            return;
        }
        let Some((index_type, index_size)) = convert::map_index_type(ty) else {
            log::debug!("unsupported index type 0x{:04X}", ty);
            return;
        };
        let (block, offset) = match indices {
            IndexSource::Buffer { buffer, offset } => {
                let Some((base, size)) = self.buffer_range(buffer) else {
                    log::debug!("draw_elements reads a buffer without storage");
                    return;
                };
                if offset + count as usize * index_size > size {
                    log::debug!("draw_elements index range out of bounds");
                    return;
                }
                (self.data_block, base + offset)
            }
            IndexSource::Client(data) => {
                let needed = count as usize * index_size;
                if data.len() < needed {
                    log::debug!("draw_elements client index array too small");
                    return;
                }
                let Some(at) = self.stage_client(&data[..needed]) else {
                    return;
                };
                (self.data_block, at)
            }
        };
        let primitive = convert::map_primitive(mode);
        self.record(Command::BindIndexBuffer {
            block,
            offset,
            index_type,
        });
        self.record(Command::DrawIndexed { primitive, count });
    }

    fn clear(&mut self, mask: ClearMask, color: [f32; 4], depth: f32, stencil: u32) {
        if self.queue_dead || !self.framebuffer_complete() {
            log::debug!("clear dropped: dead queue or incomplete framebuffer");
            return;
        }
        if mask.contains(ClearMask::COLOR) {
            self.record(Command::ClearColor { value: color });
        }
        if mask.intersects(ClearMask::DEPTH | ClearMask::STENCIL) {
            self.record(Command::ClearDepthStencil {
                depth: mask.contains(ClearMask::DEPTH).then_some(depth),
                stencil: mask.contains(ClearMask::STENCIL).then_some(stencil),
            });
        }
    }
}

impl Context {
    fn stage_client(&mut self, data: &[u8]) -> Option<usize> {
        let offset = self.slots[self.slot_index()].client.allocate(data.len())?;
        let block = self.device.block_data_mut(self.data_block)?;
        block[offset..offset + data.len()].copy_from_slice(data);
        Some(offset)
    }

    fn draw_ready(&self) -> bool {
        if self.queue_dead {
            return false;
        }
        let program_ok = self
            .bound_program
            .and_then(|h| self.programs.get(h))
            .is_some_and(|p| p.linked);
        if !program_ok {
            log::debug!("draw dropped: no linked program bound");
            return false;
        }
        if !self.framebuffer_complete() {
            log::debug!("draw dropped: incomplete framebuffer");
            return false;
        }
        true
    }
}
