//! Frame slot pipelining.
//!
//! Three slots rotate round-robin through five boundary operations: end
//! (submit), present, acquire (rotate), wait the slot fence, begin. The wait
//! happens before anything the GPU may still read is touched: the slot's
//! command buffer and its client data region.

use crate::arena::Arena;
use crate::soft::{self, CacheFlags, Command};
use crate::Context;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SlotPhase {
    Idle,
    Recording,
    Submitted,
}

pub(crate) struct FrameSlot {
    pub cmdbuf: soft::CmdBufKey,
    pub fence: Option<soft::FenceKey>,
    /// Display color image presented when this slot's frame ends.
    pub color: soft::ImageKey,
    pub client: Arena,
    pub phase: SlotPhase,
}

impl Context {
    /// Opens the current slot for recording and replays all bound state into
    /// its fresh command buffer.
    pub(crate) fn begin_slot(&mut self) {
        let index = self.slot_index();
        debug_assert_eq!(self.slots[index].phase, SlotPhase::Idle);
        self.slots[index].phase = SlotPhase::Recording;

        let targets = self.current_render_targets();
        self.record(Command::BindRenderTargets {
            color: targets.0,
            depth: targets.1,
        });
        self.record(Command::BindDescriptorSets {
            block: self.descriptor_block,
            image_offset: 0,
            image_count: self.image_descriptor_capacity,
            sampler_offset: self.sampler_table_base,
            sampler_count: self.sampler_descriptor_capacity,
        });
        self.apply_all_state();
        self.emit_program_bind();
        self.emit_texture_binds();
        if !self.bound_attribs.is_empty() {
            let attribs = self.bound_attribs.clone();
            self.record(Command::BindVertexAttribs(attribs));
        }
    }

    /// Submits the current slot's command buffer. On queue failure the
    /// context goes dead: the work is dropped and every later submit is a
    /// no-op.
    fn submit_current(&mut self) -> bool {
        let index = self.slot_index();
        debug_assert_eq!(self.slots[index].phase, SlotPhase::Recording);
        if self.queue_dead {
            self.slots[index].phase = SlotPhase::Idle;
            return false;
        }
        match self.device.submit(self.slots[index].cmdbuf) {
            Ok(fence) => {
                self.slots[index].fence = Some(fence);
                self.slots[index].phase = SlotPhase::Submitted;
                true
            }
            Err(err) => {
                log::error!("queue submit failed: {}", err);
                self.queue_dead = true;
                self.slots[index].phase = SlotPhase::Idle;
                false
            }
        }
    }

    /// Makes the slot safe to record into again: waits out its in-flight
    /// frame, then reclaims the command buffer and client region.
    fn reclaim_slot(&mut self, index: usize) {
        if self.slots[index].phase == SlotPhase::Submitted {
            if let Some(fence) = self.slots[index].fence.take() {
                self.device.wait_fence(fence);
            }
            self.slots[index].phase = SlotPhase::Idle;
        }
        self.device.reset_cmdbuf(self.slots[index].cmdbuf);
        self.slots[index].client.reset();
    }

    /// Rebuilds the uniform region from the live bindings of every program.
    /// Valid while captured draws still reference old offsets because their
    /// uniform bytes were embedded in the command stream at record time.
    fn refresh_uniforms(&mut self) {
        let mut live: Vec<(crate::ProgramHandle, usize, usize, Vec<u8>)> = Vec::new();
        for (handle, program) in &self.programs {
            for (stage, bindings) in program.uniforms.iter().enumerate() {
                for (slot, binding) in bindings.iter().enumerate() {
                    if let Some(binding) = binding {
                        if let Some(offset) = binding.offset {
                            let data = self
                                .device
                                .block_data(self.data_block)
                                .map(|d| d[offset..offset + binding.size].to_vec())
                                .unwrap_or_default();
                            live.push((handle, stage, slot, data));
                        }
                    }
                }
            }
        }
        self.uniform_arena.reset();
        for (handle, stage, slot, data) in live {
            let offset = self.uniform_arena.allocate(data.len());
            if let Some(offset) = offset {
                if let Some(block) = self.device.block_data_mut(self.data_block) {
                    block[offset..offset + data.len()].copy_from_slice(&data);
                }
            }
            if let Some(program) = self.programs.get_mut(handle) {
                if let Some(binding) = program.uniforms[stage][slot].as_mut() {
                    binding.offset = offset;
                }
            }
        }
    }
}

#[hidden_trait::expose]
impl crate::traits::FrameDevice for Context {
    fn end_frame(&mut self) {
        self.submit_current();
    }

    fn present_frame(&mut self) {
        let index = self.slot_index();
        if self.slots[index].phase != SlotPhase::Submitted {
            log::debug!("present_frame without a submitted frame");
            return;
        }
        let color = self.slots[index].color;
        if let Err(err) = self.device.present(color) {
            log::error!("present failed: {}", err);
            self.queue_dead = true;
        }
    }

    fn acquire_frame(&mut self) {
        debug_assert_ne!(
            self.slots[self.slot_index()].phase,
            SlotPhase::Recording,
            "acquire_frame while the current slot is still recording"
        );
        self.frame_index += 1;
    }

    fn wait_slot_fence(&mut self) {
        let index = self.slot_index();
        self.reclaim_slot(index);
        self.refresh_uniforms();
    }

    fn begin_frame(&mut self) {
        self.begin_slot();
    }

    fn flush(&mut self) {
        let index = self.slot_index();
        if self.submit_current() {
            // Submission is synchronous underneath, so draining the slot
            // fence here does not stall a real pipeline.
            if let Some(fence) = self.slots[index].fence.take() {
                self.device.wait_fence(fence);
            }
            self.slots[index].phase = SlotPhase::Idle;
        }
        self.device.reset_cmdbuf(self.slots[index].cmdbuf);
        self.begin_slot();
    }

    fn finish(&mut self) {
        self.flush();
        self.device.wait_idle();
    }

    fn texture_barrier(&mut self) {
        self.record(Command::Barrier(CacheFlags::IMAGE | CacheFlags::DESCRIPTOR));
    }

    fn queue_error(&self) -> bool {
        self.queue_dead || self.device.queue_error()
    }

    fn frame_index(&self) -> u64 {
        self.frame_index
    }
}
