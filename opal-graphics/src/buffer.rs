//! Buffer objects.
//!
//! A buffer is a range of the static data region. `buffer_data` always takes
//! a fresh allocation, never reusing the old range, so frames already
//! recorded against the previous contents keep reading stable bytes. The old
//! range is not reclaimed; the static region is append-only by design.

use crate::{BufferHandle, Context};

pub(crate) struct BufferEntry {
    pub size: usize,
    #[allow(dead_code)]
    pub usage: u32,
    /// Absolute offset in the data block, once storage exists.
    pub offset: Option<usize>,
}

#[hidden_trait::expose]
impl crate::traits::BufferDevice for Context {
    fn create_buffer(&mut self) -> BufferHandle {
        self.buffers.insert(BufferEntry {
            size: 0,
            usage: 0,
            offset: None,
        })
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        self.buffers.remove(buffer);
    }

    fn buffer_data(&mut self, buffer: BufferHandle, data: &[u8], usage: u32) {
        if !self.buffers.contains_key(buffer) {
            log::debug!("buffer_data on a dead handle");
            return;
        }
        let Some(offset) = self.static_arena.allocate(data.len()) else {
            return;
        };
        if let Some(block) = self.device.block_data_mut(self.data_block) {
            block[offset..offset + data.len()].copy_from_slice(data);
        }
        let entry = &mut self.buffers[buffer];
        entry.size = data.len();
        entry.usage = usage;
        entry.offset = Some(offset);
    }

    fn buffer_sub_data(&mut self, buffer: BufferHandle, offset: usize, data: &[u8]) {
        let Some(entry) = self.buffers.get(buffer) else {
            log::debug!("buffer_sub_data on a dead handle");
            return;
        };
        let Some(base) = entry.offset else {
            log::debug!("buffer_sub_data before buffer_data");
            return;
        };
        if offset + data.len() > entry.size {
            log::debug!(
                "buffer_sub_data out of bounds: {}+{} > {}",
                offset,
                data.len(),
                entry.size
            );
            return;
        }
        if let Some(block) = self.device.block_data_mut(self.data_block) {
            let at = base + offset;
            block[at..at + data.len()].copy_from_slice(data);
        }
    }
}

impl Context {
    /// Resolves a buffer to its (block-absolute) byte range, if it has
    /// storage.
    pub(crate) fn buffer_range(&self, buffer: BufferHandle) -> Option<(usize, usize)> {
        let entry = self.buffers.get(buffer)?;
        entry.offset.map(|offset| (offset, entry.size))
    }
}
