//! Bump allocation over ranges of device memory blocks.
//!
//! Regions are sized once at context init and never grow. Allocation is a
//! pointer bump; the only reclamation is a whole-region reset, and only the
//! regions with a defined reset point (client-array slots, the uniform
//! region) ever take one.

use crate::align_up;
use crate::soft::MemBlockKey;

pub struct Arena {
    block: MemBlockKey,
    base: usize,
    size: usize,
    offset: usize,
    align: usize,
    name: &'static str,
}

impl Arena {
    /// Covers `[base, base + size)` of `block`, bumping in `align` steps.
    pub fn new(block: MemBlockKey, base: usize, size: usize, align: usize, name: &'static str) -> Self {
        debug_assert!(align.is_power_of_two());
        debug_assert!(base % align == 0);
        Self {
            block,
            base,
            size,
            offset: 0,
            align,
            name,
        }
    }

    pub fn block(&self) -> MemBlockKey {
        self.block
    }

    /// Returns the absolute block offset of the allocation, or `None` when
    /// the region is exhausted. Exhaustion is logged; callers turn it into
    /// a no-op.
    pub fn allocate(&mut self, size: usize) -> Option<usize> {
        let at = align_up(self.offset, self.align);
        if at + size > self.size {
            log::error!(
                "{} region exhausted: {} bytes requested, {} of {} in use",
                self.name,
                size,
                self.offset,
                self.size
            );
            return None;
        }
        self.offset = at + size;
        Some(self.base + at)
    }

    /// Aligns the next allocation to `align` instead of the region default.
    pub fn allocate_aligned(&mut self, size: usize, align: usize) -> Option<usize> {
        debug_assert!(align.is_power_of_two());
        let at = align_up(self.offset, align.max(self.align));
        if at + size > self.size {
            log::error!(
                "{} region exhausted: {} bytes requested, {} of {} in use",
                self.name,
                size,
                self.offset,
                self.size
            );
            return None;
        }
        self.offset = at + size;
        Some(self.base + at)
    }

    /// Releases everything. Valid only once no in-flight submission still
    /// reads the region; the frame layer gates this on the slot fence.
    pub fn reset(&mut self) {
        self.offset = 0;
    }

    pub fn remaining(&self) -> usize {
        self.size - align_up(self.offset, self.align).min(self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::Key;

    fn arena(size: usize, align: usize) -> Arena {
        Arena::new(MemBlockKey::null(), 0, size, align, "test")
    }

    #[test]
    fn bump_respects_alignment() {
        let mut a = arena(1024, 64);
        assert_eq!(a.allocate(10), Some(0));
        assert_eq!(a.allocate(10), Some(64));
        assert_eq!(a.allocate_aligned(10, 256), Some(256));
    }

    #[test]
    fn exhaustion_returns_none_and_preserves_state() {
        let mut a = arena(128, 64);
        assert_eq!(a.allocate(100), Some(0));
        assert_eq!(a.allocate(64), None);
        assert_eq!(a.remaining(), 0);
        a.reset();
        assert_eq!(a.allocate(64), Some(0));
    }

    #[test]
    fn base_offset_is_applied() {
        let mut a = Arena::new(MemBlockKey::null(), 4096, 256, 64, "test");
        assert_eq!(a.allocate(1), Some(4096));
        assert_eq!(a.allocate(1), Some(4096 + 64));
    }
}
