//! Copy-cost reference with disjoint read and write buffers.

use super::{StrategyKind, SyncStrategy};
use crate::addressing::{BlockRing, WriteCursor};
use crate::config::RingConfig;
use crate::element::Element;
use crate::error::Result;
use crate::storage::AlignedBuffer;

/// Writes land in one buffer, reads come from another.
///
/// The two sides never touch the same memory, so the cost measured is that of
/// the copies and the argument checks alone. Reads return the default value of
/// `T` forever: this strategy is a timing floor, not a usable ring.
#[derive(Debug)]
pub struct Baseline<T: Element> {
    ring: BlockRing,
    cursor: WriteCursor,
    write_buf: AlignedBuffer<T>,
    read_buf: AlignedBuffer<T>,
}

impl<T: Element> Baseline<T> {
    /// Offset of the next write.
    pub fn write_position(&self) -> usize {
        self.cursor.position()
    }
}

impl<T: Element> SyncStrategy<T> for Baseline<T> {
    const KIND: StrategyKind = StrategyKind::Baseline;

    fn new(config: &RingConfig) -> Result<Self> {
        config.validate::<T>()?;
        let ring = BlockRing::from_config(config);
        let write_buf = AlignedBuffer::new(ring.capacity(), config.alignment)?;
        let mut read_buf = AlignedBuffer::new(ring.capacity(), config.alignment)?;
        read_buf.fill(T::default());

        log::debug!(
            "baseline ring: {} blocks x {} elements, {}-byte aligned",
            ring.num_blocks(),
            ring.block_size(),
            config.alignment
        );

        Ok(Self {
            ring,
            cursor: WriteCursor::new(),
            write_buf,
            read_buf,
        })
    }

    #[inline]
    fn ring(&self) -> BlockRing {
        self.ring
    }

    unsafe fn write(&self, src: &[T]) -> Result<()> {
        self.ring.check_len(src.len())?;
        // Safety: only the single writer touches `write_buf`.
        self.write_buf.copy_in(self.cursor.position(), src);
        self.cursor.advance(&self.ring);
        Ok(())
    }

    fn read(&self, dst: &mut [T], offset: usize) -> Result<()> {
        self.ring.check_len(dst.len())?;
        self.ring.block_index(offset)?;
        // Safety: nothing writes `read_buf` after construction.
        unsafe { self.read_buf.copy_out(offset, dst) };
        Ok(())
    }

    unsafe fn fill(&self, value: T) {
        self.write_buf.fill_range(0, self.ring.capacity(), value);
    }
}
