//! Strategy without any coordination.

use super::{StrategyKind, SyncStrategy};
use crate::addressing::{BlockRing, LocalCursor};
use crate::config::RingConfig;
use crate::element::Element;
use crate::error::Result;
use crate::storage::AlignedBuffer;

/// Plain block copies with no synchronization.
///
/// The cursor lives in a `Cell`, so this type is `!Sync`: a ring built on it
/// cannot be shared with reader threads, and a concurrent write/read data race
/// does not compile. It is the single-threaded reference every other strategy
/// is compared against.
///
/// ```compile_fail
/// fn needs_sync<T: Sync>() {}
/// needs_sync::<blockring::Unsynchronized<u64>>();
/// ```
///
/// For the same reason a reader handle cannot move to another thread:
///
/// ```compile_fail
/// use blockring::{RingBuffer, RingConfig, Unsynchronized};
///
/// let ring = RingBuffer::<u64, Unsynchronized<u64>>::new(RingConfig::new(2, 4)).unwrap();
/// let reader = ring.reader();
/// std::thread::spawn(move || reader.read_vec(0));
/// ```
#[derive(Debug)]
pub struct Unsynchronized<T: Element> {
    ring: BlockRing,
    cursor: LocalCursor,
    data: AlignedBuffer<T>,
}

impl<T: Element> Unsynchronized<T> {
    /// Offset of the next write.
    pub fn write_position(&self) -> usize {
        self.cursor.position()
    }
}

impl<T: Element> SyncStrategy<T> for Unsynchronized<T> {
    const KIND: StrategyKind = StrategyKind::Unsynchronized;

    fn new(config: &RingConfig) -> Result<Self> {
        config.validate::<T>()?;
        let ring = BlockRing::from_config(config);
        let data = AlignedBuffer::new(ring.capacity(), config.alignment)?;

        log::debug!(
            "unsynchronized ring: {} blocks x {} elements, {}-byte aligned",
            ring.num_blocks(),
            ring.block_size(),
            config.alignment
        );

        Ok(Self {
            ring,
            cursor: LocalCursor::default(),
            data,
        })
    }

    #[inline]
    fn ring(&self) -> BlockRing {
        self.ring
    }

    unsafe fn write(&self, src: &[T]) -> Result<()> {
        self.ring.check_len(src.len())?;
        // Safety: `!Sync` confines every access to this thread.
        self.data.copy_in(self.cursor.position(), src);
        self.cursor.advance(&self.ring);
        Ok(())
    }

    fn read(&self, dst: &mut [T], offset: usize) -> Result<()> {
        self.ring.check_len(dst.len())?;
        self.ring.block_index(offset)?;
        // Safety: `!Sync` confines every access to this thread.
        unsafe { self.data.copy_out(offset, dst) };
        Ok(())
    }

    unsafe fn fill(&self, value: T) {
        self.data.fill_range(0, self.ring.capacity(), value);
    }
}
