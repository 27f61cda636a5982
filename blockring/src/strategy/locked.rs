//! Strategies guarding each block with its own lock.

use std::sync::{Mutex, PoisonError, RwLock};

use crossbeam_utils::CachePadded;

use super::{StrategyKind, SyncStrategy};
use crate::addressing::{BlockRing, WriteCursor};
use crate::config::RingConfig;
use crate::element::Element;
use crate::error::Result;
use crate::storage::AlignedBuffer;

/// A lock guarding one block for the duration of a single copy.
///
/// Poisoning is ignored: the guarded section is a plain copy, so a panic inside
/// it cannot leave an invariant half-established.
pub trait BlockLock: Default + Send + Sync {
    /// Strategy reported by a [`Locked`] ring using this lock.
    const KIND: StrategyKind;

    /// Run `f` with exclusive access to the block.
    fn with_write<R>(&self, f: impl FnOnce() -> R) -> R;

    /// Run `f` with read access to the block.
    fn with_read<R>(&self, f: impl FnOnce() -> R) -> R;
}

impl BlockLock for Mutex<()> {
    const KIND: StrategyKind = StrategyKind::Exclusive;

    #[inline]
    fn with_write<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    #[inline]
    fn with_read<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }
}

impl BlockLock for RwLock<()> {
    const KIND: StrategyKind = StrategyKind::Shared;

    #[inline]
    fn with_write<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.write().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    #[inline]
    fn with_read<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.read().unwrap_or_else(PoisonError::into_inner);
        f()
    }
}

/// Ring with one cache-padded lock per block.
///
/// A write holds its block's lock exclusively while copying; a read holds it
/// as `L` allows (exclusive for a mutex, shared for a rwlock). Blocks never
/// contend with each other.
#[derive(Debug)]
pub struct Locked<T: Element, L: BlockLock> {
    ring: BlockRing,
    cursor: WriteCursor,
    locks: Box<[CachePadded<L>]>,
    data: AlignedBuffer<T>,
}

/// Per-block mutex: readers exclude each other as well as the writer.
pub type ExclusiveLock<T> = Locked<T, Mutex<()>>;

/// Per-block reader-writer lock: readers share, the writer excludes.
pub type SharedLock<T> = Locked<T, RwLock<()>>;

impl<T: Element, L: BlockLock> Locked<T, L> {
    /// Offset of the next write.
    pub fn write_position(&self) -> usize {
        self.cursor.position()
    }
}

impl<T: Element, L: BlockLock> SyncStrategy<T> for Locked<T, L> {
    const KIND: StrategyKind = L::KIND;

    fn new(config: &RingConfig) -> Result<Self> {
        config.validate::<T>()?;
        let ring = BlockRing::from_config(config);
        let data = AlignedBuffer::new(ring.capacity(), config.alignment)?;
        let locks = (0..ring.num_blocks())
            .map(|_| CachePadded::new(L::default()))
            .collect();

        log::debug!(
            "{} ring: {} blocks x {} elements, {}-byte aligned",
            L::KIND,
            ring.num_blocks(),
            ring.block_size(),
            config.alignment
        );

        Ok(Self {
            ring,
            cursor: WriteCursor::new(),
            locks,
            data,
        })
    }

    #[inline]
    fn ring(&self) -> BlockRing {
        self.ring
    }

    unsafe fn write(&self, src: &[T]) -> Result<()> {
        self.ring.check_len(src.len())?;
        let offset = self.cursor.position();
        let index = self.ring.write_index(offset);
        // Safety: the block lock excludes every reader of this block.
        self.locks[index].with_write(|| self.data.copy_in(offset, src));
        self.cursor.advance(&self.ring);
        Ok(())
    }

    fn read(&self, dst: &mut [T], offset: usize) -> Result<()> {
        self.ring.check_len(dst.len())?;
        let index = self.ring.block_index(offset)?;
        // Safety: the block lock excludes the writer of this block.
        self.locks[index].with_read(|| unsafe { self.data.copy_out(offset, dst) });
        Ok(())
    }

    unsafe fn fill(&self, value: T) {
        let block_size = self.ring.block_size();
        for (index, lock) in self.locks.iter().enumerate() {
            let offset = self.ring.block_offset(index);
            lock.with_write(|| self.data.fill_range(offset, block_size, value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_kinds() {
        assert_eq!(
            <ExclusiveLock<u64> as SyncStrategy<u64>>::KIND,
            StrategyKind::Exclusive
        );
        assert_eq!(
            <SharedLock<u64> as SyncStrategy<u64>>::KIND,
            StrategyKind::Shared
        );
    }

    #[test]
    fn test_one_padded_lock_per_block() {
        let s = SharedLock::<u32>::new(&RingConfig::new(7, 4)).unwrap();
        assert_eq!(s.locks.len(), 7);
        assert!(core::mem::size_of::<CachePadded<RwLock<()>>>() >= 64);
    }

    #[test]
    fn test_roundtrip_both_locks() {
        let ex = ExclusiveLock::<i64>::new(&RingConfig::new(3, 5)).unwrap();
        let sh = SharedLock::<i64>::new(&RingConfig::new(3, 5)).unwrap();
        let src = [-3i64; 5];
        let mut dst = [0i64; 5];

        unsafe { ex.write(&src).unwrap() };
        ex.read(&mut dst, 0).unwrap();
        assert_eq!(dst, src);

        unsafe { sh.write(&src).unwrap() };
        sh.read(&mut dst, 0).unwrap();
        assert_eq!(dst, src);
        assert_eq!(sh.write_position(), 5);
    }

    #[test]
    fn test_read_proceeds_after_poisoned_lock() {
        let s = Arc::new(ExclusiveLock::<u8>::new(&RingConfig::new(1, 2)).unwrap());
        let poisoner = Arc::clone(&s);
        let _ = thread::spawn(move || {
            poisoner.locks[0].with_write(|| panic!("poison the block lock"));
        })
        .join();

        let mut dst = [1u8; 2];
        s.read(&mut dst, 0).unwrap();
        assert_eq!(dst, [0, 0]);
    }

    #[test]
    fn test_fill_under_locks() {
        let s = ExclusiveLock::<u16>::new(&RingConfig::new(4, 3)).unwrap();
        unsafe { s.fill(77) };
        let mut dst = [0u16; 3];
        for block in 0..4 {
            s.read(&mut dst, block * 3).unwrap();
            assert_eq!(dst, [77; 3]);
        }
    }
}
