//! Sequence-lock strategy: non-blocking writer, optimistic readers.
//!
//! # Protocol
//!
//! Each block has a sequence counter starting at 0. Even means the block holds
//! a complete value, odd means a write is in flight.
//!
//! **Writer**:
//! 1. Load the counter `s` (relaxed, the writer is its only mutator)
//! 2. Store `s + 1` (release) and issue a release fence, so the odd state is
//!    ordered before any byte of the copy
//! 3. Copy the block
//! 4. Store `s + 2` (release), publishing the copy
//!
//! **Reader**:
//! 1. Load the counter as `s0` (acquire)
//! 2. Copy the block, even if a write is in flight
//! 3. Acquire fence, then load the counter again as `s1`
//! 4. If `s0 != s1` or `s0` is odd the copy may be torn: discard and retry
//!
//! Two equal, even counter reads around the copy mean no write started or
//! finished while copying, so the copy is exactly the value published at `s0`.
//! The fences keep both the compiler and the CPU from moving the copy outside
//! the bracket formed by the counter accesses.
//!
//! A reader can retry indefinitely while the writer keeps rewriting the same
//! block. In exchange the writer never waits for anyone.

use core::hint;
use core::sync::atomic::{fence, AtomicU64, Ordering};

use crossbeam_utils::CachePadded;

use super::{StrategyKind, SyncStrategy};
use crate::addressing::{BlockRing, WriteCursor};
use crate::config::RingConfig;
use crate::element::Element;
use crate::error::Result;
use crate::storage::AlignedBuffer;

/// Ring with one cache-padded sequence counter per block.
#[derive(Debug)]
pub struct SeqLock<T: Element> {
    ring: BlockRing,
    cursor: WriteCursor,
    sequences: Box<[CachePadded<AtomicU64>]>,
    data: AlignedBuffer<T>,
}

impl<T: Element> SeqLock<T> {
    /// Offset of the next write.
    pub fn write_position(&self) -> usize {
        self.cursor.position()
    }

    /// Current sequence counter of block `index`.
    pub fn sequence(&self, index: usize) -> Option<u64> {
        self.sequences
            .get(index)
            .map(|seq| seq.load(Ordering::Acquire))
    }

    /// Like [`read`](SyncStrategy::read), returning how many torn copies were
    /// discarded before a consistent one was accepted.
    pub fn read_counted(&self, dst: &mut [T], offset: usize) -> Result<u64> {
        self.ring.check_len(dst.len())?;
        let index = self.ring.block_index(offset)?;
        let seq = &self.sequences[index];
        let mut retries = 0u64;

        loop {
            let s0 = seq.load(Ordering::Acquire);

            // Safety: may race with the writer; a torn copy is detected below
            // and never returned. Every bit pattern of `T` is valid.
            unsafe { self.data.copy_out(offset, dst) };

            fence(Ordering::Acquire);
            let s1 = seq.load(Ordering::Acquire);

            if s0 == s1 && s0 & 1 == 0 {
                return Ok(retries);
            }

            retries += 1;
            hint::spin_loop();
        }
    }

    /// Run `copy` inside the write side of block `index`'s sequence.
    ///
    /// # Safety
    ///
    /// Single writer; `copy` must only touch block `index`.
    #[inline]
    unsafe fn publish(&self, index: usize, copy: impl FnOnce()) {
        let seq = &self.sequences[index];

        let s = seq.load(Ordering::Relaxed);
        debug_assert!(s & 1 == 0, "sequence left odd by an earlier write");
        seq.store(s.wrapping_add(1), Ordering::Release);
        fence(Ordering::Release);

        copy();

        seq.store(s.wrapping_add(2), Ordering::Release);
    }
}

impl<T: Element> SyncStrategy<T> for SeqLock<T> {
    const KIND: StrategyKind = StrategyKind::SeqLock;

    fn new(config: &RingConfig) -> Result<Self> {
        config.validate::<T>()?;
        let ring = BlockRing::from_config(config);
        let data = AlignedBuffer::new(ring.capacity(), config.alignment)?;
        let sequences = (0..ring.num_blocks())
            .map(|_| CachePadded::new(AtomicU64::new(0)))
            .collect();

        log::debug!(
            "seqlock ring: {} blocks x {} elements, {}-byte aligned, {}-byte counter slots",
            ring.num_blocks(),
            ring.block_size(),
            config.alignment,
            core::mem::size_of::<CachePadded<AtomicU64>>()
        );

        Ok(Self {
            ring,
            cursor: WriteCursor::new(),
            sequences,
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
        self.publish(index, || self.data.copy_in(offset, src));
        self.cursor.advance(&self.ring);
        Ok(())
    }

    #[inline]
    fn read(&self, dst: &mut [T], offset: usize) -> Result<()> {
        self.read_counted(dst, offset).map(|_| ())
    }

    unsafe fn fill(&self, value: T) {
        let block_size = self.ring.block_size();
        for index in 0..self.ring.num_blocks() {
            let offset = self.ring.block_offset(index);
            self.publish(index, || self.data.fill_range(offset, block_size, value));
        }
    }
}
