//! Block ring addressing.
//!
//! Maps the writer's advancing cursor and caller-supplied read offsets onto
//! block indices, and owns the wraparound arithmetic. Offsets are counted in
//! elements, not bytes.

use core::cell::Cell;
use core::sync::atomic::{AtomicUsize, Ordering};

use crate::config::RingConfig;
use crate::error::{Result, RingError};

/// Geometry of a ring of `num_blocks` blocks of `block_size` elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockRing {
    num_blocks: usize,
    block_size: usize,
}

impl BlockRing {
    /// Build the addressing for a validated configuration.
    ///
    /// # Panics
    ///
    /// Panics if `num_blocks` or `block_size` is zero. Strategies only build
    /// a `BlockRing` after [`RingConfig::validate`] has rejected both.
    #[inline]
    pub const fn new(num_blocks: usize, block_size: usize) -> Self {
        assert!(num_blocks > 0, "ring must have at least one block");
        assert!(block_size > 0, "block size must be non-zero");
        Self {
            num_blocks,
            block_size,
        }
    }

    /// Addressing for `config`.
    #[inline]
    pub const fn from_config(config: &RingConfig) -> Self {
        Self::new(config.num_blocks, config.block_size)
    }

    /// Number of blocks.
    #[inline]
    pub const fn num_blocks(&self) -> usize {
        self.num_blocks
    }

    /// Elements per block.
    #[inline]
    pub const fn block_size(&self) -> usize {
        self.block_size
    }

    /// Total elements in the ring.
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.num_blocks * self.block_size
    }

    /// Block the writer targets at `cursor`.
    #[inline]
    pub const fn write_index(&self, cursor: usize) -> usize {
        cursor / self.block_size
    }

    /// Cursor position after one block write, wrapped to the ring.
    #[inline]
    pub const fn advance(&self, cursor: usize) -> usize {
        (cursor + self.block_size) % self.capacity()
    }

    /// Validate a read offset and return its block index.
    ///
    /// The offset must be below capacity and start a block.
    #[inline]
    pub fn block_index(&self, offset: usize) -> Result<usize> {
        if offset >= self.capacity() {
            return Err(RingError::OutOfRange {
                offset,
                len: self.capacity(),
            });
        }
        if offset % self.block_size != 0 {
            return Err(RingError::Misaligned {
                offset,
                block_size: self.block_size,
            });
        }
        Ok(offset / self.block_size)
    }

    /// Check that a slice holds exactly one block.
    #[inline]
    pub fn check_len(&self, len: usize) -> Result<()> {
        if len == self.block_size {
            Ok(())
        } else {
            Err(RingError::BlockSizeMismatch {
                expected: self.block_size,
                got: len,
            })
        }
    }

    /// Element offset of block `index`.
    #[inline]
    pub const fn block_offset(&self, index: usize) -> usize {
        index * self.block_size
    }
}

/// Position of the next write, owned by the single writer.
///
/// Atomic only so that a strategy holding it stays `Sync`; the writer is the
/// sole mutator and readers never look at it, so relaxed ordering suffices.
#[derive(Debug, Default)]
pub struct WriteCursor(AtomicUsize);

impl WriteCursor {
    /// Cursor at offset 0.
    pub const fn new() -> Self {
        Self(AtomicUsize::new(0))
    }

    /// Current element offset.
    #[inline]
    pub fn position(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }

    /// Move to the next block, wrapping at capacity.
    #[inline]
    pub fn advance(&self, ring: &BlockRing) {
        let next = ring.advance(self.position());
        self.0.store(next, Ordering::Relaxed);
    }
}

/// Single-threaded cursor; makes the owning strategy `!Sync`.
#[derive(Debug, Default)]
pub(crate) struct LocalCursor(Cell<usize>);

impl LocalCursor {
    #[inline]
    pub(crate) fn position(&self) -> usize {
        self.0.get()
    }

    #[inline]
    pub(crate) fn advance(&self, ring: &BlockRing) {
        self.0.set(ring.advance(self.0.get()));
    }
}
