//! Ring buffer facade.
//!
//! [`RingBuffer`] is the writer's end of a ring: it is not `Clone`, and only
//! `&mut RingBuffer` can write or fill, which discharges the strategies'
//! single-writer precondition at compile time. [`RingReader`] handles are
//! cheap to clone and, when the strategy is `Sync`, can be sent to any number
//! of reader threads.

use core::fmt;
use core::marker::PhantomData;
use std::sync::Arc;

use crate::config::RingConfig;
use crate::element::Element;
use crate::error::Result;
use crate::strategy::{StrategyKind, SyncStrategy};

/// Writer end of a ring of `T` guarded by strategy `S`.
pub struct RingBuffer<T: Element, S: SyncStrategy<T>> {
    strategy: Arc<S>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Element, S: SyncStrategy<T>> RingBuffer<T, S> {
    /// Build a ring for `config`.
    pub fn new(config: RingConfig) -> Result<Self> {
        S::new(&config).map(Self::from_strategy)
    }

    /// Wrap an already constructed strategy.
    pub fn from_strategy(strategy: S) -> Self {
        Self {
            strategy: Arc::new(strategy),
            _marker: PhantomData,
        }
    }

    /// Copy one block into the ring at the write cursor and advance it.
    #[inline]
    pub fn write(&mut self, src: &[T]) -> Result<()> {
        // Safety: `&mut self` on the only writer handle.
        unsafe { self.strategy.write(src) }
    }

    /// Set every element of the ring to `value`.
    pub fn fill(&mut self, value: T) {
        // Safety: `&mut self` on the only writer handle.
        unsafe { self.strategy.fill(value) }
    }

    /// Copy the block at element `offset` into `dst`.
    #[inline]
    pub fn read(&self, dst: &mut [T], offset: usize) -> Result<()> {
        self.strategy.read(dst, offset)
    }

    /// Read the block at element `offset` into a new vector.
    pub fn read_vec(&self, offset: usize) -> Result<Vec<T>> {
        read_vec(&*self.strategy, offset)
    }

    /// A read-only handle onto this ring.
    pub fn reader(&self) -> RingReader<T, S> {
        RingReader {
            strategy: Arc::clone(&self.strategy),
            _marker: PhantomData,
        }
    }

    /// Total capacity in elements.
    #[inline]
    pub fn size(&self) -> usize {
        self.strategy.size()
    }

    /// Elements per block.
    #[inline]
    pub fn block_size(&self) -> usize {
        self.strategy.ring().block_size()
    }

    /// Number of blocks.
    #[inline]
    pub fn num_blocks(&self) -> usize {
        self.strategy.ring().num_blocks()
    }

    /// Strategy guarding this ring.
    #[inline]
    pub fn kind(&self) -> StrategyKind {
        S::KIND
    }

    /// The underlying strategy, for strategy-specific diagnostics.
    #[inline]
    pub fn strategy(&self) -> &S {
        &self.strategy
    }
}

impl<T: Element, S: SyncStrategy<T>> fmt::Debug for RingBuffer<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingBuffer")
            .field("kind", &S::KIND)
            .field("num_blocks", &self.num_blocks())
            .field("block_size", &self.block_size())
            .field("readers", &(Arc::strong_count(&self.strategy) - 1))
            .finish()
    }
}

/// Read-only handle onto a ring.
pub struct RingReader<T: Element, S: SyncStrategy<T>> {
    strategy: Arc<S>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Element, S: SyncStrategy<T>> RingReader<T, S> {
    /// Copy the block at element `offset` into `dst`.
    #[inline]
    pub fn read(&self, dst: &mut [T], offset: usize) -> Result<()> {
        self.strategy.read(dst, offset)
    }

    /// Read the block at element `offset` into a new vector.
    pub fn read_vec(&self, offset: usize) -> Result<Vec<T>> {
        read_vec(&*self.strategy, offset)
    }

    /// Total capacity in elements.
    #[inline]
    pub fn size(&self) -> usize {
        self.strategy.size()
    }

    /// Elements per block.
    #[inline]
    pub fn block_size(&self) -> usize {
        self.strategy.ring().block_size()
    }

    /// The underlying strategy.
    #[inline]
    pub fn strategy(&self) -> &S {
        &self.strategy
    }
}

impl<T: Element, S: SyncStrategy<T>> Clone for RingReader<T, S> {
    fn clone(&self) -> Self {
        Self {
            strategy: Arc::clone(&self.strategy),
            _marker: PhantomData,
        }
    }
}

impl<T: Element, S: SyncStrategy<T>> fmt::Debug for RingReader<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingReader")
            .field("kind", &S::KIND)
            .field("block_size", &self.block_size())
            .finish()
    }
}

fn read_vec<T: Element, S: SyncStrategy<T>>(strategy: &S, offset: usize) -> Result<Vec<T>> {
    let mut block = vec![T::default(); strategy.ring().block_size()];
    strategy.read(&mut block, offset)?;
    Ok(block)
}
