//! Synchronization strategies.
//!
//! A strategy owns the ring's storage, its addressing and the write cursor,
//! and decides how a block copy is guarded against concurrent access:
//!
//! | Strategy | Writer | Reader |
//! |----------|--------|--------|
//! | [`Unsynchronized`] | plain copy | plain copy (same thread only) |
//! | [`ExclusiveLock`] | per-block mutex | per-block mutex |
//! | [`SharedLock`] | per-block rwlock, write side | per-block rwlock, read side |
//! | [`SeqLock`] | never blocks | optimistic copy, retried on overlap |
//! | [`Baseline`] | copy into a write-only buffer | copy from a read-only buffer |
//!
//! All of them share one contract ([`SyncStrategy`]): whole-block writes at the
//! cursor, whole-block reads at any block-aligned offset, and identical
//! argument validation performed before anything is copied.

mod baseline;
mod locked;
mod seqlock;
mod unsync;

use core::fmt;
use core::str::FromStr;

use thiserror::Error;

use crate::addressing::BlockRing;
use crate::config::RingConfig;
use crate::element::Element;
use crate::error::Result;

pub use baseline::Baseline;
pub use locked::{BlockLock, ExclusiveLock, Locked, SharedLock};
pub use seqlock::SeqLock;
pub use unsync::Unsynchronized;

/// Identifies a strategy in logs, reports and on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    /// No coordination at all.
    Unsynchronized,
    /// One mutex per block.
    Exclusive,
    /// One reader-writer lock per block.
    Shared,
    /// One sequence counter per block.
    SeqLock,
    /// Split read/write buffers; copy cost without contention.
    Baseline,
}

impl StrategyKind {
    /// Every strategy.
    pub const ALL: [StrategyKind; 5] = [
        StrategyKind::Unsynchronized,
        StrategyKind::Exclusive,
        StrategyKind::Shared,
        StrategyKind::SeqLock,
        StrategyKind::Baseline,
    ];

    /// Stable name used in reports.
    pub const fn name(self) -> &'static str {
        match self {
            StrategyKind::Unsynchronized => "unsynchronized",
            StrategyKind::Exclusive => "mutex",
            StrategyKind::Shared => "shared_mutex",
            StrategyKind::SeqLock => "seqlock",
            StrategyKind::Baseline => "baseline",
        }
    }

    /// Whether readers may run on other threads than the writer.
    pub const fn is_concurrent(self) -> bool {
        !matches!(self, StrategyKind::Unsynchronized)
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unrecognized strategy name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown strategy '{0}' (expected one of: unsynchronized, mutex, shared_mutex, seqlock, baseline)")]
pub struct ParseStrategyError(pub String);

impl FromStr for StrategyKind {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "unsynchronized" | "unsync" => Ok(StrategyKind::Unsynchronized),
            "mutex" | "exclusive" => Ok(StrategyKind::Exclusive),
            "shared_mutex" | "shared" | "rwlock" => Ok(StrategyKind::Shared),
            "seqlock" => Ok(StrategyKind::SeqLock),
            "baseline" | "memcpy" => Ok(StrategyKind::Baseline),
            _ => Err(ParseStrategyError(s.to_string())),
        }
    }
}

/// The capability shared by all strategies.
///
/// Offsets and lengths are in elements. Every method validates its arguments
/// first and leaves the ring untouched when it returns an error.
pub trait SyncStrategy<T: Element>: Sized {
    /// Which strategy this is.
    const KIND: StrategyKind;

    /// Allocate storage and synchronization state for `config`.
    fn new(config: &RingConfig) -> Result<Self>;

    /// Addressing of the ring.
    fn ring(&self) -> BlockRing;

    /// Copy `src` into the block at the write cursor, then advance the cursor.
    ///
    /// Fails with an invalid-argument error unless `src.len()` equals the
    /// block size.
    ///
    /// # Safety
    ///
    /// Single writer: no other `write` or `fill` on this strategy may run at
    /// the same time. Reads may run concurrently.
    unsafe fn write(&self, src: &[T]) -> Result<()>;

    /// Copy the block starting at element `offset` into `dst`.
    ///
    /// Fails with an invalid-argument error unless `dst.len()` equals the block
    /// size, and with an out-of-range error unless `offset` is a block-aligned
    /// offset below capacity.
    fn read(&self, dst: &mut [T], offset: usize) -> Result<()>;

    /// Set every element of the ring to `value`.
    ///
    /// # Safety
    ///
    /// Same single-writer contract as [`write`](Self::write).
    unsafe fn fill(&self, value: T);

    /// Total capacity in elements.
    #[inline]
    fn size(&self) -> usize {
        self.ring().capacity()
    }
}
