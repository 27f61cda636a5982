//! blockring - a fixed-capacity block ring shared by one writer and many readers.
//!
//! The ring holds `num_blocks` blocks of `block_size` elements in one
//! over-aligned allocation. A single writer appends whole blocks at a cursor
//! that wraps around the ring; any number of readers copy out whole blocks at
//! any block-aligned offset, concurrently with the writer.
//!
//! How a block copy is protected is a compile-time choice of strategy:
//!
//! - [`Unsynchronized`]: no protection; the ring cannot leave its thread
//! - [`ExclusiveLock`]: one mutex per block
//! - [`SharedLock`]: one reader-writer lock per block
//! - [`SeqLock`]: one sequence counter per block; the writer never blocks and
//!   readers retry copies that overlapped a write
//! - [`Baseline`]: disjoint read/write buffers, the cost of the copies alone
//!
//! Whatever the strategy, a reader never accepts a block that mixes two
//! writes. There is no staleness bound: a reader may see an old block, but
//! always a complete one.
//!
//! # Example
//!
//! ```
//! use blockring::{RingBuffer, RingConfig, SeqLock};
//! use std::thread;
//!
//! let mut ring = RingBuffer::<u64, SeqLock<u64>>::new(RingConfig::new(10, 16))?;
//! ring.fill(0);
//!
//! let reader = ring.reader();
//! let handle = thread::spawn(move || {
//!     let mut block = [0u64; 16];
//!     reader.read(&mut block, 0).unwrap();
//!     assert!(block.iter().all(|&v| v == block[0]));
//! });
//!
//! for v in 1..=100u64 {
//!     ring.write(&[v; 16])?;
//! }
//! handle.join().unwrap();
//! # Ok::<(), blockring::RingError>(())
//! ```
//!
//! # Crate Features
//!
//! - `serde`: `Serialize`/`Deserialize` for [`RingConfig`]

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod addressing;
pub mod config;
pub mod element;
pub mod error;
pub mod ring;
pub mod storage;
pub mod strategy;

pub use addressing::{BlockRing, WriteCursor};
pub use config::{RingConfig, DEFAULT_ALIGNMENT};
pub use element::Element;
pub use error::{ErrorKind, Result, RingError};
pub use ring::{RingBuffer, RingReader};
pub use storage::AlignedBuffer;
pub use strategy::{
    Baseline, BlockLock, ExclusiveLock, Locked, ParseStrategyError, SeqLock, SharedLock,
    StrategyKind, SyncStrategy, Unsynchronized,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::RingConfig;
    pub use crate::error::{ErrorKind, RingError};
    pub use crate::ring::{RingBuffer, RingReader};
    pub use crate::strategy::{
        Baseline, ExclusiveLock, SeqLock, SharedLock, StrategyKind, SyncStrategy, Unsynchronized,
    };
}
