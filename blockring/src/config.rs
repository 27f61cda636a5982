//! Ring configuration types.

use core::mem;

use crate::element::Element;
use crate::error::{Result, RingError};

/// Default byte alignment of ring storage.
pub const DEFAULT_ALIGNMENT: usize = 16;

/// Ring geometry (immutable after construction).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RingConfig {
    /// Number of blocks in the ring.
    pub num_blocks: usize,
    /// Elements per block.
    pub block_size: usize,
    /// Byte alignment of the storage base address (power of two).
    pub alignment: usize,
}

impl RingConfig {
    /// Create a configuration with the default alignment.
    ///
    /// # Arguments
    /// * `num_blocks` - Number of blocks in the ring
    /// * `block_size` - Elements per block
    #[inline]
    pub const fn new(num_blocks: usize, block_size: usize) -> Self {
        Self {
            num_blocks,
            block_size,
            alignment: DEFAULT_ALIGNMENT,
        }
    }

    /// Override the storage alignment.
    #[inline]
    pub const fn with_alignment(mut self, alignment: usize) -> Self {
        self.alignment = alignment;
        self
    }

    /// Total number of elements (`num_blocks * block_size`).
    ///
    /// Saturates on overflow; [`validate`](Self::validate) rejects such configs.
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.num_blocks.saturating_mul(self.block_size)
    }

    /// Check the configuration against element type `T`.
    pub fn validate<T: Element>(&self) -> Result<()> {
        if self.num_blocks == 0 {
            return Err(RingError::InvalidConfig {
                message: "ring must have at least one block",
            });
        }
        if self.block_size == 0 {
            return Err(RingError::InvalidConfig {
                message: "block size must be non-zero",
            });
        }
        let capacity = self
            .num_blocks
            .checked_mul(self.block_size)
            .ok_or(RingError::InvalidConfig {
                message: "ring capacity overflows usize",
            })?;
        if capacity.checked_mul(mem::size_of::<T>()).is_none() {
            return Err(RingError::InvalidConfig {
                message: "ring size in bytes overflows usize",
            });
        }
        validate_alignment::<T>(self.alignment)
    }
}

impl Default for RingConfig {
    fn default() -> Self {
        Self::new(10, 16)
    }
}

/// Alignment must be a power of two no smaller than the element.
pub(crate) fn validate_alignment<T>(alignment: usize) -> Result<()> {
    if !alignment.is_power_of_two() {
        return Err(RingError::InvalidConfig {
            message: "alignment must be a power of two",
        });
    }
    if alignment < mem::size_of::<T>() {
        return Err(RingError::InvalidConfig {
            message: "alignment must not be smaller than the element size",
        });
    }
    Ok(())
}
