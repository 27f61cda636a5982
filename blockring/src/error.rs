//! Error types for blockring operations.
//!
//! Every failure is local to a single call and is reported before any state is
//! touched. [`RingError::kind`] groups the variants into the coarse categories
//! callers usually branch on.

use thiserror::Error;

/// Coarse classification of a [`RingError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A caller-supplied argument is malformed (wrong length, bad geometry).
    InvalidArgument,
    /// An offset lies outside the buffer or off a block boundary.
    OutOfRange,
    /// The allocator could not provide the requested region.
    Allocation,
}

/// Errors that can occur during blockring operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RingError {
    /// A source or destination slice does not hold exactly one block.
    #[error("invalid block length: expected {expected} elements, got {got}")]
    BlockSizeMismatch {
        /// The ring's block size in elements.
        expected: usize,
        /// Length of the slice that was passed.
        got: usize,
    },

    /// Ring geometry or alignment rejected at construction.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error.
        message: &'static str,
    },

    /// Offset past the end of the buffer.
    #[error("offset ({offset}) exceeds valid range [0 .. {len})")]
    OutOfRange {
        /// The requested offset.
        offset: usize,
        /// Number of addressable elements.
        len: usize,
    },

    /// Offset that does not start a block.
    #[error("offset ({offset}) is not a multiple of block size {block_size}")]
    Misaligned {
        /// The requested offset.
        offset: usize,
        /// The ring's block size in elements.
        block_size: usize,
    },

    /// The global allocator returned null.
    #[error("failed to allocate {bytes} bytes aligned to {alignment}")]
    AllocationFailed {
        /// Requested size in bytes.
        bytes: usize,
        /// Requested alignment in bytes.
        alignment: usize,
    },
}

impl RingError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RingError::BlockSizeMismatch { .. } | RingError::InvalidConfig { .. } => {
                ErrorKind::InvalidArgument
            }
            RingError::OutOfRange { .. } | RingError::Misaligned { .. } => ErrorKind::OutOfRange,
            RingError::AllocationFailed { .. } => ErrorKind::Allocation,
        }
    }

    /// Shorthand for `kind() == ErrorKind::InvalidArgument`.
    #[inline]
    pub fn is_invalid_argument(&self) -> bool {
        self.kind() == ErrorKind::InvalidArgument
    }

    /// Shorthand for `kind() == ErrorKind::OutOfRange`.
    #[inline]
    pub fn is_out_of_range(&self) -> bool {
        self.kind() == ErrorKind::OutOfRange
    }
}

/// Result type alias for blockring operations.
pub type Result<T> = core::result::Result<T, RingError>;
