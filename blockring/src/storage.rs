//! Over-aligned contiguous element storage.
//!
//! [`AlignedBuffer`] owns one heap region of `len` elements whose base address
//! is a multiple of a caller-chosen power-of-two alignment. Strategies share a
//! buffer between threads and copy whole blocks in and out of it through the
//! crate-internal raw copy methods; everything else goes through bounds-checked
//! accessors.

use core::fmt;
use core::mem;
use core::ptr::{self, NonNull};
use std::alloc::{self, Layout};

use crate::config::{validate_alignment, DEFAULT_ALIGNMENT};
use crate::element::Element;
use crate::error::{Result, RingError};

/// Heap buffer of `T` with a configurable base alignment.
pub struct AlignedBuffer<T: Element> {
    /// Base of the allocation (dangling when `len == 0`).
    ptr: NonNull<T>,
    /// Number of elements.
    len: usize,
    /// Byte alignment of `ptr`.
    alignment: usize,
}

// Safety: the buffer owns its region like a `Box<[T]>`. Shared references only
// hand out reads; concurrent raw copies are coordinated by the strategies.
unsafe impl<T: Element> Send for AlignedBuffer<T> {}
unsafe impl<T: Element> Sync for AlignedBuffer<T> {}

impl<T: Element> AlignedBuffer<T> {
    /// Allocate `len` elements aligned to `alignment` bytes.
    ///
    /// The contents are unspecified until [`fill`](Self::fill) or a write.
    pub fn new(len: usize, alignment: usize) -> Result<Self> {
        validate_alignment::<T>(alignment)?;

        if len == 0 {
            return Ok(Self {
                ptr: NonNull::dangling(),
                len: 0,
                alignment,
            });
        }

        let layout = Self::layout(len, alignment)?;

        // Zeroed so that reading before the first fill is merely meaningless,
        // not undefined.
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let ptr = NonNull::new(raw as *mut T).ok_or(RingError::AllocationFailed {
            bytes: layout.size(),
            alignment,
        })?;

        Ok(Self {
            ptr,
            len,
            alignment,
        })
    }

    /// A zero-length buffer that owns no allocation.
    pub fn empty() -> Self {
        Self {
            ptr: NonNull::dangling(),
            len: 0,
            alignment: DEFAULT_ALIGNMENT.max(mem::size_of::<T>()),
        }
    }

    fn layout(len: usize, alignment: usize) -> Result<Layout> {
        let bytes = len
            .checked_mul(mem::size_of::<T>())
            .ok_or(RingError::InvalidConfig {
                message: "buffer size in bytes overflows usize",
            })?;
        Layout::from_size_align(bytes, alignment).map_err(|_| RingError::InvalidConfig {
            message: "buffer layout exceeds isize::MAX",
        })
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if the buffer holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Byte alignment of the base address.
    #[inline]
    pub fn alignment(&self) -> usize {
        self.alignment
    }

    /// Base pointer.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    /// Pointer to element `d`.
    ///
    /// Fails with [`RingError::OutOfRange`] unless `d` is in `[0, len - 1]`.
    #[inline]
    pub fn offset_ptr(&self, d: usize) -> Result<NonNull<T>> {
        if d < self.len {
            // Safety: d is in bounds of the allocation.
            Ok(unsafe { NonNull::new_unchecked(self.ptr.as_ptr().add(d)) })
        } else {
            Err(RingError::OutOfRange {
                offset: d,
                len: self.len,
            })
        }
    }

    /// The whole buffer as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        unsafe { core::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// The whole buffer as a mutable slice.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        unsafe { core::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    /// Set every element to `value`.
    pub fn fill(&mut self, value: T) {
        self.as_mut_slice().fill(value);
    }

    /// Copy `src` into the buffer starting at element `offset`.
    ///
    /// # Safety
    ///
    /// - `offset + src.len()` must not exceed `len`
    /// - no other thread may access the target range unless the caller's
    ///   protocol tolerates (and detects) the overlap
    #[inline]
    pub(crate) unsafe fn copy_in(&self, offset: usize, src: &[T]) {
        debug_assert!(offset + src.len() <= self.len);
        ptr::copy_nonoverlapping(src.as_ptr(), self.ptr.as_ptr().add(offset), src.len());
    }

    /// Copy `dst.len()` elements starting at `offset` into `dst`.
    ///
    /// # Safety
    ///
    /// Same contract as [`copy_in`](Self::copy_in).
    #[inline]
    pub(crate) unsafe fn copy_out(&self, offset: usize, dst: &mut [T]) {
        debug_assert!(offset + dst.len() <= self.len);
        ptr::copy_nonoverlapping(self.ptr.as_ptr().add(offset), dst.as_mut_ptr(), dst.len());
    }

    /// Set `count` elements starting at `offset` to `value`.
    ///
    /// # Safety
    ///
    /// Same contract as [`copy_in`](Self::copy_in).
    pub(crate) unsafe fn fill_range(&self, offset: usize, count: usize, value: T) {
        debug_assert!(offset + count <= self.len);
        let base = self.ptr.as_ptr().add(offset);
        for i in 0..count {
            base.add(i).write(value);
        }
    }
}

impl<T: Element> Drop for AlignedBuffer<T> {
    fn drop(&mut self) {
        if self.len != 0 {
            unsafe {
                let layout = Layout::from_size_align_unchecked(
                    self.len * mem::size_of::<T>(),
                    self.alignment,
                );
                alloc::dealloc(self.ptr.as_ptr() as *mut u8, layout);
            }
        }
    }
}

impl<T: Element> Clone for AlignedBuffer<T> {
    fn clone(&self) -> Self {
        if self.len == 0 {
            return Self {
                ptr: NonNull::dangling(),
                len: 0,
                alignment: self.alignment,
            };
        }

        // The layout was valid when `self` was allocated.
        let layout = unsafe {
            Layout::from_size_align_unchecked(self.len * mem::size_of::<T>(), self.alignment)
        };
        let raw = unsafe { alloc::alloc(layout) };
        let Some(ptr) = NonNull::new(raw as *mut T) else {
            alloc::handle_alloc_error(layout);
        };
        unsafe { ptr::copy_nonoverlapping(self.ptr.as_ptr(), ptr.as_ptr(), self.len) };

        Self {
            ptr,
            len: self.len,
            alignment: self.alignment,
        }
    }
}

impl<T: Element> Default for AlignedBuffer<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Element> fmt::Debug for AlignedBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlignedBuffer")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .field("alignment", &self.alignment)
            .finish()
    }
}
