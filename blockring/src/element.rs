//! Element types a ring can store.

use core::fmt::Debug;

mod sealed {
    pub trait Sealed {}
}

/// A fixed-size arithmetic value stored in a ring.
///
/// Implemented for the primitive integer and floating-point types only. Every
/// bit pattern of these types is a valid value, so a copy that later turns out
/// to be torn can be discarded without ever having produced an invalid `T`.
///
/// This trait is sealed.
pub trait Element: sealed::Sealed + Copy + Default + PartialEq + Debug + Send + Sync + 'static {}

macro_rules! impl_element {
    ($($t:ty),* $(,)?) => {
        $(
            impl sealed::Sealed for $t {}
            impl Element for $t {}
        )*
    };
}

impl_element!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize, f32, f64);
