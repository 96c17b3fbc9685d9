use std::fmt;
use std::fmt::Debug;
use std::ops::{Add, AddAssign, Mul, Sub};

/// Element types a matrix can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    /// 32-bit signed integer.
    I32,
    /// 64-bit signed integer.
    I64,
    /// 32-bit floating point.
    F32,
    /// 64-bit floating point.
    F64,
}

impl DType {
    /// Returns the size in bytes of a single element.
    pub fn size_in_bytes(&self) -> usize {
        match self {
            DType::I32 | DType::F32 => 4,
            DType::I64 | DType::F64 => 8,
        }
    }

    /// Returns true for floating point types, where reassociated sums may
    /// differ from the naive loop by rounding and results are compared
    /// within a tolerance.
    pub fn is_float(&self) -> bool {
        matches!(self, DType::F32 | DType::F64)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DType::I32 => write!(f, "i32"),
            DType::I64 => write!(f, "i64"),
            DType::F32 => write!(f, "f32"),
            DType::F64 => write!(f, "f64"),
        }
    }
}

/// A fixed-width numeric element that can be stored in a [`Matrix`](crate::Matrix)
/// and moved between worker threads.
///
/// Integer arithmetic is not checked or saturated; keeping the value range small
/// enough to avoid overflow is up to the caller.
pub trait Element:
    Copy
    + Default
    + Debug
    + PartialEq
    + PartialOrd
    + Send
    + Sync
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + AddAssign
{
    /// Runtime tag for this element type.
    const DTYPE: DType;

    /// Additive identity.
    fn zero() -> Self {
        Self::default()
    }
}

impl Element for i32 {
    const DTYPE: DType = DType::I32;
}

impl Element for i64 {
    const DTYPE: DType = DType::I64;
}

impl Element for f32 {
    const DTYPE: DType = DType::F32;
}

impl Element for f64 {
    const DTYPE: DType = DType::F64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_in_bytes() {
        assert_eq!(DType::I32.size_in_bytes(), 4);
        assert_eq!(DType::I64.size_in_bytes(), 8);
        assert_eq!(DType::F32.size_in_bytes(), 4);
        assert_eq!(DType::F64.size_in_bytes(), 8);
    }

    #[test]
    fn test_element_tags() {
        assert_eq!(<i32 as Element>::DTYPE, DType::I32);
        assert_eq!(<f64 as Element>::DTYPE, DType::F64);
        assert!(!DType::I64.is_float());
        assert!(DType::F32.is_float());
    }

    #[test]
    fn test_zero() {
        assert_eq!(<i64 as Element>::zero(), 0);
        assert_eq!(<f32 as Element>::zero(), 0.0);
    }

    #[test]
    fn test_display() {
        assert_eq!(DType::I32.to_string(), "i32");
        assert_eq!(DType::F64.to_string(), "f64");
    }
}
