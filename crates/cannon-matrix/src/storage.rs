use crate::dtype::Element;
use crate::error::{MatrixError, Result};

/// Allocate a vector of `n` copies of `value`, reporting allocation failure
/// as an error instead of aborting the process.
pub fn try_filled<T: Clone>(n: usize, value: T) -> Result<Vec<T>> {
    let mut data = Vec::new();
    data.try_reserve_exact(n)
        .map_err(|_| MatrixError::Allocation { elements: n })?;
    data.resize(n, value);
    Ok(data)
}

/// Number of elements in an `order` x `order` buffer.
///
/// # Errors
/// Returns `Allocation` if the count does not fit in `usize`.
pub fn square_len(order: usize) -> Result<usize> {
    order
        .checked_mul(order)
        .ok_or(MatrixError::Allocation { elements: usize::MAX })
}

/// A contiguous, row-major square sub-matrix owned by a single worker.
#[derive(Debug, Clone, PartialEq)]
pub struct Block<T: Element> {
    order: usize,
    data: Vec<T>,
}

impl<T: Element> Block<T> {
    /// Create a zero-filled block of `order` x `order` elements.
    pub fn zeros(order: usize) -> Result<Self> {
        Ok(Block {
            order,
            data: try_filled(square_len(order)?, T::zero())?,
        })
    }

    /// A zero-sized placeholder left behind while a block is in flight.
    pub fn empty() -> Self {
        Block {
            order: 0,
            data: Vec::new(),
        }
    }

    /// Wrap an existing buffer as a block.
    ///
    /// # Errors
    /// Returns `ShapeMismatch` if `data.len() != order * order`.
    pub fn from_vec(order: usize, data: Vec<T>) -> Result<Self> {
        let expected = square_len(order)?;
        if data.len() != expected {
            return Err(MatrixError::ShapeMismatch {
                expected,
                got: data.len(),
            });
        }
        Ok(Block { order, data })
    }

    /// Side length of the block.
    pub fn order(&self) -> usize {
        self.order
    }

    /// Number of elements in the block.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the block holds no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Checks that this block has the expected side length and that its
    /// buffer length agrees with it.
    pub fn ensure_order(&self, order: usize) -> Result<()> {
        let expected = square_len(order)?;
        if self.order != order || self.data.len() != expected {
            return Err(MatrixError::ShapeMismatch {
                expected,
                got: self.data.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_filled() {
        let v = try_filled(4, 7i32).unwrap();
        assert_eq!(v, vec![7, 7, 7, 7]);
    }

    #[test]
    fn test_try_filled_overflow() {
        let err = try_filled(usize::MAX, 0u64).unwrap_err();
        assert_eq!(err, MatrixError::Allocation { elements: usize::MAX });
    }

    #[test]
    fn test_zeros_block() {
        let b = Block::<f32>::zeros(3).unwrap();
        assert_eq!(b.order(), 3);
        assert_eq!(b.len(), 9);
        assert!(!b.is_empty());
        assert_eq!(b.as_slice(), &[0.0; 9]);
    }

    #[test]
    fn test_empty_block() {
        let b = Block::<i32>::empty();
        assert!(b.is_empty());
        assert!(b.ensure_order(2).is_err());
    }

    #[test]
    fn test_from_vec_mismatch() {
        assert!(Block::from_vec(2, vec![1i32, 2, 3]).is_err());
    }

    #[test]
    fn test_ensure_order() {
        let b = Block::from_vec(2, vec![1i64, 2, 3, 4]).unwrap();
        assert!(b.ensure_order(2).is_ok());
        assert_eq!(
            b.ensure_order(3).unwrap_err(),
            MatrixError::ShapeMismatch { expected: 9, got: 4 }
        );
    }

    #[test]
    fn test_mut_slice() {
        let mut b = Block::<i32>::zeros(2).unwrap();
        b.as_mut_slice()[3] = 42;
        assert_eq!(b.as_slice(), &[0, 0, 0, 42]);
    }

    #[test]
    fn test_square_len_overflow() {
        let order = 1usize << (usize::BITS / 2);
        assert_eq!(square_len(3).unwrap(), 9);
        assert_eq!(
            square_len(order).unwrap_err(),
            MatrixError::Allocation { elements: usize::MAX }
        );
        assert_eq!(
            Block::<i32>::zeros(order).unwrap_err(),
            MatrixError::Allocation { elements: usize::MAX }
        );
        assert!(Block::<i32>::from_vec(order, Vec::new()).is_err());
    }
}
