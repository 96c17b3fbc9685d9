use crate::error::{MatrixError, Result};

/// Partition of an `order` x `order` matrix into a `grid` x `grid` array of
/// equally sized square blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockLayout {
    order: usize,
    grid: usize,
    block: usize,
}

impl BlockLayout {
    /// Create a layout splitting a matrix of the given order into
    /// `grid` blocks per side.
    ///
    /// # Errors
    /// Returns `InvalidOrder` if `grid` is zero or does not divide `order`.
    pub fn new(order: usize, grid: usize) -> Result<Self> {
        if grid == 0 {
            return Err(MatrixError::InvalidOrder {
                order,
                reason: "block grid must have at least one block per side".to_string(),
            });
        }
        if order % grid != 0 {
            return Err(MatrixError::InvalidOrder {
                order,
                reason: format!("not divisible by grid size {}", grid),
            });
        }
        Ok(BlockLayout {
            order,
            grid,
            block: order / grid,
        })
    }

    /// Order of the full matrix.
    pub fn order(&self) -> usize {
        self.order
    }

    /// Number of blocks per side.
    pub fn grid(&self) -> usize {
        self.grid
    }

    /// Side length of each block.
    pub fn block_order(&self) -> usize {
        self.block
    }

    /// Number of elements in each block.
    pub fn block_len(&self) -> usize {
        self.block * self.block
    }

    /// Global (row, col) of the top-left element of block (`row`, `col`).
    pub fn origin(&self, row: usize, col: usize) -> (usize, usize) {
        (row * self.block, col * self.block)
    }

    pub(crate) fn check_block(&self, row: usize, col: usize) -> Result<()> {
        if row >= self.grid || col >= self.grid {
            return Err(MatrixError::OutOfBounds {
                row,
                col,
                order: self.grid,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let l = BlockLayout::new(12, 3).unwrap();
        assert_eq!(l.order(), 12);
        assert_eq!(l.grid(), 3);
        assert_eq!(l.block_order(), 4);
        assert_eq!(l.block_len(), 16);
        assert_eq!(l.origin(2, 1), (8, 4));
    }

    #[test]
    fn test_layout_not_divisible() {
        assert!(BlockLayout::new(10, 3).is_err());
    }

    #[test]
    fn test_layout_zero_grid() {
        assert!(BlockLayout::new(8, 0).is_err());
    }

    #[test]
    fn test_check_block() {
        let l = BlockLayout::new(4, 2).unwrap();
        assert!(l.check_block(1, 1).is_ok());
        assert!(l.check_block(2, 0).is_err());
    }
}
