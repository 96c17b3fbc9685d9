use crate::dtype::{DType, Element};
use crate::error::{MatrixError, Result};
use crate::layout::BlockLayout;
use crate::storage::{square_len, try_filled, Block};

/// A dense square matrix stored contiguously in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix<T: Element> {
    order: usize,
    data: Vec<T>,
}

impl<T: Element> Matrix<T> {
    /// Create a zero-filled matrix of the given order.
    ///
    /// # Errors
    /// Returns `Allocation` if `order * order` elements cannot be reserved.
    pub fn zeros(order: usize) -> Result<Self> {
        Ok(Matrix {
            order,
            data: try_filled(square_len(order)?, T::zero())?,
        })
    }

    /// Create a matrix from row-major data.
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
        Ok(Matrix { order, data })
    }

    /// Create a matrix whose element (i, j) is `f(i, j)`.
    pub fn from_fn(order: usize, mut f: impl FnMut(usize, usize) -> T) -> Result<Self> {
        let mut m = Self::zeros(order)?;
        for i in 0..order {
            for j in 0..order {
                m.data[i * order + j] = f(i, j);
            }
        }
        Ok(m)
    }

    /// Number of rows (and columns).
    pub fn order(&self) -> usize {
        self.order
    }

    /// Element type of this matrix.
    pub fn dtype(&self) -> DType {
        T::DTYPE
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Copy block (`row`, `col`) of `layout` out into a fresh contiguous block.
    pub fn extract_block(&self, layout: &BlockLayout, row: usize, col: usize) -> Result<Block<T>> {
        self.check_layout(layout)?;
        layout.check_block(row, col)?;

        let b = layout.block_order();
        let (r0, c0) = layout.origin(row, col);
        let len = layout.block_len();
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| MatrixError::Allocation { elements: len })?;
        for i in 0..b {
            let start = (r0 + i) * self.order + c0;
            data.extend_from_slice(&self.data[start..start + b]);
        }
        Block::from_vec(b, data)
    }

    /// Overwrite block (`row`, `col`) of `layout` with the contents of `block`.
    pub fn write_block(
        &mut self,
        layout: &BlockLayout,
        row: usize,
        col: usize,
        block: &Block<T>,
    ) -> Result<()> {
        self.check_layout(layout)?;
        layout.check_block(row, col)?;
        let b = layout.block_order();
        block.ensure_order(b)?;

        let (r0, c0) = layout.origin(row, col);
        let src = block.as_slice();
        for i in 0..b {
            let start = (r0 + i) * self.order + c0;
            self.data[start..start + b].copy_from_slice(&src[i * b..(i + 1) * b]);
        }
        Ok(())
    }

    /// Sequential triple-loop product, used as the correctness oracle for the
    /// distributed and blocked kernels.
    pub fn reference_product(&self, other: &Matrix<T>) -> Result<Matrix<T>> {
        self.check_same_order(other)?;
        let n = self.order;
        let mut out = Self::zeros(n)?;
        for i in 0..n {
            for j in 0..n {
                let mut sum = T::zero();
                for k in 0..n {
                    sum += self.data[i * n + k] * other.data[k * n + j];
                }
                out.data[i * n + j] = sum;
            }
        }
        Ok(out)
    }

    fn check_layout(&self, layout: &BlockLayout) -> Result<()> {
        if layout.order() != self.order {
            return Err(MatrixError::ShapeMismatch {
                expected: self.data.len(),
                got: square_len(layout.order()).unwrap_or(usize::MAX),
            });
        }
        Ok(())
    }

    fn check_same_order(&self, other: &Matrix<T>) -> Result<()> {
        if self.order != other.order {
            return Err(MatrixError::ShapeMismatch {
                expected: self.data.len(),
                got: other.data.len(),
            });
        }
        Ok(())
    }
}
