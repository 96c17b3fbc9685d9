use crate::backend::{check_operands, MultiplyAccumulate};
use crate::dtype::Element;
use crate::error::{MatrixError, Result};

/// Cache-blocked kernel that walks the operands in `tile` x `tile` tiles.
///
/// Orders that are not a multiple of the tile size are handled by clipping
/// the trailing tiles.
#[derive(Debug, Clone)]
pub struct TiledKernel {
    tile: usize,
}

impl TiledKernel {
    /// Create a tiled kernel.
    ///
    /// # Errors
    /// Returns `InvalidKernel` for a tile size of zero.
    pub fn new(tile: usize) -> Result<Self> {
        if tile == 0 {
            return Err(MatrixError::InvalidKernel(
                "tile size must be at least 1".to_string(),
            ));
        }
        Ok(TiledKernel { tile })
    }
}

impl<T: Element> MultiplyAccumulate<T> for TiledKernel {
    fn name(&self) -> &str {
        "tiled"
    }

    fn multiply_accumulate(&mut self, a: &[T], b: &[T], c: &mut [T], order: usize) -> Result<()> {
        check_operands(a, b, c, order)?;
        let n = order;
        let t = self.tile;

        for ii in (0..n).step_by(t) {
            let i_end = (ii + t).min(n);
            for kk in (0..n).step_by(t) {
                let k_end = (kk + t).min(n);
                for jj in (0..n).step_by(t) {
                    let j_end = (jj + t).min(n);
                    for i in ii..i_end {
                        for k in kk..k_end {
                            let a_ik = a[i * n + k];
                            let b_row = &b[k * n + jj..k * n + j_end];
                            let c_row = &mut c[i * n + jj..i * n + j_end];
                            for (c_ij, &b_kj) in c_row.iter_mut().zip(b_row) {
                                *c_ij += a_ik * b_kj;
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
