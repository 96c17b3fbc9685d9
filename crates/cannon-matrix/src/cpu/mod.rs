pub mod strassen;
pub mod tiled;

pub use strassen::StrassenKernel;
pub use tiled::TiledKernel;

use crate::backend::{check_operands, MultiplyAccumulate};
use crate::dtype::Element;
use crate::error::Result;

/// C += A @ B over `n` x `n` row-major slices, in i-k-j order so the
/// innermost loop streams along rows of B and C.
pub(crate) fn accumulate_ikj<T: Element>(a: &[T], b: &[T], c: &mut [T], n: usize) {
    for i in 0..n {
        let c_row = &mut c[i * n..(i + 1) * n];
        for k in 0..n {
            let a_ik = a[i * n + k];
            let b_row = &b[k * n..(k + 1) * n];
            for (c_ij, &b_kj) in c_row.iter_mut().zip(b_row) {
                *c_ij += a_ik * b_kj;
            }
        }
    }
}

/// Pure-Rust triple-loop kernel.
///
/// Intended as a reference implementation and fallback.
#[derive(Debug, Clone)]
pub struct NaiveKernel;

impl NaiveKernel {
    pub fn new() -> Self {
        NaiveKernel
    }
}

impl Default for NaiveKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Element> MultiplyAccumulate<T> for NaiveKernel {
    fn name(&self) -> &str {
        "naive"
    }

    fn multiply_accumulate(&mut self, a: &[T], b: &[T], c: &mut [T], order: usize) -> Result<()> {
        check_operands(a, b, c, order)?;
        accumulate_ikj(a, b, c, order);
        Ok(())
    }
}
