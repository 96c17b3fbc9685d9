use std::fmt::{self, Debug};

use crate::cpu::{NaiveKernel, StrassenKernel, TiledKernel};
use crate::dtype::Element;
use crate::error::{MatrixError, Result};

/// Trait for pluggable local multiply kernels.
///
/// A kernel owns whatever scratch space it needs, which is why the multiply
/// takes `&mut self`: each worker builds its own kernel once and reuses it
/// for every step.
pub trait MultiplyAccumulate<T: Element>: Send + Debug {
    /// Returns the name of this kernel (e.g., "naive", "strassen").
    fn name(&self) -> &str;

    /// Block-local product accumulated into `c`: C += A @ B.
    ///
    /// - `a`, `b`, `c`: row-major data of shape [order, order]
    fn multiply_accumulate(&mut self, a: &[T], b: &[T], c: &mut [T], order: usize) -> Result<()>;
}

/// Checks that all three operands hold exactly `order * order` elements.
pub(crate) fn check_operands<T>(a: &[T], b: &[T], c: &[T], order: usize) -> Result<()> {
    let expected = order * order;
    for got in [a.len(), b.len(), c.len()] {
        if got != expected {
            return Err(MatrixError::ShapeMismatch { expected, got });
        }
    }
    Ok(())
}

/// Selects which local kernel each worker builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KernelKind {
    /// Straight i-k-j triple loop.
    #[default]
    Naive,
    /// Cache-blocked loops over `tile` x `tile` tiles.
    Tiled { tile: usize },
    /// Strassen recursion down to sub-problems of at most `threshold` order.
    Strassen { threshold: usize },
}

impl KernelKind {
    /// Default tile size, matching the matrix alignment constant.
    pub const DEFAULT_TILE: usize = 8;
    /// Default order below which Strassen falls back to the naive loop.
    pub const DEFAULT_STRASSEN_THRESHOLD: usize = 64;

    /// Build a kernel sized for blocks of the given order.
    ///
    /// # Errors
    /// Returns `InvalidKernel` for a zero tile or threshold, or `Allocation`
    /// if the Strassen scratch arena cannot be reserved.
    pub fn build<T: Element>(self, order: usize) -> Result<Box<dyn MultiplyAccumulate<T>>> {
        Ok(match self {
            KernelKind::Naive => Box::new(NaiveKernel::new()),
            KernelKind::Tiled { tile } => Box::new(TiledKernel::new(tile)?),
            KernelKind::Strassen { threshold } => Box::new(StrassenKernel::new(order, threshold)?),
        })
    }
}

impl fmt::Display for KernelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelKind::Naive => write!(f, "naive"),
            KernelKind::Tiled { tile } => write!(f, "tiled(tile={})", tile),
            KernelKind::Strassen { threshold } => write!(f, "strassen(threshold={})", threshold),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_operands() {
        assert!(check_operands(&[1; 4], &[1; 4], &[0; 4], 2).is_ok());
        assert_eq!(
            check_operands(&[1; 4], &[1; 3], &[0; 4], 2).unwrap_err(),
            MatrixError::ShapeMismatch { expected: 4, got: 3 }
        );
    }

    #[test]
    fn test_build_names() {
        let k = KernelKind::Naive.build::<i32>(4).unwrap();
        assert_eq!(k.name(), "naive");
        let k = KernelKind::Tiled { tile: 2 }.build::<i32>(4).unwrap();
        assert_eq!(k.name(), "tiled");
        let k = KernelKind::Strassen { threshold: 1 }.build::<i32>(4).unwrap();
        assert_eq!(k.name(), "strassen");
    }

    #[test]
    fn test_build_rejects_zero_parameters() {
        assert!(KernelKind::Tiled { tile: 0 }.build::<i32>(4).is_err());
        assert!(KernelKind::Strassen { threshold: 0 }.build::<f64>(4).is_err());
    }

    #[test]
    fn test_default_kind() {
        assert_eq!(KernelKind::default(), KernelKind::Naive);
        assert_eq!(KernelKind::Strassen { threshold: 64 }.to_string(), "strassen(threshold=64)");
    }
}
