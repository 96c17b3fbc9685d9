use crate::backend::{check_operands, MultiplyAccumulate};
use crate::cpu::accumulate_ikj;
use crate::dtype::Element;
use crate::error::{MatrixError, Result};
use crate::storage::try_filled;

/// One operand of a Strassen product, built from the quadrants
/// (0 = top-left, 1 = top-right, 2 = bottom-left, 3 = bottom-right).
#[derive(Debug, Clone, Copy)]
enum Operand {
    Quad(usize),
    Sum(usize, usize),
    Diff(usize, usize),
}

use Operand::{Diff, Quad, Sum};

/// Left and right operands of the seven products M1..M7.
const PRODUCTS: [(Operand, Operand); 7] = [
    (Sum(0, 3), Sum(0, 3)),
    (Sum(2, 3), Quad(0)),
    (Quad(0), Diff(1, 3)),
    (Quad(3), Diff(2, 0)),
    (Sum(0, 1), Quad(3)),
    (Diff(2, 0), Sum(0, 1)),
    (Diff(1, 3), Sum(2, 3)),
];

/// Scratch buffers for one recursion depth. Every buffer holds `half * half`
/// elements.
#[derive(Debug)]
struct Level<T> {
    half: usize,
    a: [Vec<T>; 4],
    b: [Vec<T>; 4],
    m: [Vec<T>; 7],
    lhs: Vec<T>,
    rhs: Vec<T>,
}

impl<T: Element> Level<T> {
    fn new(half: usize) -> Result<Self> {
        let n = half * half;
        let buf = || try_filled(n, T::zero());
        Ok(Level {
            half,
            a: [buf()?, buf()?, buf()?, buf()?],
            b: [buf()?, buf()?, buf()?, buf()?],
            m: [buf()?, buf()?, buf()?, buf()?, buf()?, buf()?, buf()?],
            lhs: buf()?,
            rhs: buf()?,
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum Stage {
    Split,
    Product(usize),
    Combine,
}

/// A pending piece of work. `slot` names the parent product this frame
/// writes into and is unused at depth 0.
#[derive(Debug, Clone, Copy)]
struct WorkItem {
    depth: usize,
    stage: Stage,
    slot: usize,
}

/// Strassen kernel driven by an explicit work stack.
///
/// The arena holds one [`Level`] per recursion depth and is allocated once
/// for a fixed block order, so repeated calls do not allocate. Recursion
/// stops when a sub-problem is at most `threshold` or has odd order; those
/// leaves use the i-k-j loop.
#[derive(Debug)]
pub struct StrassenKernel<T: Element> {
    order: usize,
    levels: Vec<Level<T>>,
    stack: Vec<WorkItem>,
}

impl<T: Element> StrassenKernel<T> {
    /// Create a kernel for `order` x `order` operands, preallocating the
    /// scratch arena.
    ///
    /// # Errors
    /// Returns `InvalidKernel` for a threshold of zero, or `Allocation` if the
    /// arena cannot be reserved.
    pub fn new(order: usize, threshold: usize) -> Result<Self> {
        if threshold == 0 {
            return Err(MatrixError::InvalidKernel(
                "strassen threshold must be at least 1".to_string(),
            ));
        }
        let mut levels = Vec::new();
        let mut size = order;
        while size > threshold && size % 2 == 0 {
            levels.push(Level::new(size / 2)?);
            size /= 2;
        }
        Ok(StrassenKernel {
            order,
            levels,
            stack: Vec::with_capacity(2 * levels_capacity(order)),
        })
    }

    fn split(&mut self, depth: usize, a: &[T], b: &[T]) {
        let (parents, rest) = self.levels.split_at_mut(depth);
        let level = &mut rest[0];
        let (src_a, src_b): (&[T], &[T]) = match parents.last() {
            Some(parent) => (parent.lhs.as_slice(), parent.rhs.as_slice()),
            None => (a, b),
        };
        let h = level.half;
        let n = 2 * h;
        for q in 0..4 {
            let (r0, c0) = ((q / 2) * h, (q % 2) * h);
            for i in 0..h {
                let src = (r0 + i) * n + c0;
                level.a[q][i * h..(i + 1) * h].copy_from_slice(&src_a[src..src + h]);
                level.b[q][i * h..(i + 1) * h].copy_from_slice(&src_b[src..src + h]);
            }
        }
    }

    /// Builds the operands of product `index` and zeroes its output slot.
    fn prepare_product(&mut self, depth: usize, index: usize) {
        let Level { a, b, m, lhs, rhs, .. } = &mut self.levels[depth];
        let (left, right) = PRODUCTS[index];
        eval(left, a, lhs);
        eval(right, b, rhs);
        m[index].fill(T::zero());
    }

    fn combine(&mut self, depth: usize, slot: usize, c: &mut [T]) {
        let (parents, rest) = self.levels.split_at_mut(depth);
        let level = &rest[0];
        let out: &mut [T] = match parents.last_mut() {
            Some(parent) => parent.m[slot].as_mut_slice(),
            None => c,
        };
        let h = level.half;
        let n = 2 * h;
        let m = &level.m;
        for i in 0..h {
            for j in 0..h {
                let x = i * h + j;
                let top = i * n + j;
                let bottom = (i + h) * n + j;
                out[top] += m[0][x] + m[3][x] - m[4][x] + m[6][x];
                out[top + h] += m[2][x] + m[4][x];
                out[bottom] += m[1][x] + m[3][x];
                out[bottom + h] += m[0][x] - m[1][x] + m[2][x] + m[5][x];
            }
        }
    }
}

fn levels_capacity(order: usize) -> usize {
    (usize::BITS - order.leading_zeros()) as usize + 1
}

fn eval<T: Element>(op: Operand, quads: &[Vec<T>; 4], out: &mut [T]) {
    match op {
        Quad(q) => out.copy_from_slice(&quads[q]),
        Sum(p, q) => {
            for ((o, &x), &y) in out.iter_mut().zip(&quads[p]).zip(&quads[q]) {
                *o = x + y;
            }
        }
        Diff(p, q) => {
            for ((o, &x), &y) in out.iter_mut().zip(&quads[p]).zip(&quads[q]) {
                *o = x - y;
            }
        }
    }
}

impl<T: Element> MultiplyAccumulate<T> for StrassenKernel<T> {
    fn name(&self) -> &str {
        "strassen"
    }

    fn multiply_accumulate(&mut self, a: &[T], b: &[T], c: &mut [T], order: usize) -> Result<()> {
        check_operands(a, b, c, order)?;
        if order != self.order {
            return Err(MatrixError::ShapeMismatch {
                expected: self.order * self.order,
                got: order * order,
            });
        }
        if self.levels.is_empty() {
            accumulate_ikj(a, b, c, order);
            return Ok(());
        }

        self.stack.clear();
        self.stack.push(WorkItem {
            depth: 0,
            stage: Stage::Split,
            slot: 0,
        });

        while let Some(item) = self.stack.pop() {
            let depth = item.depth;
            match item.stage {
                Stage::Split => {
                    self.split(depth, a, b);
                    self.stack.push(WorkItem {
                        stage: Stage::Product(0),
                        ..item
                    });
                }
                Stage::Product(index) if index < PRODUCTS.len() => {
                    self.prepare_product(depth, index);
                    self.stack.push(WorkItem {
                        stage: Stage::Product(index + 1),
                        ..item
                    });
                    if depth + 1 < self.levels.len() {
                        self.stack.push(WorkItem {
                            depth: depth + 1,
                            stage: Stage::Split,
                            slot: index,
                        });
                    } else {
                        let level = &mut self.levels[depth];
                        accumulate_ikj(&level.lhs, &level.rhs, &mut level.m[index], level.half);
                    }
                }
                Stage::Product(_) => {
                    self.stack.push(WorkItem {
                        stage: Stage::Combine,
                        ..item
                    });
                }
                Stage::Combine => self.combine(depth, item.slot, c),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::NaiveKernel;
    use approx::assert_relative_eq;

    fn naive<T: Element>(a: &[T], b: &[T], n: usize) -> Vec<T> {
        let mut c = vec![T::zero(); n * n];
        NaiveKernel::new().multiply_accumulate(a, b, &mut c, n).unwrap();
        c
    }

    #[test]
    fn test_arena_depth() {
        let depth = |order, threshold| {
            StrassenKernel::<i32>::new(order, threshold)
                .unwrap()
                .levels
                .len()
        };
        assert_eq!(depth(64, 8), 3);
        assert_eq!(depth(96, 16), 3);
        assert_eq!(depth(8, 8), 0);
        assert_eq!(depth(7, 1), 0);
    }

    #[test]
    fn test_zero_threshold_rejected() {
        assert!(matches!(
            StrassenKernel::<i32>::new(8, 0),
            Err(MatrixError::InvalidKernel(_))
        ));
    }

    #[test]
    fn test_two_by_two() {
        let mut k = StrassenKernel::new(2, 1).unwrap();
        let mut c = vec![0i32; 4];
        k.multiply_accumulate(&[1, 2, 3, 4], &[5, 6, 7, 8], &mut c, 2).unwrap();
        assert_eq!(c, vec![19, 22, 43, 50]);
    }

    #[test]
    fn test_integer_matches_naive() {
        for (n, threshold) in [(16, 2), (32, 4), (24, 2), (12, 1)] {
            let a: Vec<i64> = (0..n * n).map(|v| (v as i64 * 7 + 3) % 11 - 5).collect();
            let b: Vec<i64> = (0..n * n).map(|v| (v as i64 * 5 + 1) % 13 - 6).collect();
            let mut k = StrassenKernel::new(n, threshold).unwrap();
            let mut c = vec![0i64; n * n];
            k.multiply_accumulate(&a, &b, &mut c, n).unwrap();
            assert_eq!(c, naive(&a, &b, n), "n={} threshold={}", n, threshold);
        }
    }

    #[test]
    fn test_accumulates_and_reuses_arena() {
        let n = 8;
        let a: Vec<i32> = (0..n * n).map(|v| (v % 10) as i32 + 1).collect();
        let b: Vec<i32> = (0..n * n).map(|v| (v % 3) as i32).collect();
        let expected = naive(&a, &b, n);

        let mut k = StrassenKernel::new(n, 2).unwrap();
        let mut c = vec![0i32; n * n];
        k.multiply_accumulate(&a, &b, &mut c, n).unwrap();
        k.multiply_accumulate(&a, &b, &mut c, n).unwrap();
        let doubled: Vec<i32> = expected.iter().map(|v| v * 2).collect();
        assert_eq!(c, doubled);
    }

    #[test]
    fn test_float_close_to_naive() {
        let n = 32;
        let a: Vec<f64> = (0..n * n).map(|v| ((v * 37) % 101) as f64 / 10.0).collect();
        let b: Vec<f64> = (0..n * n).map(|v| ((v * 53) % 97) as f64 / 10.0).collect();
        let expected = naive(&a, &b, n);
        let mut k = StrassenKernel::new(n, 4).unwrap();
        let mut c = vec![0.0f64; n * n];
        k.multiply_accumulate(&a, &b, &mut c, n).unwrap();
        for (got, want) in c.iter().zip(&expected) {
            assert_relative_eq!(*got, *want, max_relative = 1e-10);
        }
    }

    #[test]
    fn test_order_mismatch() {
        let mut k = StrassenKernel::new(4, 1).unwrap();
        let mut c = vec![0i32; 4];
        assert!(k.multiply_accumulate(&[1; 4], &[1; 4], &mut c, 2).is_err());
    }
}
