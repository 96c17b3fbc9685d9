use std::ops::RangeInclusive;

use rand::distributions::uniform::SampleUniform;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::dtype::Element;
use crate::error::{MatrixError, Result};
use crate::matrix::Matrix;

/// Inclusive value range used by the reference workload.
pub const DEFAULT_RANGE: RangeInclusive<i32> = 1..=10;

/// Generate an `order` x `order` matrix with elements drawn uniformly from
/// `range`, using a seeded RNG so runs are reproducible.
///
/// # Errors
/// Returns `InvalidRange` if the range is empty.
pub fn uniform<T>(order: usize, range: RangeInclusive<T>, seed: u64) -> Result<Matrix<T>>
where
    T: Element + SampleUniform,
{
    let (low, high) = range.into_inner();
    if low > high {
        return Err(MatrixError::InvalidRange(format!(
            "{:?} is greater than {:?}",
            low, high
        )));
    }

    let dist = Uniform::new_inclusive(low, high);
    let mut rng = StdRng::seed_from_u64(seed);
    Matrix::from_fn(order, |_, _| dist.sample(&mut rng))
}
