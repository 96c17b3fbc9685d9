use std::fmt::Display;
use std::time::Duration;

use cannon_matrix::{Element, Matrix};
use cannon_mesh::{Engine, Product};

/// Largest top-left corner printed for small results.
const CORNER: usize = 4;
/// Results up to this order get their corner printed.
const PRINT_LIMIT: usize = 8;

/// Element comparison used when verifying a result. Integer types compare
/// exactly; float types (see [`DType::is_float`](cannon_matrix::DType::is_float))
/// allow for rounding.
pub trait Tolerance: Element {
    fn close_to(self, other: Self) -> bool;
}

impl Tolerance for i32 {
    fn close_to(self, other: Self) -> bool {
        self == other
    }
}

impl Tolerance for i64 {
    fn close_to(self, other: Self) -> bool {
        self == other
    }
}

impl Tolerance for f32 {
    fn close_to(self, other: Self) -> bool {
        (self - other).abs() <= 1e-4 * other.abs().max(1.0)
    }
}

impl Tolerance for f64 {
    fn close_to(self, other: Self) -> bool {
        (self - other).abs() <= 1e-9 * other.abs().max(1.0)
    }
}

/// Format a duration in seconds with microsecond precision.
fn format_seconds(elapsed: Duration) -> String {
    format!("{:.6}", elapsed.as_secs_f64())
}

/// Rows of the top-left `size` x `size` corner, space separated.
fn corner<T: Element + Display>(matrix: &Matrix<T>, size: usize) -> Vec<String> {
    let n = size.min(matrix.order());
    let data = matrix.as_slice();
    (0..n)
        .map(|i| {
            data[i * matrix.order()..i * matrix.order() + n]
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

/// Number of elements of `got` that differ from `expected`.
fn count_mismatches<T: Tolerance>(got: &Matrix<T>, expected: &Matrix<T>) -> usize {
    got.as_slice()
        .iter()
        .zip(expected.as_slice())
        .filter(|(g, e)| !g.close_to(**e))
        .count()
}

/// Print the timing line and, for small results, the top-left corner.
pub fn print_summary<T: Element + Display>(product: &Product<T>, engine: &Engine) {
    let order = product.matrix.order();
    println!(
        "Cannon {}x{} ({}, {} kernel) completed in {} seconds across {} worker(s).",
        order,
        order,
        product.matrix.dtype(),
        engine.config().kernel,
        format_seconds(product.elapsed),
        engine.topology().workers()
    );
    if order <= PRINT_LIMIT {
        println!("Result C[0:{n}][0:{n}]:", n = CORNER.min(order));
        for row in corner(&product.matrix, CORNER) {
            println!("{}", row);
        }
    }
}

/// Compare against the sequential product and print the outcome.
///
/// Returns true if every element matched.
pub fn print_verification<T: Tolerance>(got: &Matrix<T>, expected: &Matrix<T>) -> bool {
    let mismatches = count_mismatches(got, expected);
    let mode = if T::DTYPE.is_float() {
        "within rounding tolerance"
    } else {
        "exactly"
    };
    if mismatches == 0 {
        println!(
            "Verification passed: result matches sequential multiplication {}.",
            mode
        );
    } else {
        println!(
            "Verification FAILED: {} of {} elements differ.",
            mismatches,
            expected.as_slice().len()
        );
    }
    mismatches == 0
}
