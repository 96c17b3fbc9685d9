//! `cannon-matrix` - square matrices, blocks, and local multiply kernels for cannon.
//!
//! This crate provides:
//! - A row-major `Matrix` type and the `Block` sub-matrices workers own
//! - A `BlockLayout` describing how a matrix splits into a grid of blocks
//! - A `MultiplyAccumulate` trait for pluggable local kernels
//! - Naive, tiled, and Strassen CPU kernels
//! - Element type definitions (i32, i64, f32, f64) and seeded random fill

pub mod backend;
pub mod cpu;
pub mod dtype;
pub mod error;
pub mod layout;
pub mod matrix;
pub mod random;
pub mod storage;

// Re-export primary types at the crate root for convenience.
pub use backend::{KernelKind, MultiplyAccumulate};
pub use cpu::{NaiveKernel, StrassenKernel, TiledKernel};
pub use dtype::{DType, Element};
pub use error::{MatrixError, Result};
pub use layout::BlockLayout;
pub use matrix::Matrix;
pub use storage::Block;
