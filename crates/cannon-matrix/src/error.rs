use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatrixError {
    #[error("shape mismatch: expected {expected} elements, got {got}")]
    ShapeMismatch { expected: usize, got: usize },
    #[error("invalid matrix order {order}: {reason}")]
    InvalidOrder { order: usize, reason: String },
    #[error("failed to allocate {elements} elements")]
    Allocation { elements: usize },
    #[error("index ({row}, {col}) out of bounds for order {order}")]
    OutOfBounds { row: usize, col: usize, order: usize },
    #[error("invalid value range: {0}")]
    InvalidRange(String),
    #[error("invalid kernel parameter: {0}")]
    InvalidKernel(String),
}

pub type Result<T> = std::result::Result<T, MatrixError>;
