use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    #[error("invalid topology: {workers} workers is not a non-zero perfect square")]
    InvalidTopology { workers: usize },
    #[error("invalid matrix size: order {order} must be divisible by grid size {q} and alignment {alignment}")]
    InvalidMatrixSize {
        order: usize,
        q: usize,
        alignment: usize,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("worker {rank}: block shape mismatch: expected {expected} elements, got {got}")]
    ShapeMismatch {
        rank: usize,
        expected: usize,
        got: usize,
    },
    #[error("worker {rank}: expected block for step {expected_step}, got step {got_step}")]
    Protocol {
        rank: usize,
        expected_step: usize,
        got_step: usize,
    },
    #[error("worker {rank}: expected block from worker {expected}, got it from worker {got}")]
    UnexpectedSender {
        rank: usize,
        expected: usize,
        got: usize,
    },
    #[error("collection failed: {0}")]
    Collection(String),
    #[error("worker {rank}: {link} link disconnected")]
    Disconnected { rank: usize, link: &'static str },
    #[error("worker {rank}: aborted after a failure elsewhere in the grid")]
    Aborted { rank: usize },
    #[error("worker {rank} panicked")]
    WorkerPanicked { rank: usize },
    #[error("failed to spawn worker {rank}: {reason}")]
    Spawn { rank: usize, reason: String },
    #[error("matrix error: {0}")]
    Matrix(#[from] cannon_matrix::MatrixError),
}

impl MeshError {
    /// Returns true for errors that only echo a failure on another worker.
    pub fn is_secondary(&self) -> bool {
        matches!(self, MeshError::Aborted { .. } | MeshError::Disconnected { .. })
    }
}

pub type Result<T> = std::result::Result<T, MeshError>;
