use cannon_matrix::KernelKind;

use crate::error::{MeshError, Result};

/// Configuration for one multiply engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Number of workers. Must be a perfect square.
    pub workers: usize,
    /// Matrix orders must be a multiple of this value (default 8).
    pub alignment: usize,
    /// Local kernel every worker runs between rotations.
    pub kernel: KernelKind,
}

impl EngineConfig {
    pub const DEFAULT_ALIGNMENT: usize = 8;

    /// Configuration with the default alignment and the naive kernel.
    pub fn new(workers: usize) -> Self {
        EngineConfig {
            workers,
            alignment: Self::DEFAULT_ALIGNMENT,
            kernel: KernelKind::default(),
        }
    }

    pub fn with_alignment(mut self, alignment: usize) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_kernel(mut self, kernel: KernelKind) -> Self {
        self.kernel = kernel;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.alignment == 0 {
            return Err(MeshError::InvalidConfig(
                "alignment must be at least 1".to_string(),
            ));
        }
        match self.kernel {
            KernelKind::Tiled { tile: 0 } => Err(MeshError::InvalidConfig(
                "tile size must be at least 1".to_string(),
            )),
            KernelKind::Strassen { threshold: 0 } => Err(MeshError::InvalidConfig(
                "strassen threshold must be at least 1".to_string(),
            )),
            _ => Ok(()),
        }
    }
}
