use cannon_matrix::KernelKind;
use cannon_mesh::EngineConfig;
use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "cannon")]
#[command(about = "Distributed square matrix multiplication with Cannon's algorithm", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Number of workers; must be a perfect square
    #[arg(short, long, env = "CANNON_WORKERS", default_value_t = 4)]
    pub workers: usize,

    /// Matrix order; must be divisible by sqrt(workers) and the alignment
    #[arg(short = 'n', long, env = "CANNON_ORDER", default_value_t = 1024)]
    pub order: usize,

    /// Required divisor of the matrix order
    #[arg(long, default_value_t = EngineConfig::DEFAULT_ALIGNMENT)]
    pub alignment: usize,

    /// Element type of the generated matrices
    #[arg(long, value_enum, default_value_t = ElementType::I32)]
    pub dtype: ElementType,

    /// Local multiply kernel each worker runs
    #[arg(short, long, value_enum, default_value_t = Kernel::Naive)]
    pub kernel: Kernel,

    /// Tile size for the tiled kernel
    #[arg(long, default_value_t = KernelKind::DEFAULT_TILE)]
    pub tile: usize,

    /// Order at or below which the Strassen kernel stops recursing
    #[arg(long, default_value_t = KernelKind::DEFAULT_STRASSEN_THRESHOLD)]
    pub threshold: usize,

    /// Smallest generated element value
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    pub min: i64,

    /// Largest generated element value
    #[arg(long, default_value_t = 10, allow_negative_numbers = true)]
    pub max: i64,

    /// RNG seed; defaults to the current time
    #[arg(long, env = "CANNON_SEED")]
    pub seed: Option<u64>,

    /// Check the result against a sequential multiplication
    #[arg(long)]
    pub verify: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    I32,
    I64,
    F32,
    F64,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kernel {
    Naive,
    Tiled,
    Strassen,
}

impl Cli {
    pub fn kernel_kind(&self) -> KernelKind {
        match self.kernel {
            Kernel::Naive => KernelKind::Naive,
            Kernel::Tiled => KernelKind::Tiled { tile: self.tile },
            Kernel::Strassen => KernelKind::Strassen {
                threshold: self.threshold,
            },
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::new(self.workers)
            .with_alignment(self.alignment)
            .with_kernel(self.kernel_kind())
    }
}
