use std::panic::{self, AssertUnwindSafe};
use std::thread;

use cannon_matrix::{BlockLayout, Element, Matrix};
use crossbeam_channel::{bounded, unbounded, Sender};
use tracing::{info, warn};

use crate::collector::Product;
use crate::config::EngineConfig;
use crate::error::{MeshError, Result};
use crate::fabric::{self, Never};
use crate::topology::Topology;
use crate::worker::{Coordinator, Role, Worker};

/// Rank that holds the full matrices before distribution and after collection.
pub const COORDINATOR_RANK: usize = 0;

/// Cannon's algorithm over a `q` x `q` torus of worker threads.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    topology: Topology,
}

impl Engine {
    /// Validate the configuration and build the worker topology.
    ///
    /// # Errors
    /// Returns `InvalidTopology` if the worker count is not a perfect square,
    /// or `InvalidConfig` for a zero alignment or tile size.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let topology = Topology::new(config.workers)?;
        Ok(Engine { config, topology })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Checks that matrices of `order` can be split across the grid and
    /// returns the resulting block layout.
    pub fn layout_for(&self, order: usize) -> Result<BlockLayout> {
        let q = self.topology.q();
        let alignment = self.config.alignment;
        if order == 0 || order % q != 0 || order % alignment != 0 {
            return Err(MeshError::InvalidMatrixSize { order, q, alignment });
        }
        Ok(BlockLayout::new(order, q)?)
    }

    /// Compute `a @ b` across all workers.
    ///
    /// The first error raised by any worker aborts every other worker and is
    /// returned; no partial result is ever produced.
    pub fn multiply<T: Element>(&self, a: &Matrix<T>, b: &Matrix<T>) -> Result<Product<T>> {
        if a.order() != b.order() {
            return Err(MeshError::InvalidMatrixSize {
                order: b.order(),
                q: self.topology.q(),
                alignment: self.config.alignment,
            });
        }
        let layout = self.layout_for(a.order())?;

        info!(
            workers = self.topology.workers(),
            order = a.order(),
            dtype = %a.dtype(),
            block_bytes = layout.block_len() * a.dtype().size_in_bytes(),
            kernel = %self.config.kernel,
            "starting distributed multiply"
        );

        let (abort_tx, abort_rx) = bounded::<Never>(0);
        let (links, endpoints) = fabric::wire::<T>(&self.topology, COORDINATOR_RANK, &abort_rx);
        let mut coordinator = Some(Coordinator::new(a, b, links));

        let tasks = endpoints
            .into_iter()
            .map(|endpoint| {
                let rank = endpoint.rank();
                let role = if rank == COORDINATOR_RANK {
                    coordinator.take().map_or(Role::Member, Role::Coordinator)
                } else {
                    Role::Member
                };
                let mut worker =
                    Worker::new(self.topology, layout, self.config.kernel, endpoint, role);
                (rank, move || worker.run())
            })
            .collect();

        supervise(tasks, abort_tx)?.ok_or_else(|| {
            MeshError::Collection("coordinator produced no result".to_string())
        })
    }
}

/// Run every `(rank, task)` on its own scoped thread and wait for all of them.
///
/// The first failure closes the abort channel so blocked peers return
/// instead of waiting forever. A root-cause error is preferred over the
/// `Aborted`/`Disconnected` echoes it triggers. On success, returns the
/// value produced by whichever task returned one.
fn supervise<R, F>(tasks: Vec<(usize, F)>, abort: Sender<Never>) -> Result<Option<R>>
where
    R: Send,
    F: FnMut() -> Result<Option<R>> + Send,
{
    let (failure_tx, failure_rx) = unbounded::<MeshError>();

    thread::scope(|s| {
        let mut handles = Vec::with_capacity(tasks.len());
        let mut spawn_failure = None;

        for (rank, mut task) in tasks {
            let failure_tx = failure_tx.clone();
            let spawned = thread::Builder::new()
                .name(format!("cannon-worker-{}", rank))
                .spawn_scoped(s, move || {
                    let outcome = panic::catch_unwind(AssertUnwindSafe(&mut task))
                        .unwrap_or_else(|_| Err(MeshError::WorkerPanicked { rank }));
                    match outcome {
                        Ok(value) => value,
                        Err(err) => {
                            // Report before the task and its links are dropped
                            // so the root cause arrives ahead of any echo.
                            let _ = failure_tx.send(err);
                            None
                        }
                    }
                });

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(err) => {
                    spawn_failure = Some(MeshError::Spawn {
                        rank,
                        reason: err.to_string(),
                    });
                    break;
                }
            }
        }
        drop(failure_tx);

        // Either the first failure, or nothing once every task has finished
        // and dropped its reporting handle.
        let failure = spawn_failure.or_else(|| failure_rx.recv().ok());
        if let Some(err) = &failure {
            warn!(error = %err, "aborting all workers");
            drop(abort);
        }

        let mut result = None;
        for handle in handles {
            if let Ok(Some(value)) = handle.join() {
                result = Some(value);
            }
        }

        // All tasks have exited; if the first report was only an echo of the
        // abort, a later one may carry the root cause.
        match failure {
            Some(first) if first.is_secondary() => Err(failure_rx
                .try_iter()
                .find(|err| !err.is_secondary())
                .unwrap_or(first)),
            Some(first) => Err(first),
            None => Ok(result),
        }
    })
}
