//! Channel wiring between workers.
//!
//! Every worker gets one [`Endpoint`] holding the links it is allowed to use:
//! its scatter inbox, the outgoing and incoming rotation links for each
//! axis, the barrier, and the result outbox. The coordinator additionally
//! gets a [`CoordinatorLinks`] with the fan-out and fan-in ends.
//!
//! Rotation links are bounded with capacity 1, so a send blocks only until
//! the neighbor has taken the previous step's block. Every blocking call
//! also watches the shared abort channel, which the engine closes when any
//! worker fails.

use std::time::Duration;

use cannon_matrix::{Block, Element};
use crossbeam_channel::{bounded, select, Receiver, Sender};

use crate::error::{MeshError, Result};
use crate::topology::{Axis, Coord, Topology};

/// Uninhabited message type for the abort channel; it is only ever closed.
#[derive(Debug)]
pub(crate) enum Never {}

/// A block in flight between neighbors.
#[derive(Debug)]
pub(crate) struct Tagged<T: Element> {
    pub step: usize,
    pub from: usize,
    pub block: Block<T>,
}

/// The initial, already skewed, operands for one worker.
#[derive(Debug)]
pub(crate) struct Assignment<T: Element> {
    pub a: Block<T>,
    pub b: Block<T>,
}

/// A finished C-block on its way to the coordinator.
#[derive(Debug)]
pub(crate) struct Finished<T: Element> {
    pub rank: usize,
    pub coord: Coord,
    pub block: Block<T>,
    pub elapsed: Duration,
}

fn recv_or_abort<M>(
    rank: usize,
    rx: &Receiver<M>,
    abort: &Receiver<Never>,
    link: &'static str,
) -> Result<M> {
    select! {
        recv(rx) -> msg => msg.map_err(|_| MeshError::Disconnected { rank, link }),
        recv(abort) -> _ => Err(MeshError::Aborted { rank }),
    }
}

fn send_or_abort<M>(
    rank: usize,
    tx: &Sender<M>,
    msg: M,
    abort: &Receiver<Never>,
    link: &'static str,
) -> Result<()> {
    select! {
        send(tx, msg) -> res => res.map_err(|_| MeshError::Disconnected { rank, link }),
        recv(abort) -> _ => Err(MeshError::Aborted { rank }),
    }
}

/// Links owned by a single worker.
#[derive(Debug)]
pub(crate) struct Endpoint<T: Element> {
    rank: usize,
    assignment: Receiver<Assignment<T>>,
    a_out: Sender<Tagged<T>>,
    a_in: Receiver<Tagged<T>>,
    b_out: Sender<Tagged<T>>,
    b_in: Receiver<Tagged<T>>,
    ready: Sender<usize>,
    release: Receiver<()>,
    results: Sender<Finished<T>>,
    abort: Receiver<Never>,
}

impl<T: Element> Endpoint<T> {
    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn recv_assignment(&self) -> Result<Assignment<T>> {
        recv_or_abort(self.rank, &self.assignment, &self.abort, "scatter")
    }

    /// Send the current A-block to the left neighbor.
    pub fn send_a(&self, msg: Tagged<T>) -> Result<()> {
        send_or_abort(self.rank, &self.a_out, msg, &self.abort, "row shift")
    }

    /// Receive the next A-block from the right neighbor.
    pub fn recv_a(&self) -> Result<Tagged<T>> {
        recv_or_abort(self.rank, &self.a_in, &self.abort, "row shift")
    }

    /// Send the current B-block to the neighbor above.
    pub fn send_b(&self, msg: Tagged<T>) -> Result<()> {
        send_or_abort(self.rank, &self.b_out, msg, &self.abort, "column shift")
    }

    /// Receive the next B-block from the neighbor below.
    pub fn recv_b(&self) -> Result<Tagged<T>> {
        recv_or_abort(self.rank, &self.b_in, &self.abort, "column shift")
    }

    /// Tell the coordinator this worker reached the barrier.
    pub fn arrive(&self) -> Result<()> {
        send_or_abort(self.rank, &self.ready, self.rank, &self.abort, "barrier")
    }

    /// Block until the coordinator releases the barrier.
    pub fn wait_release(&self) -> Result<()> {
        recv_or_abort(self.rank, &self.release, &self.abort, "barrier")
    }

    pub fn submit(&self, finished: Finished<T>) -> Result<()> {
        send_or_abort(self.rank, &self.results, finished, &self.abort, "gather")
    }
}

/// Fan-out and fan-in ends held only by the coordinator.
#[derive(Debug)]
pub(crate) struct CoordinatorLinks<T: Element> {
    rank: usize,
    assignments: Vec<Sender<Assignment<T>>>,
    ready: Receiver<usize>,
    releases: Vec<Sender<()>>,
    results: Receiver<Finished<T>>,
    abort: Receiver<Never>,
}

impl<T: Element> CoordinatorLinks<T> {
    pub fn workers(&self) -> usize {
        self.assignments.len()
    }

    pub fn send_assignment(&self, to: usize, assignment: Assignment<T>) -> Result<()> {
        send_or_abort(self.rank, &self.assignments[to], assignment, &self.abort, "scatter")
    }

    /// Wait until every worker has reached the barrier, once each.
    pub fn collect_arrivals(&self) -> Result<()> {
        let mut arrived = vec![false; self.workers()];
        for _ in 0..self.workers() {
            let rank = recv_or_abort(self.rank, &self.ready, &self.abort, "barrier")?;
            match arrived.get_mut(rank) {
                Some(slot) if !*slot => *slot = true,
                _ => {
                    return Err(MeshError::Collection(format!(
                        "unexpected barrier arrival from worker {}",
                        rank
                    )))
                }
            }
        }
        Ok(())
    }

    pub fn release_all(&self) -> Result<()> {
        for tx in &self.releases {
            send_or_abort(self.rank, tx, (), &self.abort, "barrier")?;
        }
        Ok(())
    }

    pub fn recv_result(&self) -> Result<Finished<T>> {
        recv_or_abort(self.rank, &self.results, &self.abort, "gather")
    }
}

/// Build the channels for `topology`, returning the coordinator's links and
/// one endpoint per rank (in rank order).
pub(crate) fn wire<T: Element>(
    topology: &Topology,
    coordinator: usize,
    abort: &Receiver<Never>,
) -> (CoordinatorLinks<T>, Vec<Endpoint<T>>) {
    let w = topology.workers();

    let (assign_tx, assign_rx): (Vec<Sender<Assignment<T>>>, Vec<Receiver<Assignment<T>>>) =
        (0..w).map(|_| bounded(1)).unzip();
    let (a_tx, a_rx): (Vec<Sender<Tagged<T>>>, Vec<Receiver<Tagged<T>>>) =
        (0..w).map(|_| bounded(1)).unzip();
    let (b_tx, b_rx): (Vec<Sender<Tagged<T>>>, Vec<Receiver<Tagged<T>>>) =
        (0..w).map(|_| bounded(1)).unzip();
    let (release_tx, release_rx): (Vec<Sender<()>>, Vec<Receiver<()>>) =
        (0..w).map(|_| bounded(1)).unzip();
    let (ready_tx, ready_rx) = bounded(w);
    let (result_tx, result_rx) = bounded(w);
    let row_shift = topology.shift_schedule(Axis::Row);
    let column_shift = topology.shift_schedule(Axis::Column);

    let endpoints = assign_rx
        .into_iter()
        .zip(a_rx)
        .zip(b_rx)
        .zip(release_rx)
        .enumerate()
        .map(|(rank, (((assignment, a_in), b_in), release))| {
            Endpoint {
                rank,
                assignment,
                a_out: a_tx[row_shift[rank].to].clone(),
                a_in,
                b_out: b_tx[column_shift[rank].to].clone(),
                b_in,
                ready: ready_tx.clone(),
                release,
                results: result_tx.clone(),
                abort: abort.clone(),
            }
        })
        .collect();

    let links = CoordinatorLinks {
        rank: coordinator,
        assignments: assign_tx,
        ready: ready_rx,
        releases: release_tx,
        results: result_rx,
        abort: abort.clone(),
    };
    (links, endpoints)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(v: i32) -> Block<i32> {
        Block::from_vec(1, vec![v]).unwrap()
    }

    #[test]
    fn test_wire_routes_rotation_links() {
        let (_abort_tx, abort_rx) = bounded::<Never>(0);
        let topology = Topology::new(4).unwrap();
        let (_links, endpoints) = wire::<i32>(&topology, 0, &abort_rx);
        assert_eq!(endpoints.len(), 4);

        // rank 3 at (1, 1): left is rank 2, up is rank 1
        endpoints[3]
            .send_a(Tagged { step: 0, from: 3, block: block(30) })
            .unwrap();
        endpoints[3]
            .send_b(Tagged { step: 0, from: 3, block: block(31) })
            .unwrap();
        let a = endpoints[2].recv_a().unwrap();
        let b = endpoints[1].recv_b().unwrap();
        assert_eq!((a.from, a.block.as_slice()), (3, &[30][..]));
        assert_eq!((b.from, b.block.as_slice()), (3, &[31][..]));
    }

    #[test]
    fn test_abort_unblocks_receivers() {
        let (abort_tx, abort_rx) = bounded::<Never>(0);
        let topology = Topology::new(1).unwrap();
        let (_links, endpoints) = wire::<i32>(&topology, 0, &abort_rx);
        drop(abort_tx);
        assert_eq!(
            endpoints[0].recv_a().unwrap_err(),
            MeshError::Aborted { rank: 0 }
        );
    }

    #[test]
    fn test_barrier_round() {
        let (_abort_tx, abort_rx) = bounded::<Never>(0);
        let topology = Topology::new(4).unwrap();
        let (links, endpoints) = wire::<i32>(&topology, 0, &abort_rx);
        for e in &endpoints {
            e.arrive().unwrap();
        }
        links.collect_arrivals().unwrap();
        links.release_all().unwrap();
        for e in &endpoints {
            e.wait_release().unwrap();
        }
    }

    #[test]
    fn test_duplicate_arrival_rejected() {
        let (_abort_tx, abort_rx) = bounded::<Never>(0);
        let topology = Topology::new(4).unwrap();
        let (links, endpoints) = wire::<i32>(&topology, 0, &abort_rx);
        for _ in 0..4 {
            endpoints[1].arrive().unwrap();
        }
        assert!(matches!(
            links.collect_arrivals(),
            Err(MeshError::Collection(_))
        ));
    }
}
