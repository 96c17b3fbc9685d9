use cannon_matrix::{BlockLayout, Element, Matrix};
use tracing::{debug, info};

use crate::error::Result;
use crate::fabric::{Assignment, CoordinatorLinks, Endpoint};
use crate::store::BlockStore;
use crate::topology::{Coord, Placement, Topology};

/// Where one worker's initial blocks come from in the global matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub rank: usize,
    pub a_from: Coord,
    pub b_from: Coord,
}

/// Skewed source blocks for every worker, in rank order.
pub fn plan(topology: &Topology) -> Vec<Route> {
    topology
        .placements()
        .map(|p| Route {
            rank: p.rank,
            a_from: topology.a_source(p.coord),
            b_from: topology.b_source(p.coord),
        })
        .collect()
}

/// Cut A and B into blocks and send each worker, the coordinator included,
/// its skewed pair.
pub(crate) fn scatter<T: Element>(
    a: &Matrix<T>,
    b: &Matrix<T>,
    layout: &BlockLayout,
    topology: &Topology,
    links: &CoordinatorLinks<T>,
) -> Result<()> {
    for route in plan(topology) {
        let assignment = Assignment {
            a: a.extract_block(layout, route.a_from.row, route.a_from.col)?,
            b: b.extract_block(layout, route.b_from.row, route.b_from.col)?,
        };
        debug!(
            to = route.rank,
            a_from = %route.a_from,
            b_from = %route.b_from,
            "sending initial blocks"
        );
        links.send_assignment(route.rank, assignment)?;
    }
    info!(
        workers = topology.workers(),
        block = layout.block_order(),
        "distribution complete"
    );
    Ok(())
}

/// Wait for this worker's initial blocks and build its store.
pub(crate) fn receive<T: Element>(
    endpoint: &Endpoint<T>,
    placement: &Placement,
    layout: &BlockLayout,
) -> Result<BlockStore<T>> {
    let Assignment { a, b } = endpoint.recv_assignment()?;
    BlockStore::new(placement.rank, layout.block_order(), a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fabric::{wire, Never};
    use crossbeam_channel::bounded;
    use std::collections::HashSet;

    #[test]
    fn test_plan_uses_every_block_once() {
        let t = Topology::new(9).unwrap();
        let routes = plan(&t);
        assert_eq!(routes.len(), 9);
        let a: HashSet<_> = routes.iter().map(|r| r.a_from).collect();
        let b: HashSet<_> = routes.iter().map(|r| r.b_from).collect();
        assert_eq!(a.len(), 9);
        assert_eq!(b.len(), 9);
    }

    #[test]
    fn test_plan_skew() {
        let t = Topology::new(4).unwrap();
        let routes = plan(&t);
        // rank 3 at (1, 1)
        assert_eq!(routes[3].a_from, Coord::new(1, 0));
        assert_eq!(routes[3].b_from, Coord::new(0, 1));
        // rank 0 keeps its own blocks
        assert_eq!(routes[0].a_from, Coord::new(0, 0));
        assert_eq!(routes[0].b_from, Coord::new(0, 0));
    }

    #[test]
    fn test_scatter_delivers_skewed_blocks() {
        let (_abort_tx, abort_rx) = bounded::<Never>(0);
        let t = Topology::new(4).unwrap();
        let layout = BlockLayout::new(4, 2).unwrap();
        let a = Matrix::from_fn(4, |i, j| (i * 4 + j) as i32).unwrap();
        let b = Matrix::from_fn(4, |i, j| 100 + (i * 4 + j) as i32).unwrap();
        let (links, endpoints) = wire::<i32>(&t, 0, &abort_rx);

        scatter(&a, &b, &layout, &t, &links).unwrap();

        let stores: Vec<_> = endpoints
            .iter()
            .map(|e| receive(e, &t.placement(e.rank()), &layout).unwrap())
            .collect();
        // rank 1 at (0, 1): A from block (0, 1), B from block (1, 1)
        assert_eq!(stores[1].a().as_slice(), &[2, 3, 6, 7]);
        assert_eq!(stores[1].b().as_slice(), &[110, 111, 114, 115]);
        // rank 2 at (1, 0): A from block (1, 1), B from block (1, 0)
        assert_eq!(stores[2].a().as_slice(), &[10, 11, 14, 15]);
        assert_eq!(stores[2].b().as_slice(), &[108, 109, 112, 113]);
    }
}
