use std::time::Duration;

use cannon_matrix::{BlockLayout, Element, Matrix};
use tracing::info;

use crate::error::{MeshError, Result};
use crate::fabric::{CoordinatorLinks, Endpoint, Finished};
use crate::store::BlockStore;
use crate::topology::{Placement, Topology};

/// Output of one distributed multiplication.
#[derive(Debug, Clone, PartialEq)]
pub struct Product<T: Element> {
    /// The assembled result matrix.
    pub matrix: Matrix<T>,
    /// Longest time any worker spent in the rotate-and-multiply phase.
    pub elapsed: Duration,
}

/// Send this worker's finished C-block to the coordinator.
pub(crate) fn submit<T: Element>(
    endpoint: &Endpoint<T>,
    placement: &Placement,
    store: BlockStore<T>,
    elapsed: Duration,
) -> Result<()> {
    endpoint.submit(Finished {
        rank: placement.rank,
        coord: placement.coord,
        block: store.into_result(),
        elapsed,
    })
}

/// Receive every worker's C-block and assemble the result.
pub(crate) fn gather<T: Element>(
    links: &CoordinatorLinks<T>,
    layout: &BlockLayout,
    topology: &Topology,
) -> Result<Product<T>> {
    let product = assemble(
        layout,
        topology,
        (0..links.workers()).map(|_| links.recv_result()),
    )?;
    info!(
        order = layout.order(),
        elapsed_ms = product.elapsed.as_secs_f64() * 1e3,
        "collection complete"
    );
    Ok(product)
}

/// Writes each finished block at its own (row, col) position. C is never
/// skewed, so no offset is applied. Each block must arrive exactly once.
fn assemble<T: Element>(
    layout: &BlockLayout,
    topology: &Topology,
    finished: impl IntoIterator<Item = Result<Finished<T>>>,
) -> Result<Product<T>> {
    let mut matrix = Matrix::zeros(layout.order())?;
    let mut written = vec![false; topology.workers()];
    let mut elapsed = Duration::ZERO;

    for msg in finished {
        let msg = msg?;
        if msg.rank >= topology.workers() || topology.coord(msg.rank) != msg.coord {
            return Err(MeshError::Collection(format!(
                "worker {} reported block {} which it does not own",
                msg.rank, msg.coord
            )));
        }
        if std::mem::replace(&mut written[msg.rank], true) {
            return Err(MeshError::Collection(format!(
                "block {} received twice",
                msg.coord
            )));
        }
        matrix.write_block(layout, msg.coord.row, msg.coord.col, &msg.block)?;
        elapsed = elapsed.max(msg.elapsed);
    }

    if let Some(missing) = written.iter().position(|w| !w) {
        return Err(MeshError::Collection(format!(
            "block {} was never received",
            topology.coord(missing)
        )));
    }

    Ok(Product { matrix, elapsed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cannon_matrix::Block;

    fn finished(t: &Topology, rank: usize, ms: u64) -> Result<Finished<i32>> {
        let coord = t.coord(rank);
        Ok(Finished {
            rank,
            coord,
            block: Block::from_vec(2, vec![(coord.row * 10 + coord.col) as i32; 4]).unwrap(),
            elapsed: Duration::from_millis(ms),
        })
    }

    #[test]
    fn test_assemble_places_blocks_by_coordinate() {
        let t = Topology::new(4).unwrap();
        let layout = BlockLayout::new(4, 2).unwrap();
        // arrival order is irrelevant
        let msgs = [3, 1, 0, 2].into_iter().map(|r| finished(&t, r, r as u64 * 5));
        let p = assemble(&layout, &t, msgs).unwrap();
        assert_eq!(
            p.matrix.as_slice(),
            &[0, 0, 1, 1, 0, 0, 1, 1, 10, 10, 11, 11, 10, 10, 11, 11]
        );
        assert_eq!(p.elapsed, Duration::from_millis(15));
    }

    #[test]
    fn test_assemble_rejects_duplicate() {
        let t = Topology::new(4).unwrap();
        let layout = BlockLayout::new(4, 2).unwrap();
        let msgs = [0, 1, 1, 2].into_iter().map(|r| finished(&t, r, 0));
        assert!(matches!(
            assemble(&layout, &t, msgs),
            Err(MeshError::Collection(_))
        ));
    }

    #[test]
    fn test_assemble_rejects_missing() {
        let t = Topology::new(4).unwrap();
        let layout = BlockLayout::new(4, 2).unwrap();
        let msgs = [0, 1, 2].into_iter().map(|r| finished(&t, r, 0));
        let err = assemble(&layout, &t, msgs).unwrap_err();
        assert_eq!(
            err,
            MeshError::Collection("block (1, 1) was never received".to_string())
        );
    }

    #[test]
    fn test_assemble_rejects_wrong_owner() {
        let t = Topology::new(4).unwrap();
        let layout = BlockLayout::new(4, 2).unwrap();
        let mut bad = finished(&t, 0, 0).unwrap();
        bad.coord = t.coord(3);
        assert!(assemble(&layout, &t, [Ok(bad)]).is_err());
    }

    #[test]
    fn test_assemble_propagates_receive_error() {
        let t = Topology::new(1).unwrap();
        let layout = BlockLayout::new(2, 1).unwrap();
        let msgs: Vec<Result<Finished<i32>>> = vec![Err(MeshError::Aborted { rank: 0 })];
        assert_eq!(
            assemble(&layout, &t, msgs).unwrap_err(),
            MeshError::Aborted { rank: 0 }
        );
    }
}
