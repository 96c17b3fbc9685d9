use cannon_matrix::{Block, Element};

use crate::error::{MeshError, Result};
use crate::fabric::{Endpoint, Tagged};
use crate::store::BlockStore;
use crate::topology::Placement;

/// One rotation step: A moves one hop left, B one hop up.
///
/// Both outgoing blocks are sent before either incoming block is awaited.
/// The received blocks replace the operands in the store. Shapes are checked
/// before anything is sent, so a malformed store never puts a partial
/// exchange on the wire.
pub(crate) fn rotate<T: Element>(
    store: &mut BlockStore<T>,
    endpoint: &Endpoint<T>,
    placement: &Placement,
    step: usize,
) -> Result<()> {
    store.check_shapes()?;
    let rank = placement.rank;
    let (a, b) = store.take_operands();

    endpoint.send_a(Tagged { step, from: rank, block: a })?;
    endpoint.send_b(Tagged { step, from: rank, block: b })?;

    let a = accept(endpoint.recv_a()?, rank, step, placement.neighbors.right)?;
    let b = accept(endpoint.recv_b()?, rank, step, placement.neighbors.down)?;
    store.install_operands(a, b)
}

fn accept<T: Element>(msg: Tagged<T>, rank: usize, step: usize, expected_from: usize) -> Result<Block<T>> {
    if msg.step != step {
        return Err(MeshError::Protocol {
            rank,
            expected_step: step,
            got_step: msg.step,
        });
    }
    if msg.from != expected_from {
        return Err(MeshError::UnexpectedSender {
            rank,
            expected: expected_from,
            got: msg.from,
        });
    }
    Ok(msg.block)
}
