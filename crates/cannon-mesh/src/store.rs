use cannon_matrix::{Block, Element, MultiplyAccumulate};

use crate::error::{MeshError, Result};

/// Per-worker storage for the A, B and C blocks.
///
/// A and B are replaced wholesale on every rotation; C only ever
/// accumulates.
#[derive(Debug)]
pub struct BlockStore<T: Element> {
    rank: usize,
    order: usize,
    a: Block<T>,
    b: Block<T>,
    c: Block<T>,
}

impl<T: Element> BlockStore<T> {
    /// Take ownership of the initial operands and allocate a zeroed C-block.
    ///
    /// # Errors
    /// Returns `ShapeMismatch` if either operand is not `order` x `order`.
    pub fn new(rank: usize, order: usize, a: Block<T>, b: Block<T>) -> Result<Self> {
        check(rank, order, &a)?;
        check(rank, order, &b)?;
        Ok(BlockStore {
            rank,
            order,
            a,
            b,
            c: Block::zeros(order)?,
        })
    }

    /// Side length of the blocks.
    pub fn order(&self) -> usize {
        self.order
    }

    pub fn a(&self) -> &Block<T> {
        &self.a
    }

    pub fn b(&self) -> &Block<T> {
        &self.b
    }

    pub fn c(&self) -> &Block<T> {
        &self.c
    }

    /// C += A @ B with the current operands.
    pub fn multiply_accumulate(&mut self, kernel: &mut dyn MultiplyAccumulate<T>) -> Result<()> {
        kernel.multiply_accumulate(
            self.a.as_slice(),
            self.b.as_slice(),
            self.c.as_mut_slice(),
            self.order,
        )?;
        Ok(())
    }

    /// Checks both operands still have the expected shape.
    pub fn check_shapes(&self) -> Result<()> {
        check(self.rank, self.order, &self.a)?;
        check(self.rank, self.order, &self.b)
    }

    /// Move the operands out, leaving empty placeholders until
    /// [`install_operands`](Self::install_operands) is called.
    pub(crate) fn take_operands(&mut self) -> (Block<T>, Block<T>) {
        (
            std::mem::replace(&mut self.a, Block::empty()),
            std::mem::replace(&mut self.b, Block::empty()),
        )
    }

    pub(crate) fn install_operands(&mut self, a: Block<T>, b: Block<T>) -> Result<()> {
        check(self.rank, self.order, &a)?;
        check(self.rank, self.order, &b)?;
        self.a = a;
        self.b = b;
        Ok(())
    }

    /// Consume the store, returning the accumulated C-block.
    pub fn into_result(self) -> Block<T> {
        self.c
    }
}

fn check<T: Element>(rank: usize, order: usize, block: &Block<T>) -> Result<()> {
    block.ensure_order(order).map_err(|_| MeshError::ShapeMismatch {
        rank,
        expected: order * order,
        got: block.len(),
    })
}
