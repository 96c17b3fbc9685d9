use std::time::Instant;

use cannon_matrix::{BlockLayout, Element, KernelKind, Matrix};
use tracing::{debug, info_span};

use crate::collector::{self, Product};
use crate::distributor;
use crate::error::Result;
use crate::fabric::{CoordinatorLinks, Endpoint};
use crate::rotation;
use crate::topology::{Placement, Topology};

/// Capabilities only the coordinating worker has: the full input matrices
/// and the fan-out/fan-in links.
#[derive(Debug)]
pub(crate) struct Coordinator<'a, T: Element> {
    a: &'a Matrix<T>,
    b: &'a Matrix<T>,
    links: CoordinatorLinks<T>,
}

impl<'a, T: Element> Coordinator<'a, T> {
    pub fn new(a: &'a Matrix<T>, b: &'a Matrix<T>, links: CoordinatorLinks<T>) -> Self {
        Coordinator { a, b, links }
    }
}

#[derive(Debug)]
pub(crate) enum Role<'a, T: Element> {
    Coordinator(Coordinator<'a, T>),
    Member,
}

/// One participant in the multiplication, run on its own thread.
#[derive(Debug)]
pub(crate) struct Worker<'a, T: Element> {
    placement: Placement,
    topology: Topology,
    layout: BlockLayout,
    kernel: KernelKind,
    endpoint: Endpoint<T>,
    role: Role<'a, T>,
}

impl<'a, T: Element> Worker<'a, T> {
    pub fn new(
        topology: Topology,
        layout: BlockLayout,
        kernel: KernelKind,
        endpoint: Endpoint<T>,
        role: Role<'a, T>,
    ) -> Self {
        Worker {
            placement: topology.placement(endpoint.rank()),
            topology,
            layout,
            kernel,
            endpoint,
            role,
        }
    }

    /// Distribute, synchronize, run the q multiply/rotate steps, and collect.
    ///
    /// Returns the product on the coordinator and `None` everywhere else.
    pub fn run(&mut self) -> Result<Option<Product<T>>> {
        let p = self.placement;
        let span = info_span!("worker", rank = p.rank, row = p.coord.row, col = p.coord.col);
        let _enter = span.enter();

        if let Role::Coordinator(c) = &self.role {
            distributor::scatter(c.a, c.b, &self.layout, &self.topology, &c.links)?;
        }
        let mut store = distributor::receive(&self.endpoint, &p, &self.layout)?;
        let mut kernel = self.kernel.build::<T>(self.layout.block_order())?;

        self.barrier()?;

        let start = Instant::now();
        for step in 0..self.topology.q() {
            store.multiply_accumulate(kernel.as_mut())?;
            rotation::rotate(&mut store, &self.endpoint, &p, step)?;
            debug!(step, "step complete");
        }
        let elapsed = start.elapsed();

        collector::submit(&self.endpoint, &p, store, elapsed)?;
        match &self.role {
            Role::Coordinator(c) => Ok(Some(collector::gather(
                &c.links,
                &self.layout,
                &self.topology,
            )?)),
            Role::Member => Ok(None),
        }
    }

    /// Every worker checks in with the coordinator, which releases them all
    /// once the last one has arrived.
    fn barrier(&self) -> Result<()> {
        self.endpoint.arrive()?;
        if let Role::Coordinator(c) = &self.role {
            c.links.collect_arrivals()?;
            c.links.release_all()?;
        }
        self.endpoint.wait_release()
    }
}
