use std::fmt;

use crate::error::{MeshError, Result};

/// Position of a worker on the torus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub fn new(row: usize, col: usize) -> Self {
        Coord { row, col }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Ranks of the four cyclic neighbors of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbors {
    pub up: usize,
    pub down: usize,
    pub left: usize,
    pub right: usize,
}

/// Everything a single worker needs to know about its place in the grid.
/// Computed once at startup and never changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub rank: usize,
    pub coord: Coord,
    pub neighbors: Neighbors,
}

/// Direction a rotation moves blocks in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// A-blocks move one hop left along their row.
    Row,
    /// B-blocks move one hop up along their column.
    Column,
}

/// One point-to-point transfer in a rotation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exchange {
    pub from: usize,
    pub to: usize,
}

/// A `q` x `q` torus of workers with row-major rank assignment
/// (`rank = row * q + col`).
///
/// Every worker derives the same mapping from the worker count alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Topology {
    workers: usize,
    q: usize,
}

impl Topology {
    /// Build the torus for `workers` workers.
    ///
    /// # Errors
    /// Returns `InvalidTopology` unless `workers` is a non-zero perfect square.
    pub fn new(workers: usize) -> Result<Self> {
        let q = isqrt(workers);
        if workers == 0 || q.checked_mul(q) != Some(workers) {
            return Err(MeshError::InvalidTopology { workers });
        }
        Ok(Topology { workers, q })
    }

    /// Total number of workers (q * q).
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Side length of the grid.
    pub fn q(&self) -> usize {
        self.q
    }

    /// Grid coordinate of `rank`.
    ///
    /// # Panics
    /// Panics if `rank >= workers()`.
    pub fn coord(&self, rank: usize) -> Coord {
        assert!(rank < self.workers, "rank {} outside grid of {}", rank, self.workers);
        Coord::new(rank / self.q, rank % self.q)
    }

    /// Rank of the worker at `coord`. Coordinates wrap around the torus.
    pub fn rank(&self, coord: Coord) -> usize {
        (coord.row % self.q) * self.q + coord.col % self.q
    }

    /// Cyclic neighbors of `rank`.
    pub fn neighbors(&self, rank: usize) -> Neighbors {
        let Coord { row, col } = self.coord(rank);
        let q = self.q;
        Neighbors {
            up: self.rank(Coord::new((row + q - 1) % q, col)),
            down: self.rank(Coord::new((row + 1) % q, col)),
            left: self.rank(Coord::new(row, (col + q - 1) % q)),
            right: self.rank(Coord::new(row, (col + 1) % q)),
        }
    }

    pub fn placement(&self, rank: usize) -> Placement {
        Placement {
            rank,
            coord: self.coord(rank),
            neighbors: self.neighbors(rank),
        }
    }

    /// Placements of every worker, in rank order.
    pub fn placements(&self) -> impl Iterator<Item = Placement> + '_ {
        (0..self.workers).map(|rank| self.placement(rank))
    }

    /// Global block the worker at `coord` starts with as its A-block:
    /// row `row`, column `(col + row) mod q`.
    pub fn a_source(&self, coord: Coord) -> Coord {
        Coord::new(coord.row, (coord.col + coord.row) % self.q)
    }

    /// Global block the worker at `coord` starts with as its B-block:
    /// row `(row + col) mod q`, column `col`.
    pub fn b_source(&self, coord: Coord) -> Coord {
        Coord::new((coord.row + coord.col) % self.q, coord.col)
    }

    /// Transfers made by every worker in one rotation step along `axis`.
    pub fn shift_schedule(&self, axis: Axis) -> Vec<Exchange> {
        self.placements()
            .map(|p| Exchange {
                from: p.rank,
                to: match axis {
                    Axis::Row => p.neighbors.left,
                    Axis::Column => p.neighbors.up,
                },
            })
            .collect()
    }
}

/// Integer square root. The float estimate is corrected in both directions;
/// products that overflow count as larger than `n`.
fn isqrt(n: usize) -> usize {
    let square_fits = |q: usize| q.checked_mul(q).is_some_and(|sq| sq <= n);
    let mut q = (n as f64).sqrt() as usize;
    while q > 0 && !square_fits(q) {
        q -= 1;
    }
    while square_fits(q + 1) {
        q += 1;
    }
    q
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_squares() {
        for (w, q) in [(1, 1), (4, 2), (9, 3), (16, 4), (64, 8)] {
            let t = Topology::new(w).unwrap();
            assert_eq!(t.q(), q);
            assert_eq!(t.workers(), w);
        }
    }

    #[test]
    fn test_not_square() {
        for w in [0, 2, 3, 5, 8, 12, 15, 17, usize::MAX, usize::MAX - 1] {
            assert_eq!(
                Topology::new(w).unwrap_err(),
                MeshError::InvalidTopology { workers: w }
            );
        }
    }

    #[test]
    fn test_rank_coord_bijection() {
        let t = Topology::new(9).unwrap();
        let mut seen = std::collections::HashSet::new();
        for rank in 0..9 {
            let c = t.coord(rank);
            assert!(c.row < 3 && c.col < 3);
            assert_eq!(t.rank(c), rank);
            assert!(seen.insert(c));
        }
        assert_eq!(t.coord(5), Coord::new(1, 2));
    }

    #[test]
    fn test_neighbors_wrap() {
        let t = Topology::new(9).unwrap();
        // rank 0 sits at (0, 0)
        let n = t.neighbors(0);
        assert_eq!(n.up, 6);
        assert_eq!(n.down, 3);
        assert_eq!(n.left, 2);
        assert_eq!(n.right, 1);
    }

    #[test]
    fn test_single_worker_is_own_neighbor() {
        let t = Topology::new(1).unwrap();
        let n = t.neighbors(0);
        assert_eq!((n.up, n.down, n.left, n.right), (0, 0, 0, 0));
    }

    #[test]
    fn test_skew_sources() {
        let t = Topology::new(16).unwrap();
        assert_eq!(t.a_source(Coord::new(1, 3)), Coord::new(1, 0));
        assert_eq!(t.b_source(Coord::new(1, 3)), Coord::new(0, 3));
        assert_eq!(t.a_source(Coord::new(0, 2)), Coord::new(0, 2));
    }

    #[test]
    fn test_skew_is_permutation() {
        let t = Topology::new(16).unwrap();
        let mut a: Vec<_> = t.placements().map(|p| t.a_source(p.coord)).collect();
        let mut b: Vec<_> = t.placements().map(|p| t.b_source(p.coord)).collect();
        a.sort();
        b.sort();
        a.dedup();
        b.dedup();
        assert_eq!(a.len(), 16);
        assert_eq!(b.len(), 16);
    }

    #[test]
    fn test_shift_schedule_is_matched() {
        // Every rank sends exactly once and receives exactly once per axis, and
        // the receiver expects its block from the sender, so each blocking
        // receive has a matching send and no wait cycle can form.
        for w in [1, 4, 9, 16, 25] {
            let t = Topology::new(w).unwrap();
            for axis in [Axis::Row, Axis::Column] {
                let schedule = t.shift_schedule(axis);
                let mut received = vec![0usize; w];
                for ex in &schedule {
                    received[ex.to] += 1;
                    let back = t.neighbors(ex.to);
                    let expected_sender = match axis {
                        Axis::Row => back.right,
                        Axis::Column => back.down,
                    };
                    assert_eq!(expected_sender, ex.from);
                }
                assert!(received.iter().all(|&n| n == 1), "w={} axis={:?}", w, axis);
            }
        }
    }

    #[test]
    fn test_isqrt() {
        assert_eq!(isqrt(0), 0);
        assert_eq!(isqrt(15), 3);
        assert_eq!(isqrt(16), 4);
        assert_eq!(isqrt(1 << 40), 1 << 20);
        let root = (1usize << (usize::BITS / 2)) - 1;
        assert_eq!(isqrt(usize::MAX), root);
        assert_eq!(isqrt(root * root), root);
    }
}
