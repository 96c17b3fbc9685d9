//! `cannon-mesh` - Cannon's algorithm over a torus of message-passing workers.
//!
//! This crate provides:
//! - `Topology`: the q x q torus, rank/coordinate mapping, and skew sources
//! - `Engine`: validates inputs, spawns one thread per worker, and returns
//!   the assembled `Product`
//! - The distributor, rotation, and collector phases the workers run
//! - `BlockStore`: the per-worker A, B and C blocks
//!
//! Workers share no mutable state; every block moves over a
//! `crossbeam-channel` link, and any worker failure aborts the whole grid.

pub mod collector;
pub mod config;
pub mod distributor;
pub mod engine;
pub mod error;
mod fabric;
mod rotation;
pub mod store;
pub mod topology;
mod worker;

pub use collector::Product;
pub use config::EngineConfig;
pub use distributor::{plan, Route};
pub use engine::{Engine, COORDINATOR_RANK};
pub use error::{MeshError, Result};
pub use store::BlockStore;
pub use topology::{Axis, Coord, Exchange, Neighbors, Placement, Topology};
