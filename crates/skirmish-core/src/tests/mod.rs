//! Crate-level test suites.
//!
//! - `scenarios.rs`: hand-placed populations with scripted dice
//! - `concurrency.rs`: threaded runs, racing resolvers and shutdown
//! - `determinism.rs`: same seed, same synchronous run
//! - `helpers.rs`: shared setup and a recording observer

mod concurrency;
mod helpers;

pub use helpers::*;
