//! Station reconciliation.
//!
//! Classifies every station id across two snapshots as added, removed,
//! moved, renamed, or unchanged. Comparison is a pure function of its
//! inputs; sorting for presentation happens when records are written.

mod compare;
mod config;

pub use compare::{Comparison, Renamed, compare};
pub use config::Tolerances;
