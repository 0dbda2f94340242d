//! Bike-share station tracker.
//!
//! Compares an operator's live station feed against its own earlier
//! snapshot and against community map data, and reports which stations
//! were added, removed, moved, or renamed.

pub mod distance;
pub mod domain;
pub mod history;
pub mod output;
pub mod reconcile;
pub mod record;
pub mod sources;
