//! blindhour-sim: seeded synthetic contests for demos and tests.
//!
//! A generated [`SimDataset`] has the same shape as fetched data, so the
//! replay and reveal paths run over it unchanged.

pub mod generator;

pub use generator::{SimDataset, SimParams, generate};
