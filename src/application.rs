//! Application layer module
//!
//! Orchestrates selection, per-page fill and batch aggregation on top of
//! the store seams.

pub mod filler;

pub use filler::FillService;
