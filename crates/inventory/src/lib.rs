//! Inventory domain module.
//!
//! Stock quantities and the arithmetic that keeps them non-negative,
//! implemented as deterministic logic (no IO, no storage).

pub mod stock;

pub use stock::{Stock, clamp_quantity};
