//! Products domain module.
//!
//! This crate contains the product record shape and its input validation,
//! implemented as plain data (no IO, no storage).

pub mod product;

pub use product::{NewProduct, Product};
