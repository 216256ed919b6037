//! Infrastructure layer: SQLite store, sessions, and inventory operations.

pub mod config;
pub mod db;
pub mod error;
pub mod operations;

pub use config::StoreConfig;
pub use db::{ProductFilter, ProductStock, Session, Store};
pub use error::InventoryError;
pub use operations::{ProductAdded, add_product, add_stock, remove_product_by_id, remove_stock};
