//! SQLx row types and their conversion into domain records.

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

use stockroom_core::{ProductId, StockId};
use stockroom_inventory::Stock;
use stockroom_products::Product;

#[derive(Debug)]
pub(crate) struct ProductRow {
    id: i64,
    name: String,
    price: f64,
    description: Option<String>,
}

impl<'r> FromRow<'r, SqliteRow> for ProductRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(ProductRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            price: row.try_get("price")?,
            description: row.try_get("description")?,
        })
    }
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product::new(ProductId::from_raw(row.id), row.name, row.price, row.description)
    }
}

#[derive(Debug)]
pub(crate) struct StockRow {
    id: i64,
    product_id: i64,
    quantity: i64,
}

impl<'r> FromRow<'r, SqliteRow> for StockRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(StockRow {
            id: row.try_get("id")?,
            product_id: row.try_get("product_id")?,
            quantity: row.try_get("quantity")?,
        })
    }
}

impl From<StockRow> for Stock {
    fn from(row: StockRow) -> Self {
        Stock::new(
            StockId::from_raw(row.id),
            ProductId::from_raw(row.product_id),
            row.quantity,
        )
    }
}

/// Product columns plus the summed quantity of its stock rows.
#[derive(Debug)]
pub(crate) struct ProductStockRow {
    pub(crate) product: ProductRow,
    pub(crate) quantity: i64,
}

impl<'r> FromRow<'r, SqliteRow> for ProductStockRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(ProductStockRow {
            product: ProductRow::from_row(row)?,
            quantity: row.try_get("quantity")?,
        })
    }
}
