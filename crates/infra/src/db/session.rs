//! Unit-of-work handle over the inventory store.
//!
//! A `Session` owns at most one open transaction. Writes begin one on demand
//! (auto-begin) and it stays open until `commit()` or `rollback()`; the next
//! write begins a fresh one. Reads run inside the open transaction when there
//! is one (so they see the session's own uncommitted writes) and on a pooled
//! connection otherwise.
//!
//! Dropping a session with an open transaction rolls it back and returns the
//! connection to the pool; both come from sqlx's own `Drop` for
//! `Transaction`, which queues the rollback on the connection.

use serde::Serialize;
use sqlx::sqlite::{Sqlite, SqliteConnection, SqlitePool};
use sqlx::{QueryBuilder, Transaction};
use tracing::debug;

use stockroom_core::{ProductId, StockId};
use stockroom_inventory::{Stock, clamp_quantity};
use stockroom_products::{NewProduct, Product};

use super::rows::{ProductRow, ProductStockRow, StockRow};
use crate::error::{InventoryError, is_unique_violation, map_sqlx_error};

/// Run a read on the open transaction if there is one, else on the pool.
macro_rules! read_with {
    ($session:expr, $query:expr, $method:ident) => {
        match $session.tx.as_mut() {
            Some(tx) => $query.$method(&mut **tx).await,
            None => $query.$method(&$session.pool).await,
        }
    };
}

const PRODUCT_STOCK_SELECT: &str = r#"
    SELECT
        p.id,
        p.name,
        p.price,
        p.description,
        COALESCE(SUM(s.quantity), 0) AS quantity
    FROM products p
    LEFT JOIN stocks s ON s.product_id = p.id
"#;

/// Predicate for product queries.
#[derive(Debug, Clone, PartialEq)]
pub enum ProductFilter {
    All,
    Id(ProductId),
    /// Exact, case-sensitive name match.
    Name(String),
    /// Substring match on name (ASCII case-insensitive, SQLite `LIKE`).
    NameContains(String),
    /// Inclusive price range.
    PriceBetween { min: f64, max: f64 },
}

impl ProductFilter {
    fn push_where(&self, qb: &mut QueryBuilder<'static, Sqlite>) {
        match self {
            ProductFilter::All => {}
            ProductFilter::Id(id) => {
                qb.push(" WHERE id = ").push_bind(id.get());
            }
            ProductFilter::Name(name) => {
                qb.push(" WHERE name = ").push_bind(name.clone());
            }
            ProductFilter::NameContains(fragment) => {
                qb.push(" WHERE name LIKE ")
                    .push_bind(format!("%{}%", escape_like(fragment)))
                    .push(" ESCAPE '\\'");
            }
            ProductFilter::PriceBetween { min, max } => {
                qb.push(" WHERE price BETWEEN ")
                    .push_bind(*min)
                    .push(" AND ")
                    .push_bind(*max);
            }
        }
    }
}

fn escape_like(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len());
    for c in fragment.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// A product joined with its on-hand quantity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductStock {
    pub product: Product,
    pub quantity: i64,
}

impl From<ProductStockRow> for ProductStock {
    fn from(row: ProductStockRow) -> Self {
        Self {
            product: row.product.into(),
            quantity: row.quantity,
        }
    }
}

pub struct Session {
    pool: SqlitePool,
    tx: Option<Transaction<'static, Sqlite>>,
}

impl core::fmt::Debug for Session {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Session")
            .field("in_transaction", &self.tx.is_some())
            .finish()
    }
}

impl Session {
    pub(crate) fn new(pool: SqlitePool) -> Self {
        Self { pool, tx: None }
    }

    pub fn in_transaction(&self) -> bool {
        self.tx.is_some()
    }

    /// Open a transaction now if none is open.
    ///
    /// Reads issued after this run inside the transaction, so a
    /// check-then-write sequence sees one consistent snapshot.
    pub async fn begin(&mut self) -> Result<(), InventoryError> {
        self.write_conn().await.map(|_| ())
    }

    /// Durably apply everything written since the transaction began.
    /// A no-op when nothing is open.
    pub async fn commit(&mut self) -> Result<(), InventoryError> {
        if let Some(tx) = self.tx.take() {
            tx.commit()
                .await
                .map_err(|e| map_sqlx_error("commit", e))?;
            debug!("transaction committed");
        }
        Ok(())
    }

    /// Discard everything written since the transaction began.
    /// A no-op when nothing is open.
    pub async fn rollback(&mut self) -> Result<(), InventoryError> {
        if let Some(tx) = self.tx.take() {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            debug!("transaction rolled back");
        }
        Ok(())
    }

    async fn write_conn(&mut self) -> Result<&mut SqliteConnection, InventoryError> {
        let tx = match self.tx.take() {
            Some(tx) => tx,
            None => {
                let tx = self
                    .pool
                    .begin()
                    .await
                    .map_err(|e| map_sqlx_error("begin", e))?;
                debug!("transaction started");
                tx
            }
        };
        Ok(&mut **self.tx.insert(tx))
    }

    // Reads

    pub async fn find_products(
        &mut self,
        filter: &ProductFilter,
    ) -> Result<Vec<Product>, InventoryError> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT id, name, price, description FROM products");
        filter.push_where(&mut qb);
        qb.push(" ORDER BY id");

        let rows = read_with!(self, qb.build_query_as::<ProductRow>(), fetch_all)
            .map_err(|e| map_sqlx_error("find_products", e))?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    pub async fn find_product_by_name(
        &mut self,
        name: &str,
    ) -> Result<Option<Product>, InventoryError> {
        let found = self
            .find_products(&ProductFilter::Name(name.to_string()))
            .await?;
        Ok(found.into_iter().next())
    }

    pub async fn find_product_by_id(
        &mut self,
        product_id: ProductId,
    ) -> Result<Option<Product>, InventoryError> {
        let row = read_with!(
            self,
            sqlx::query_as::<_, ProductRow>(
                "SELECT id, name, price, description FROM products WHERE id = ?1",
            )
            .bind(product_id.get()),
            fetch_optional
        )
        .map_err(|e| map_sqlx_error("find_product_by_id", e))?;
        Ok(row.map(Product::from))
    }

    pub async fn list_products(&mut self) -> Result<Vec<Product>, InventoryError> {
        self.find_products(&ProductFilter::All).await
    }

    /// First stock row (lowest id) for a product.
    pub async fn find_stock_by_product_id(
        &mut self,
        product_id: ProductId,
    ) -> Result<Option<Stock>, InventoryError> {
        let row = read_with!(
            self,
            sqlx::query_as::<_, StockRow>(
                r#"
                SELECT id, product_id, quantity
                FROM stocks
                WHERE product_id = ?1
                ORDER BY id
                LIMIT 1
                "#,
            )
            .bind(product_id.get()),
            fetch_optional
        )
        .map_err(|e| map_sqlx_error("find_stock_by_product_id", e))?;
        Ok(row.map(Stock::from))
    }

    pub async fn list_stocks(&mut self) -> Result<Vec<Stock>, InventoryError> {
        let rows = read_with!(
            self,
            sqlx::query_as::<_, StockRow>("SELECT id, product_id, quantity FROM stocks ORDER BY id"),
            fetch_all
        )
        .map_err(|e| map_sqlx_error("list_stocks", e))?;
        Ok(rows.into_iter().map(Stock::from).collect())
    }

    pub async fn product_with_stock(
        &mut self,
        product_id: ProductId,
    ) -> Result<Option<ProductStock>, InventoryError> {
        let sql = format!("{PRODUCT_STOCK_SELECT} WHERE p.id = ?1 GROUP BY p.id");
        let row = read_with!(
            self,
            sqlx::query_as::<_, ProductStockRow>(&sql).bind(product_id.get()),
            fetch_optional
        )
        .map_err(|e| map_sqlx_error("product_with_stock", e))?;
        Ok(row.map(ProductStock::from))
    }

    pub async fn list_inventory(&mut self) -> Result<Vec<ProductStock>, InventoryError> {
        let sql = format!("{PRODUCT_STOCK_SELECT} GROUP BY p.id ORDER BY p.id");
        let rows = read_with!(self, sqlx::query_as::<_, ProductStockRow>(&sql), fetch_all)
            .map_err(|e| map_sqlx_error("list_inventory", e))?;
        Ok(rows.into_iter().map(ProductStock::from).collect())
    }

    // Writes (all inside the session transaction)

    /// Insert a product and return it with its generated id.
    pub async fn insert_product(&mut self, product: NewProduct) -> Result<Product, InventoryError> {
        product.validate()?;

        let conn = self.write_conn().await?;
        let result = sqlx::query("INSERT INTO products (name, price, description) VALUES (?1, ?2, ?3)")
            .bind(product.name.as_str())
            .bind(product.price)
            .bind(product.description.as_deref())
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    InventoryError::DuplicateName(product.name.clone())
                } else {
                    map_sqlx_error("insert_product", e)
                }
            })?;

        let id = ProductId::from_raw(result.last_insert_rowid());
        Ok(product.into_product(id))
    }

    /// Insert a stock row for `product_id`. Negative quantities are stored as zero.
    pub async fn insert_stock(
        &mut self,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Stock, InventoryError> {
        let quantity = clamp_quantity(quantity);

        let conn = self.write_conn().await?;
        let result = sqlx::query("INSERT INTO stocks (product_id, quantity) VALUES (?1, ?2)")
            .bind(product_id.get())
            .bind(quantity)
            .execute(&mut *conn)
            .await
            .map_err(|e| map_sqlx_error("insert_stock", e))?;

        Ok(Stock::new(
            StockId::from_raw(result.last_insert_rowid()),
            product_id,
            quantity,
        ))
    }

    /// Persist the quantity carried by `stock`.
    pub async fn update_stock_quantity(&mut self, stock: &Stock) -> Result<(), InventoryError> {
        let conn = self.write_conn().await?;
        let result = sqlx::query("UPDATE stocks SET quantity = ?1 WHERE id = ?2")
            .bind(stock.quantity())
            .bind(stock.id_typed().get())
            .execute(&mut *conn)
            .await
            .map_err(|e| map_sqlx_error("update_stock_quantity", e))?;

        if result.rows_affected() == 0 {
            return Err(InventoryError::not_found(stock.product_id()));
        }
        Ok(())
    }

    /// Delete a product row. Returns whether a row was removed.
    pub async fn delete_product(&mut self, product_id: ProductId) -> Result<bool, InventoryError> {
        let conn = self.write_conn().await?;
        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(product_id.get())
            .execute(&mut *conn)
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every stock row for a product. Returns the number removed.
    pub async fn delete_stocks_for_product(
        &mut self,
        product_id: ProductId,
    ) -> Result<u64, InventoryError> {
        let conn = self.write_conn().await?;
        let result = sqlx::query("DELETE FROM stocks WHERE product_id = ?1")
            .bind(product_id.get())
            .execute(&mut *conn)
            .await
            .map_err(|e| map_sqlx_error("delete_stocks_for_product", e))?;
        Ok(result.rows_affected())
    }
}

/// Only records the discard; the rollback itself happens when the
/// `Transaction` field is dropped right after this runs.
impl Drop for Session {
    fn drop(&mut self) {
        if self.tx.is_some() {
            debug!("session dropped with an open transaction; sqlx rolls it back");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_like_escapes_wildcards() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("TV"), "TV");
    }
}
