//! Table definitions for `products` and `stocks`.
//!
//! `stocks.product_id` references `products(id)` with `ON DELETE CASCADE`, so
//! deleting a product can never leave an orphaned stock row behind (foreign
//! keys are switched on for every pooled connection). `products.name` is
//! `UNIQUE`, which closes the check-then-insert race between concurrent
//! sessions adding the same name.

use sqlx::sqlite::SqliteConnection;

use crate::error::{InventoryError, map_sqlx_error};

pub const PRODUCTS_TABLE: &str = "products";
pub const STOCKS_TABLE: &str = "stocks";

const CREATE_STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        name        TEXT    NOT NULL UNIQUE,
        price       REAL    NOT NULL,
        description TEXT    NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS stocks (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        product_id INTEGER NOT NULL REFERENCES products(id) ON DELETE CASCADE,
        quantity   INTEGER NOT NULL DEFAULT 0 CHECK (quantity >= 0)
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_stocks_product_id ON stocks (product_id)
    "#,
];

// Dependents first.
const DROP_STATEMENTS: &[&str] = &[
    "DROP INDEX IF EXISTS idx_stocks_product_id",
    "DROP TABLE IF EXISTS stocks",
    "DROP TABLE IF EXISTS products",
];

/// Create any missing tables. Existing tables and their rows are untouched.
pub async fn create_all(conn: &mut SqliteConnection) -> Result<(), InventoryError> {
    for statement in CREATE_STATEMENTS {
        sqlx::query(*statement)
            .execute(&mut *conn)
            .await
            .map_err(|e| map_sqlx_error("create_schema", e))?;
    }
    Ok(())
}

/// Drop every table this crate owns. All rows are discarded.
pub async fn drop_all(conn: &mut SqliteConnection) -> Result<(), InventoryError> {
    for statement in DROP_STATEMENTS {
        sqlx::query(*statement)
            .execute(&mut *conn)
            .await
            .map_err(|e| map_sqlx_error("drop_schema", e))?;
    }
    Ok(())
}

/// Names of the tables currently present, sorted.
pub async fn existing_tables(conn: &mut SqliteConnection) -> Result<Vec<String>, InventoryError> {
    sqlx::query_scalar::<_, String>(
        r#"
        SELECT name
        FROM sqlite_master
        WHERE type = 'table' AND name IN (?1, ?2)
        ORDER BY name
        "#,
    )
    .bind(PRODUCTS_TABLE)
    .bind(STOCKS_TABLE)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("existing_tables", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Connection;

    async fn memory_conn() -> SqliteConnection {
        let options = crate::config::StoreConfig::in_memory()
            .connect_options()
            .unwrap();
        SqliteConnection::connect_with(&options).await.unwrap()
    }

    #[tokio::test]
    async fn create_all_is_idempotent() {
        let mut conn = memory_conn().await;
        create_all(&mut conn).await.unwrap();
        create_all(&mut conn).await.unwrap();

        let tables = existing_tables(&mut conn).await.unwrap();
        assert_eq!(tables, vec!["products".to_string(), "stocks".to_string()]);
    }

    #[tokio::test]
    async fn drop_all_removes_both_tables() {
        let mut conn = memory_conn().await;
        create_all(&mut conn).await.unwrap();
        drop_all(&mut conn).await.unwrap();

        assert!(existing_tables(&mut conn).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stock_quantity_cannot_be_negative() {
        let mut conn = memory_conn().await;
        create_all(&mut conn).await.unwrap();

        sqlx::query("INSERT INTO products (name, price) VALUES ('TV', 999.0)")
            .execute(&mut conn)
            .await
            .unwrap();
        let err = sqlx::query("INSERT INTO stocks (product_id, quantity) VALUES (1, -1)")
            .execute(&mut conn)
            .await
            .unwrap_err();

        match err {
            sqlx::Error::Database(db_err) => assert!(db_err.is_check_violation()),
            other => panic!("expected check violation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn stock_requires_an_existing_product() {
        let mut conn = memory_conn().await;
        create_all(&mut conn).await.unwrap();

        let err = sqlx::query("INSERT INTO stocks (product_id, quantity) VALUES (99, 0)")
            .execute(&mut conn)
            .await
            .unwrap_err();

        match err {
            sqlx::Error::Database(db_err) => assert!(db_err.is_foreign_key_violation()),
            other => panic!("expected foreign key violation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn deleting_a_product_cascades_to_stock() {
        let mut conn = memory_conn().await;
        create_all(&mut conn).await.unwrap();

        sqlx::query("INSERT INTO products (name, price) VALUES ('TV', 999.0)")
            .execute(&mut conn)
            .await
            .unwrap();
        sqlx::query("INSERT INTO stocks (product_id) VALUES (1)")
            .execute(&mut conn)
            .await
            .unwrap();
        sqlx::query("DELETE FROM products WHERE id = 1")
            .execute(&mut conn)
            .await
            .unwrap();

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stocks")
            .fetch_one(&mut conn)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }
}
