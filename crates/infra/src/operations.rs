//! The four mutating inventory operations.
//!
//! Every operation follows the same pattern on the caller's session:
//!
//! ```text
//! begin (or join the open transaction)
//!   ↓
//! read whatever the preconditions need
//!   ↓
//! write
//!   ↓
//! commit on success / roll back on any error
//! ```
//!
//! Failures come back as `InventoryError`; nothing is left half-written. A
//! rollback also discards uncommitted writes the caller made on the same
//! session before calling the operation.

use tracing::{debug, error, instrument, warn};

use stockroom_core::{Entity, ProductId};
use stockroom_inventory::Stock;
use stockroom_products::{NewProduct, Product};

use crate::db::Session;
use crate::error::InventoryError;

/// Result of [`add_product`].
#[derive(Debug, Clone, PartialEq)]
pub enum ProductAdded {
    /// A new product (and its zero-quantity stock row) was written.
    Created(Product),
    /// A product with that name already existed; nothing was written.
    AlreadyExists(Product),
}

impl ProductAdded {
    pub fn product(&self) -> &Product {
        match self {
            ProductAdded::Created(p) | ProductAdded::AlreadyExists(p) => p,
        }
    }

    pub fn into_product(self) -> Product {
        match self {
            ProductAdded::Created(p) | ProductAdded::AlreadyExists(p) => p,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, ProductAdded::Created(_))
    }
}

/// Add a product together with a stock row at quantity 0.
///
/// If a product with the same name exists this is a no-op that returns the
/// existing product. Starting stock, if any, is added afterwards with
/// [`add_stock`].
#[instrument(skip(session, description), err)]
pub async fn add_product(
    session: &mut Session,
    name: &str,
    price: f64,
    description: Option<&str>,
) -> Result<ProductAdded, InventoryError> {
    let new = NewProduct::new(name, price, description.map(str::to_owned));
    let outcome = try_add_product(session, new).await;
    settle(session, outcome).await
}

async fn try_add_product(
    session: &mut Session,
    new: NewProduct,
) -> Result<ProductAdded, InventoryError> {
    new.validate()?;
    session.begin().await?;

    if let Some(existing) = session.find_product_by_name(&new.name).await? {
        warn!(product_id = %existing.id(), "product with that name already exists");
        return Ok(ProductAdded::AlreadyExists(existing));
    }

    let product = session.insert_product(new).await?;
    let stock = session.insert_stock(product.id(), 0).await?;
    debug!(product_id = %product.id(), stock_id = %stock.id(), "product created");

    Ok(ProductAdded::Created(product))
}

/// Add `quantity` (a delta) to the product's stock.
///
/// Fails with `NotFound` if the product has no stock row. A negative delta
/// larger than the current quantity leaves the stock at 0.
#[instrument(skip(session), fields(product_id = %product_id), err)]
pub async fn add_stock(
    session: &mut Session,
    product_id: ProductId,
    quantity: i64,
) -> Result<Stock, InventoryError> {
    let outcome = try_adjust_stock(session, product_id, |stock| stock.added(quantity)).await;
    settle(session, outcome).await
}

/// Remove `quantity` from the product's stock, clamping at 0.
///
/// Fails with `NotFound` if the product has no stock row.
#[instrument(skip(session), fields(product_id = %product_id), err)]
pub async fn remove_stock(
    session: &mut Session,
    product_id: ProductId,
    quantity: i64,
) -> Result<Stock, InventoryError> {
    let outcome = try_adjust_stock(session, product_id, |stock| stock.removed(quantity)).await;
    settle(session, outcome).await
}

async fn try_adjust_stock(
    session: &mut Session,
    product_id: ProductId,
    adjust: impl FnOnce(&Stock) -> Stock,
) -> Result<Stock, InventoryError> {
    session.begin().await?;

    let Some(stock) = session.find_stock_by_product_id(product_id).await? else {
        return Err(InventoryError::not_found(product_id));
    };

    let updated = adjust(&stock);
    session.update_stock_quantity(&updated).await?;
    debug!(
        before = stock.quantity(),
        after = updated.quantity(),
        "stock adjusted"
    );

    Ok(updated)
}

/// Delete a product and its stock rows, then commit.
///
/// Returns the removed product. Fails with `NotFound` if no product has
/// that id.
#[instrument(skip(session), fields(product_id = %product_id), err)]
pub async fn remove_product_by_id(
    session: &mut Session,
    product_id: ProductId,
) -> Result<Product, InventoryError> {
    let outcome = try_remove_product(session, product_id).await;
    settle(session, outcome).await
}

async fn try_remove_product(
    session: &mut Session,
    product_id: ProductId,
) -> Result<Product, InventoryError> {
    session.begin().await?;

    let Some(product) = session.find_product_by_id(product_id).await? else {
        return Err(InventoryError::not_found(product_id));
    };

    let removed_stocks = session.delete_stocks_for_product(product_id).await?;
    if !session.delete_product(product_id).await? {
        return Err(InventoryError::not_found(product_id));
    }
    debug!(removed_stocks, "product removed");

    Ok(product)
}

/// Commit on success, roll back on failure.
async fn settle<T>(
    session: &mut Session,
    outcome: Result<T, InventoryError>,
) -> Result<T, InventoryError> {
    match outcome {
        Ok(value) => {
            session.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = session.rollback().await {
                error!(error = %rollback_err, cause = %err, "rollback failed");
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::db::Store;

    async fn memory_store() -> Store {
        Store::open(StoreConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn add_product_creates_zero_stock() {
        let store = memory_store().await;
        let mut session = store.open_session().await.unwrap();

        let added = add_product(&mut session, "TV", 999.0, Some("Best TV")).await.unwrap();
        assert!(added.was_created());
        assert!(!session.in_transaction());

        let stock = session
            .find_stock_by_product_id(added.product().id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stock.quantity(), 0);
    }

    #[tokio::test]
    async fn add_product_with_existing_name_is_a_no_op() {
        let store = memory_store().await;
        let mut session = store.open_session().await.unwrap();

        let first = add_product(&mut session, "TV", 999.0, None).await.unwrap();
        let second = add_product(&mut session, "TV", 10.0, Some("cheaper")).await.unwrap();

        assert_eq!(second, ProductAdded::AlreadyExists(first.product().clone()));
        assert_eq!(session.list_products().await.unwrap().len(), 1);
        assert_eq!(session.list_stocks().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn add_product_rejects_non_finite_price_without_writing() {
        let store = memory_store().await;
        let mut session = store.open_session().await.unwrap();

        let err = add_product(&mut session, "Ghost", f64::NAN, None).await.unwrap_err();
        assert!(matches!(err, InventoryError::Domain(_)));
        assert!(session.list_products().await.unwrap().is_empty());
        assert!(!session.in_transaction());
    }

    #[tokio::test]
    async fn failed_operation_rolls_back_pending_writes() {
        let store = memory_store().await;
        let mut session = store.open_session().await.unwrap();

        session
            .insert_product(NewProduct::new("Draft", 1.0, None))
            .await
            .unwrap();
        assert!(session.in_transaction());

        let err = add_stock(&mut session, ProductId::from_raw(999), 5).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(!session.in_transaction());
        assert!(session.find_product_by_name("Draft").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn remove_stock_returns_clamped_stock() {
        let store = memory_store().await;
        let mut session = store.open_session().await.unwrap();

        let id = add_product(&mut session, "Radio", 49.0, None).await.unwrap().product().id();
        add_stock(&mut session, id, 3).await.unwrap();

        let stock = remove_stock(&mut session, id, 10).await.unwrap();
        assert_eq!(stock.quantity(), 0);
        assert_eq!(stock.product_id(), id);
    }

    #[tokio::test]
    async fn remove_product_deletes_its_stock_rows() {
        let store = memory_store().await;
        let mut session = store.open_session().await.unwrap();

        let id = add_product(&mut session, "Lamp", 15.0, None).await.unwrap().product().id();
        let removed = remove_product_by_id(&mut session, id).await.unwrap();

        assert_eq!(removed.name(), "Lamp");
        assert!(session.find_product_by_id(id).await.unwrap().is_none());
        assert!(session.find_stock_by_product_id(id).await.unwrap().is_none());
        assert!(!session.in_transaction());
    }
}
