//! Smoke run against the configured store: add a product, stock it, print the result.
//!
//! Configuration comes from `STOCKROOM_DATABASE_URL` (default `sqlite://inventory.db`).

use anyhow::Context;

use stockroom_core::Entity;
use stockroom_infra::{Store, StoreConfig, add_product, add_stock};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stockroom_observability::init();

    let config = StoreConfig::from_env();
    let store = Store::open(config.clone())
        .await
        .with_context(|| format!("failed to open inventory store at {}", config.database_url))?;
    let mut session = store.open_session().await?;

    let added = add_product(&mut session, "TV", 999.0, Some("Best TV")).await?;
    let created = added.was_created();
    let product = added.into_product();
    if created {
        add_stock(&mut session, product.id(), 10).await?;
    }

    let view = session
        .product_with_stock(product.id())
        .await?
        .context("product vanished after insert")?;
    tracing::info!(
        database_url = %store.config().database_url,
        product_id = %view.product.id(),
        quantity = view.quantity,
        "inventory ready"
    );

    println!("{}", serde_json::to_string_pretty(&view)?);

    drop(session);
    store.close().await;
    Ok(())
}
