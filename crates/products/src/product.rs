use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, Entity, ProductId};

/// A catalog product as persisted in the `products` table.
///
/// `name` is unique across products. `price` is non-negative by convention
/// only; nothing here rejects a negative price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    name: String,
    price: f64,
    description: Option<String>,
}

impl Product {
    /// Rehydrate a product from stored column values.
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        price: f64,
        description: Option<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            description,
        }
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Insert shape for a product that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price: f64,
    pub description: Option<String>,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, price: f64, description: Option<String>) -> Self {
        Self {
            name: name.into(),
            price,
            description,
        }
    }

    /// Reject values the store cannot represent faithfully.
    ///
    /// SQLite has no NaN/infinity for REAL columns (NaN is stored as NULL),
    /// so a non-finite price never round-trips.
    pub fn validate(&self) -> DomainResult<()> {
        if !self.price.is_finite() {
            return Err(DomainError::validation(format!(
                "price must be a finite number, got {}",
                self.price
            )));
        }
        Ok(())
    }

    /// Attach the id generated by the store.
    pub fn into_product(self, id: ProductId) -> Product {
        Product {
            id,
            name: self.name,
            price: self.price,
            description: self.description,
        }
    }
}
