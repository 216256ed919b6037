use serde::{Deserialize, Serialize};

use stockroom_core::{Entity, ProductId, StockId};

/// Floor a quantity at zero.
pub fn clamp_quantity(quantity: i64) -> i64 {
    quantity.max(0)
}

/// On-hand quantity for one product, as persisted in the `stocks` table.
///
/// Quantities are never negative: every transition goes through
/// [`clamp_quantity`], and arithmetic saturates instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    id: StockId,
    product_id: ProductId,
    quantity: i64,
}

impl Stock {
    /// Rehydrate a stock row from stored column values.
    pub fn new(id: StockId, product_id: ProductId, quantity: i64) -> Self {
        Self {
            id,
            product_id,
            quantity: clamp_quantity(quantity),
        }
    }

    pub fn id_typed(&self) -> StockId {
        self.id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    /// Apply an additive delta. A negative delta that would take the
    /// quantity below zero clamps to zero.
    #[must_use]
    pub fn added(&self, delta: i64) -> Self {
        Self {
            quantity: clamp_quantity(self.quantity.saturating_add(delta)),
            ..*self
        }
    }

    /// Remove `amount` units, clamping at zero.
    #[must_use]
    pub fn removed(&self, amount: i64) -> Self {
        Self {
            quantity: clamp_quantity(self.quantity.saturating_sub(amount)),
            ..*self
        }
    }
}

impl Entity for Stock {
    type Id = StockId;

    fn id(&self) -> Self::Id {
        self.id
    }
}
