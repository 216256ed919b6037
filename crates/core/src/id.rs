//! Strongly-typed identifiers used across the domain.
//!
//! Identifiers are generated by the backing store (integer row ids), so
//! there is no `new()`; values come back from an insert or a query.

use serde::{Deserialize, Serialize};

/// Identifier of a product row.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(i64);

/// Identifier of a stock row.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StockId(i64);

macro_rules! impl_row_id_newtype {
    ($t:ty) => {
        impl $t {
            pub const fn from_raw(raw: i64) -> Self {
                Self(raw)
            }

            /// Raw row id, as bound into SQL parameters.
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

impl_row_id_newtype!(ProductId);
impl_row_id_newtype!(StockId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_id_displays_raw_value() {
        let id = ProductId::from_raw(42);
        assert_eq!(id.get(), 42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn ids_serialize_as_bare_integers() {
        let json = serde_json::to_string(&StockId::from_raw(7)).unwrap();
        assert_eq!(json, "7");
    }
}
