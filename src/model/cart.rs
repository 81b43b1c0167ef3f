use crate::model::{checked_sum, money, ProductId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
    /// Price shown when the line was last touched; checkout re-reads the product.
    pub unit_price: Decimal,
}

/// A user's shopping cart. Ephemeral: emptied when an order is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub user_id: UserId,
    pub lines: BTreeMap<ProductId, CartLine>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    pub fn new(user_id: UserId, at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            lines: BTreeMap::new(),
            updated_at: at,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of the lines at their last seen prices, or `None` on overflow.
    pub fn total(&self) -> Option<Decimal> {
        checked_sum(
            self.lines
                .values()
                .map(|line| line.unit_price.checked_mul(Decimal::from(line.quantity))),
        )
        .map(money)
    }

    pub fn quantity_of(&self, product: ProductId) -> u32 {
        self.lines.get(&product).map_or(0, |line| line.quantity)
    }
}
