//! Orders: one buyer, one or more items, one meetup to confirm.
//!
//! Item names, images and prices are copied from the product at creation time
//! and never follow later product edits.

use crate::model::{
    DisputeId, DisputeSummary, OrderId, PaymentSummary, ProductId, SoftDelete, UserId,
    UserSummary,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    WaitingToMeet,
    MetAndExchanged,
    Cancelled,
    Disputed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::WaitingToMeet => "waiting_to_meet",
            OrderStatus::MetAndExchanged => "met_and_exchanged",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Disputed => "disputed",
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which party a confirmation comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmSide {
    Buyer,
    Seller,
}

impl Display for ConfirmSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfirmSide::Buyer => f.write_str("buyer"),
            ConfirmSide::Seller => f.write_str("seller"),
        }
    }
}

/// Filter for listing a user's orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderRole {
    Buyer,
    Seller,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub recipient: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
}

impl Address {
    pub fn new(
        recipient: impl Into<String>,
        street: impl Into<String>,
        city: impl Into<String>,
        postal_code: impl Into<String>,
    ) -> Self {
        Self {
            recipient: recipient.into(),
            street: street.into(),
            city: city.into(),
            postal_code: postal_code.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        [&self.recipient, &self.street, &self.city, &self.postal_code]
            .iter()
            .all(|field| !field.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub seller_id: UserId,
    pub name: String,
    pub image: Option<String>,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl OrderItem {
    /// `None` when the product does not fit in a `Decimal`.
    pub fn line_total(&self) -> Option<Decimal> {
        self.unit_price.checked_mul(Decimal::from(self.quantity))
    }
}

/// One entry of the order's audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    pub from: Option<OrderStatus>,
    pub to: OrderStatus,
    pub by: UserId,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub buyer_id: UserId,
    pub items: Vec<OrderItem>,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub buyer_confirmed: bool,
    /// Sellers that have confirmed the meetup; only ever grows.
    pub seller_confirmations: BTreeSet<UserId>,
    /// True once every seller of the order has confirmed.
    pub seller_confirmed: bool,
    pub dispute_id: Option<DisputeId>,
    pub shipping_address: Address,
    pub billing_address: Address,
    pub history: Vec<StatusChange>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub deletion: Option<SoftDelete>,
}

impl Order {
    /// Not deleted and not cancelled: the order holds a stock reservation.
    pub fn is_active(&self) -> bool {
        self.deletion.is_none() && self.status != OrderStatus::Cancelled
    }

    /// Distinct sellers across all items.
    pub fn sellers(&self) -> BTreeSet<UserId> {
        self.items.iter().map(|item| item.seller_id).collect()
    }

    pub fn is_seller(&self, user: UserId) -> bool {
        self.items.iter().any(|item| item.seller_id == user)
    }

    pub fn is_party(&self, user: UserId) -> bool {
        self.buyer_id == user || self.is_seller(user)
    }

    /// Units of `product` this order covers.
    pub fn quantity_of(&self, product: ProductId) -> u32 {
        self.items
            .iter()
            .filter(|item| item.product_id == product)
            .map(|item| item.quantity)
            .sum()
    }

    pub fn references(&self, product: ProductId) -> bool {
        self.items.iter().any(|item| item.product_id == product)
    }

    /// Moves to `to` and appends the audit entry.
    pub fn transition(&mut self, to: OrderStatus, by: UserId, at: DateTime<Utc>) {
        self.history.push(StatusChange {
            from: Some(self.status),
            to,
            by,
            at,
        });
        self.status = to;
        self.updated_at = at;
        if to == OrderStatus::MetAndExchanged {
            self.completed_at = Some(at);
        }
    }
}

/// An order joined with the records it references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDetails {
    pub order: Order,
    pub buyer: UserSummary,
    pub sellers: Vec<UserSummary>,
    pub payment: Option<PaymentSummary>,
    pub dispute: Option<DisputeSummary>,
}
