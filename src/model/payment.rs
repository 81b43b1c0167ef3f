use crate::model::{OrderId, PaymentId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Completed,
    Refunded,
}

/// What is kept of a card after checkout: nothing that could charge it again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardFingerprint {
    pub last4: String,
    /// `MM/YY`
    pub expiry: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub amount: Decimal,
    pub status: PaymentStatus,
    pub card: CardFingerprint,
    /// Reference returned by the gateway.
    pub reference: String,
    pub created_at: DateTime<Utc>,
    pub refunded_at: Option<DateTime<Utc>>,
}

impl Payment {
    pub fn summary(&self) -> PaymentSummary {
        PaymentSummary {
            id: self.id,
            amount: self.amount,
            status: self.status,
            card_last4: self.card.last4.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentSummary {
    pub id: PaymentId,
    pub amount: Decimal,
    pub status: PaymentStatus,
    pub card_last4: String,
}
