use crate::model::{DisputeId, OrderId, SoftDelete, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeStatus {
    Open,
    UnderReview,
    Resolved,
    Closed,
}

impl DisputeStatus {
    /// Open or under review: the order is locked.
    pub fn is_active(&self) -> bool {
        matches!(self, DisputeStatus::Open | DisputeStatus::UnderReview)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    Buyer,
    Seller,
    Admin,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisputeMessage {
    pub sender_id: UserId,
    pub role: MessageRole,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

/// A complaint about an order, with its append-only conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dispute {
    pub id: DisputeId,
    pub order_id: OrderId,
    pub buyer_id: UserId,
    pub seller_ids: Vec<UserId>,
    pub opened_by: UserId,
    pub status: DisputeStatus,
    pub messages: Vec<DisputeMessage>,
    pub resolution: Option<String>,
    pub resolved_by: Option<UserId>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub closed_by: Option<UserId>,
    pub closed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub deletion: Option<SoftDelete>,
}

impl Dispute {
    /// Not deleted and still open or under review.
    pub fn is_active(&self) -> bool {
        self.deletion.is_none() && self.status.is_active()
    }

    pub fn is_party(&self, user: UserId) -> bool {
        self.buyer_id == user || self.seller_ids.contains(&user)
    }

    pub fn summary(&self) -> DisputeSummary {
        DisputeSummary {
            id: self.id,
            status: self.status,
            messages: self.messages.len(),
            resolution: self.resolution.clone(),
        }
    }
}

/// Compact projection of a dispute embedded in order views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisputeSummary {
    pub id: DisputeId,
    pub status: DisputeStatus,
    pub messages: usize,
    pub resolution: Option<String>,
}
