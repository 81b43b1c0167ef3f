use crate::model::{DeletionBatch, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Audit stamp carried by a soft-deleted record.
///
/// `deleted_by` is the actor that performed the deletion. Every record touched by
/// the same delete operation carries the same `batch`, which is what a restore
/// matches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftDelete {
    pub deleted_at: DateTime<Utc>,
    pub deleted_by: UserId,
    pub batch: DeletionBatch,
}

/// Records that can be soft-deleted and restored.
pub trait SoftDeletable {
    fn deletion(&self) -> Option<&SoftDelete>;

    fn set_deletion(&mut self, deletion: Option<SoftDelete>);

    fn is_deleted(&self) -> bool {
        self.deletion().is_some()
    }

    /// True when this record was stamped by `batch`.
    fn deleted_in(&self, batch: DeletionBatch) -> bool {
        self.deletion().is_some_and(|d| d.batch == batch)
    }
}

macro_rules! impl_soft_deletable {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl SoftDeletable for $ty {
                fn deletion(&self) -> Option<&SoftDelete> {
                    self.deletion.as_ref()
                }

                fn set_deletion(&mut self, deletion: Option<SoftDelete>) {
                    self.deletion = deletion;
                }
            }
        )+
    };
}

impl_soft_deletable!(
    crate::model::User,
    crate::model::Product,
    crate::model::Order,
    crate::model::Dispute,
);

/// Target of an administrative delete or restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EntityRef {
    User(crate::model::UserId),
    Product(crate::model::ProductId),
    Order(crate::model::OrderId),
    Dispute(crate::model::DisputeId),
}

impl std::fmt::Display for EntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityRef::User(id) => id.fmt(f),
            EntityRef::Product(id) => id.fmt(f),
            EntityRef::Order(id) => id.fmt(f),
            EntityRef::Dispute(id) => id.fmt(f),
        }
    }
}

/// The record a delete or restore acted on, as it is after the operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "record", rename_all = "snake_case")]
pub enum EntityRecord {
    User(crate::model::User),
    Product(crate::model::Product),
    Order(crate::model::Order),
    Dispute(crate::model::Dispute),
}

impl EntityRecord {
    pub fn deletion(&self) -> Option<&SoftDelete> {
        match self {
            EntityRecord::User(user) => user.deletion(),
            EntityRecord::Product(product) => product.deletion(),
            EntityRecord::Order(order) => order.deletion(),
            EntityRecord::Dispute(dispute) => dispute.deletion(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProductId;

    #[test]
    fn entity_ref_is_tagged_by_kind() {
        let target = EntityRef::Product(ProductId(7));
        let json = serde_json::to_value(target).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "product", "id": 7 }));

        let back: EntityRef = serde_json::from_value(json).unwrap();
        assert_eq!(back, target);
        assert_eq!(back.to_string(), "product_7");
    }
}
