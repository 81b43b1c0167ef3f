use serde::{Deserialize, Serialize};
use std::fmt::Display;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, "_{}"), self.0)
            }
        }
    };
}

entity_id!(
    /// Type-safe identifier for Users. Also identifies the acting party of a request.
    UserId,
    "user"
);
entity_id!(
    /// Type-safe identifier for Products.
    ProductId,
    "product"
);
entity_id!(
    /// Type-safe identifier for Orders.
    OrderId,
    "order"
);
entity_id!(
    /// Type-safe identifier for Disputes.
    DisputeId,
    "dispute"
);
entity_id!(
    /// Type-safe identifier for Payments.
    PaymentId,
    "payment"
);
entity_id!(
    /// Groups every record stamped by one soft-delete operation.
    DeletionBatch,
    "batch"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_display_with_prefix() {
        assert_eq!(UserId(3).to_string(), "user_3");
        assert_eq!(OrderId::from(12).to_string(), "order_12");
        assert_eq!(DeletionBatch(1).to_string(), "batch_1");
    }
}
