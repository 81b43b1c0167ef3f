//! Payment gateway seam.

use crate::model::{CardFingerprint, OrderId};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU64, Ordering};

/// External payment processor. Only ever sees the amount and a card fingerprint.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Charges `amount` and returns the processor's reference.
    async fn charge(
        &self,
        order: OrderId,
        amount: Decimal,
        card: &CardFingerprint,
    ) -> Result<String, String>;

    async fn refund(&self, reference: &str, amount: Decimal) -> Result<(), String>;
}

/// Gateway that approves everything.
#[derive(Debug, Default)]
pub struct MockGateway {
    counter: AtomicU64,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn charge(
        &self,
        order: OrderId,
        _amount: Decimal,
        _card: &CardFingerprint,
    ) -> Result<String, String> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("mock_{}_{n}", order.0))
    }

    async fn refund(&self, _reference: &str, _amount: Decimal) -> Result<(), String> {
        Ok(())
    }
}
