//! The Market actor: a single [`ResourceActor`] owning users, products, carts,
//! orders, payments and disputes.

pub mod actions;
pub mod clock;
pub mod entity;
pub mod error;
pub mod gateway;

pub use actions::*;
pub use clock::*;
pub use entity::*;
pub use error::*;
pub use gateway::*;

use crate::framework::{ResourceActor, ResourceClient};
use crate::lifecycle::MarketConfig;
use std::sync::Arc;

/// Collaborators injected into the actor when it starts.
#[derive(Clone)]
pub struct MarketContext {
    pub gateway: Arc<dyn PaymentGateway>,
    pub clock: Arc<dyn Clock>,
}

impl Default for MarketContext {
    fn default() -> Self {
        Self {
            gateway: Arc::new(MockGateway::new()),
            clock: Arc::new(SystemClock),
        }
    }
}

/// Creates a new Market actor and its client.
pub fn new(config: &MarketConfig) -> (ResourceActor<Market>, ResourceClient<Market>) {
    ResourceActor::new(config.channel_buffer, Market::new(config.order_prefix.clone()))
}
