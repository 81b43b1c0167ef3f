use crate::checkout::CheckoutRequest;
use crate::clients::macros::impl_market_client;
use crate::clients::ActorClient;
use crate::framework::ResourceClient;
use crate::market_actor::{Market, MarketAction, MarketError};
use crate::model::{ConfirmSide, Order, OrderDetails, OrderId, OrderRole, OrderStatus, UserId};
use tracing::{info, instrument};

/// Client for checkout and the order lifecycle.
#[derive(Clone)]
pub struct OrderClient {
    inner: ResourceClient<Market>,
}

impl_market_client!(OrderClient);

impl OrderClient {
    /// Turns the buyer's cart into an order. Nothing is written unless every
    /// step succeeds.
    #[instrument(skip(self, request))]
    pub async fn create_order(
        &self,
        buyer: UserId,
        request: CheckoutRequest,
    ) -> Result<Order, MarketError> {
        info!("Sending create_order to actor");
        self.send(MarketAction::CreateOrder { buyer, request })
            .await?
            .into_order()
    }

    #[instrument(skip(self))]
    pub async fn confirm(
        &self,
        order: OrderId,
        side: ConfirmSide,
        actor: UserId,
    ) -> Result<Order, MarketError> {
        self.send(MarketAction::Confirm { order, side, actor })
            .await?
            .into_order()
    }

    #[instrument(skip(self))]
    pub async fn cancel(&self, order: OrderId, actor: UserId) -> Result<Order, MarketError> {
        self.send(MarketAction::Cancel { order, actor })
            .await?
            .into_order()
    }

    /// Admin override.
    #[instrument(skip(self))]
    pub async fn set_status(
        &self,
        order: OrderId,
        status: OrderStatus,
        actor: UserId,
    ) -> Result<Order, MarketError> {
        self.send(MarketAction::SetOrderStatus {
            order,
            status,
            actor,
        })
        .await?
        .into_order()
    }

    #[instrument(skip(self))]
    pub async fn details(
        &self,
        order: OrderId,
        actor: UserId,
    ) -> Result<OrderDetails, MarketError> {
        self.send(MarketAction::OrderDetails { order, actor })
            .await?
            .into_order_details()
    }

    #[instrument(skip(self))]
    pub async fn orders_for(
        &self,
        actor: UserId,
        role: OrderRole,
    ) -> Result<Vec<Order>, MarketError> {
        self.send(MarketAction::OrdersFor { actor, role })
            .await?
            .into_orders()
    }
}
