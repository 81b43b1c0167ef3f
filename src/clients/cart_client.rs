use crate::clients::macros::impl_market_client;
use crate::clients::ActorClient;
use crate::framework::ResourceClient;
use crate::market_actor::{Market, MarketAction, MarketError};
use crate::model::{Cart, ProductId, UserId};
use tracing::instrument;

/// Client for shopping carts.
#[derive(Clone)]
pub struct CartClient {
    inner: ResourceClient<Market>,
}

impl_market_client!(CartClient);

impl CartClient {
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        user: UserId,
        product: ProductId,
        quantity: u32,
    ) -> Result<Cart, MarketError> {
        self.send(MarketAction::AddToCart {
            user,
            product,
            quantity,
        })
        .await?
        .into_cart()
    }

    /// Sets the line quantity; `0` removes the line.
    #[instrument(skip(self))]
    pub async fn update_item(
        &self,
        user: UserId,
        product: ProductId,
        quantity: u32,
    ) -> Result<Cart, MarketError> {
        self.send(MarketAction::UpdateCartItem {
            user,
            product,
            quantity,
        })
        .await?
        .into_cart()
    }

    #[instrument(skip(self))]
    pub async fn remove_item(&self, user: UserId, product: ProductId) -> Result<Cart, MarketError> {
        self.send(MarketAction::RemoveFromCart { user, product })
            .await?
            .into_cart()
    }

    #[instrument(skip(self))]
    pub async fn cart(&self, user: UserId) -> Result<Cart, MarketError> {
        self.send(MarketAction::GetCart(user)).await?.into_cart()
    }
}
