use crate::clients::{AdminClient, CartClient, CatalogClient, DisputeClient, OrderClient};
use crate::framework::ResourceClient;
use crate::lifecycle::MarketConfig;
use crate::market_actor::{self, Market, MarketContext, MarketError};
use tokio::task::JoinHandle;
use tracing::{error, info};

/// The running market: one actor task plus the typed clients that talk to it.
///
/// # Example
///
/// ```ignore
/// let system = MarketSystem::new(&MarketConfig::default());
///
/// let seller = system.catalog.register_user(UserCreate::member("Sam", "sam@campus.edu")).await?;
/// system.carts.add_item(buyer.id, product.product.id, 1).await?;
/// let order = system.orders.create_order(buyer.id, request).await?;
///
/// let market = system.shutdown().await?;
/// ```
pub struct MarketSystem {
    pub catalog: CatalogClient,
    pub carts: CartClient,
    pub orders: OrderClient,
    pub disputes: DisputeClient,
    pub admin: AdminClient,
    client: ResourceClient<Market>,
    handle: JoinHandle<Market>,
}

impl MarketSystem {
    /// Starts the market with the mock payment gateway and the system clock.
    pub fn new(config: &MarketConfig) -> Self {
        Self::with_context(config, MarketContext::default())
    }

    /// Starts the market with injected collaborators.
    pub fn with_context(config: &MarketConfig, context: MarketContext) -> Self {
        let (actor, client) = market_actor::new(config);
        let handle = tokio::spawn(actor.run(context));

        Self {
            catalog: CatalogClient::new(client.clone()),
            carts: CartClient::new(client.clone()),
            orders: OrderClient::new(client.clone()),
            disputes: DisputeClient::new(client.clone()),
            admin: AdminClient::new(client.clone()),
            client,
            handle,
        }
    }

    /// Stops the actor once the requests already queued are done and returns
    /// its final state.
    pub async fn shutdown(self) -> Result<Market, MarketError> {
        info!("Shutting down market...");

        self.client
            .shutdown()
            .await
            .map_err(|e| MarketError::ActorCommunicationError(e.to_string()))?;

        // Clones handed out earlier now get ActorClosed.
        drop(self.catalog);
        drop(self.carts);
        drop(self.orders);
        drop(self.disputes);
        drop(self.admin);

        match self.handle.await {
            Ok(market) => {
                info!(records = market.store().len(), "Market shutdown complete.");
                Ok(market)
            }
            Err(e) => {
                error!("Market task failed: {:?}", e);
                Err(MarketError::ActorCommunicationError(format!(
                    "Market task failed: {e}"
                )))
            }
        }
    }
}
