use crate::clients::macros::impl_market_client;
use crate::clients::ActorClient;
use crate::framework::ResourceClient;
use crate::market_actor::{Market, MarketAction, MarketError};
use crate::model::{Dispute, DisputeId, OrderId, UserId};
use tracing::instrument;

/// Client for disputes.
#[derive(Clone)]
pub struct DisputeClient {
    inner: ResourceClient<Market>,
}

impl_market_client!(DisputeClient);

impl DisputeClient {
    #[instrument(skip(self))]
    pub async fn open(
        &self,
        order: OrderId,
        reason: &str,
        actor: UserId,
    ) -> Result<Dispute, MarketError> {
        self.send(MarketAction::OpenDispute {
            order,
            reason: reason.to_string(),
            actor,
        })
        .await?
        .into_dispute()
    }

    #[instrument(skip(self))]
    pub async fn add_message(
        &self,
        dispute: DisputeId,
        text: &str,
        actor: UserId,
    ) -> Result<Dispute, MarketError> {
        self.send(MarketAction::AddDisputeMessage {
            dispute,
            text: text.to_string(),
            actor,
        })
        .await?
        .into_dispute()
    }

    #[instrument(skip(self))]
    pub async fn resolve(
        &self,
        dispute: DisputeId,
        resolution: &str,
        actor: UserId,
    ) -> Result<Dispute, MarketError> {
        self.send(MarketAction::ResolveDispute {
            dispute,
            resolution: resolution.to_string(),
            actor,
        })
        .await?
        .into_dispute()
    }

    #[instrument(skip(self))]
    pub async fn close(&self, dispute: DisputeId, actor: UserId) -> Result<Dispute, MarketError> {
        self.send(MarketAction::CloseDispute { dispute, actor })
            .await?
            .into_dispute()
    }

    #[instrument(skip(self))]
    pub async fn dispute(&self, dispute: DisputeId, actor: UserId) -> Result<Dispute, MarketError> {
        self.send(MarketAction::GetDispute { dispute, actor })
            .await?
            .into_dispute()
    }
}
