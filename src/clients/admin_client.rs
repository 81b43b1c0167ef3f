use crate::clients::macros::impl_market_client;
use crate::clients::ActorClient;
use crate::framework::ResourceClient;
use crate::market_actor::{Market, MarketAction, MarketError};
use crate::model::{EntityRecord, EntityRef, UserId};
use tracing::instrument;

/// Client for soft delete and restore.
///
/// Users may delete themselves and sellers their own listings through this
/// client too; the market decides what `actor` is allowed to do.
#[derive(Clone)]
pub struct AdminClient {
    inner: ResourceClient<Market>,
}

impl_market_client!(AdminClient);

impl AdminClient {
    #[instrument(skip(self))]
    pub async fn soft_delete(
        &self,
        target: EntityRef,
        actor: UserId,
    ) -> Result<EntityRecord, MarketError> {
        self.send(MarketAction::SoftDelete { target, actor })
            .await?
            .into_record()
    }

    #[instrument(skip(self))]
    pub async fn restore(
        &self,
        target: EntityRef,
        actor: UserId,
    ) -> Result<EntityRecord, MarketError> {
        self.send(MarketAction::Restore { target, actor })
            .await?
            .into_record()
    }
}
