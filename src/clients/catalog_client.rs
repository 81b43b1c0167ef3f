use crate::clients::macros::impl_market_client;
use crate::clients::ActorClient;
use crate::framework::ResourceClient;
use crate::market_actor::{Market, MarketAction, MarketError};
use crate::model::{
    AccountStatus, ProductCreate, ProductId, ProductUpdate, ProductView, User, UserCreate, UserId,
};
use tracing::instrument;

/// Client for accounts and listings.
#[derive(Clone)]
pub struct CatalogClient {
    inner: ResourceClient<Market>,
}

impl_market_client!(CatalogClient);

impl CatalogClient {
    #[instrument(skip(self))]
    pub async fn register_user(&self, params: UserCreate) -> Result<User, MarketError> {
        self.send(MarketAction::RegisterUser(params))
            .await?
            .into_user()
    }

    #[instrument(skip(self))]
    pub async fn set_user_status(
        &self,
        actor: UserId,
        user: UserId,
        status: AccountStatus,
    ) -> Result<User, MarketError> {
        self.send(MarketAction::SetUserStatus {
            actor,
            user,
            status,
        })
        .await?
        .into_user()
    }

    #[instrument(skip(self))]
    pub async fn user(&self, id: UserId) -> Result<User, MarketError> {
        self.send(MarketAction::GetUser(id)).await?.into_user()
    }

    #[instrument(skip(self))]
    pub async fn create_product(
        &self,
        seller: UserId,
        params: ProductCreate,
    ) -> Result<ProductView, MarketError> {
        self.send(MarketAction::CreateProduct { seller, params })
            .await?
            .into_product()
    }

    #[instrument(skip(self))]
    pub async fn update_product(
        &self,
        actor: UserId,
        product: ProductId,
        update: ProductUpdate,
    ) -> Result<ProductView, MarketError> {
        self.send(MarketAction::UpdateProduct {
            actor,
            product,
            update,
        })
        .await?
        .into_product()
    }

    #[instrument(skip(self))]
    pub async fn product(&self, id: ProductId) -> Result<ProductView, MarketError> {
        self.send(MarketAction::GetProduct(id)).await?.into_product()
    }

    #[instrument(skip(self))]
    pub async fn available_quantity(&self, id: ProductId) -> Result<u32, MarketError> {
        self.send(MarketAction::AvailableQuantity(id))
            .await?
            .into_quantity()
    }
}
