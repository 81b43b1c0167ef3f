//! [`ActorEntity`] implementation for the market.
//!
//! The actor feeds actions one at a time, so each handler below sees the store
//! exactly as the previous action left it. That is what makes a checkout's
//! final stock check and its writes one indivisible step.

use crate::framework::ActorEntity;
use crate::market_actor::{MarketAction, MarketActionResult, MarketContext, MarketError};
use crate::store::MarketStore;
use crate::{cascade, catalog, checkout, confirmation, dispute, queries};
use async_trait::async_trait;
use tracing::info;

/// Owns every aggregate of the marketplace.
#[derive(Debug)]
pub struct Market {
    store: MarketStore,
    order_prefix: String,
}

impl Market {
    pub fn new(order_prefix: impl Into<String>) -> Self {
        Self {
            store: MarketStore::new(),
            order_prefix: order_prefix.into(),
        }
    }

    pub fn store(&self) -> &MarketStore {
        &self.store
    }
}

#[async_trait]
impl ActorEntity for Market {
    type Action = MarketAction;
    type ActionResult = MarketActionResult;
    type Context = MarketContext;
    type Error = MarketError;

    async fn on_start(&mut self, _ctx: &MarketContext) -> Result<(), MarketError> {
        info!(prefix = %self.order_prefix, records = self.store.len(), "Market ready");
        Ok(())
    }

    async fn handle_action(
        &mut self,
        action: MarketAction,
        ctx: &MarketContext,
    ) -> Result<MarketActionResult, MarketError> {
        use MarketAction as A;
        use MarketActionResult as R;

        let now = ctx.clock.now();
        let store = &mut self.store;
        match action {
            A::RegisterUser(params) => catalog::register_user(store, now, params).map(R::User),
            A::SetUserStatus {
                actor,
                user,
                status,
            } => catalog::set_user_status(store, actor, user, status).map(R::User),
            A::GetUser(id) => catalog::user(store, id).map(R::User),
            A::CreateProduct { seller, params } => {
                catalog::create_product(store, now, seller, params).map(R::Product)
            }
            A::UpdateProduct {
                actor,
                product,
                update,
            } => catalog::update_product(store, now, actor, product, update).map(R::Product),
            A::GetProduct(id) => catalog::product(store, id).map(R::Product),
            A::AvailableQuantity(id) => catalog::available_quantity(store, id).map(R::Quantity),

            A::AddToCart {
                user,
                product,
                quantity,
            } => checkout::cart::add_item(store, now, user, product, quantity).map(R::Cart),
            A::UpdateCartItem {
                user,
                product,
                quantity,
            } => checkout::cart::update_item(store, now, user, product, quantity).map(R::Cart),
            A::RemoveFromCart { user, product } => {
                checkout::cart::remove_item(store, now, user, product).map(R::Cart)
            }
            A::GetCart(user) => checkout::cart::cart(store, now, user).map(R::Cart),

            A::CreateOrder { buyer, request } => {
                checkout::create_order(store, ctx, &self.order_prefix, buyer, request)
                    .await
                    .map(R::Order)
            }
            A::Confirm { order, side, actor } => {
                confirmation::confirm(store, now, order, side, actor).map(R::Order)
            }
            A::Cancel { order, actor } => confirmation::cancel(store, ctx, order, actor)
                .await
                .map(R::Order),
            A::SetOrderStatus {
                order,
                status,
                actor,
            } => confirmation::set_status(store, ctx, order, status, actor)
                .await
                .map(R::Order),
            A::OrderDetails { order, actor } => {
                queries::order_details(store, order, actor).map(R::OrderDetails)
            }
            A::OrdersFor { actor, role } => queries::orders_for(store, actor, role).map(R::Orders),

            A::OpenDispute {
                order,
                reason,
                actor,
            } => dispute::open(store, now, order, &reason, actor).map(R::Dispute),
            A::AddDisputeMessage {
                dispute: id,
                text,
                actor,
            } => dispute::add_message(store, now, id, &text, actor).map(R::Dispute),
            A::ResolveDispute {
                dispute: id,
                resolution,
                actor,
            } => dispute::resolve(store, ctx, id, &resolution, actor)
                .await
                .map(R::Dispute),
            A::CloseDispute { dispute: id, actor } => {
                dispute::close(store, now, id, actor).map(R::Dispute)
            }
            A::GetDispute { dispute: id, actor } => {
                dispute::get(store, id, actor).map(R::Dispute)
            }

            A::SoftDelete { target, actor } => {
                cascade::soft_delete(store, now, target, actor).map(R::Record)
            }
            A::Restore { target, actor } => cascade::restore(store, target, actor).map(R::Record),
        }
    }

    fn size(&self) -> usize {
        self.store.len()
    }
}
