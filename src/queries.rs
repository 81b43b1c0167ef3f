//! Read models that join several tables.

use crate::market_actor::MarketError;
use crate::model::{Order, OrderDetails, OrderId, OrderRole, SoftDeletable, UserId};
use crate::store::MarketStore;

/// An order with its buyer, sellers, payment and dispute. Visible to the
/// parties and to admins, deleted or not.
pub fn order_details(
    store: &MarketStore,
    order_id: OrderId,
    actor: UserId,
) -> Result<OrderDetails, MarketError> {
    let order = store.order(order_id)?;
    let viewer = store.active_actor(actor)?;
    if !order.is_party(actor) && !viewer.is_admin() {
        return Err(MarketError::Forbidden(format!(
            "{actor} cannot view {order_id}"
        )));
    }

    let buyer = store.user(order.buyer_id)?.summary();
    let sellers = order
        .sellers()
        .into_iter()
        .map(|id| store.user(id).map(|u| u.summary()))
        .collect::<Result<Vec<_>, _>>()?;
    let payment = store.payment_for(order_id).map(|p| p.summary());
    let dispute = order
        .dispute_id
        .and_then(|id| store.disputes.get(&id))
        .map(|d| d.summary());

    Ok(OrderDetails {
        order: order.clone(),
        buyer,
        sellers,
        payment,
        dispute,
    })
}

/// Non-deleted orders where `actor` plays `role`, oldest first.
pub fn orders_for(
    store: &MarketStore,
    actor: UserId,
    role: OrderRole,
) -> Result<Vec<Order>, MarketError> {
    store.active_actor(actor)?;
    Ok(store
        .orders
        .values()
        .filter(|o| !o.is_deleted())
        .filter(|o| match role {
            OrderRole::Buyer => o.buyer_id == actor,
            OrderRole::Seller => o.is_seller(actor),
        })
        .cloned()
        .collect())
}
