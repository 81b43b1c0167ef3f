//! Meetup confirmation state machine.
//!
//! ```text
//! waiting_to_meet ──both confirmed──▶ met_and_exchanged
//!        │                                  │
//!        ├──cancel──▶ cancelled             └──admin──▶ disputed
//!        └──dispute─▶ disputed
//! ```
//!
//! While a dispute is open or under review every transition here is refused.

use crate::inventory;
use crate::market_actor::{MarketContext, MarketError};
use crate::model::{ConfirmSide, Order, OrderId, OrderStatus, PaymentStatus, SoftDeletable, UserId};
use crate::store::{MarketStore, Transaction};
use chrono::{DateTime, Utc};
use tracing::info;

/// Refuses any change to a deleted order or one locked by a live dispute.
pub(crate) fn ensure_not_frozen(store: &MarketStore, order: &Order) -> Result<(), MarketError> {
    if order.is_deleted() {
        return Err(MarketError::Frozen(format!("{} is deleted", order.id)));
    }
    if store
        .live_dispute_for(order.id)
        .is_some_and(|d| d.status.is_active())
    {
        return Err(MarketError::Frozen(format!("{} is under dispute", order.id)));
    }
    Ok(())
}

/// Records one side's confirmation. The order completes once the buyer and
/// every seller have confirmed, whichever comes last.
pub fn confirm(
    store: &mut MarketStore,
    now: DateTime<Utc>,
    order_id: OrderId,
    side: ConfirmSide,
    actor: UserId,
) -> Result<Order, MarketError> {
    let mut order = store.order(order_id)?.clone();
    store.active_actor(actor)?;
    let is_side = match side {
        ConfirmSide::Buyer => order.buyer_id == actor,
        ConfirmSide::Seller => order.is_seller(actor),
    };
    if !is_side {
        return Err(MarketError::Forbidden(format!(
            "{actor} is not the {side} of {order_id}"
        )));
    }

    ensure_not_frozen(store, &order)?;
    if order.status == OrderStatus::Disputed {
        return Err(MarketError::Frozen(format!("{order_id} is disputed")));
    }

    let already = match side {
        ConfirmSide::Buyer => order.buyer_confirmed,
        ConfirmSide::Seller => order.seller_confirmations.contains(&actor),
    };
    if already {
        return Err(MarketError::AlreadyConfirmed {
            order: order_id,
            side,
        });
    }
    if order.status != OrderStatus::WaitingToMeet {
        return Err(MarketError::Frozen(format!(
            "{order_id} is {}",
            order.status
        )));
    }

    match side {
        ConfirmSide::Buyer => order.buyer_confirmed = true,
        ConfirmSide::Seller => {
            order.seller_confirmations.insert(actor);
            order.seller_confirmed = order
                .sellers()
                .iter()
                .all(|seller| order.seller_confirmations.contains(seller));
        }
    }
    order.updated_at = now;
    if order.buyer_confirmed && order.seller_confirmed {
        order.transition(OrderStatus::MetAndExchanged, actor, now);
        info!(order = %order_id, "Order completed");
    }

    let mut tx = store.begin();
    tx.put_order(order.clone());
    tx.commit();
    Ok(order)
}

/// Cancels a waiting order on behalf of the buyer, one of its sellers or an
/// admin, and refunds it.
pub async fn cancel(
    store: &mut MarketStore,
    ctx: &MarketContext,
    order_id: OrderId,
    actor: UserId,
) -> Result<Order, MarketError> {
    let order = store.order(order_id)?.clone();
    let acting = store.active_actor(actor)?;
    if !order.is_party(actor) && !acting.is_admin() {
        return Err(MarketError::Forbidden(format!(
            "{actor} cannot cancel {order_id}"
        )));
    }
    ensure_not_frozen(store, &order)?;
    match order.status {
        OrderStatus::WaitingToMeet => {}
        OrderStatus::Disputed => {
            return Err(MarketError::Frozen(format!("{order_id} is disputed")));
        }
        from => {
            return Err(MarketError::InvalidTransition {
                from,
                to: OrderStatus::Cancelled,
            });
        }
    }

    let now = ctx.clock.now();
    let mut tx = store.begin();
    let order = apply_cancellation(&mut tx, ctx, order, actor, now).await?;
    tx.commit();
    info!(order = %order_id, by = %actor, "Order cancelled");
    Ok(order)
}

/// Admin override of the order status.
pub async fn set_status(
    store: &mut MarketStore,
    ctx: &MarketContext,
    order_id: OrderId,
    status: OrderStatus,
    actor: UserId,
) -> Result<Order, MarketError> {
    let mut order = store.order(order_id)?.clone();
    store.require_admin(actor)?;
    ensure_not_frozen(store, &order)?;

    let from = order.status;
    if from == status {
        return Ok(order);
    }
    if from == OrderStatus::MetAndExchanged && status != OrderStatus::Disputed {
        return Err(MarketError::InvalidTransition { from, to: status });
    }
    if from == OrderStatus::Cancelled {
        // The order starts reserving stock again.
        inventory::check_reservation(
            store,
            order.items.iter().map(|item| (item.product_id, item.quantity)),
        )?;
    }

    let now = ctx.clock.now();
    let mut tx = store.begin();
    if status == OrderStatus::Cancelled {
        order = apply_cancellation(&mut tx, ctx, order, actor, now).await?;
    } else {
        order.transition(status, actor, now);
        tx.put_order(order.clone());
        if from == OrderStatus::Cancelled {
            reinstate_payment(&mut tx, order_id);
        }
    }
    tx.commit();
    info!(order = %order_id, %from, to = %status, by = %actor, "Order status overridden");
    Ok(order)
}

/// Moves `order` to cancelled and refunds its payment. The refund goes last so
/// nothing after it can fail.
pub(crate) async fn apply_cancellation(
    tx: &mut Transaction<'_>,
    ctx: &MarketContext,
    mut order: Order,
    actor: UserId,
    now: DateTime<Utc>,
) -> Result<Order, MarketError> {
    order.transition(OrderStatus::Cancelled, actor, now);
    tx.put_order(order.clone());

    if let Some(mut payment) = tx
        .payment_for(order.id)
        .filter(|p| p.status == PaymentStatus::Completed)
        .cloned()
    {
        ctx.gateway
            .refund(&payment.reference, payment.amount)
            .await
            .map_err(MarketError::PaymentFailed)?;
        payment.status = PaymentStatus::Refunded;
        payment.refunded_at = Some(now);
        tx.put_payment(payment);
    }
    Ok(order)
}

// Marks a refunded payment as completed again. Only the record changes.
fn reinstate_payment(tx: &mut Transaction<'_>, order: OrderId) {
    if let Some(mut payment) = tx
        .payment_for(order)
        .filter(|p| p.status == PaymentStatus::Refunded)
        .cloned()
    {
        payment.status = PaymentStatus::Completed;
        payment.refunded_at = None;
        tx.put_payment(payment);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_actor::{FixedClock, MockGateway};
    use crate::model::{CardFingerprint, Payment, PaymentId, ProductId, Role};
    use crate::test_support::{at, order_for, product, user};
    use std::sync::Arc;

    fn ctx() -> MarketContext {
        MarketContext {
            gateway: Arc::new(MockGateway::new()),
            clock: Arc::new(FixedClock::new(at())),
        }
    }

    /// Buyer 2, sellers 1 and 3, admin 9; order 1 holds one unit of each product.
    fn seeded() -> MarketStore {
        let mut store = MarketStore::new();
        for u in [
            user(1, Role::Member),
            user(2, Role::Member),
            user(3, Role::Member),
            user(4, Role::Member),
            user(9, Role::Admin),
        ] {
            store.users.insert(u.id, u);
        }
        let a = product(1, UserId(1), 1);
        let b = product(2, UserId(3), 1);
        let order = order_for(1, UserId(2), &[(&a, 1), (&b, 1)]);
        store.payments.insert(
            PaymentId(1),
            Payment {
                id: PaymentId(1),
                order_id: order.id,
                amount: order.total_amount,
                status: PaymentStatus::Completed,
                card: CardFingerprint {
                    last4: "4242".into(),
                    expiry: "12/29".into(),
                },
                reference: "ref".into(),
                created_at: at(),
                refunded_at: None,
            },
        );
        store.products.insert(a.id, a);
        store.products.insert(b.id, b);
        store.orders.insert(order.id, order);
        store
    }

    #[test]
    fn test_completes_after_buyer_and_every_seller() {
        let mut store = seeded();
        let order = confirm(&mut store, at(), OrderId(1), ConfirmSide::Seller, UserId(1)).unwrap();
        assert!(!order.seller_confirmed);

        let order = confirm(&mut store, at(), OrderId(1), ConfirmSide::Buyer, UserId(2)).unwrap();
        assert_eq!(order.status, OrderStatus::WaitingToMeet);

        let order = confirm(&mut store, at(), OrderId(1), ConfirmSide::Seller, UserId(3)).unwrap();
        assert!(order.seller_confirmed);
        assert_eq!(order.status, OrderStatus::MetAndExchanged);
        assert_eq!(order.completed_at, Some(at()));
        assert_eq!(order.history.last().unwrap().by, UserId(3));
    }

    #[test]
    fn test_repeated_confirmation_is_rejected() {
        let mut store = seeded();
        confirm(&mut store, at(), OrderId(1), ConfirmSide::Buyer, UserId(2)).unwrap();
        let err = confirm(&mut store, at(), OrderId(1), ConfirmSide::Buyer, UserId(2)).unwrap_err();
        assert_eq!(
            err,
            MarketError::AlreadyConfirmed {
                order: OrderId(1),
                side: ConfirmSide::Buyer
            }
        );
        assert_eq!(store.order(OrderId(1)).unwrap().status, OrderStatus::WaitingToMeet);
    }

    #[test]
    fn test_wrong_side_is_forbidden() {
        let mut store = seeded();
        let err =
            confirm(&mut store, at(), OrderId(1), ConfirmSide::Seller, UserId(2)).unwrap_err();
        assert!(matches!(err, MarketError::Forbidden(_)));
        let err = confirm(&mut store, at(), OrderId(7), ConfirmSide::Buyer, UserId(2)).unwrap_err();
        assert!(matches!(err, MarketError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_cancel_refunds_and_releases_stock() {
        let mut store = seeded();
        let order = cancel(&mut store, &ctx(), OrderId(1), UserId(3)).await.unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(
            store.payment_for(OrderId(1)).unwrap().status,
            PaymentStatus::Refunded
        );
        let p = store.product(ProductId(1)).unwrap();
        assert_eq!(inventory::available_quantity(p, store.orders.values()), 1);

        let err = cancel(&mut store, &ctx(), OrderId(1), UserId(2)).await.unwrap_err();
        assert_eq!(
            err,
            MarketError::InvalidTransition {
                from: OrderStatus::Cancelled,
                to: OrderStatus::Cancelled
            }
        );
    }

    #[tokio::test]
    async fn test_outsider_cannot_cancel() {
        let mut store = seeded();
        let err = cancel(&mut store, &ctx(), OrderId(1), UserId(4)).await.unwrap_err();
        assert!(matches!(err, MarketError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_admin_reactivation_rechecks_stock() {
        let mut store = seeded();
        cancel(&mut store, &ctx(), OrderId(1), UserId(9)).await.unwrap();

        // Someone else takes the freed unit of product 1.
        let a = store.product(ProductId(1)).unwrap().clone();
        let other = order_for(2, UserId(4), &[(&a, 1)]);
        store.orders.insert(other.id, other);

        let err = set_status(&mut store, &ctx(), OrderId(1), OrderStatus::WaitingToMeet, UserId(9))
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::InsufficientStock { .. }));

        store.orders.remove(&OrderId(2));
        let order = set_status(
            &mut store,
            &ctx(),
            OrderId(1),
            OrderStatus::WaitingToMeet,
            UserId(9),
        )
        .await
        .unwrap();
        assert_eq!(order.status, OrderStatus::WaitingToMeet);
        assert_eq!(
            store.payment_for(OrderId(1)).unwrap().status,
            PaymentStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_override_rules() {
        let mut store = seeded();
        let err = set_status(&mut store, &ctx(), OrderId(1), OrderStatus::Cancelled, UserId(2))
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::Forbidden(_)));

        let same = set_status(&mut store, &ctx(), OrderId(1), OrderStatus::WaitingToMeet, UserId(9))
            .await
            .unwrap();
        assert!(same.history.is_empty());

        set_status(&mut store, &ctx(), OrderId(1), OrderStatus::MetAndExchanged, UserId(9))
            .await
            .unwrap();
        let err = set_status(&mut store, &ctx(), OrderId(1), OrderStatus::Cancelled, UserId(9))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            MarketError::InvalidTransition {
                from: OrderStatus::MetAndExchanged,
                to: OrderStatus::Cancelled
            }
        );
        let order = set_status(&mut store, &ctx(), OrderId(1), OrderStatus::Disputed, UserId(9))
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Disputed);
    }
}
