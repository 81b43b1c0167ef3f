//! Disputes: the lock on an order while buyer, sellers and admins argue it out,
//! and the deterministic way it ends.

use crate::confirmation::apply_cancellation;
use crate::market_actor::{MarketContext, MarketError};
use crate::model::{
    Dispute, DisputeId, DisputeMessage, DisputeStatus, MessageRole, OrderId, OrderStatus,
    SoftDeletable, User, UserId,
};
use crate::store::MarketStore;
use chrono::{DateTime, Utc};
use tracing::info;

/// Opens a dispute on `order_id`. The reason becomes the first message and the
/// order moves to `disputed`.
pub fn open(
    store: &mut MarketStore,
    now: DateTime<Utc>,
    order_id: OrderId,
    reason: &str,
    actor: UserId,
) -> Result<Dispute, MarketError> {
    let mut order = store.order(order_id)?.clone();
    store.active_actor(actor)?;
    if !order.is_party(actor) {
        return Err(MarketError::Forbidden(format!(
            "{actor} is not a party to {order_id}"
        )));
    }
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(MarketError::ValidationError("a reason is required".into()));
    }
    if let Some(existing) = store.live_dispute_for(order_id) {
        return Err(MarketError::Conflict(format!(
            "{order_id} already has {}",
            existing.id
        )));
    }
    if order.is_deleted() {
        return Err(MarketError::Frozen(format!("{order_id} is deleted")));
    }
    if order.status == OrderStatus::Cancelled {
        return Err(MarketError::InvalidTransition {
            from: OrderStatus::Cancelled,
            to: OrderStatus::Disputed,
        });
    }

    let role = if order.buyer_id == actor {
        MessageRole::Buyer
    } else {
        MessageRole::Seller
    };

    let mut tx = store.begin();
    let dispute = Dispute {
        id: tx.next_dispute_id(),
        order_id,
        buyer_id: order.buyer_id,
        seller_ids: order.sellers().into_iter().collect(),
        opened_by: actor,
        status: DisputeStatus::Open,
        messages: vec![DisputeMessage {
            sender_id: actor,
            role,
            text: reason.to_string(),
            sent_at: now,
        }],
        resolution: None,
        resolved_by: None,
        resolved_at: None,
        closed_by: None,
        closed_at: None,
        created_at: now,
        deletion: None,
    };
    order.dispute_id = Some(dispute.id);
    if order.status != OrderStatus::Disputed {
        order.transition(OrderStatus::Disputed, actor, now);
    }
    tx.put_order(order);
    tx.put_dispute(dispute.clone());
    tx.commit();

    info!(dispute = %dispute.id, order = %order_id, by = %actor, "Dispute opened");
    Ok(dispute)
}

/// Appends a message. The first admin message puts the dispute under review.
pub fn add_message(
    store: &mut MarketStore,
    now: DateTime<Utc>,
    dispute_id: DisputeId,
    text: &str,
    actor: UserId,
) -> Result<Dispute, MarketError> {
    let mut dispute = store.dispute(dispute_id)?.clone();
    let sender = store.active_actor(actor)?;
    let role = message_role(&dispute, sender)?;
    let text = text.trim();
    if text.is_empty() {
        return Err(MarketError::ValidationError("message is empty".into()));
    }
    ensure_open(store, &dispute)?;

    dispute.messages.push(DisputeMessage {
        sender_id: actor,
        role,
        text: text.to_string(),
        sent_at: now,
    });
    if role == MessageRole::Admin && dispute.status == DisputeStatus::Open {
        dispute.status = DisputeStatus::UnderReview;
        info!(dispute = %dispute_id, "Dispute under review");
    }

    let mut tx = store.begin();
    tx.put_dispute(dispute.clone());
    tx.commit();
    Ok(dispute)
}

/// Ends the dispute in the buyer's favour: the order is cancelled and refunded
/// unless it already was.
pub async fn resolve(
    store: &mut MarketStore,
    ctx: &MarketContext,
    dispute_id: DisputeId,
    resolution: &str,
    actor: UserId,
) -> Result<Dispute, MarketError> {
    let mut dispute = store.dispute(dispute_id)?.clone();
    store.require_admin(actor)?;
    let resolution = resolution.trim();
    if resolution.is_empty() {
        return Err(MarketError::ValidationError(
            "a resolution is required".into(),
        ));
    }
    ensure_open(store, &dispute)?;
    let order = store.order(dispute.order_id)?.clone();

    let now = ctx.clock.now();
    dispute.status = DisputeStatus::Resolved;
    dispute.resolution = Some(resolution.to_string());
    dispute.resolved_by = Some(actor);
    dispute.resolved_at = Some(now);
    dispute.messages.push(DisputeMessage {
        sender_id: actor,
        role: MessageRole::System,
        text: format!("Dispute resolved: {resolution}"),
        sent_at: now,
    });

    let mut tx = store.begin();
    tx.put_dispute(dispute.clone());
    if order.status != OrderStatus::Cancelled {
        apply_cancellation(&mut tx, ctx, order, actor, now).await?;
    }
    tx.commit();

    info!(dispute = %dispute_id, by = %actor, "Dispute resolved");
    Ok(dispute)
}

/// Closes an unresolved dispute without touching the order.
pub fn close(
    store: &mut MarketStore,
    now: DateTime<Utc>,
    dispute_id: DisputeId,
    actor: UserId,
) -> Result<Dispute, MarketError> {
    let mut dispute = store.dispute(dispute_id)?.clone();
    store.require_admin(actor)?;
    ensure_open(store, &dispute)?;

    dispute.status = DisputeStatus::Closed;
    dispute.closed_by = Some(actor);
    dispute.closed_at = Some(now);

    let mut tx = store.begin();
    tx.put_dispute(dispute.clone());
    tx.commit();

    info!(dispute = %dispute_id, by = %actor, "Dispute closed");
    Ok(dispute)
}

/// Reads a dispute. Works on frozen disputes too.
pub fn get(
    store: &MarketStore,
    dispute_id: DisputeId,
    actor: UserId,
) -> Result<Dispute, MarketError> {
    let dispute = store.dispute(dispute_id)?;
    let viewer = store.active_actor(actor)?;
    if !dispute.is_party(actor) && !viewer.is_admin() {
        return Err(MarketError::Forbidden(format!(
            "{actor} cannot view {dispute_id}"
        )));
    }
    Ok(dispute.clone())
}

fn message_role(dispute: &Dispute, sender: &User) -> Result<MessageRole, MarketError> {
    if dispute.buyer_id == sender.id {
        Ok(MessageRole::Buyer)
    } else if dispute.seller_ids.contains(&sender.id) {
        Ok(MessageRole::Seller)
    } else if sender.is_admin() {
        Ok(MessageRole::Admin)
    } else {
        Err(MarketError::Forbidden(format!(
            "{} is not a participant in {}",
            sender.id, dispute.id
        )))
    }
}

// A dispute accepts changes only while active and while neither it nor its
// order is soft-deleted.
fn ensure_open(store: &MarketStore, dispute: &Dispute) -> Result<(), MarketError> {
    if dispute.is_deleted() {
        return Err(MarketError::Frozen(format!("{} is deleted", dispute.id)));
    }
    if store.order(dispute.order_id)?.is_deleted() {
        return Err(MarketError::Frozen(format!(
            "{} belongs to a deleted order",
            dispute.id
        )));
    }
    if !dispute.status.is_active() {
        return Err(MarketError::Frozen(format!(
            "{} is already {:?}",
            dispute.id, dispute.status
        )));
    }
    Ok(())
}
