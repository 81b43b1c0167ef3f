//! Soft delete and restore, with the cascade from users to what they own.
//!
//! Every delete draws a fresh [`DeletionBatch`] and stamps it on each record it
//! touches. A restore brings back exactly the records carrying the target's
//! batch, so records deleted independently (before or after) stay deleted.

use crate::inventory;
use crate::market_actor::MarketError;
use crate::model::{
    AccountStatus, DeletionBatch, DisputeId, EntityRecord, EntityRef, OrderId, OrderStatus,
    ProductId, SoftDeletable, SoftDelete, UserId,
};
use crate::store::{MarketStore, Transaction};
use chrono::{DateTime, Utc};
use tracing::info;

pub fn soft_delete(
    store: &mut MarketStore,
    now: DateTime<Utc>,
    target: EntityRef,
    actor: UserId,
) -> Result<EntityRecord, MarketError> {
    let mut tx = store.begin();
    let record = match target {
        EntityRef::User(id) => delete_user(&mut tx, now, id, actor)?,
        EntityRef::Product(id) => delete_product(&mut tx, now, id, actor)?,
        EntityRef::Order(id) => delete_order(&mut tx, now, id, actor)?,
        EntityRef::Dispute(id) => delete_dispute(&mut tx, now, id, actor)?,
    };
    let writes = tx.staged();
    tx.commit();
    info!(%target, by = %actor, writes, "Soft deleted");
    Ok(record)
}

pub fn restore(
    store: &mut MarketStore,
    target: EntityRef,
    actor: UserId,
) -> Result<EntityRecord, MarketError> {
    let mut tx = store.begin();
    let record = match target {
        EntityRef::User(id) => restore_user(&mut tx, id, actor)?,
        EntityRef::Product(id) => restore_product(&mut tx, id, actor)?,
        EntityRef::Order(id) => restore_order(&mut tx, id, actor)?,
        EntityRef::Dispute(id) => restore_dispute(&mut tx, id, actor)?,
    };
    let writes = tx.staged();
    tx.commit();
    info!(%target, by = %actor, writes, "Restored");
    Ok(record)
}

fn stamp(tx: &mut Transaction<'_>, now: DateTime<Utc>, actor: UserId) -> SoftDelete {
    SoftDelete {
        deleted_at: now,
        deleted_by: actor,
        batch: tx.next_batch(),
    }
}

fn already_deleted(target: impl std::fmt::Display) -> MarketError {
    MarketError::InvalidState(format!("{target} is already deleted"))
}

fn not_deleted(target: impl std::fmt::Display) -> MarketError {
    MarketError::InvalidState(format!("{target} is not deleted"))
}

// Drops `products` from every cart that holds them.
fn purge_from_carts(tx: &mut Transaction<'_>, now: DateTime<Utc>, products: &[ProductId]) {
    let carts: Vec<_> = tx
        .carts
        .values()
        .filter(|cart| products.iter().any(|p| cart.lines.contains_key(p)))
        .cloned()
        .collect();
    for mut cart in carts {
        cart.lines.retain(|product, _| !products.contains(product));
        cart.updated_at = now;
        tx.put_cart(cart);
    }
}

// -----------------------------------------------------------------------------
// Users
// -----------------------------------------------------------------------------

fn delete_user(
    tx: &mut Transaction<'_>,
    now: DateTime<Utc>,
    id: UserId,
    actor: UserId,
) -> Result<EntityRecord, MarketError> {
    let mut user = tx.user(id)?.clone();
    let acting = tx.active_actor(actor)?;
    if actor != id && !acting.is_admin() {
        return Err(MarketError::Forbidden(format!("{actor} cannot delete {id}")));
    }
    if user.is_deleted() {
        return Err(already_deleted(id));
    }
    // Another buyer still expects to meet this seller.
    if let Some(order) = tx
        .active_orders()
        .find(|o| o.buyer_id != id && o.is_seller(id))
    {
        return Err(MarketError::Conflict(format!(
            "{id} has products in active {}",
            order.id
        )));
    }

    let stamp = stamp(tx, now, actor);
    user.set_deletion(Some(stamp));
    tx.put_user(user.clone());

    let products: Vec<_> = tx
        .products
        .values()
        .filter(|p| p.seller_id == id && !p.is_deleted())
        .cloned()
        .collect();
    let product_ids: Vec<_> = products.iter().map(|p| p.id).collect();
    for mut product in products {
        product.set_deletion(Some(stamp));
        tx.put_product(product);
    }

    let orders: Vec<_> = tx
        .orders
        .values()
        .filter(|o| o.buyer_id == id && !o.is_deleted())
        .cloned()
        .collect();
    for mut order in orders {
        order.set_deletion(Some(stamp));
        tx.put_order(order);
    }

    purge_from_carts(tx, now, &product_ids);
    tx.remove_cart(id);
    Ok(EntityRecord::User(user))
}

fn restore_user(
    tx: &mut Transaction<'_>,
    id: UserId,
    actor: UserId,
) -> Result<EntityRecord, MarketError> {
    let mut user = tx.user(id)?.clone();
    let deletion = user.deletion().copied().ok_or_else(|| not_deleted(id))?;

    // A self-deleted user may undo their own deletion while still deleted.
    let permitted = if actor == id {
        deletion.deleted_by == id && user.status == AccountStatus::Active
    } else {
        let acting = tx.active_actor(actor)?;
        acting.is_admin() || deletion.deleted_by == actor
    };
    if !permitted {
        return Err(MarketError::Forbidden(format!("{actor} cannot restore {id}")));
    }

    if let Some(holder) = tx.active_user_by_email(&user.email) {
        return Err(MarketError::Conflict(format!(
            "{} is already used by {}",
            user.email, holder.id
        )));
    }

    user.set_deletion(None);
    tx.put_user(user.clone());
    restore_batch(tx, deletion.batch)?;
    Ok(EntityRecord::User(user))
}

// Brings back the products and orders stamped by `batch`. Products go first so
// the orders' stock check can see them.
fn restore_batch(tx: &mut Transaction<'_>, batch: DeletionBatch) -> Result<(), MarketError> {
    let products: Vec<_> = tx
        .products
        .values()
        .filter(|p| p.deleted_in(batch))
        .cloned()
        .collect();
    for mut product in products {
        product.set_deletion(None);
        tx.put_product(product);
    }

    let orders: Vec<_> = tx
        .orders
        .values()
        .filter(|o| o.deleted_in(batch))
        .cloned()
        .collect();
    for mut order in orders {
        if order.status != OrderStatus::Cancelled {
            inventory::check_reservation(
                tx,
                order.items.iter().map(|item| (item.product_id, item.quantity)),
            )?;
        }
        order.set_deletion(None);
        tx.put_order(order);
    }
    Ok(())
}

// -----------------------------------------------------------------------------
// Products
// -----------------------------------------------------------------------------

fn delete_product(
    tx: &mut Transaction<'_>,
    now: DateTime<Utc>,
    id: ProductId,
    actor: UserId,
) -> Result<EntityRecord, MarketError> {
    let mut product = tx.product(id)?.clone();
    let acting = tx.active_actor(actor)?;
    if product.seller_id != actor && !acting.is_admin() {
        return Err(MarketError::Forbidden(format!("{actor} cannot delete {id}")));
    }
    if product.is_deleted() {
        return Err(already_deleted(id));
    }
    if let Some(order) = tx.active_orders().find(|o| o.references(id)) {
        return Err(MarketError::Conflict(format!(
            "{id} is reserved by {}",
            order.id
        )));
    }

    let stamp = stamp(tx, now, actor);
    product.set_deletion(Some(stamp));
    tx.put_product(product.clone());
    purge_from_carts(tx, now, &[id]);
    Ok(EntityRecord::Product(product))
}

fn restore_product(
    tx: &mut Transaction<'_>,
    id: ProductId,
    actor: UserId,
) -> Result<EntityRecord, MarketError> {
    let mut product = tx.product(id)?.clone();
    let acting = tx.active_actor(actor)?;
    if product.seller_id != actor && !acting.is_admin() {
        return Err(MarketError::Forbidden(format!("{actor} cannot restore {id}")));
    }
    if !product.is_deleted() {
        return Err(not_deleted(id));
    }
    if tx.user(product.seller_id)?.is_deleted() {
        return Err(MarketError::InvalidState(format!(
            "seller {} of {id} is deleted",
            product.seller_id
        )));
    }

    product.set_deletion(None);
    tx.put_product(product.clone());
    Ok(EntityRecord::Product(product))
}

// -----------------------------------------------------------------------------
// Orders
// -----------------------------------------------------------------------------

fn delete_order(
    tx: &mut Transaction<'_>,
    now: DateTime<Utc>,
    id: OrderId,
    actor: UserId,
) -> Result<EntityRecord, MarketError> {
    let mut order = tx.order(id)?.clone();
    tx.require_admin(actor)?;
    if order.is_deleted() {
        return Err(already_deleted(id));
    }

    let stamp = stamp(tx, now, actor);
    order.set_deletion(Some(stamp));
    tx.put_order(order.clone());
    Ok(EntityRecord::Order(order))
}

fn restore_order(
    tx: &mut Transaction<'_>,
    id: OrderId,
    actor: UserId,
) -> Result<EntityRecord, MarketError> {
    let mut order = tx.order(id)?.clone();
    tx.require_admin(actor)?;
    if !order.is_deleted() {
        return Err(not_deleted(id));
    }
    if tx.user(order.buyer_id)?.is_deleted() {
        return Err(MarketError::InvalidState(format!(
            "buyer {} of {id} is deleted",
            order.buyer_id
        )));
    }
    if order.status != OrderStatus::Cancelled {
        inventory::check_reservation(
            tx,
            order.items.iter().map(|item| (item.product_id, item.quantity)),
        )?;
    }

    order.set_deletion(None);
    tx.put_order(order.clone());
    Ok(EntityRecord::Order(order))
}

// -----------------------------------------------------------------------------
// Disputes
// -----------------------------------------------------------------------------

fn delete_dispute(
    tx: &mut Transaction<'_>,
    now: DateTime<Utc>,
    id: DisputeId,
    actor: UserId,
) -> Result<EntityRecord, MarketError> {
    let mut dispute = tx.dispute(id)?.clone();
    tx.require_admin(actor)?;
    if dispute.is_deleted() {
        return Err(already_deleted(id));
    }

    let stamp = stamp(tx, now, actor);
    dispute.set_deletion(Some(stamp));
    tx.put_dispute(dispute.clone());
    Ok(EntityRecord::Dispute(dispute))
}

fn restore_dispute(
    tx: &mut Transaction<'_>,
    id: DisputeId,
    actor: UserId,
) -> Result<EntityRecord, MarketError> {
    let mut dispute = tx.dispute(id)?.clone();
    tx.require_admin(actor)?;
    if !dispute.is_deleted() {
        return Err(not_deleted(id));
    }
    if let Some(other) = tx.live_dispute_for(dispute.order_id) {
        return Err(MarketError::Conflict(format!(
            "{} already has {}",
            dispute.order_id, other.id
        )));
    }

    dispute.set_deletion(None);
    tx.put_dispute(dispute.clone());
    Ok(EntityRecord::Dispute(dispute))
}
