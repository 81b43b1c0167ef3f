//! Cart to order conversion.
//!
//! [`create_order`] runs inside one [`Transaction`](crate::store::Transaction):
//! the order row, the payment row and the emptied cart are committed together
//! or not at all.

pub mod card;
pub mod cart;

pub use card::*;

use crate::inventory;
use crate::market_actor::{MarketContext, MarketError};
use crate::model::{
    checked_sum, money, Address, ListingStatus, Order, OrderItem, OrderStatus, Payment,
    PaymentStatus, Product, ProductId, SoftDeletable, StatusChange, UserId,
};
use crate::store::MarketStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Everything a buyer submits at checkout besides the cart itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub shipping_address: Address,
    pub billing_address: Address,
    pub card: CardDetails,
}

/// Loads a product a buyer wants and checks it is listed by an active seller.
///
/// Returns the product together with its current availability, which may be
/// zero; callers decide how a sold-out listing is reported.
pub(crate) fn purchasable(
    store: &MarketStore,
    product_id: ProductId,
) -> Result<(&Product, u32), MarketError> {
    let product = store
        .product(product_id)
        .map_err(|_| MarketError::ProductUnavailable(product_id))?;
    if product.is_deleted() || product.listing == ListingStatus::Hidden {
        return Err(MarketError::ProductUnavailable(product_id));
    }
    let seller = store.user(product.seller_id)?;
    if !seller.is_active() {
        return Err(MarketError::SellerInactive(seller.id));
    }
    let available = inventory::available_quantity(product, store.orders.values());
    Ok((product, available))
}

/// Converts the buyer's cart into an order, charges the card and empties the
/// cart.
pub async fn create_order(
    store: &mut MarketStore,
    ctx: &MarketContext,
    order_prefix: &str,
    buyer: UserId,
    request: CheckoutRequest,
) -> Result<Order, MarketError> {
    store.active_actor(buyer)?;

    // Input checks come before anything is loaded.
    let fingerprint = request.card.validate()?;
    for (label, address) in [
        ("shipping", &request.shipping_address),
        ("billing", &request.billing_address),
    ] {
        if !address.is_complete() {
            return Err(MarketError::ValidationError(format!(
                "{label} address is incomplete"
            )));
        }
    }

    let cart = match store.cart(buyer) {
        Some(cart) if !cart.is_empty() => cart.clone(),
        _ => return Err(MarketError::EmptyCart),
    };

    let mut items = Vec::with_capacity(cart.lines.len());
    for line in cart.lines.values() {
        let (product, available) = purchasable(store, line.product_id)?;
        if line.quantity > available {
            return Err(MarketError::InsufficientStock {
                product: line.product_id,
                requested: line.quantity,
                available,
            });
        }
        // Snapshot from the record just loaded, not from the cart line.
        items.push(OrderItem {
            product_id: product.id,
            seller_id: product.seller_id,
            name: product.name.clone(),
            image: product.image.clone(),
            unit_price: product.price,
            quantity: line.quantity,
        });
    }
    let total_amount = checked_sum(items.iter().map(OrderItem::line_total))
        .map(money)
        .ok_or_else(|| MarketError::ValidationError("order total is too large".into()))?;

    let now = ctx.clock.now();
    let mut tx = store.begin();
    let order_id = tx.next_order_id();
    let order = Order {
        id: order_id,
        order_number: format!("{order_prefix}-{}-{:06}", now.format("%Y%m%d"), order_id.0),
        buyer_id: buyer,
        items,
        total_amount,
        status: OrderStatus::WaitingToMeet,
        buyer_confirmed: false,
        seller_confirmations: BTreeSet::new(),
        seller_confirmed: false,
        dispute_id: None,
        shipping_address: request.shipping_address,
        billing_address: request.billing_address,
        history: vec![StatusChange {
            from: None,
            to: OrderStatus::WaitingToMeet,
            by: buyer,
            at: now,
        }],
        created_at: now,
        updated_at: now,
        completed_at: None,
        deletion: None,
    };
    tx.put_order(order.clone());

    debug!(order = %order_id, amount = %total_amount, "Charging card");
    let reference = ctx
        .gateway
        .charge(order_id, total_amount, &fingerprint)
        .await
        .map_err(MarketError::PaymentFailed)?;
    let payment_id = tx.next_payment_id();
    tx.put_payment(Payment {
        id: payment_id,
        order_id,
        amount: total_amount,
        status: PaymentStatus::Completed,
        card: fingerprint,
        reference,
        created_at: now,
        refunded_at: None,
    });

    tx.remove_cart(buyer);
    tx.commit();

    info!(order = %order_id, number = %order.order_number, total = %total_amount, "Order created");
    Ok(order)
}
