//! Inventory ledger: how much of a product can still be bought.
//!
//! Nothing here is stored. Every consumer recomputes availability from the live
//! order table at the moment it decides, so there is no counter to drift.

use crate::market_actor::MarketError;
use crate::model::{
    ListingStatus, Order, Product, ProductId, ProductStatus, ProductView, SoftDeletable,
};
use crate::store::MarketStore;
use std::collections::BTreeMap;

/// Units of `product` held by active (non-deleted, non-cancelled) orders.
///
/// Disputed orders keep their reservation.
pub fn reserved_quantity<'a>(
    product: ProductId,
    orders: impl IntoIterator<Item = &'a Order>,
) -> u32 {
    orders
        .into_iter()
        .filter(|order| order.is_active())
        .map(|order| order.quantity_of(product))
        .sum()
}

/// `total_quantity - reserved`, never below zero.
pub fn available_quantity<'a>(
    product: &Product,
    orders: impl IntoIterator<Item = &'a Order>,
) -> u32 {
    product
        .total_quantity
        .saturating_sub(reserved_quantity(product.id, orders))
}

pub fn effective_status(product: &Product, available: u32) -> ProductStatus {
    if available == 0 {
        return ProductStatus::Sold;
    }
    match product.listing {
        ListingStatus::Available => ProductStatus::Available,
        ListingStatus::Hidden => ProductStatus::Hidden,
    }
}

/// Joins a product with its live reservation figures.
pub fn view(store: &MarketStore, product: &Product) -> ProductView {
    let reserved = reserved_quantity(product.id, store.orders.values());
    let available = product.total_quantity.saturating_sub(reserved);
    ProductView {
        product: product.clone(),
        reserved,
        available,
        status: effective_status(product, available),
    }
}

/// Verifies that `lines` could be reserved on top of every active order.
///
/// Lines for the same product are summed first. A deleted product can't back a
/// reservation at all.
pub fn check_reservation(
    store: &MarketStore,
    lines: impl IntoIterator<Item = (ProductId, u32)>,
) -> Result<(), MarketError> {
    let mut wanted: BTreeMap<ProductId, u32> = BTreeMap::new();
    for (product, quantity) in lines {
        *wanted.entry(product).or_default() += quantity;
    }

    for (product_id, requested) in wanted {
        let product = store.product(product_id)?;
        if product.is_deleted() {
            return Err(MarketError::ProductUnavailable(product_id));
        }
        let available = available_quantity(product, store.orders.values());
        if requested > available {
            return Err(MarketError::InsufficientStock {
                product: product_id,
                requested,
                available,
            });
        }
    }
    Ok(())
}
