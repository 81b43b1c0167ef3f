//! Cart mutations. Every change is checked against live availability.

use crate::checkout::purchasable;
use crate::market_actor::MarketError;
use crate::model::{Cart, CartLine, ProductId, UserId};
use crate::store::MarketStore;
use chrono::{DateTime, Utc};

/// Adds `quantity` units of `product` to the user's cart, merging with an
/// existing line.
pub fn add_item(
    store: &mut MarketStore,
    now: DateTime<Utc>,
    user: UserId,
    product: ProductId,
    quantity: u32,
) -> Result<Cart, MarketError> {
    let current = store.cart(user).map_or(0, |cart| cart.quantity_of(product));
    set_line(store, now, user, product, current.saturating_add(quantity), quantity)
}

/// Replaces the quantity of an existing line; `0` removes it.
pub fn update_item(
    store: &mut MarketStore,
    now: DateTime<Utc>,
    user: UserId,
    product: ProductId,
    quantity: u32,
) -> Result<Cart, MarketError> {
    if store.cart(user).map_or(0, |cart| cart.quantity_of(product)) == 0 {
        return Err(MarketError::not_found("Cart item", product));
    }
    if quantity == 0 {
        return remove_item(store, now, user, product);
    }
    set_line(store, now, user, product, quantity, quantity)
}

pub fn remove_item(
    store: &mut MarketStore,
    now: DateTime<Utc>,
    user: UserId,
    product: ProductId,
) -> Result<Cart, MarketError> {
    store.active_actor(user)?;
    let mut cart = store
        .cart(user)
        .filter(|cart| cart.lines.contains_key(&product))
        .cloned()
        .ok_or_else(|| MarketError::not_found("Cart item", product))?;
    cart.lines.remove(&product);
    cart.updated_at = now;

    let mut tx = store.begin();
    tx.put_cart(cart.clone());
    tx.commit();
    Ok(cart)
}

/// The user's cart; an empty one if nothing was ever added.
pub fn cart(store: &MarketStore, now: DateTime<Utc>, user: UserId) -> Result<Cart, MarketError> {
    store.user(user)?;
    Ok(store
        .cart(user)
        .cloned()
        .unwrap_or_else(|| Cart::new(user, now)))
}

fn set_line(
    store: &mut MarketStore,
    now: DateTime<Utc>,
    user: UserId,
    product_id: ProductId,
    line_quantity: u32,
    requested: u32,
) -> Result<Cart, MarketError> {
    store.active_actor(user)?;
    if requested == 0 {
        return Err(MarketError::ValidationError(
            "quantity must be at least 1".into(),
        ));
    }
    let (product, available) = purchasable(store, product_id)?;
    if available == 0 {
        return Err(MarketError::ProductUnavailable(product_id));
    }
    if product.seller_id == user {
        return Err(MarketError::Forbidden(
            "sellers cannot buy their own listing".into(),
        ));
    }
    if line_quantity > available {
        return Err(MarketError::InsufficientStock {
            product: product_id,
            requested: line_quantity,
            available,
        });
    }
    let unit_price = product.price;

    let mut cart = store
        .cart(user)
        .cloned()
        .unwrap_or_else(|| Cart::new(user, now));
    cart.lines.insert(
        product_id,
        CartLine {
            product_id,
            quantity: line_quantity,
            unit_price,
        },
    );
    cart.updated_at = now;

    let mut tx = store.begin();
    tx.put_cart(cart.clone());
    tx.commit();
    Ok(cart)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;
    use crate::test_support::{at, order_for, product, user};

    fn seeded() -> MarketStore {
        let mut store = MarketStore::new();
        for u in [user(1, Role::Member), user(2, Role::Member), user(3, Role::Member)] {
            store.users.insert(u.id, u);
        }
        let p = product(1, UserId(1), 3);
        store.products.insert(p.id, p);
        store
    }

    #[test]
    fn test_add_merges_lines_and_respects_availability() {
        let mut store = seeded();
        add_item(&mut store, at(), UserId(2), ProductId(1), 2).unwrap();
        let cart = add_item(&mut store, at(), UserId(2), ProductId(1), 1).unwrap();
        assert_eq!(cart.quantity_of(ProductId(1)), 3);
        assert_eq!(cart.total().unwrap().to_string(), "30.00");

        let err = add_item(&mut store, at(), UserId(2), ProductId(1), 1).unwrap_err();
        assert_eq!(
            err,
            MarketError::InsufficientStock {
                product: ProductId(1),
                requested: 4,
                available: 3
            }
        );
    }

    #[test]
    fn test_reserved_units_are_not_addable() {
        let mut store = seeded();
        let p = store.product(ProductId(1)).unwrap().clone();
        let o = order_for(1, UserId(3), &[(&p, 3)]);
        store.orders.insert(o.id, o);

        let err = add_item(&mut store, at(), UserId(2), ProductId(1), 1).unwrap_err();
        assert_eq!(err, MarketError::ProductUnavailable(ProductId(1)));
    }

    #[test]
    fn test_seller_cannot_add_own_listing() {
        let mut store = seeded();
        let err = add_item(&mut store, at(), UserId(1), ProductId(1), 1).unwrap_err();
        assert!(matches!(err, MarketError::Forbidden(_)));
    }

    #[test]
    fn test_update_to_zero_removes_line() {
        let mut store = seeded();
        add_item(&mut store, at(), UserId(2), ProductId(1), 2).unwrap();
        let cart = update_item(&mut store, at(), UserId(2), ProductId(1), 0).unwrap();
        assert!(cart.is_empty());

        let err = update_item(&mut store, at(), UserId(2), ProductId(1), 1).unwrap_err();
        assert!(matches!(err, MarketError::NotFound { .. }));
    }
}
