//! Accounts and listings.

use crate::inventory;
use crate::market_actor::MarketError;
use crate::model::{
    money, normalize_email, AccountStatus, ListingStatus, Product, ProductCreate, ProductId,
    ProductUpdate, ProductView, SoftDeletable, User, UserCreate, UserId,
};
use crate::store::MarketStore;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::info;

pub fn register_user(
    store: &mut MarketStore,
    now: DateTime<Utc>,
    params: UserCreate,
) -> Result<User, MarketError> {
    let name = params.name.trim();
    if name.is_empty() {
        return Err(MarketError::ValidationError("name is required".into()));
    }
    let email = normalize_email(&params.email);
    if !plausible_email(&email) {
        return Err(MarketError::ValidationError(format!(
            "invalid email: {email}"
        )));
    }
    if let Some(holder) = store.active_user_by_email(&email) {
        return Err(MarketError::Conflict(format!(
            "{email} is already used by {}",
            holder.id
        )));
    }

    let mut tx = store.begin();
    let user = User {
        id: tx.next_user_id(),
        name: name.to_string(),
        email,
        role: params.role,
        status: AccountStatus::Active,
        created_at: now,
        deletion: None,
    };
    tx.put_user(user.clone());
    tx.commit();

    info!(user = %user.id, role = ?user.role, "User registered");
    Ok(user)
}

fn plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
                && !domain.contains('@')
        }
        None => false,
    }
}

/// Bans or unbans an account.
pub fn set_user_status(
    store: &mut MarketStore,
    actor: UserId,
    target: UserId,
    status: AccountStatus,
) -> Result<User, MarketError> {
    store.require_admin(actor)?;
    let mut user = store.user(target)?.clone();
    if user.is_deleted() {
        return Err(MarketError::InvalidState(format!("{target} is deleted")));
    }
    user.status = status;

    let mut tx = store.begin();
    tx.put_user(user.clone());
    tx.commit();
    info!(user = %target, ?status, by = %actor, "User status changed");
    Ok(user)
}

pub fn user(store: &MarketStore, id: UserId) -> Result<User, MarketError> {
    store.user(id).cloned()
}

pub fn create_product(
    store: &mut MarketStore,
    now: DateTime<Utc>,
    seller: UserId,
    params: ProductCreate,
) -> Result<ProductView, MarketError> {
    store.active_actor(seller)?;
    let name = validate_name(&params.name)?;
    let price = validate_price(params.price)?;

    let mut tx = store.begin();
    let product = Product {
        id: tx.next_product_id(),
        seller_id: seller,
        name,
        price,
        image: params.image,
        total_quantity: params.quantity,
        listing: ListingStatus::Available,
        created_at: now,
        updated_at: now,
        deletion: None,
    };
    tx.put_product(product.clone());
    tx.commit();

    info!(product = %product.id, seller = %seller, "Product listed");
    Ok(inventory::view(store, &product))
}

/// Applies a partial update. Stock can't shrink below what active orders hold.
pub fn update_product(
    store: &mut MarketStore,
    now: DateTime<Utc>,
    actor: UserId,
    id: ProductId,
    update: ProductUpdate,
) -> Result<ProductView, MarketError> {
    let mut product = store.product(id)?.clone();
    let acting = store.active_actor(actor)?;
    if product.seller_id != actor && !acting.is_admin() {
        return Err(MarketError::Forbidden(format!("{actor} cannot edit {id}")));
    }
    if product.is_deleted() {
        return Err(MarketError::InvalidState(format!("{id} is deleted")));
    }

    if let Some(name) = update.name {
        product.name = validate_name(&name)?;
    }
    if let Some(price) = update.price {
        product.price = validate_price(price)?;
    }
    if let Some(image) = update.image {
        product.image = Some(image).filter(|i| !i.trim().is_empty());
    }
    if let Some(listing) = update.listing {
        product.listing = listing;
    }
    if let Some(total) = update.total_quantity {
        let reserved = inventory::reserved_quantity(id, store.orders.values());
        if total < reserved {
            return Err(MarketError::QuantityBelowReserved {
                product: id,
                requested: total,
                reserved,
            });
        }
        product.total_quantity = total;
    }
    product.updated_at = now;

    let mut tx = store.begin();
    tx.put_product(product.clone());
    tx.commit();
    Ok(inventory::view(store, &product))
}

pub fn product(store: &MarketStore, id: ProductId) -> Result<ProductView, MarketError> {
    let product = store.product(id)?;
    Ok(inventory::view(store, product))
}

pub fn available_quantity(store: &MarketStore, id: ProductId) -> Result<u32, MarketError> {
    let product = store.product(id)?;
    if product.is_deleted() {
        return Ok(0);
    }
    Ok(inventory::available_quantity(product, store.orders.values()))
}

fn validate_name(name: &str) -> Result<String, MarketError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(MarketError::ValidationError(
            "product name is required".into(),
        ));
    }
    Ok(name.to_string())
}

fn validate_price(price: Decimal) -> Result<Decimal, MarketError> {
    if price.is_sign_negative() {
        return Err(MarketError::ValidationError(
            "price cannot be negative".into(),
        ));
    }
    if price.normalize().scale() > 2 {
        return Err(MarketError::ValidationError(
            "price has more than two decimals".into(),
        ));
    }
    Ok(money(price))
}
