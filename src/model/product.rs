//! Product listings.
//!
//! The stored [`ListingStatus`] is what the seller chose; the status buyers see
//! is derived by the inventory ledger (see [`ProductStatus`]).

use crate::model::{ProductId, SoftDelete, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Status stored on the product record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Available,
    Hidden,
}

/// Status as seen by buyers: `Sold` whenever nothing is left to purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    Available,
    Hidden,
    Sold,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub seller_id: UserId,
    pub name: String,
    pub price: Decimal,
    pub image: Option<String>,
    /// Units the seller owns in total, reserved or not.
    pub total_quantity: u32,
    pub listing: ListingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deletion: Option<SoftDelete>,
}

/// DTO for Product creation.
#[derive(Debug, Clone)]
pub struct ProductCreate {
    pub name: String,
    pub price: Decimal,
    pub image: Option<String>,
    pub quantity: u32,
}

/// DTO for Product updates. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub image: Option<String>,
    pub total_quantity: Option<u32>,
    pub listing: Option<ListingStatus>,
}

/// A product joined with its live reservation figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductView {
    pub product: Product,
    pub reserved: u32,
    pub available: u32,
    pub status: ProductStatus,
}
