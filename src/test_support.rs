//! Record builders shared by the unit tests.

use crate::model::{
    AccountStatus, Address, Dispute, DisputeId, DisputeStatus, ListingStatus, Order, OrderId,
    OrderItem, OrderStatus, Product, ProductId, Role, User, UserId,
};
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeSet;

pub fn at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

pub fn user(id: u64, role: Role) -> User {
    User {
        id: UserId(id),
        name: format!("User {id}"),
        email: format!("user{id}@campus.edu"),
        role,
        status: AccountStatus::Active,
        created_at: at(),
        deletion: None,
    }
}

pub fn product(id: u64, seller: UserId, quantity: u32) -> Product {
    Product {
        id: ProductId(id),
        seller_id: seller,
        name: format!("Product {id}"),
        price: Decimal::new(1000, 2),
        image: None,
        total_quantity: quantity,
        listing: ListingStatus::Available,
        created_at: at(),
        updated_at: at(),
        deletion: None,
    }
}

pub fn address() -> Address {
    Address::new("Alice", "1 College Rd", "Springfield", "12345")
}

pub fn order_for(id: u64, buyer: UserId, lines: &[(&Product, u32)]) -> Order {
    let items: Vec<OrderItem> = lines
        .iter()
        .map(|(product, quantity)| OrderItem {
            product_id: product.id,
            seller_id: product.seller_id,
            name: product.name.clone(),
            image: product.image.clone(),
            unit_price: product.price,
            quantity: *quantity,
        })
        .collect();
    let total_amount = crate::model::checked_sum(items.iter().map(OrderItem::line_total))
        .map(crate::model::money)
        .unwrap();
    Order {
        id: OrderId(id),
        order_number: format!("ORD-20240301-{id:06}"),
        buyer_id: buyer,
        items,
        total_amount,
        status: OrderStatus::WaitingToMeet,
        buyer_confirmed: false,
        seller_confirmations: BTreeSet::new(),
        seller_confirmed: false,
        dispute_id: None,
        shipping_address: address(),
        billing_address: address(),
        history: Vec::new(),
        created_at: at(),
        updated_at: at(),
        completed_at: None,
        deletion: None,
    }
}

pub fn dispute_for(id: u64, order: &Order, status: DisputeStatus) -> Dispute {
    Dispute {
        id: DisputeId(id),
        order_id: order.id,
        buyer_id: order.buyer_id,
        seller_ids: order.items.iter().map(|item| item.seller_id).collect(),
        opened_by: order.buyer_id,
        status,
        messages: Vec::new(),
        resolution: None,
        resolved_by: None,
        resolved_at: None,
        closed_by: None,
        closed_at: None,
        created_at: at(),
        deletion: None,
    }
}
