use campus_market::checkout::{CardDetails, CheckoutRequest};
use campus_market::lifecycle::{MarketConfig, MarketSystem};
use campus_market::market_actor::{FixedClock, MarketContext, MarketError, MockGateway};
use campus_market::model::{
    Address, ConfirmSide, DisputeStatus, EntityRecord, EntityRef, OrderRole, OrderStatus,
    PaymentStatus, ProductCreate, ProductView, SoftDeletable, User, UserCreate,
};
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;

struct Fixture {
    system: MarketSystem,
    seller: User,
    buyer: User,
    admin: User,
}

async fn setup() -> Fixture {
    let context = MarketContext {
        gateway: Arc::new(MockGateway::new()),
        clock: Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        )),
    };
    let system = MarketSystem::with_context(&MarketConfig::default(), context);

    let seller = system
        .catalog
        .register_user(UserCreate::member("Sam", "sam@campus.edu"))
        .await
        .expect("Failed to register seller");
    let buyer = system
        .catalog
        .register_user(UserCreate::member("Bea", "bea@campus.edu"))
        .await
        .expect("Failed to register buyer");
    let admin = system
        .catalog
        .register_user(UserCreate::admin("Ada", "ada@campus.edu"))
        .await
        .expect("Failed to register admin");

    Fixture {
        system,
        seller,
        buyer,
        admin,
    }
}

async fn list(system: &MarketSystem, seller: &User, quantity: u32) -> ProductView {
    system
        .catalog
        .create_product(
            seller.id,
            ProductCreate {
                name: "Desk lamp".to_string(),
                price: Decimal::new(1000, 2),
                image: None,
                quantity,
            },
        )
        .await
        .expect("Failed to create product")
}

fn request() -> CheckoutRequest {
    let address = Address::new("Bea", "12 Dorm Lane", "College Town", "10001");
    CheckoutRequest {
        shipping_address: address.clone(),
        billing_address: address,
        card: CardDetails::new("4242-4242-4242-4242", "Bea", "12/30", "123"),
    }
}

/// Full end-to-end run: checkout, both confirmations, then a refused cancel.
#[tokio::test]
async fn test_checkout_and_meetup() {
    let Fixture {
        system,
        seller,
        buyer,
        ..
    } = setup().await;
    let product = list(&system, &seller, 5).await;
    let product_id = product.product.id;

    system.carts.add_item(buyer.id, product_id, 2).await.unwrap();
    let order = system
        .orders
        .create_order(buyer.id, request())
        .await
        .expect("Checkout failed");

    assert_eq!(order.total_amount.to_string(), "20.00");
    assert_eq!(order.status, OrderStatus::WaitingToMeet);
    assert_eq!(order.order_number, "ORD-20240301-000001");
    assert_eq!(
        system.catalog.available_quantity(product_id).await.unwrap(),
        3
    );
    assert!(system.carts.cart(buyer.id).await.unwrap().is_empty());

    let order = system
        .orders
        .confirm(order.id, ConfirmSide::Buyer, buyer.id)
        .await
        .unwrap();
    assert!(order.buyer_confirmed);
    assert_eq!(order.status, OrderStatus::WaitingToMeet);

    let err = system
        .orders
        .confirm(order.id, ConfirmSide::Buyer, buyer.id)
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::AlreadyConfirmed { .. }));

    let order = system
        .orders
        .confirm(order.id, ConfirmSide::Seller, seller.id)
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::MetAndExchanged);
    assert!(order.completed_at.is_some());

    let err = system.orders.cancel(order.id, buyer.id).await.unwrap_err();
    assert!(matches!(err, MarketError::InvalidTransition { .. }));

    let details = system.orders.details(order.id, seller.id).await.unwrap();
    assert_eq!(details.buyer.id, buyer.id);
    assert_eq!(
        details.payment.map(|p| p.status),
        Some(PaymentStatus::Completed)
    );

    let market = system.shutdown().await.expect("Shutdown failed");
    assert_eq!(market.store().order(order.id).unwrap().history.len(), 2);
}

#[tokio::test]
async fn test_concurrent_checkout_for_last_unit() {
    let Fixture {
        system,
        seller,
        buyer,
        ..
    } = setup().await;
    let rival = system
        .catalog
        .register_user(UserCreate::member("Rio", "rio@campus.edu"))
        .await
        .unwrap();
    let product = list(&system, &seller, 1).await;
    let product_id = product.product.id;

    system.carts.add_item(buyer.id, product_id, 1).await.unwrap();
    system.carts.add_item(rival.id, product_id, 1).await.unwrap();

    let mut tasks = Vec::new();
    for user in [buyer.id, rival.id] {
        let orders = system.orders.clone();
        tasks.push(tokio::spawn(async move {
            orders.create_order(user, request()).await
        }));
    }

    let mut created = 0;
    let mut short = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => created += 1,
            Err(MarketError::InsufficientStock { available, .. }) => {
                assert_eq!(available, 0);
                short += 1;
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(created, 1);
    assert_eq!(short, 1);
    assert_eq!(
        system.catalog.available_quantity(product_id).await.unwrap(),
        0
    );

    let market = system.shutdown().await.unwrap();
    assert_eq!(market.store().active_orders().count(), 1);
}

#[tokio::test]
async fn test_dispute_freezes_order_until_resolved() {
    let Fixture {
        system,
        seller,
        buyer,
        admin,
    } = setup().await;
    let product = list(&system, &seller, 5).await;
    system
        .carts
        .add_item(buyer.id, product.product.id, 2)
        .await
        .unwrap();
    let order = system.orders.create_order(buyer.id, request()).await.unwrap();

    let dispute = system
        .disputes
        .open(order.id, "Lamp does not turn on", buyer.id)
        .await
        .unwrap();
    assert_eq!(dispute.status, DisputeStatus::Open);
    assert_eq!(dispute.messages.len(), 1);

    let err = system
        .orders
        .confirm(order.id, ConfirmSide::Seller, seller.id)
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::Frozen(_)));
    let err = system.orders.cancel(order.id, buyer.id).await.unwrap_err();
    assert!(matches!(err, MarketError::Frozen(_)));
    let err = system
        .orders
        .set_status(order.id, OrderStatus::Cancelled, admin.id)
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::Frozen(_)));

    let err = system
        .disputes
        .open(order.id, "Again", seller.id)
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::Conflict(_)));

    let dispute = system
        .disputes
        .add_message(dispute.id, "Please send a photo", admin.id)
        .await
        .unwrap();
    assert_eq!(dispute.status, DisputeStatus::UnderReview);

    let dispute = system
        .disputes
        .resolve(dispute.id, "refund issued", admin.id)
        .await
        .unwrap();
    assert_eq!(dispute.status, DisputeStatus::Resolved);
    assert_eq!(dispute.resolution.as_deref(), Some("refund issued"));

    let details = system.orders.details(order.id, buyer.id).await.unwrap();
    assert_eq!(details.order.status, OrderStatus::Cancelled);
    assert_eq!(
        details.payment.map(|p| p.status),
        Some(PaymentStatus::Refunded)
    );
    assert_eq!(
        system
            .catalog
            .available_quantity(product.product.id)
            .await
            .unwrap(),
        5
    );

    let err = system
        .disputes
        .add_message(dispute.id, "Thanks", buyer.id)
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::Frozen(_)));

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_user_cascade_and_email_collision() {
    let Fixture {
        system,
        seller,
        buyer,
        admin,
    } = setup().await;
    let own = list(&system, &buyer, 2).await;
    let other = list(&system, &seller, 5).await;
    system
        .carts
        .add_item(buyer.id, other.product.id, 1)
        .await
        .unwrap();
    let order = system.orders.create_order(buyer.id, request()).await.unwrap();

    // Somebody else's active order on one of the seller's products blocks
    // deleting the seller.
    let err = system
        .admin
        .soft_delete(EntityRef::User(seller.id), admin.id)
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::Conflict(_)));

    let record = system
        .admin
        .soft_delete(EntityRef::User(buyer.id), buyer.id)
        .await
        .unwrap();
    assert!(record.deletion().is_some());

    let own_view = system.catalog.product(own.product.id).await.unwrap();
    assert!(own_view.product.is_deleted());
    let other_view = system.catalog.product(other.product.id).await.unwrap();
    assert!(!other_view.product.is_deleted());
    assert_eq!(other_view.available, 5);
    assert!(system
        .orders
        .orders_for(seller.id, OrderRole::Seller)
        .await
        .unwrap()
        .is_empty());

    // The address is free again, so a new account may take it.
    system
        .catalog
        .register_user(UserCreate::member("Bea Two", "BEA@campus.edu"))
        .await
        .unwrap();

    let err = system
        .admin
        .restore(EntityRef::User(buyer.id), admin.id)
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::Conflict(_)));

    let market = system.shutdown().await.unwrap();
    let store = market.store();
    assert!(store.user(buyer.id).unwrap().is_deleted());
    assert!(store.order(order.id).unwrap().is_deleted());
}

#[tokio::test]
async fn test_restore_reverses_exactly_the_cascade() {
    let Fixture {
        system,
        seller,
        buyer,
        admin,
    } = setup().await;
    let first = list(&system, &seller, 3).await;
    let second = list(&system, &seller, 3).await;

    // Deleted on its own beforehand; must stay deleted after the restore.
    system
        .admin
        .soft_delete(EntityRef::Product(second.product.id), seller.id)
        .await
        .unwrap();

    system
        .admin
        .soft_delete(EntityRef::User(seller.id), admin.id)
        .await
        .unwrap();
    let err = system
        .carts
        .add_item(buyer.id, first.product.id, 1)
        .await
        .unwrap_err();
    assert_eq!(err, MarketError::ProductUnavailable(first.product.id));

    let record = system
        .admin
        .restore(EntityRef::User(seller.id), admin.id)
        .await
        .unwrap();
    assert!(matches!(record, EntityRecord::User(ref u) if !u.is_deleted()));

    assert!(!system
        .catalog
        .product(first.product.id)
        .await
        .unwrap()
        .product
        .is_deleted());
    assert!(system
        .catalog
        .product(second.product.id)
        .await
        .unwrap()
        .product
        .is_deleted());

    let err = system
        .admin
        .restore(EntityRef::User(seller.id), admin.id)
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::InvalidState(_)));

    system.shutdown().await.unwrap();
}

/// A total too large for `Decimal` is refused and the market keeps serving.
#[tokio::test]
async fn test_oversized_total_keeps_market_running() {
    let Fixture {
        system,
        seller,
        buyer,
        ..
    } = setup().await;
    let product = system
        .catalog
        .create_product(
            seller.id,
            ProductCreate {
                name: "Gold bar".to_string(),
                price: Decimal::from_i128_with_scale(50_000_000_000_000_000_000_000_000_000, 0),
                image: None,
                quantity: 2,
            },
        )
        .await
        .expect("Failed to create product");

    system
        .carts
        .add_item(buyer.id, product.product.id, 2)
        .await
        .unwrap();
    let err = system
        .orders
        .create_order(buyer.id, request())
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::ValidationError(_)));

    let fetched = system.catalog.user(buyer.id).await.unwrap();
    assert_eq!(fetched.id, buyer.id);
    assert_eq!(
        system
            .catalog
            .available_quantity(product.product.id)
            .await
            .unwrap(),
        2
    );

    system.shutdown().await.unwrap();
}
