//! Demo: one buyer, one seller, one meetup.
//!
//! Runs the happy path end to end against an in-memory market:
//! register both users, list two products, fill a cart, check out and have
//! both sides confirm the exchange.
//!
//! ```bash
//! RUST_LOG=info cargo run
//! MARKET_LOG_FORMAT=json RUST_LOG=debug cargo run
//! ```

use campus_market::checkout::{CardDetails, CheckoutRequest};
use campus_market::lifecycle::tracing::setup_tracing;
use campus_market::lifecycle::{MarketConfig, MarketSystem};
use campus_market::model::{Address, ConfirmSide, OrderStatus, ProductCreate, UserCreate};
use rust_decimal::Decimal;
use tracing::{error, info, Instrument};

#[tokio::main]
async fn main() -> Result<(), String> {
    let config = MarketConfig::from_env().map_err(|e| e.to_string())?;
    setup_tracing(config.log_format);

    info!(prefix = %config.order_prefix, "Starting campus market");
    let system = MarketSystem::new(&config);

    let span = tracing::info_span!("registration");
    let (seller, buyer) = async {
        info!("Registering demo users");
        let seller = system
            .catalog
            .register_user(UserCreate::member("Sam Seller", "sam@campus.edu"))
            .await?;
        let buyer = system
            .catalog
            .register_user(UserCreate::member("Bea Buyer", "bea@campus.edu"))
            .await?;
        Ok::<_, campus_market::market_actor::MarketError>((seller, buyer))
    }
    .instrument(span)
    .await
    .map_err(|e| e.to_string())?;

    let lamp = system
        .catalog
        .create_product(
            seller.id,
            ProductCreate {
                name: "Desk lamp".to_string(),
                price: Decimal::new(1250, 2),
                image: None,
                quantity: 1,
            },
        )
        .await
        .map_err(|e| e.to_string())?;
    let notes = system
        .catalog
        .create_product(
            seller.id,
            ProductCreate {
                name: "Calculus notes".to_string(),
                price: Decimal::new(750, 2),
                image: None,
                quantity: 3,
            },
        )
        .await
        .map_err(|e| e.to_string())?;
    info!(lamp = %lamp.product.id, notes = %notes.product.id, "Products listed");

    let span = tracing::info_span!("checkout");
    let order = async {
        system.carts.add_item(buyer.id, lamp.product.id, 1).await?;
        let cart = system.carts.add_item(buyer.id, notes.product.id, 1).await?;
        info!(total = ?cart.total(), "Cart ready");

        let address = Address::new("Bea Buyer", "12 Dorm Lane", "College Town", "10001");
        let request = CheckoutRequest {
            shipping_address: address.clone(),
            billing_address: address,
            card: CardDetails::new("4242 4242 4242 4242", "Bea Buyer", "12/30", "123"),
        };
        system.orders.create_order(buyer.id, request).await
    }
    .instrument(span)
    .await;

    let order = match order {
        Ok(order) => order,
        Err(e) => {
            error!(error = %e, "Checkout failed");
            system.shutdown().await.map_err(|e| e.to_string())?;
            return Err(e.to_string());
        }
    };
    info!(order = %order.order_number, total = %order.total_amount, "Order placed");

    let span = tracing::info_span!("meetup");
    let order = async {
        system
            .orders
            .confirm(order.id, ConfirmSide::Buyer, buyer.id)
            .await?;
        system
            .orders
            .confirm(order.id, ConfirmSide::Seller, seller.id)
            .await
    }
    .instrument(span)
    .await
    .map_err(|e| e.to_string())?;

    if order.status == OrderStatus::MetAndExchanged {
        info!(order = %order.order_number, "Meetup confirmed by both sides");
    }

    let remaining = system
        .catalog
        .available_quantity(lamp.product.id)
        .await
        .map_err(|e| e.to_string())?;
    info!(product = %lamp.product.id, remaining, "Stock after the sale");

    system.shutdown().await.map_err(|e| e.to_string())?;

    info!("Demo completed successfully");
    Ok(())
}
