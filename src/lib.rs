//! # Campus Market
//!
//! An in-memory engine for a student-to-student marketplace: listings,
//! carts, checkout with card payment, in-person meetup confirmation,
//! disputes and soft deletion with cascading restore.
//!
//! ## Architecture
//!
//! All state lives in one [`Market`](market_actor::Market) owned by a single
//! [`ResourceActor`](framework::ResourceActor). The actor applies requests one
//! at a time, so a checkout can re-check stock, write the order and payment and
//! clear the cart without any other request observing a half-done state.
//! Inside one request, writes go through a [`Transaction`](store::Transaction)
//! that rolls everything back unless the request succeeds.
//!
//! ## Module Tour
//!
//! ### The Engine ([`framework`])
//! Generic actor loop, client and test mocks. Knows nothing about markets.
//!
//! ### The State ([`model`], [`store`])
//! Plain records and the tables that hold them.
//!
//! ### The Rules
//! - [`inventory`]: available quantity derived from active orders
//! - [`catalog`]: users and product listings
//! - [`checkout`]: carts and the cart-to-order transaction
//! - [`confirmation`]: buyer and seller confirmation, cancellation, admin overrides
//! - [`dispute`]: disputes and the freeze they put on an order
//! - [`cascade`]: soft delete and restore across related records
//! - [`queries`]: joined read models
//!
//! ### The Interface ([`clients`], [`lifecycle`])
//! Typed clients over the actor channel, and [`MarketSystem`](lifecycle::MarketSystem)
//! to start and stop everything.
//!
//! ## Running
//!
//! ```bash
//! RUST_LOG=info cargo run
//! cargo test
//! ```

pub mod cascade;
pub mod catalog;
pub mod checkout;
pub mod clients;
pub mod confirmation;
pub mod dispute;
pub mod framework;
pub mod inventory;
pub mod lifecycle;
pub mod market_actor;
pub mod model;
pub mod queries;
pub mod store;

#[cfg(test)]
mod test_support;
