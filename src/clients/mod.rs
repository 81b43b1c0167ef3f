//! Type-safe wrappers around [`ResourceClient`](crate::framework::ResourceClient).
//!
//! All clients talk to the same Market actor; they only split its surface by
//! concern.

mod macros;

pub mod actor_client;
pub mod admin_client;
pub mod cart_client;
pub mod catalog_client;
pub mod dispute_client;
pub mod order_client;

pub use actor_client::*;
pub use admin_client::*;
pub use cart_client::*;
pub use catalog_client::*;
pub use dispute_client::*;
pub use order_client::*;
