//! Startup, configuration and shutdown of the market runtime.

pub mod config;
pub mod market_system;
pub mod tracing;

pub use config::*;
pub use market_system::*;
