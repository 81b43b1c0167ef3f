//! Generic actor framework.
//!
//! One [`ResourceActor`] owns a piece of state and applies the actions sent to it
//! one at a time; typed clients wrap the generic [`ResourceClient`].
//!
//! # Main Components
//!
//! - [`ActorEntity`] - Trait the owned state implements
//! - [`ResourceActor`] - Generic actor running the message loop
//! - [`ResourceClient`] - Cloneable handle used to send actions
//! - [`FrameworkError`] - Channel failures and wrapped entity errors
//!
//! # Testing
//!
//! See [`mock`] for utilities to test clients without spawning full actors.

pub mod core;
pub mod mock;

// Re-export core types for convenience
pub use core::*;
