//! Error types for the Market actor.

use crate::model::{ConfirmSide, OrderId, OrderStatus, ProductId, UserId};
use thiserror::Error;

/// Coarse classification of a [`MarketError`], for callers that map failures
/// onto status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Forbidden,
    Frozen,
    InvalidTransition,
    InvalidState,
    Unavailable,
}

/// Errors that can occur during market operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MarketError {
    /// Malformed input: empty names, bad email, bad quantity or address.
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid payment details: {0}")]
    InvalidPaymentDetails(String),

    /// The payment gateway refused the charge or refund.
    #[error("Payment gateway error: {0}")]
    PaymentFailed(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The acting user may not perform this operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Cart is empty")]
    EmptyCart,

    /// Deleted, hidden or sold out.
    #[error("Product unavailable: {0}")]
    ProductUnavailable(ProductId),

    #[error("Seller inactive: {0}")]
    SellerInactive(UserId),

    #[error("Insufficient stock for {product}: requested {requested}, available {available}")]
    InsufficientStock {
        product: ProductId,
        requested: u32,
        available: u32,
    },

    #[error("Quantity {requested} for {product} is below the {reserved} units already reserved")]
    QuantityBelowReserved {
        product: ProductId,
        requested: u32,
        reserved: u32,
    },

    #[error("{side} already confirmed {order}")]
    AlreadyConfirmed { order: OrderId, side: ConfirmSide },

    /// Blocked by an active dispute, a terminal status or a soft delete.
    #[error("Frozen: {0}")]
    Frozen(String),

    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The actor answered with a result of the wrong shape.
    #[error("Unexpected result: {0}")]
    UnexpectedResult(String),

    /// An error occurred while communicating with the actor system.
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl MarketError {
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        MarketError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            MarketError::ValidationError(_)
            | MarketError::InvalidPaymentDetails(_)
            | MarketError::PaymentFailed(_)
            | MarketError::EmptyCart => ErrorKind::Validation,
            MarketError::NotFound { .. } => ErrorKind::NotFound,
            MarketError::Conflict(_)
            | MarketError::InsufficientStock { .. }
            | MarketError::QuantityBelowReserved { .. }
            | MarketError::AlreadyConfirmed { .. } => ErrorKind::Conflict,
            MarketError::ProductUnavailable(_) | MarketError::SellerInactive(_) => {
                ErrorKind::InvalidState
            }
            MarketError::Forbidden(_) => ErrorKind::Forbidden,
            MarketError::Frozen(_) => ErrorKind::Frozen,
            MarketError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            MarketError::InvalidState(_) => ErrorKind::InvalidState,
            MarketError::UnexpectedResult(_) | MarketError::ActorCommunicationError(_) => {
                ErrorKind::Unavailable
            }
        }
    }
}
