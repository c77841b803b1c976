//! Domain error model.

use thiserror::Error;

use crate::id::AggregateId;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures. All of these
/// are expected outcomes to report back to the caller, never defects.
/// Infrastructure concerns (storage, locking) belong elsewhere and must not
/// be folded into this enum.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed or out-of-range input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// No order exists for the given id.
    #[error("unknown order {order_id}")]
    UnknownOrder { order_id: AggregateId },

    /// An operation was invoked from an illegal order state
    /// (already sent/received, not sent, not received).
    #[error("illegal order state for {order_id}: {message}")]
    OrderState {
        order_id: AggregateId,
        message: String,
    },

    /// The operation requires at least one order line and none exist.
    #[error("order {order_id} has no order lines")]
    EmptyOrder { order_id: AggregateId },

    /// A stock invariant would be violated: the resulting stock would go
    /// negative, or a required-lines precondition tied to stock processing
    /// failed (in which case no single product is identifiable).
    #[error("product stock violation: {message}")]
    ProductStock {
        product_id: Option<AggregateId>,
        message: String,
    },
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unknown_order(order_id: AggregateId) -> Self {
        Self::UnknownOrder { order_id }
    }

    pub fn order_state(order_id: AggregateId, msg: impl Into<String>) -> Self {
        Self::OrderState {
            order_id,
            message: msg.into(),
        }
    }

    pub fn empty_order(order_id: AggregateId) -> Self {
        Self::EmptyOrder { order_id }
    }

    /// Stock violation attributable to a specific product.
    pub fn stock_violation(product_id: AggregateId, msg: impl Into<String>) -> Self {
        Self::ProductStock {
            product_id: Some(product_id),
            message: msg.into(),
        }
    }

    /// Stock-processing precondition failure with no offending product.
    pub fn stock_precondition(msg: impl Into<String>) -> Self {
        Self::ProductStock {
            product_id: None,
            message: msg.into(),
        }
    }
}
