//! The shared error taxonomy for the retail core.
//!
//! Every failure mode a caller can act on is a distinct variant; nothing is
//! collapsed into a generic message. Variants carry the data needed to act,
//! e.g. `InsufficientStock` reports what remains available so the caller can
//! clamp the requested quantity and retry.

use crate::catalog::ProductStatus;
use crate::money::{Currency, Money};
use crate::order::OrderStatus;
use thiserror::Error;

/// Errors that can occur in retail operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommerceError {
    /// Customer not found.
    #[error("customer not found: {0}")]
    CustomerNotFound(String),

    /// Product not found.
    #[error("product not found: {0}")]
    ProductNotFound(String),

    /// Cart not found.
    #[error("cart not found: {0}")]
    CartNotFound(String),

    /// Cart item not found (or no longer active).
    #[error("cart item not found: {0}")]
    CartItemNotFound(String),

    /// Order not found.
    #[error("order not found: {0}")]
    OrderNotFound(String),

    /// No promotion matches the code.
    #[error("promotion not found: {0}")]
    PromotionNotFound(String),

    /// Quantity must be positive.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(i64),

    /// Quantity exceeds the per-line cap.
    #[error("quantity {0} exceeds maximum allowed ({1})")]
    QuantityExceedsLimit(i64, i64),

    /// Product exists but cannot be sold in its current status.
    #[error("product {product_id} is {status} and cannot be purchased")]
    ProductUnavailable {
        product_id: String,
        status: ProductStatus,
    },

    /// Not enough stock to satisfy the request.
    #[error("insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        requested: i64,
        available: i64,
    },

    /// Promotion exists but has been switched off.
    #[error("promotion {0} is inactive")]
    PromotionInactive(String),

    /// Promotion exists but the current time is outside its validity window.
    #[error("promotion {0} is outside its validity window")]
    PromotionOutOfWindow(String),

    /// Cart subtotal is below the promotion's minimum purchase amount.
    #[error("promotion {code} requires a minimum purchase of {minimum}, subtotal is {subtotal}")]
    PromotionBelowMinimum {
        code: String,
        minimum: Money,
        subtotal: Money,
    },

    /// Checkout requires at least one active cart item.
    #[error("cart {0} is empty")]
    EmptyCart(String),

    /// The cart has already been converted into an order.
    #[error("cart {0} has already been checked out")]
    CartAlreadyCheckedOut(String),

    /// Order state machine rejected the transition.
    #[error("invalid order transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Monetary values in two different currencies were combined.
    #[error("currency mismatch: expected {expected}, got {got}")]
    CurrencyMismatch { expected: Currency, got: Currency },

    /// Arithmetic overflow in a money calculation.
    #[error("arithmetic overflow in money calculation")]
    Overflow,

    /// Backend storage failure.
    #[error("store error: {0}")]
    StoreError(String),
}

impl CommerceError {
    /// Whether this is one of the promotion validation failures.
    pub fn is_promotion_invalid(&self) -> bool {
        matches!(
            self,
            CommerceError::PromotionNotFound(_)
                | CommerceError::PromotionInactive(_)
                | CommerceError::PromotionOutOfWindow(_)
                | CommerceError::PromotionBelowMinimum { .. }
        )
    }
}
