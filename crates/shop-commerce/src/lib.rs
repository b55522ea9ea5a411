//! Retail domain types and logic for shopfloor.
//!
//! This crate holds the records and pure rules of the retail core:
//!
//! - **Catalog**: products, stock levels, stock movement audit records
//! - **Cart**: a customer's mutable pre-purchase basket with logical
//!   (status-flip) item removal and frozen add-time prices
//! - **Promotion**: time-boxed discount rules keyed by code
//! - **Order**: the immutable result of a checkout, with an explicit
//!   status state machine
//!
//! Everything that touches persistence or concurrency lives in the
//! `shop-store` and `shop-engine` crates; the types here only know how to
//! validate and recompute themselves.

pub mod cart;
pub mod catalog;
pub mod clock;
pub mod customer;
pub mod error;
pub mod ids;
pub mod money;
pub mod order;
pub mod promotion;

pub use cart::{AppliedPromotion, Cart, CartItem, CartItemStatus, CartStatus, MAX_QUANTITY_PER_ITEM};
pub use catalog::{Product, ProductStatus, StockMovement, StockMovementReason};
pub use clock::unix_now;
pub use customer::Customer;
pub use error::CommerceError;
pub use ids::*;
pub use money::{Currency, Money};
pub use order::{Order, OrderItem, OrderItemStatus, OrderStatus, PaymentMethod};
pub use promotion::{Promotion, PromotionValue};
