//! Product and stock types.

use crate::clock::unix_now;
use crate::ids::ProductId;
use crate::money::Money;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a product in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ProductStatus {
    /// Visible and purchasable.
    #[default]
    Active,
    /// Temporarily off sale; already-carted units may still check out.
    Inactive,
    /// Permanently withdrawn; blocks checkout as well.
    Discontinued,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Active => "active",
            ProductStatus::Inactive => "inactive",
            ProductStatus::Discontinued => "discontinued",
        }
    }

    /// Whether new cart lines may be opened for the product.
    pub fn is_purchasable(&self) -> bool {
        matches!(self, ProductStatus::Active)
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A catalog product.
///
/// The retail core references products and adjusts their stock; it never
/// creates or destroys them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Current list price. Cart lines snapshot this at add time.
    pub price: Money,
    /// Units available for sale. Invariant: never negative.
    pub current_stock: i64,
    pub status: ProductStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Product {
    pub fn new(name: impl Into<String>, price: Money, current_stock: i64) -> Self {
        let now = unix_now();
        Self {
            id: ProductId::generate(),
            name: name.into(),
            price,
            current_stock,
            status: ProductStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_status(mut self, status: ProductStatus) -> Self {
        self.status = status;
        self
    }

    /// Whether the requested quantity fits in current stock.
    pub fn can_fulfill(&self, quantity: i64) -> bool {
        quantity <= self.current_stock
    }
}

/// Why a stock level changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StockMovementReason {
    /// Deducted at checkout.
    Sale,
    /// Restored by an order cancellation.
    CancelRestock,
    /// Restocked from a supplier.
    Restock,
    /// Manual correction.
    Correction,
}

impl StockMovementReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockMovementReason::Sale => "sale",
            StockMovementReason::CancelRestock => "cancel_restock",
            StockMovementReason::Restock => "restock",
            StockMovementReason::Correction => "correction",
        }
    }
}

/// An audit record for a single stock adjustment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockMovement {
    pub product_id: ProductId,
    /// Signed change in units (negative for deductions).
    pub delta: i64,
    pub reason: StockMovementReason,
    /// Correlating record, e.g. the order id that caused the movement.
    pub reference: Option<String>,
    pub at: i64,
}

impl StockMovement {
    pub fn new(product_id: ProductId, delta: i64, reason: StockMovementReason) -> Self {
        Self {
            product_id,
            delta,
            reason,
            reference: None,
            at: unix_now(),
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}
