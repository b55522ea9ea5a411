//! Promotion types.
//!
//! Promotions are read-only to the retail core: the registry collaborator
//! owns them, the core only validates codes and computes discounts.

use crate::ids::PromotionId;
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// The discount rule of a promotion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum PromotionValue {
    /// Percentage off the subtotal (0.0 – 100.0).
    Percentage(f64),
    /// Fixed amount off, capped at the subtotal.
    Fixed(Money),
}

impl PromotionValue {
    /// Discount amount for a given subtotal.
    ///
    /// A fixed discount never exceeds the subtotal, so a total can never go
    /// negative.
    pub fn discount_for(&self, subtotal: Money) -> Money {
        match self {
            PromotionValue::Percentage(percent) => subtotal.percentage(*percent),
            PromotionValue::Fixed(amount) => amount.min(&subtotal),
        }
    }
}

/// A time-boxed discount rule keyed by a code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Promotion {
    pub id: PromotionId,
    /// The code customers enter, e.g. "SAVE10".
    pub code: String,
    pub value: PromotionValue,
    /// Smallest subtotal the promotion applies to.
    pub minimum_purchase: Money,
    /// Start of the validity window (Unix seconds, inclusive).
    pub starts_at: i64,
    /// End of the validity window (Unix seconds, inclusive).
    pub ends_at: i64,
    pub is_active: bool,
}

impl Promotion {
    /// A percentage-off promotion valid over the given window.
    pub fn percentage(
        code: impl Into<String>,
        percent: f64,
        minimum_purchase: Money,
        starts_at: i64,
        ends_at: i64,
    ) -> Self {
        Self {
            id: PromotionId::generate(),
            code: code.into(),
            value: PromotionValue::Percentage(percent),
            minimum_purchase,
            starts_at,
            ends_at,
            is_active: true,
        }
    }

    /// A fixed-amount promotion valid over the given window.
    pub fn fixed(
        code: impl Into<String>,
        amount: Money,
        minimum_purchase: Money,
        starts_at: i64,
        ends_at: i64,
    ) -> Self {
        Self {
            id: PromotionId::generate(),
            code: code.into(),
            value: PromotionValue::Fixed(amount),
            minimum_purchase,
            starts_at,
            ends_at,
            is_active: true,
        }
    }

    /// Whether `now` falls inside the validity window.
    pub fn in_window(&self, now: i64) -> bool {
        now >= self.starts_at && now <= self.ends_at
    }
}
