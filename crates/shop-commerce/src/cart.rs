//! Cart and cart line-item types.
//!
//! A cart is stored as one document embedding its line items. Removal and
//! clearing are logical: the row's status flips and the row is retained for
//! audit. Unit prices are snapshotted when a line is opened and deliberately
//! never re-read from the catalog afterwards.

use crate::clock::unix_now;
use crate::error::CommerceError;
use crate::ids::{CartId, CartItemId, CustomerId, ProductId, PromotionId};
use crate::money::{Currency, Money};
use serde::{Deserialize, Serialize};

/// Maximum quantity allowed per line item.
pub const MAX_QUANTITY_PER_ITEM: i64 = 9999;

/// Cart lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CartStatus {
    /// Open for mutation. Each customer has at most one active cart.
    #[default]
    Active,
    /// Converted into an order; frozen forever.
    CheckedOut,
}

impl CartStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CartStatus::Active => "active",
            CartStatus::CheckedOut => "checked_out",
        }
    }
}

/// Line item status within a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CartItemStatus {
    #[default]
    Active,
    /// Logically deleted; retained for audit.
    Removed,
    /// Converted into an order item at checkout.
    Purchased,
}

impl CartItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CartItemStatus::Active => "active",
            CartItemStatus::Removed => "removed",
            CartItemStatus::Purchased => "purchased",
        }
    }
}

/// A promotion that has been validated against and applied to a cart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppliedPromotion {
    pub promotion_id: PromotionId,
    pub code: String,
    /// Discount computed against the subtotal at application time; refreshed
    /// whenever the cart changes.
    pub amount: Money,
}

/// A line item in a cart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartItem {
    pub id: CartItemId,
    pub product_id: ProductId,
    /// Units requested. Invariant: positive while the row is active.
    pub quantity: i64,
    /// Price snapshot taken when the line was opened.
    pub unit_price: Money,
    /// `unit_price * quantity`.
    pub line_total: Money,
    pub status: CartItemStatus,
}

impl CartItem {
    fn new(product_id: ProductId, quantity: i64, unit_price: Money) -> Result<Self, CommerceError> {
        let line_total = unit_price.try_mul(quantity).ok_or(CommerceError::Overflow)?;
        Ok(Self {
            id: CartItemId::generate(),
            product_id,
            quantity,
            unit_price,
            line_total,
            status: CartItemStatus::Active,
        })
    }

    pub fn is_active(&self) -> bool {
        self.status == CartItemStatus::Active
    }

    fn update_line_total(&mut self) -> Result<(), CommerceError> {
        self.line_total = self
            .unit_price
            .try_mul(self.quantity)
            .ok_or(CommerceError::Overflow)?;
        Ok(())
    }
}

/// A customer's mutable pre-purchase basket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cart {
    pub id: CartId,
    pub customer_id: CustomerId,
    pub status: CartStatus,
    pub currency: Currency,
    /// All line items ever added, including removed and purchased rows.
    pub items: Vec<CartItem>,
    /// Sum of active line totals.
    pub subtotal: Money,
    /// Discount from the applied promotion, zero when none.
    pub discount: Money,
    /// Invariant: `total == max(0, subtotal - discount)`.
    pub total: Money,
    pub promotion: Option<AppliedPromotion>,
    /// Free-form collaborator data.
    pub metadata: serde_json::Value,
    pub created_at: i64,
    pub last_activity_at: i64,
}

impl Cart {
    pub fn new(customer_id: CustomerId, currency: Currency) -> Self {
        let now = unix_now();
        Self {
            id: CartId::generate(),
            customer_id,
            status: CartStatus::Active,
            currency,
            items: Vec::new(),
            subtotal: Money::zero(currency),
            discount: Money::zero(currency),
            total: Money::zero(currency),
            promotion: None,
            metadata: serde_json::Value::Object(serde_json::Map::new()),
            created_at: now,
            last_activity_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == CartStatus::Active
    }

    /// Active line items, in insertion order.
    pub fn active_items(&self) -> impl Iterator<Item = &CartItem> {
        self.items.iter().filter(|i| i.is_active())
    }

    /// Whether the cart has no active line items.
    pub fn is_empty(&self) -> bool {
        self.active_items().next().is_none()
    }

    /// Look up a line item by id, regardless of status.
    pub fn item(&self, item_id: &CartItemId) -> Option<&CartItem> {
        self.items.iter().find(|i| &i.id == item_id)
    }

    /// Units of a product already in the cart's active lines.
    pub fn active_quantity_of(&self, product_id: &ProductId) -> i64 {
        self.active_items()
            .filter(|i| &i.product_id == product_id)
            .map(|i| i.quantity)
            .sum()
    }

    /// Sum of active line totals.
    pub fn active_subtotal(&self) -> Result<Money, CommerceError> {
        let mut subtotal = Money::zero(self.currency);
        for item in self.active_items() {
            subtotal = subtotal
                .try_add(&item.line_total)
                .ok_or(CommerceError::Overflow)?;
        }
        Ok(subtotal)
    }

    /// Add units of a product, merging into an existing active line when one
    /// exists; otherwise opens a new line snapshotting `unit_price`.
    ///
    /// Stock validation happens in the cart manager; this only enforces the
    /// in-document rules (positive quantity, per-line cap, cart currency).
    pub fn add_item(
        &mut self,
        product_id: ProductId,
        quantity: i64,
        unit_price: Money,
    ) -> Result<CartItemId, CommerceError> {
        if quantity <= 0 {
            return Err(CommerceError::InvalidQuantity(quantity));
        }
        if unit_price.currency != self.currency {
            return Err(CommerceError::CurrencyMismatch {
                expected: self.currency,
                got: unit_price.currency,
            });
        }

        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|i| i.is_active() && i.product_id == product_id)
        {
            let merged = existing
                .quantity
                .checked_add(quantity)
                .ok_or(CommerceError::Overflow)?;
            if merged > MAX_QUANTITY_PER_ITEM {
                return Err(CommerceError::QuantityExceedsLimit(
                    merged,
                    MAX_QUANTITY_PER_ITEM,
                ));
            }
            existing.quantity = merged;
            existing.update_line_total()?;
            let id = existing.id.clone();
            self.touch();
            return Ok(id);
        }

        if quantity > MAX_QUANTITY_PER_ITEM {
            return Err(CommerceError::QuantityExceedsLimit(
                quantity,
                MAX_QUANTITY_PER_ITEM,
            ));
        }

        let item = CartItem::new(product_id, quantity, unit_price)?;
        let id = item.id.clone();
        self.items.push(item);
        self.touch();
        Ok(id)
    }

    /// Set the quantity of an active line item. The quantity must be
    /// positive; callers treat non-positive values as removal.
    pub fn set_item_quantity(
        &mut self,
        item_id: &CartItemId,
        quantity: i64,
    ) -> Result<(), CommerceError> {
        if quantity <= 0 {
            return Err(CommerceError::InvalidQuantity(quantity));
        }
        if quantity > MAX_QUANTITY_PER_ITEM {
            return Err(CommerceError::QuantityExceedsLimit(
                quantity,
                MAX_QUANTITY_PER_ITEM,
            ));
        }
        let item = self
            .items
            .iter_mut()
            .find(|i| i.is_active() && &i.id == item_id)
            .ok_or_else(|| CommerceError::CartItemNotFound(item_id.to_string()))?;
        item.quantity = quantity;
        item.update_line_total()?;
        self.touch();
        Ok(())
    }

    /// Flip an active line item to removed. The row is kept.
    pub fn remove_item(&mut self, item_id: &CartItemId) -> Result<(), CommerceError> {
        let item = self
            .items
            .iter_mut()
            .find(|i| i.is_active() && &i.id == item_id)
            .ok_or_else(|| CommerceError::CartItemNotFound(item_id.to_string()))?;
        item.status = CartItemStatus::Removed;
        self.touch();
        Ok(())
    }

    /// Flip every active line to removed and drop the promotion.
    /// Clearing an already-empty cart is a no-op success.
    pub fn clear(&mut self) {
        for item in self.items.iter_mut().filter(|i| i.is_active()) {
            item.status = CartItemStatus::Removed;
        }
        self.promotion = None;
        self.touch();
    }

    pub fn apply_promotion(&mut self, promotion: AppliedPromotion) {
        self.promotion = Some(promotion);
        self.touch();
    }

    /// Drop the applied promotion, if any. Returns whether one was applied.
    pub fn remove_promotion(&mut self) -> bool {
        let had = self.promotion.take().is_some();
        if had {
            self.touch();
        }
        had
    }

    /// Recompute `subtotal`, `discount` and `total` from the active lines
    /// and the applied promotion.
    pub fn recalculate(&mut self) -> Result<(), CommerceError> {
        self.subtotal = self.active_subtotal()?;
        self.discount = self
            .promotion
            .as_ref()
            .map(|p| p.amount)
            .unwrap_or_else(|| Money::zero(self.currency));
        self.total = self
            .subtotal
            .try_sub_to_zero(&self.discount)
            .ok_or(CommerceError::CurrencyMismatch {
                expected: self.currency,
                got: self.discount.currency,
            })?;
        Ok(())
    }

    /// Freeze the cart at successful checkout: the cart flips to
    /// `CheckedOut` and every active line to `Purchased`.
    pub fn mark_checked_out(&mut self) {
        for item in self.items.iter_mut().filter(|i| i.is_active()) {
            item.status = CartItemStatus::Purchased;
        }
        self.status = CartStatus::CheckedOut;
        self.touch();
    }

    fn touch(&mut self) {
        self.last_activity_at = unix_now();
    }
}
