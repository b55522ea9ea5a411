//! Order types and the order-status state machine.

use crate::clock::unix_now;
use crate::error::CommerceError;
use crate::ids::{CustomerId, OrderId, OrderItemId, ProductId};
use crate::money::Money;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order status.
///
/// `Delivered` and `Cancelled` are terminal. Transitions only move forward
/// along the fulfillment chain; `Cancelled` is reachable from any
/// non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Order placed, awaiting confirmation.
    #[default]
    Pending,
    /// Order confirmed.
    Confirmed,
    /// Order being prepared.
    Processing,
    /// Order handed to delivery.
    Shipped,
    /// Order delivered (terminal).
    Delivered,
    /// Order cancelled, stock restored (terminal).
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    pub fn can_cancel(&self) -> bool {
        !self.is_terminal()
    }

    /// Position on the fulfillment chain; `Cancelled` sits outside it.
    fn rank(&self) -> Option<u8> {
        match self {
            OrderStatus::Pending => Some(0),
            OrderStatus::Confirmed => Some(1),
            OrderStatus::Processing => Some(2),
            OrderStatus::Shipped => Some(3),
            OrderStatus::Delivered => Some(4),
            OrderStatus::Cancelled => None,
        }
    }

    /// Whether the state machine permits moving from `self` to `next`.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self.rank(), next.rank()) {
            // Fulfillment only moves forward, never regresses or repeats.
            (Some(from), Some(to)) => to > from,
            // Into Cancelled from any non-terminal state.
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentMethod {
    #[default]
    Card,
    Cash,
    BankTransfer,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::Cash => "cash",
            PaymentMethod::BankTransfer => "bank_transfer",
        }
    }
}

/// Status of a single order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderItemStatus {
    #[default]
    Pending,
    Delivered,
    Cancelled,
}

impl OrderItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderItemStatus::Pending => "pending",
            OrderItemStatus::Delivered => "delivered",
            OrderItemStatus::Cancelled => "cancelled",
        }
    }
}

/// A line item in an order. Created atomically with the order and immutable
/// afterwards except for its status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub quantity: i64,
    /// Price frozen at checkout (which itself froze the add-to-cart price).
    pub unit_price: Money,
    pub line_total: Money,
    pub status: OrderItemStatus,
}

impl OrderItem {
    pub fn new(product_id: ProductId, quantity: i64, unit_price: Money, line_total: Money) -> Self {
        Self {
            id: OrderItemId::generate(),
            product_id,
            quantity,
            unit_price,
            line_total,
            status: OrderItemStatus::Pending,
        }
    }
}

/// A completed purchase. Created exactly once per successful checkout and
/// never physically deleted; `deleted` is a soft-delete flag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: OrderId,
    /// Human-readable unique identifier, monotonic per process.
    pub order_number: String,
    pub customer_id: CustomerId,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    /// The cart total at checkout, after discount.
    pub total_amount: Money,
    pub delivery_address: String,
    pub payment_method: PaymentMethod,
    pub tracking_number: Option<String>,
    /// Stamped on the transition into `Delivered`, if not already set.
    pub delivery_date: Option<i64>,
    pub notes: Option<String>,
    /// Free-form collaborator data.
    pub metadata: serde_json::Value,
    /// Soft-delete flag; hidden from listings, never removed.
    pub deleted: bool,
    pub created_at: i64,
    pub updated_at: i64,
    pub cancelled_at: Option<i64>,
}

impl Order {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: OrderId,
        order_number: String,
        customer_id: CustomerId,
        items: Vec<OrderItem>,
        total_amount: Money,
        delivery_address: String,
        payment_method: PaymentMethod,
        notes: Option<String>,
    ) -> Self {
        let now = unix_now();
        Self {
            id,
            order_number,
            customer_id,
            status: OrderStatus::Pending,
            items,
            total_amount,
            delivery_address,
            payment_method,
            tracking_number: None,
            delivery_date: None,
            notes,
            metadata: serde_json::Value::Object(serde_json::Map::new()),
            deleted: false,
            created_at: now,
            updated_at: now,
            cancelled_at: None,
        }
    }

    /// Total units across all lines.
    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Apply a validated status transition, stamping the timestamps and
    /// line statuses the new state implies.
    pub fn transition_to(&mut self, next: OrderStatus) -> Result<(), CommerceError> {
        if !self.status.can_transition_to(next) {
            return Err(CommerceError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        let now = unix_now();
        match next {
            OrderStatus::Delivered => {
                if self.delivery_date.is_none() {
                    self.delivery_date = Some(now);
                }
                for item in &mut self.items {
                    item.status = OrderItemStatus::Delivered;
                }
            }
            OrderStatus::Cancelled => {
                self.cancelled_at = Some(now);
                for item in &mut self.items {
                    item.status = OrderItemStatus::Cancelled;
                }
            }
            _ => {}
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Currency;

    fn order() -> Order {
        let item = OrderItem::new(
            ProductId::new("prd-1"),
            3,
            Money::new(1000, Currency::USD),
            Money::new(3000, Currency::USD),
        );
        Order::new(
            OrderId::generate(),
            "SO-1".into(),
            CustomerId::new("cus-1"),
            vec![item],
            Money::new(3000, Currency::USD),
            "12 Main St".into(),
            PaymentMethod::Card,
            None,
        )
    }

    #[test]
    fn fulfillment_moves_forward_only() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Confirmed));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Shipped));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Pending));
        assert!(!OrderStatus::Confirmed.can_transition_to(OrderStatus::Confirmed));
    }

    #[test]
    fn cancelled_reachable_from_any_non_terminal_state() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Processing,
            OrderStatus::Shipped,
        ] {
            assert!(status.can_transition_to(OrderStatus::Cancelled));
        }
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Cancelled));
    }

    #[test]
    fn terminal_states_admit_nothing() {
        for next in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert!(!OrderStatus::Delivered.can_transition_to(next));
            assert!(!OrderStatus::Cancelled.can_transition_to(next));
        }
    }

    #[test]
    fn delivered_stamps_date_and_items() {
        let mut order = order();
        order.transition_to(OrderStatus::Shipped).unwrap();
        assert!(order.delivery_date.is_none());

        order.transition_to(OrderStatus::Delivered).unwrap();
        assert!(order.delivery_date.is_some());
        assert!(order
            .items
            .iter()
            .all(|i| i.status == OrderItemStatus::Delivered));
    }

    #[test]
    fn cancel_stamps_timestamp_and_items() {
        let mut order = order();
        order.transition_to(OrderStatus::Cancelled).unwrap();
        assert!(order.cancelled_at.is_some());
        assert!(order
            .items
            .iter()
            .all(|i| i.status == OrderItemStatus::Cancelled));

        let err = order.transition_to(OrderStatus::Cancelled).unwrap_err();
        assert!(matches!(err, CommerceError::InvalidTransition { .. }));
    }
}
