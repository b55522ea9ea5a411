//! Order lifecycle manager.
//!
//! Owns post-purchase status transitions and the cancellation compensation.
//! All writes to a given order are serialized on its keyed lock, so a
//! double-cancel loses the state-machine check under the lock and can never
//! restore stock twice.

use crate::locks::KeyedLocks;
use crate::stock::StockLedger;
use shop_commerce::{CommerceError, CustomerId, Order, OrderId, OrderStatus};
use shop_store::OrderRepository;
use std::sync::Arc;
use tracing::{error, info};

pub struct OrderLifecycle {
    orders: Arc<dyn OrderRepository>,
    stock: Arc<StockLedger>,
    order_locks: KeyedLocks<OrderId>,
}

impl OrderLifecycle {
    pub fn new(orders: Arc<dyn OrderRepository>, stock: Arc<StockLedger>) -> Self {
        Self {
            orders,
            stock,
            order_locks: KeyedLocks::new(),
        }
    }

    /// Fetch an order by id.
    pub async fn order(&self, order_id: &OrderId) -> Result<Order, CommerceError> {
        self.orders
            .order(order_id)
            .await?
            .ok_or_else(|| CommerceError::OrderNotFound(order_id.to_string()))
    }

    /// A customer's orders, newest first, excluding soft-deleted ones.
    pub async fn orders_for_customer(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Vec<Order>, CommerceError> {
        self.orders.orders_for_customer(customer_id).await
    }

    /// Apply a status transition with optional tracking number and notes.
    ///
    /// Transitions into `Cancelled` go through the compensation path: stock
    /// is restored for every line before the status flips, so the generic
    /// transition entry point can never bypass the restoration.
    pub async fn update_status(
        &self,
        order_id: &OrderId,
        new_status: OrderStatus,
        tracking_number: Option<String>,
        notes: Option<String>,
    ) -> Result<Order, CommerceError> {
        let _guard = self.order_locks.lock(order_id).await;
        let mut order = self
            .orders
            .order(order_id)
            .await?
            .ok_or_else(|| CommerceError::OrderNotFound(order_id.to_string()))?;

        // Validate before compensating so a rejected transition (e.g. a
        // second cancel) restores nothing.
        if !order.status.can_transition_to(new_status) {
            return Err(CommerceError::InvalidTransition {
                from: order.status,
                to: new_status,
            });
        }

        if new_status == OrderStatus::Cancelled {
            self.restore_all(&order).await;
        }

        order.transition_to(new_status)?;
        if let Some(tracking) = tracking_number {
            order.tracking_number = Some(tracking);
        }
        if let Some(notes) = notes {
            order.notes = Some(notes);
        }
        self.orders.store(order.clone()).await?;

        info!(order = %order_id, status = %new_status, "order transitioned");
        Ok(order)
    }

    /// Cancel an order, restoring the stock its checkout deducted. This is
    /// the compensating action for the checkout saga. Fails with
    /// `InvalidTransition` if the order is already terminal.
    pub async fn cancel(&self, order_id: &OrderId) -> Result<Order, CommerceError> {
        self.update_status(order_id, OrderStatus::Cancelled, None, None)
            .await
    }

    /// Soft-delete an order: hidden from listings, the record is kept.
    pub async fn soft_delete(&self, order_id: &OrderId) -> Result<Order, CommerceError> {
        let _guard = self.order_locks.lock(order_id).await;
        let mut order = self
            .orders
            .order(order_id)
            .await?
            .ok_or_else(|| CommerceError::OrderNotFound(order_id.to_string()))?;
        order.deleted = true;
        self.orders.store(order.clone()).await?;
        Ok(order)
    }

    /// Restore stock for every line of the order.
    ///
    /// Restoration is an unconditional increment and only fails if a
    /// product record disappeared, which the data model forbids; such a
    /// line is logged and skipped so the cancellation still completes for
    /// the rest.
    async fn restore_all(&self, order: &Order) {
        for item in &order.items {
            if let Err(err) = self
                .stock
                .restore(&item.product_id, item.quantity, order.id.as_str())
                .await
            {
                error!(
                    order = %order.id,
                    product = %item.product_id,
                    quantity = item.quantity,
                    %err,
                    "cancellation restore failed for line"
                );
            }
        }
    }
}
