//! Order repository seam and in-memory backend.

use async_trait::async_trait;
use shop_commerce::{CommerceError, CustomerId, Order, OrderId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;

/// The order repository collaborator.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn order(&self, id: &OrderId) -> Result<Option<Order>, CommerceError>;

    /// Orders for a customer, newest first, excluding soft-deleted rows.
    async fn orders_for_customer(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Vec<Order>, CommerceError>;

    /// Insert or replace an order document.
    async fn store(&self, order: Order) -> Result<(), CommerceError>;

    /// Remove an order document. Only used to unwind a checkout that
    /// failed after its order was stored; committed orders are never
    /// removed, only soft-deleted.
    async fn remove(&self, id: &OrderId) -> Result<(), CommerceError>;

    /// Allocate the next human-readable order number. Unique and monotonic
    /// within the repository.
    fn allocate_order_number(&self) -> String;
}

/// In-memory order repository.
pub struct MemoryOrders {
    orders: RwLock<HashMap<OrderId, Order>>,
    /// Epoch-seconds seed keeps numbers from colliding across restarts.
    number_seed: u64,
    number_counter: AtomicU64,
}

impl MemoryOrders {
    pub fn new() -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            orders: RwLock::new(HashMap::new()),
            number_seed: seed,
            number_counter: AtomicU64::new(0),
        }
    }
}

impl Default for MemoryOrders {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderRepository for MemoryOrders {
    async fn order(&self, id: &OrderId) -> Result<Option<Order>, CommerceError> {
        Ok(self.orders.read().await.get(id).cloned())
    }

    async fn orders_for_customer(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Vec<Order>, CommerceError> {
        let mut orders: Vec<Order> = self
            .orders
            .read()
            .await
            .values()
            .filter(|o| &o.customer_id == customer_id && !o.deleted)
            .cloned()
            .collect();
        // Timestamps are second-resolution; the monotonic order number
        // breaks ties between orders placed in the same second.
        orders.sort_by(|a, b| {
            (b.created_at, &b.order_number).cmp(&(a.created_at, &a.order_number))
        });
        Ok(orders)
    }

    async fn store(&self, order: Order) -> Result<(), CommerceError> {
        self.orders.write().await.insert(order.id.clone(), order);
        Ok(())
    }

    async fn remove(&self, id: &OrderId) -> Result<(), CommerceError> {
        self.orders.write().await.remove(id);
        Ok(())
    }

    fn allocate_order_number(&self) -> String {
        let seq = self.number_counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("SO-{}-{:04}", self.number_seed, seq)
    }
}
