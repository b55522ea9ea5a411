//! Cart repository seam and in-memory backend.
//!
//! Carts are whole documents: `store` replaces the entire record, items
//! included. The engine serializes mutations per cart, so a replace never
//! races another writer of the same cart.

use async_trait::async_trait;
use shop_commerce::{Cart, CartId, CartItemId, CommerceError, CustomerId};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// The cart repository collaborator.
#[async_trait]
pub trait CartRepository: Send + Sync {
    async fn cart(&self, id: &CartId) -> Result<Option<Cart>, CommerceError>;

    /// The customer's active cart, if any. At most one exists per customer.
    async fn active_cart_for(&self, customer_id: &CustomerId)
        -> Result<Option<Cart>, CommerceError>;

    /// The cart owning a given line item, regardless of the item's status.
    async fn cart_with_item(&self, item_id: &CartItemId) -> Result<Option<Cart>, CommerceError>;

    /// Insert or replace a cart document.
    async fn store(&self, cart: Cart) -> Result<(), CommerceError>;
}

/// In-memory cart repository.
#[derive(Default)]
pub struct MemoryCarts {
    carts: RwLock<HashMap<CartId, Cart>>,
}

impl MemoryCarts {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CartRepository for MemoryCarts {
    async fn cart(&self, id: &CartId) -> Result<Option<Cart>, CommerceError> {
        Ok(self.carts.read().await.get(id).cloned())
    }

    async fn active_cart_for(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Option<Cart>, CommerceError> {
        Ok(self
            .carts
            .read()
            .await
            .values()
            .find(|c| &c.customer_id == customer_id && c.is_active())
            .cloned())
    }

    async fn cart_with_item(&self, item_id: &CartItemId) -> Result<Option<Cart>, CommerceError> {
        Ok(self
            .carts
            .read()
            .await
            .values()
            .find(|c| c.item(item_id).is_some())
            .cloned())
    }

    async fn store(&self, cart: Cart) -> Result<(), CommerceError> {
        self.carts.write().await.insert(cart.id.clone(), cart);
        Ok(())
    }
}
