//! Product catalog seam and in-memory backend.

use async_trait::async_trait;
use shop_commerce::{
    CommerceError, Product, ProductId, StockMovement, StockMovementReason,
};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// The product catalog collaborator.
///
/// `deduct_stock` and `restore_stock` are the only stock writers in the
/// system. Both record an audit movement. `deduct_stock` is a
/// compare-and-swap: the availability check and the decrement happen
/// atomically, so two concurrent deductions for the same product can never
/// jointly oversell it.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Fetch a product by id.
    async fn product(&self, id: &ProductId) -> Result<Option<Product>, CommerceError>;

    /// Insert or replace a product record.
    async fn upsert(&self, product: Product) -> Result<(), CommerceError>;

    /// Atomically decrement stock if `current_stock >= quantity`, returning
    /// the remaining stock; otherwise fail with `InsufficientStock` carrying
    /// the available quantity.
    async fn deduct_stock(
        &self,
        id: &ProductId,
        quantity: i64,
        reference: Option<String>,
    ) -> Result<i64, CommerceError>;

    /// Unconditionally increment stock, returning the new level.
    async fn restore_stock(
        &self,
        id: &ProductId,
        quantity: i64,
        reference: Option<String>,
    ) -> Result<i64, CommerceError>;
}

#[derive(Default)]
struct CatalogInner {
    products: HashMap<ProductId, Product>,
    movements: Vec<StockMovement>,
}

/// In-memory catalog backend.
#[derive(Default)]
pub struct MemoryCatalog {
    inner: RwLock<CatalogInner>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The audit trail of stock movements, oldest first.
    pub async fn movements(&self, id: &ProductId) -> Vec<StockMovement> {
        self.inner
            .read()
            .await
            .movements
            .iter()
            .filter(|m| &m.product_id == id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ProductCatalog for MemoryCatalog {
    async fn product(&self, id: &ProductId) -> Result<Option<Product>, CommerceError> {
        Ok(self.inner.read().await.products.get(id).cloned())
    }

    async fn upsert(&self, product: Product) -> Result<(), CommerceError> {
        self.inner
            .write()
            .await
            .products
            .insert(product.id.clone(), product);
        Ok(())
    }

    async fn deduct_stock(
        &self,
        id: &ProductId,
        quantity: i64,
        reference: Option<String>,
    ) -> Result<i64, CommerceError> {
        if quantity <= 0 {
            return Err(CommerceError::InvalidQuantity(quantity));
        }
        let mut inner = self.inner.write().await;
        let product = inner
            .products
            .get_mut(id)
            .ok_or_else(|| CommerceError::ProductNotFound(id.to_string()))?;
        if product.current_stock < quantity {
            return Err(CommerceError::InsufficientStock {
                product_id: id.to_string(),
                requested: quantity,
                available: product.current_stock,
            });
        }
        product.current_stock -= quantity;
        product.updated_at = shop_commerce::unix_now();
        let remaining = product.current_stock;

        let mut movement = StockMovement::new(id.clone(), -quantity, StockMovementReason::Sale);
        movement.reference = reference;
        inner.movements.push(movement);
        Ok(remaining)
    }

    async fn restore_stock(
        &self,
        id: &ProductId,
        quantity: i64,
        reference: Option<String>,
    ) -> Result<i64, CommerceError> {
        if quantity <= 0 {
            return Err(CommerceError::InvalidQuantity(quantity));
        }
        let mut inner = self.inner.write().await;
        let product = inner
            .products
            .get_mut(id)
            .ok_or_else(|| CommerceError::ProductNotFound(id.to_string()))?;
        product.current_stock = product
            .current_stock
            .checked_add(quantity)
            .ok_or(CommerceError::Overflow)?;
        product.updated_at = shop_commerce::unix_now();
        let remaining = product.current_stock;

        let mut movement =
            StockMovement::new(id.clone(), quantity, StockMovementReason::CancelRestock);
        movement.reference = reference;
        inner.movements.push(movement);
        Ok(remaining)
    }
}
