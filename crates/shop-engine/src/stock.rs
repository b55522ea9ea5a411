//! Stock ledger adapter.
//!
//! Thin accessor over the product catalog: read a product, check
//! availability, apply signed stock deltas. All engine stock traffic goes
//! through here so deductions and restorations are logged and carry an
//! order reference for the catalog's audit trail.

use shop_commerce::{CommerceError, Product, ProductId};
use shop_store::ProductCatalog;
use std::sync::Arc;
use tracing::debug;

pub struct StockLedger {
    catalog: Arc<dyn ProductCatalog>,
}

impl StockLedger {
    pub fn new(catalog: Arc<dyn ProductCatalog>) -> Self {
        Self { catalog }
    }

    /// Fetch a product, mapping absence to `ProductNotFound`.
    pub async fn product(&self, id: &ProductId) -> Result<Product, CommerceError> {
        self.catalog
            .product(id)
            .await?
            .ok_or_else(|| CommerceError::ProductNotFound(id.to_string()))
    }

    /// Read-only availability check against current stock.
    ///
    /// `requested` is the total the caller wants to be coverable (e.g. cart
    /// quantity including units already in the cart), so the error reports
    /// a number the caller can clamp to.
    pub fn ensure_available(product: &Product, requested: i64) -> Result<(), CommerceError> {
        if product.can_fulfill(requested) {
            Ok(())
        } else {
            Err(CommerceError::InsufficientStock {
                product_id: product.id.to_string(),
                requested,
                available: product.current_stock,
            })
        }
    }

    /// Atomically deduct stock; the catalog guarantees check-and-decrement
    /// in one step. Returns the remaining stock.
    pub async fn deduct(
        &self,
        id: &ProductId,
        quantity: i64,
        reference: &str,
    ) -> Result<i64, CommerceError> {
        let remaining = self
            .catalog
            .deduct_stock(id, quantity, Some(reference.to_string()))
            .await?;
        debug!(product = %id, quantity, remaining, reference, "stock deducted");
        Ok(remaining)
    }

    /// Restore previously deducted stock. Returns the new level.
    pub async fn restore(
        &self,
        id: &ProductId,
        quantity: i64,
        reference: &str,
    ) -> Result<i64, CommerceError> {
        let remaining = self
            .catalog
            .restore_stock(id, quantity, Some(reference.to_string()))
            .await?;
        debug!(product = %id, quantity, remaining, reference, "stock restored");
        Ok(remaining)
    }
}
