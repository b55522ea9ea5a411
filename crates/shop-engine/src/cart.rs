//! Cart manager.
//!
//! Owns the mutable pre-purchase basket. Every mutation runs under the
//! cart's keyed lock: load the document, validate against the catalog,
//! mutate, refresh totals, store. Two concurrent mutations of the same cart
//! can therefore never interleave their read-modify-write of the totals;
//! mutations of different carts proceed in parallel.

use crate::locks::KeyedLocks;
use crate::promotion::PromotionEvaluator;
use crate::stock::StockLedger;
use shop_commerce::{
    unix_now, AppliedPromotion, Cart, CartId, CartItemId, CommerceError, Currency, CustomerId,
    ProductId,
};
use shop_store::{CartRepository, CustomerLedger};
use std::sync::Arc;
use tracing::debug;

pub struct CartManager {
    carts: Arc<dyn CartRepository>,
    customers: Arc<dyn CustomerLedger>,
    stock: Arc<StockLedger>,
    promotions: Arc<PromotionEvaluator>,
    cart_locks: Arc<KeyedLocks<CartId>>,
    customer_locks: KeyedLocks<CustomerId>,
    currency: Currency,
}

impl CartManager {
    pub fn new(
        carts: Arc<dyn CartRepository>,
        customers: Arc<dyn CustomerLedger>,
        stock: Arc<StockLedger>,
        promotions: Arc<PromotionEvaluator>,
        cart_locks: Arc<KeyedLocks<CartId>>,
        currency: Currency,
    ) -> Self {
        Self {
            carts,
            customers,
            stock,
            promotions,
            cart_locks,
            customer_locks: KeyedLocks::new(),
            currency,
        }
    }

    /// The customer's active cart, created empty on first access.
    ///
    /// Creation happens inside a per-customer critical section: lock,
    /// re-check for an existing active cart, insert. That makes "at most
    /// one active cart per customer" an invariant rather than a query
    /// convention.
    pub async fn get_or_create(&self, customer_id: &CustomerId) -> Result<Cart, CommerceError> {
        self.customers
            .customer(customer_id)
            .await?
            .ok_or_else(|| CommerceError::CustomerNotFound(customer_id.to_string()))?;

        let _guard = self.customer_locks.lock(customer_id).await;
        if let Some(cart) = self.carts.active_cart_for(customer_id).await? {
            return Ok(cart);
        }
        let cart = Cart::new(customer_id.clone(), self.currency);
        self.carts.store(cart.clone()).await?;
        debug!(cart = %cart.id, customer = %customer_id, "created active cart");
        Ok(cart)
    }

    /// Add units of a product to the cart.
    ///
    /// Validates that the product is purchasable and that the cart's total
    /// demand for it (existing active line plus this request) fits current
    /// stock. The unit price is snapshotted here and never re-read.
    pub async fn add_item(
        &self,
        cart_id: &CartId,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<Cart, CommerceError> {
        if quantity <= 0 {
            return Err(CommerceError::InvalidQuantity(quantity));
        }

        let _guard = self.cart_locks.lock(cart_id).await;
        let mut cart = self.load_active(cart_id).await?;

        let product = self.stock.product(product_id).await?;
        if !product.status.is_purchasable() {
            return Err(CommerceError::ProductUnavailable {
                product_id: product_id.to_string(),
                status: product.status,
            });
        }
        let demanded = cart
            .active_quantity_of(product_id)
            .checked_add(quantity)
            .ok_or(CommerceError::Overflow)?;
        StockLedger::ensure_available(&product, demanded)?;

        cart.add_item(product_id.clone(), quantity, product.price)?;
        self.refresh_totals(&mut cart).await?;
        self.carts.store(cart.clone()).await?;
        debug!(cart = %cart_id, product = %product_id, quantity, "item added");
        Ok(cart)
    }

    /// Change the quantity of a line item. Non-positive quantities remove
    /// the line; otherwise the new quantity is re-validated against current
    /// stock.
    pub async fn update_quantity(
        &self,
        item_id: &CartItemId,
        quantity: i64,
    ) -> Result<Cart, CommerceError> {
        let cart_id = self.owning_cart_id(item_id).await?;
        let _guard = self.cart_locks.lock(&cart_id).await;
        let mut cart = self.load_active(&cart_id).await?;

        if quantity <= 0 {
            cart.remove_item(item_id)?;
        } else {
            let item = cart
                .item(item_id)
                .filter(|i| i.is_active())
                .ok_or_else(|| CommerceError::CartItemNotFound(item_id.to_string()))?;
            let product = self.stock.product(&item.product_id).await?;
            StockLedger::ensure_available(&product, quantity)?;
            cart.set_item_quantity(item_id, quantity)?;
        }

        self.refresh_totals(&mut cart).await?;
        self.carts.store(cart.clone()).await?;
        debug!(cart = %cart_id, item = %item_id, quantity, "quantity updated");
        Ok(cart)
    }

    /// Flip a line item to removed and recompute totals from the remaining
    /// active lines.
    pub async fn remove_item(&self, item_id: &CartItemId) -> Result<Cart, CommerceError> {
        let cart_id = self.owning_cart_id(item_id).await?;
        let _guard = self.cart_locks.lock(&cart_id).await;
        let mut cart = self.load_active(&cart_id).await?;

        cart.remove_item(item_id)?;
        self.refresh_totals(&mut cart).await?;
        self.carts.store(cart.clone()).await?;
        debug!(cart = %cart_id, item = %item_id, "item removed");
        Ok(cart)
    }

    /// Flip every active line to removed, drop the promotion and zero the
    /// totals. Clearing an empty cart is a no-op success.
    pub async fn clear(&self, cart_id: &CartId) -> Result<Cart, CommerceError> {
        let _guard = self.cart_locks.lock(cart_id).await;
        let mut cart = self.load_active(cart_id).await?;

        cart.clear();
        self.refresh_totals(&mut cart).await?;
        self.carts.store(cart.clone()).await?;
        debug!(cart = %cart_id, "cart cleared");
        Ok(cart)
    }

    /// Validate a promotion code against the cart's subtotal and apply it.
    /// On failure the cart is left untouched and the evaluator's error is
    /// surfaced.
    pub async fn apply_promotion(
        &self,
        cart_id: &CartId,
        code: &str,
    ) -> Result<Cart, CommerceError> {
        let _guard = self.cart_locks.lock(cart_id).await;
        let mut cart = self.load_active(cart_id).await?;

        let subtotal = cart.active_subtotal()?;
        let (promotion_id, amount) = self.promotions.evaluate(code, subtotal, unix_now()).await?;
        cart.apply_promotion(AppliedPromotion {
            promotion_id,
            code: code.to_uppercase(),
            amount,
        });
        cart.recalculate()?;
        self.carts.store(cart.clone()).await?;
        debug!(cart = %cart_id, code, discount = %amount, "promotion applied");
        Ok(cart)
    }

    /// Drop the applied promotion and recompute totals.
    pub async fn remove_promotion(&self, cart_id: &CartId) -> Result<Cart, CommerceError> {
        let _guard = self.cart_locks.lock(cart_id).await;
        let mut cart = self.load_active(cart_id).await?;

        cart.remove_promotion();
        cart.recalculate()?;
        self.carts.store(cart.clone()).await?;
        debug!(cart = %cart_id, "promotion removed");
        Ok(cart)
    }

    /// Load a cart that must still be open for mutation.
    async fn load_active(&self, cart_id: &CartId) -> Result<Cart, CommerceError> {
        let cart = self
            .carts
            .cart(cart_id)
            .await?
            .ok_or_else(|| CommerceError::CartNotFound(cart_id.to_string()))?;
        if !cart.is_active() {
            return Err(CommerceError::CartAlreadyCheckedOut(cart_id.to_string()));
        }
        Ok(cart)
    }

    async fn owning_cart_id(&self, item_id: &CartItemId) -> Result<CartId, CommerceError> {
        Ok(self
            .carts
            .cart_with_item(item_id)
            .await?
            .ok_or_else(|| CommerceError::CartItemNotFound(item_id.to_string()))?
            .id)
    }

    /// Recompute subtotal, discount and total after a mutation.
    ///
    /// The applied promotion is re-evaluated against the new subtotal; if it
    /// no longer qualifies (below minimum after a removal, expired, switched
    /// off) the discount is cleared rather than silently kept. Backend
    /// errors still propagate.
    async fn refresh_totals(&self, cart: &mut Cart) -> Result<(), CommerceError> {
        let subtotal = cart.active_subtotal()?;
        if let Some(applied) = cart.promotion.clone() {
            match self
                .promotions
                .evaluate(&applied.code, subtotal, unix_now())
                .await
            {
                Ok((_, amount)) => {
                    if let Some(promotion) = cart.promotion.as_mut() {
                        promotion.amount = amount;
                    }
                }
                Err(err) if err.is_promotion_invalid() => {
                    debug!(cart = %cart.id, code = %applied.code, %err, "promotion no longer valid, clearing");
                    cart.remove_promotion();
                }
                Err(err) => return Err(err),
            }
        }
        cart.recalculate()
    }
}
