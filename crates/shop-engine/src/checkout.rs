//! Checkout engine.
//!
//! Converts one active cart into an order as a single unit of work. The
//! operation has two phases:
//!
//! 1. A precondition pass that mutates nothing: customer exists, cart is
//!    active and non-empty, the applied promotion still qualifies, every
//!    line's product still exists, is not discontinued, and has enough
//!    stock *right now* (cart-build-time checks are not trusted).
//! 2. A saga: stock is deducted first, line by line, through the catalog's
//!    compare-and-swap. If any line loses a race to a concurrent checkout,
//!    the deductions already applied are rolled back and the failure is
//!    surfaced as `InsufficientStock`. Only once all stock is held are the
//!    order created, the cart frozen, and the customer's spend recorded.
//!    A failure in any of those commit steps unwinds what already landed
//!    (the stored order, the frozen cart, the held stock) before the error
//!    is surfaced, so a failed checkout never leaves partial state behind.
//!
//! The whole operation holds the cart's keyed lock, so it cannot interleave
//! with cart mutations or with a second checkout of the same cart. Stock
//! contention with checkouts of *other* carts is resolved solely by the
//! per-product compare-and-swap.

use crate::locks::KeyedLocks;
use crate::promotion::PromotionEvaluator;
use crate::stock::StockLedger;
use shop_commerce::{
    unix_now, Cart, CartId, CommerceError, CustomerId, Order, OrderId, OrderItem, PaymentMethod,
    ProductId, ProductStatus,
};
use shop_store::{CartRepository, CustomerLedger, OrderRepository};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Caller-supplied order details.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub delivery_address: String,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
}

pub struct CheckoutEngine {
    carts: Arc<dyn CartRepository>,
    customers: Arc<dyn CustomerLedger>,
    orders: Arc<dyn OrderRepository>,
    stock: Arc<StockLedger>,
    promotions: Arc<PromotionEvaluator>,
    cart_locks: Arc<KeyedLocks<CartId>>,
}

impl CheckoutEngine {
    pub fn new(
        carts: Arc<dyn CartRepository>,
        customers: Arc<dyn CustomerLedger>,
        orders: Arc<dyn OrderRepository>,
        stock: Arc<StockLedger>,
        promotions: Arc<PromotionEvaluator>,
        cart_locks: Arc<KeyedLocks<CartId>>,
    ) -> Self {
        Self {
            carts,
            customers,
            orders,
            stock,
            promotions,
            cart_locks,
        }
    }

    /// Convert the customer's active cart into an order.
    pub async fn checkout(
        &self,
        customer_id: &CustomerId,
        request: CheckoutRequest,
    ) -> Result<Order, CommerceError> {
        self.customers
            .customer(customer_id)
            .await?
            .ok_or_else(|| CommerceError::CustomerNotFound(customer_id.to_string()))?;

        let cart_id = self
            .carts
            .active_cart_for(customer_id)
            .await?
            .ok_or_else(|| {
                CommerceError::CartNotFound(format!("no active cart for customer {customer_id}"))
            })?
            .id;

        let _guard = self.cart_locks.lock(&cart_id).await;
        // Re-read under the lock; the cart may have been checked out while
        // we were waiting.
        let mut cart = self
            .carts
            .cart(&cart_id)
            .await?
            .ok_or_else(|| CommerceError::CartNotFound(cart_id.to_string()))?;
        if !cart.is_active() {
            return Err(CommerceError::CartAlreadyCheckedOut(cart_id.to_string()));
        }
        if cart.is_empty() {
            return Err(CommerceError::EmptyCart(cart_id.to_string()));
        }

        self.validate_promotion(&mut cart).await?;
        self.validate_stock(&cart).await?;

        let order_id = OrderId::generate();
        let deducted = self.deduct_all(&cart, &order_id).await?;

        // Stock is held; commit the remaining steps.
        let items: Vec<OrderItem> = cart
            .active_items()
            .map(|i| OrderItem::new(i.product_id.clone(), i.quantity, i.unit_price, i.line_total))
            .collect();
        let order = Order::new(
            order_id.clone(),
            self.orders.allocate_order_number(),
            customer_id.clone(),
            items,
            cart.total,
            request.delivery_address,
            request.payment_method,
            request.notes,
        );

        if let Err(err) = self.orders.store(order.clone()).await {
            self.roll_back(&deducted, &order_id).await;
            return Err(err);
        }

        let open_cart = cart.clone();
        cart.mark_checked_out();
        if let Err(err) = self.carts.store(cart).await {
            self.unwind_commit(&deducted, &order_id).await;
            return Err(err);
        }

        if let Err(err) = self
            .customers
            .record_spend(customer_id, order.total_amount)
            .await
        {
            // Reopen the cart, then release the order and the held stock,
            // so the failure leaves the same state as a lost stock race.
            if let Err(store_err) = self.carts.store(open_cart).await {
                error!(cart = %cart_id, %store_err, "failed to reopen cart during checkout unwind");
            }
            self.unwind_commit(&deducted, &order_id).await;
            return Err(err);
        }

        info!(
            order = %order.id,
            number = %order.order_number,
            customer = %customer_id,
            total = %order.total_amount,
            "checkout committed"
        );
        Ok(order)
    }

    /// Re-validate the applied promotion against the cart as it stands.
    ///
    /// Policy for promotions that went stale between application and
    /// checkout: fail the checkout with the evaluator's typed error and
    /// mutate nothing, so the caller can remove the code and retry. The
    /// refreshed discount is folded into the in-memory totals used for the
    /// order; the stored cart is untouched until commit.
    async fn validate_promotion(&self, cart: &mut Cart) -> Result<(), CommerceError> {
        let subtotal = cart.active_subtotal()?;
        if let Some(applied) = cart.promotion.clone() {
            let (_, amount) = self
                .promotions
                .evaluate(&applied.code, subtotal, unix_now())
                .await?;
            if let Some(promotion) = cart.promotion.as_mut() {
                promotion.amount = amount;
            }
        }
        cart.recalculate()
    }

    /// Mutation-free stock and liveness pass over every active line.
    ///
    /// Discontinued products block checkout; inactive ones do not, since units
    /// already in a cart may still be bought after a product is taken off
    /// the shelf.
    async fn validate_stock(&self, cart: &Cart) -> Result<(), CommerceError> {
        for item in cart.active_items() {
            let product = self.stock.product(&item.product_id).await?;
            if product.status == ProductStatus::Discontinued {
                return Err(CommerceError::ProductUnavailable {
                    product_id: product.id.to_string(),
                    status: product.status,
                });
            }
            StockLedger::ensure_available(&product, item.quantity)?;
        }
        Ok(())
    }

    /// Deduct stock for every active line, rolling back on the first
    /// failure. Returns the applied deductions on success.
    async fn deduct_all(
        &self,
        cart: &Cart,
        order_id: &OrderId,
    ) -> Result<Vec<(ProductId, i64)>, CommerceError> {
        let mut deducted: Vec<(ProductId, i64)> = Vec::new();
        for item in cart.active_items() {
            match self
                .stock
                .deduct(&item.product_id, item.quantity, order_id.as_str())
                .await
            {
                Ok(_) => deducted.push((item.product_id.clone(), item.quantity)),
                Err(err) => {
                    warn!(
                        cart = %cart.id,
                        product = %item.product_id,
                        %err,
                        "stock deduction failed, rolling back"
                    );
                    self.roll_back(&deducted, order_id).await;
                    return Err(err);
                }
            }
        }
        Ok(deducted)
    }

    /// Compensate a checkout that failed after its order was stored:
    /// release the held stock and remove the order record.
    async fn unwind_commit(&self, deducted: &[(ProductId, i64)], order_id: &OrderId) {
        self.roll_back(deducted, order_id).await;
        if let Err(err) = self.orders.remove(order_id).await {
            error!(order = %order_id, %err, "failed to remove order during checkout unwind");
        }
    }

    /// Compensate deductions already applied by a failed checkout.
    async fn roll_back(&self, deducted: &[(ProductId, i64)], order_id: &OrderId) {
        for (product_id, quantity) in deducted {
            if let Err(err) = self.stock.restore(product_id, *quantity, order_id.as_str()).await {
                // A product record vanishing mid-rollback cannot be
                // compensated further; record it loudly.
                error!(product = %product_id, quantity, %err, "rollback restore failed");
            }
        }
    }
}
