//! Cart, checkout and order lifecycle services for shopfloor.
//!
//! This crate wires the domain types from `shop-commerce` and the
//! collaborator seams from `shop-store` into the operational core:
//!
//! - [`CartManager`]: the mutable pre-purchase basket, linearized per cart
//! - [`PromotionEvaluator`]: code validation and discount computation
//! - [`CheckoutEngine`]: the atomic cart-to-order conversion (stock CAS
//!   plus compensation saga)
//! - [`OrderLifecycle`]: status transitions and the cancellation
//!   compensation
//!
//! [`Shopfloor`] assembles them over a set of collaborator backends and is
//! the surface the presentation layer talks to.

pub mod cart;
pub mod checkout;
pub mod lifecycle;
pub mod locks;
pub mod promotion;
pub mod stock;

pub use cart::CartManager;
pub use checkout::{CheckoutEngine, CheckoutRequest};
pub use lifecycle::OrderLifecycle;
pub use locks::KeyedLocks;
pub use promotion::PromotionEvaluator;
pub use stock::StockLedger;

use shop_commerce::Currency;
use shop_store::{CartRepository, CustomerLedger, OrderRepository, ProductCatalog, PromotionRegistry};
use std::sync::Arc;

/// The assembled retail core.
pub struct Shopfloor {
    pub carts: CartManager,
    pub checkout: CheckoutEngine,
    pub orders: OrderLifecycle,
}

impl Shopfloor {
    /// Wire the services over a set of collaborator backends.
    ///
    /// The cart manager and checkout engine share one keyed-lock table so a
    /// checkout excludes cart mutations for the same cart, and vice versa.
    pub fn new(
        catalog: Arc<dyn ProductCatalog>,
        customers: Arc<dyn CustomerLedger>,
        promotions: Arc<dyn PromotionRegistry>,
        carts: Arc<dyn CartRepository>,
        orders: Arc<dyn OrderRepository>,
        currency: Currency,
    ) -> Self {
        let stock = Arc::new(StockLedger::new(catalog));
        let evaluator = Arc::new(PromotionEvaluator::new(promotions));
        let cart_locks = Arc::new(KeyedLocks::new());

        Self {
            carts: CartManager::new(
                Arc::clone(&carts),
                Arc::clone(&customers),
                Arc::clone(&stock),
                Arc::clone(&evaluator),
                Arc::clone(&cart_locks),
                currency,
            ),
            checkout: CheckoutEngine::new(
                Arc::clone(&carts),
                customers,
                Arc::clone(&orders),
                Arc::clone(&stock),
                evaluator,
                cart_locks,
            ),
            orders: OrderLifecycle::new(orders, stock),
        }
    }
}
