//! Checkout: the atomic cart-to-order conversion and its failure modes.

mod common;

use async_trait::async_trait;
use common::{card_checkout, harness, open_percentage_promotion, usd};
use shop_commerce::{
    Cart, CartId, CartItemId, CartStatus, CommerceError, Currency, Customer, CustomerId, Money,
    OrderStatus, Product, ProductStatus, Promotion, StockMovementReason,
};
use shop_engine::Shopfloor;
use shop_store::{
    CartRepository, CustomerLedger, MemoryCarts, MemoryCatalog, MemoryLedger, MemoryOrders,
    MemoryPromotions, ProductCatalog, PromotionRegistry,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[tokio::test]
async fn checkout_converts_the_cart_and_settles_every_ledger() {
    let h = harness();
    let customer = h.seed_customer("Ana").await;
    let product = h.seed_product("Teapot", 1_000, 5).await;
    h.seed_promotion(open_percentage_promotion("WELCOME10", 10.0, 2_000))
        .await;

    let cart = h.shop.carts.get_or_create(&customer).await.unwrap();
    h.shop.carts.add_item(&cart.id, &product, 3).await.unwrap();
    let cart = h
        .shop
        .carts
        .apply_promotion(&cart.id, "WELCOME10")
        .await
        .unwrap();
    assert_eq!(cart.subtotal, usd(3_000));
    assert_eq!(cart.discount, usd(300));
    assert_eq!(cart.total, usd(2_700));

    let order = h
        .shop
        .checkout
        .checkout(&customer, card_checkout())
        .await
        .unwrap();

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total_amount, usd(2_700));
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].quantity, 3);
    assert_eq!(order.items[0].unit_price, usd(1_000));
    assert!(order.order_number.starts_with("SO-"));

    // Stock was deducted and the movement carries the order reference.
    assert_eq!(h.stock_of(&product).await, 2);
    let movements = h.catalog.movements(&product).await;
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].delta, -3);
    assert_eq!(movements[0].reason, StockMovementReason::Sale);
    assert_eq!(movements[0].reference.as_deref(), Some(order.id.as_str()));

    // The cart is frozen and a fresh one is handed out next time.
    let next = h.shop.carts.get_or_create(&customer).await.unwrap();
    assert_ne!(next.id, cart.id);
    assert!(next.is_empty());

    // The customer's lifetime spend reflects the discounted total.
    let ana = h.customers.customer(&customer).await.unwrap().unwrap();
    assert_eq!(ana.total_spent, usd(2_700));
}

#[tokio::test]
async fn checkout_marks_the_cart_checked_out() {
    let h = harness();
    let customer = h.seed_customer("Ana").await;
    let product = h.seed_product("Vase", 2_000, 3).await;

    let cart = h.shop.carts.get_or_create(&customer).await.unwrap();
    h.shop.carts.add_item(&cart.id, &product, 1).await.unwrap();
    h.shop
        .checkout
        .checkout(&customer, card_checkout())
        .await
        .unwrap();

    // The frozen cart refuses further mutation.
    let err = h
        .shop
        .carts
        .add_item(&cart.id, &product, 1)
        .await
        .unwrap_err();
    assert_eq!(err, CommerceError::CartAlreadyCheckedOut(cart.id.to_string()));
}

#[tokio::test]
async fn checkout_requires_an_active_non_empty_cart() {
    let h = harness();
    let customer = h.seed_customer("Ana").await;

    // No cart at all.
    let err = h
        .shop
        .checkout
        .checkout(&customer, card_checkout())
        .await
        .unwrap_err();
    assert!(matches!(err, CommerceError::CartNotFound(_)));

    // An empty cart.
    h.shop.carts.get_or_create(&customer).await.unwrap();
    let err = h
        .shop
        .checkout
        .checkout(&customer, card_checkout())
        .await
        .unwrap_err();
    assert!(matches!(err, CommerceError::EmptyCart(_)));
}

#[tokio::test]
async fn a_stock_shortfall_leaves_no_trace() {
    let h = harness();
    let customer = h.seed_customer("Ana").await;
    let plenty = h.seed_product("Cushion", 1_500, 10).await;
    let scarce = h.seed_product("Rug", 8_000, 2).await;

    let cart = h.shop.carts.get_or_create(&customer).await.unwrap();
    h.shop.carts.add_item(&cart.id, &plenty, 2).await.unwrap();
    h.shop.carts.add_item(&cart.id, &scarce, 2).await.unwrap();

    // Another sale drains the scarce product after the cart was built.
    h.catalog
        .deduct_stock(&scarce, 1, Some("walk-in sale".to_string()))
        .await
        .unwrap();

    let err = h
        .shop
        .checkout
        .checkout(&customer, card_checkout())
        .await
        .unwrap_err();
    assert!(matches!(err, CommerceError::InsufficientStock { .. }));

    // Nothing happened: no deduction survived, the cart is still active,
    // no order exists, no spend was recorded.
    assert_eq!(h.stock_of(&plenty).await, 10);
    assert_eq!(h.stock_of(&scarce).await, 1);
    let cart = h.shop.carts.get_or_create(&customer).await.unwrap();
    assert_eq!(cart.status, CartStatus::Active);
    assert_eq!(cart.active_quantity_of(&plenty), 2);
    assert!(h
        .shop
        .orders
        .orders_for_customer(&customer)
        .await
        .unwrap()
        .is_empty());
    let ana = h.customers.customer(&customer).await.unwrap().unwrap();
    assert!(ana.total_spent.is_zero());
}

#[tokio::test]
async fn a_stale_promotion_fails_checkout_without_mutating() {
    let h = harness();
    let customer = h.seed_customer("Ana").await;
    let product = h.seed_product("Blanket", 4_000, 5).await;
    let promo = open_percentage_promotion("COZY20", 20.0, 0);
    h.seed_promotion(promo.clone()).await;

    let cart = h.shop.carts.get_or_create(&customer).await.unwrap();
    h.shop.carts.add_item(&cart.id, &product, 1).await.unwrap();
    h.shop
        .carts
        .apply_promotion(&cart.id, "COZY20")
        .await
        .unwrap();

    // The promotion is switched off between apply and checkout.
    let deactivated = Promotion {
        is_active: false,
        ..promo
    };
    h.promotions.upsert(deactivated).await.unwrap();

    let err = h
        .shop
        .checkout
        .checkout(&customer, card_checkout())
        .await
        .unwrap_err();
    assert!(matches!(err, CommerceError::PromotionInactive(_)));

    // Checkout failed before touching anything.
    assert_eq!(h.stock_of(&product).await, 5);
    let cart = h.shop.carts.get_or_create(&customer).await.unwrap();
    assert_eq!(cart.status, CartStatus::Active);
    assert!(h
        .shop
        .orders
        .orders_for_customer(&customer)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn discontinued_lines_block_checkout_but_inactive_do_not() {
    let h = harness();
    let customer = h.seed_customer("Ana").await;
    let product = h.seed_product("Clock", 3_500, 5).await;

    let cart = h.shop.carts.get_or_create(&customer).await.unwrap();
    h.shop.carts.add_item(&cart.id, &product, 1).await.unwrap();

    // Discontinuation after add-to-cart stops the sale.
    h.set_product_status(&product, ProductStatus::Discontinued)
        .await;
    let err = h
        .shop
        .checkout
        .checkout(&customer, card_checkout())
        .await
        .unwrap_err();
    assert!(matches!(err, CommerceError::ProductUnavailable { .. }));

    // Mere deactivation does not: units already in carts may still ship.
    h.set_product_status(&product, ProductStatus::Inactive).await;
    let order = h
        .shop
        .checkout
        .checkout(&customer, card_checkout())
        .await
        .unwrap();
    assert_eq!(order.total_amount, usd(3_500));
    assert_eq!(h.stock_of(&product).await, 4);
}

/// A cart backend that refuses to persist checked-out carts while the
/// outage flag is up.
struct OutageCarts {
    inner: MemoryCarts,
    refuse_frozen: AtomicBool,
}

impl OutageCarts {
    fn new() -> Self {
        Self {
            inner: MemoryCarts::new(),
            refuse_frozen: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl CartRepository for OutageCarts {
    async fn cart(&self, id: &CartId) -> Result<Option<Cart>, CommerceError> {
        self.inner.cart(id).await
    }

    async fn active_cart_for(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Option<Cart>, CommerceError> {
        self.inner.active_cart_for(customer_id).await
    }

    async fn cart_with_item(&self, item_id: &CartItemId) -> Result<Option<Cart>, CommerceError> {
        self.inner.cart_with_item(item_id).await
    }

    async fn store(&self, cart: Cart) -> Result<(), CommerceError> {
        if self.refuse_frozen.load(Ordering::SeqCst) && !cart.is_active() {
            return Err(CommerceError::StoreError("cart store unavailable".into()));
        }
        self.inner.store(cart).await
    }
}

/// A customer backend whose spend recording can be switched off.
struct OutageLedger {
    inner: MemoryLedger,
    refuse_spend: AtomicBool,
}

impl OutageLedger {
    fn new() -> Self {
        Self {
            inner: MemoryLedger::new(),
            refuse_spend: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl CustomerLedger for OutageLedger {
    async fn customer(&self, id: &CustomerId) -> Result<Option<Customer>, CommerceError> {
        self.inner.customer(id).await
    }

    async fn upsert(&self, customer: Customer) -> Result<(), CommerceError> {
        self.inner.upsert(customer).await
    }

    async fn record_spend(
        &self,
        id: &CustomerId,
        amount: Money,
    ) -> Result<Customer, CommerceError> {
        if self.refuse_spend.load(Ordering::SeqCst) {
            return Err(CommerceError::StoreError("ledger unavailable".into()));
        }
        self.inner.record_spend(id, amount).await
    }
}

struct OutageRig {
    shop: Shopfloor,
    catalog: Arc<MemoryCatalog>,
    carts: Arc<OutageCarts>,
    customers: Arc<OutageLedger>,
    customer: CustomerId,
    product: shop_commerce::ProductId,
}

/// A shopfloor over flappable backends, seeded with one customer holding a
/// three-unit cart against a five-unit product.
async fn outage_rig() -> OutageRig {
    let catalog = Arc::new(MemoryCatalog::new());
    let carts = Arc::new(OutageCarts::new());
    let customers = Arc::new(OutageLedger::new());
    let shop = Shopfloor::new(
        Arc::clone(&catalog) as Arc<dyn ProductCatalog>,
        Arc::clone(&customers) as Arc<dyn CustomerLedger>,
        Arc::new(MemoryPromotions::new()),
        Arc::clone(&carts) as Arc<dyn CartRepository>,
        Arc::new(MemoryOrders::new()),
        Currency::USD,
    );

    let ana = Customer::new("Ana", Currency::USD);
    let customer = ana.id.clone();
    customers.upsert(ana).await.unwrap();
    let teapot = Product::new("Teapot", usd(1_000), 5);
    let product = teapot.id.clone();
    catalog.upsert(teapot).await.unwrap();

    let cart = shop.carts.get_or_create(&customer).await.unwrap();
    shop.carts.add_item(&cart.id, &product, 3).await.unwrap();

    OutageRig {
        shop,
        catalog,
        carts,
        customers,
        customer,
        product,
    }
}

impl OutageRig {
    async fn stock(&self) -> i64 {
        self.catalog
            .product(&self.product)
            .await
            .unwrap()
            .unwrap()
            .current_stock
    }

    /// The all-or-nothing assertions: no deduction, no order, an active
    /// cart still holding its three units, no spend.
    async fn assert_untouched(&self) {
        assert_eq!(self.stock().await, 5);
        assert!(self
            .shop
            .orders
            .orders_for_customer(&self.customer)
            .await
            .unwrap()
            .is_empty());
        let cart = self.shop.carts.get_or_create(&self.customer).await.unwrap();
        assert_eq!(cart.status, CartStatus::Active);
        assert_eq!(cart.active_quantity_of(&self.product), 3);
        let ana = self
            .customers
            .customer(&self.customer)
            .await
            .unwrap()
            .unwrap();
        assert!(ana.total_spent.is_zero());
    }
}

#[tokio::test]
async fn a_cart_store_failure_after_order_creation_is_fully_unwound() {
    let rig = outage_rig().await;

    rig.carts.refuse_frozen.store(true, Ordering::SeqCst);
    let err = rig
        .shop
        .checkout
        .checkout(&rig.customer, card_checkout())
        .await
        .unwrap_err();
    assert!(matches!(err, CommerceError::StoreError(_)));
    rig.assert_untouched().await;

    // Once the backend recovers the same cart checks out cleanly.
    rig.carts.refuse_frozen.store(false, Ordering::SeqCst);
    let order = rig
        .shop
        .checkout
        .checkout(&rig.customer, card_checkout())
        .await
        .unwrap();
    assert_eq!(order.total_amount, usd(3_000));
    assert_eq!(rig.stock().await, 2);
}

#[tokio::test]
async fn a_spend_recording_failure_is_fully_unwound() {
    let rig = outage_rig().await;

    rig.customers.refuse_spend.store(true, Ordering::SeqCst);
    let err = rig
        .shop
        .checkout
        .checkout(&rig.customer, card_checkout())
        .await
        .unwrap_err();
    assert!(matches!(err, CommerceError::StoreError(_)));
    rig.assert_untouched().await;

    rig.customers.refuse_spend.store(false, Ordering::SeqCst);
    let order = rig
        .shop
        .checkout
        .checkout(&rig.customer, card_checkout())
        .await
        .unwrap();
    assert_eq!(order.total_amount, usd(3_000));
    assert_eq!(rig.stock().await, 2);
    let ana = rig
        .customers
        .customer(&rig.customer)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ana.total_spent, usd(3_000));
}

#[tokio::test]
async fn order_numbers_are_unique_per_store() {
    let h = harness();
    let customer = h.seed_customer("Ana").await;
    let product = h.seed_product("Spoon", 300, 50).await;

    let mut numbers = std::collections::HashSet::new();
    for _ in 0..5 {
        let cart = h.shop.carts.get_or_create(&customer).await.unwrap();
        h.shop.carts.add_item(&cart.id, &product, 1).await.unwrap();
        let order = h
            .shop
            .checkout
            .checkout(&customer, card_checkout())
            .await
            .unwrap();
        assert!(numbers.insert(order.order_number));
    }
    assert_eq!(numbers.len(), 5);
}
