//! Shared test harness: a shopfloor wired over in-memory backends.

#![allow(dead_code)]

use shop_commerce::{
    Currency, Customer, CustomerId, Money, PaymentMethod, Product, ProductId, ProductStatus,
    Promotion,
};
use shop_engine::{CheckoutRequest, Shopfloor};
use shop_store::{
    CustomerLedger, MemoryCarts, MemoryCatalog, MemoryLedger, MemoryOrders, MemoryPromotions,
    ProductCatalog, PromotionRegistry,
};
use std::sync::Arc;

pub struct Harness {
    pub shop: Shopfloor,
    pub catalog: Arc<MemoryCatalog>,
    pub customers: Arc<MemoryLedger>,
    pub promotions: Arc<MemoryPromotions>,
}

pub fn usd(cents: i64) -> Money {
    Money::new(cents, Currency::USD)
}

pub fn harness() -> Harness {
    let catalog = Arc::new(MemoryCatalog::new());
    let customers = Arc::new(MemoryLedger::new());
    let promotions = Arc::new(MemoryPromotions::new());
    let carts = Arc::new(MemoryCarts::new());
    let orders = Arc::new(MemoryOrders::new());

    let shop = Shopfloor::new(
        Arc::clone(&catalog) as Arc<dyn shop_store::ProductCatalog>,
        Arc::clone(&customers) as Arc<dyn shop_store::CustomerLedger>,
        Arc::clone(&promotions) as Arc<dyn shop_store::PromotionRegistry>,
        carts,
        orders,
        Currency::USD,
    );

    Harness {
        shop,
        catalog,
        customers,
        promotions,
    }
}

impl Harness {
    pub async fn seed_customer(&self, name: &str) -> CustomerId {
        let customer = Customer::new(name, Currency::USD);
        let id = customer.id.clone();
        self.customers.upsert(customer).await.expect("seed customer");
        id
    }

    pub async fn seed_product(&self, name: &str, price_cents: i64, stock: i64) -> ProductId {
        let product = Product::new(name, usd(price_cents), stock);
        let id = product.id.clone();
        self.catalog.upsert(product).await.expect("seed product");
        id
    }

    pub async fn seed_product_with_status(
        &self,
        name: &str,
        price_cents: i64,
        stock: i64,
        status: ProductStatus,
    ) -> ProductId {
        let product = Product::new(name, usd(price_cents), stock).with_status(status);
        let id = product.id.clone();
        self.catalog.upsert(product).await.expect("seed product");
        id
    }

    pub async fn seed_promotion(&self, promotion: Promotion) {
        self.promotions.upsert(promotion).await.expect("seed promotion");
    }

    pub async fn stock_of(&self, product_id: &ProductId) -> i64 {
        self.catalog
            .product(product_id)
            .await
            .expect("catalog read")
            .expect("product exists")
            .current_stock
    }

    pub async fn set_product_status(&self, product_id: &ProductId, status: ProductStatus) {
        let mut product = self
            .catalog
            .product(product_id)
            .await
            .expect("catalog read")
            .expect("product exists");
        product.status = status;
        self.catalog.upsert(product).await.expect("update product");
    }

    pub async fn set_product_price(&self, product_id: &ProductId, price_cents: i64) {
        let mut product = self
            .catalog
            .product(product_id)
            .await
            .expect("catalog read")
            .expect("product exists");
        product.price = usd(price_cents);
        self.catalog.upsert(product).await.expect("update product");
    }
}

pub fn card_checkout() -> CheckoutRequest {
    CheckoutRequest {
        delivery_address: "12 Harbor Lane".to_string(),
        payment_method: PaymentMethod::Card,
        notes: None,
    }
}

/// A promotion valid from the distant past to the distant future.
pub fn open_percentage_promotion(code: &str, percent: f64, minimum_cents: i64) -> Promotion {
    Promotion::percentage(code, percent, usd(minimum_cents), 0, i64::MAX)
}

pub fn open_fixed_promotion(code: &str, amount_cents: i64, minimum_cents: i64) -> Promotion {
    Promotion::fixed(code, usd(amount_cents), usd(minimum_cents), 0, i64::MAX)
}
