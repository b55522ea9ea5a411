//! Promotion registry seam and in-memory backend.

use async_trait::async_trait;
use shop_commerce::{CommerceError, Promotion};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// The promotion registry collaborator. Read-only to the core; codes are
/// matched case-insensitively.
#[async_trait]
pub trait PromotionRegistry: Send + Sync {
    async fn by_code(&self, code: &str) -> Result<Option<Promotion>, CommerceError>;

    async fn upsert(&self, promotion: Promotion) -> Result<(), CommerceError>;
}

/// In-memory registry backend, keyed by uppercased code.
#[derive(Default)]
pub struct MemoryPromotions {
    promotions: RwLock<HashMap<String, Promotion>>,
}

impl MemoryPromotions {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PromotionRegistry for MemoryPromotions {
    async fn by_code(&self, code: &str) -> Result<Option<Promotion>, CommerceError> {
        Ok(self
            .promotions
            .read()
            .await
            .get(&code.to_uppercase())
            .cloned())
    }

    async fn upsert(&self, promotion: Promotion) -> Result<(), CommerceError> {
        self.promotions
            .write()
            .await
            .insert(promotion.code.to_uppercase(), promotion);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shop_commerce::{Currency, Money};

    #[tokio::test]
    async fn lookup_is_case_insensitive() {
        let registry = MemoryPromotions::new();
        let promo =
            Promotion::percentage("Save10", 10.0, Money::zero(Currency::USD), 0, i64::MAX);
        registry.upsert(promo).await.unwrap();

        assert!(registry.by_code("save10").await.unwrap().is_some());
        assert!(registry.by_code("SAVE10").await.unwrap().is_some());
        assert!(registry.by_code("OTHER").await.unwrap().is_none());
    }
}
