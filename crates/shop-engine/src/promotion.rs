//! Promotion evaluator.

use shop_commerce::{CommerceError, Money, PromotionId};
use shop_store::PromotionRegistry;
use std::sync::Arc;

/// Validates a promotion code against a subtotal and computes the discount.
///
/// Failure modes are typed and checked in a fixed order so callers can tell
/// a bad code from an expired one from a too-small basket:
/// not-found, inactive, out-of-window, below-minimum.
pub struct PromotionEvaluator {
    registry: Arc<dyn PromotionRegistry>,
}

impl PromotionEvaluator {
    pub fn new(registry: Arc<dyn PromotionRegistry>) -> Self {
        Self { registry }
    }

    /// Evaluate `code` against `subtotal` at time `now`, returning the
    /// promotion id and the computed discount amount.
    pub async fn evaluate(
        &self,
        code: &str,
        subtotal: Money,
        now: i64,
    ) -> Result<(PromotionId, Money), CommerceError> {
        let promotion = self
            .registry
            .by_code(code)
            .await?
            .ok_or_else(|| CommerceError::PromotionNotFound(code.to_string()))?;

        if !promotion.is_active {
            return Err(CommerceError::PromotionInactive(promotion.code));
        }
        if !promotion.in_window(now) {
            return Err(CommerceError::PromotionOutOfWindow(promotion.code));
        }
        if promotion.minimum_purchase.currency != subtotal.currency {
            return Err(CommerceError::CurrencyMismatch {
                expected: subtotal.currency,
                got: promotion.minimum_purchase.currency,
            });
        }
        if subtotal.amount_cents < promotion.minimum_purchase.amount_cents {
            return Err(CommerceError::PromotionBelowMinimum {
                code: promotion.code,
                minimum: promotion.minimum_purchase,
                subtotal,
            });
        }

        let discount = promotion.value.discount_for(subtotal);
        Ok((promotion.id, discount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shop_commerce::{Currency, Promotion};
    use shop_store::MemoryPromotions;

    async fn evaluator_with(promotion: Promotion) -> PromotionEvaluator {
        let registry = MemoryPromotions::new();
        registry.upsert(promotion).await.unwrap();
        PromotionEvaluator::new(Arc::new(registry))
    }

    fn usd(cents: i64) -> Money {
        Money::new(cents, Currency::USD)
    }

    #[tokio::test]
    async fn unknown_code_is_not_found() {
        let evaluator = PromotionEvaluator::new(Arc::new(MemoryPromotions::new()));
        let err = evaluator.evaluate("NOPE", usd(1000), 0).await.unwrap_err();
        assert!(matches!(err, CommerceError::PromotionNotFound(_)));
    }

    #[tokio::test]
    async fn inactive_beats_window_and_minimum() {
        let mut promo = Promotion::percentage("TEN", 10.0, usd(100_000), 1000, 2000);
        promo.is_active = false;
        let evaluator = evaluator_with(promo).await;
        // Out of window and below minimum too, but inactive is reported.
        let err = evaluator.evaluate("TEN", usd(10), 0).await.unwrap_err();
        assert!(matches!(err, CommerceError::PromotionInactive(_)));
    }

    #[tokio::test]
    async fn window_is_enforced() {
        let promo = Promotion::percentage("TEN", 10.0, usd(0), 1000, 2000);
        let evaluator = evaluator_with(promo).await;
        let err = evaluator.evaluate("TEN", usd(1000), 999).await.unwrap_err();
        assert!(matches!(err, CommerceError::PromotionOutOfWindow(_)));
        let err = evaluator.evaluate("TEN", usd(1000), 2001).await.unwrap_err();
        assert!(matches!(err, CommerceError::PromotionOutOfWindow(_)));
    }

    #[tokio::test]
    async fn minimum_purchase_is_enforced() {
        let promo = Promotion::percentage("TEN", 10.0, usd(2000), 0, i64::MAX);
        let evaluator = evaluator_with(promo).await;
        let err = evaluator.evaluate("TEN", usd(1999), 100).await.unwrap_err();
        assert!(matches!(err, CommerceError::PromotionBelowMinimum { .. }));
    }

    #[tokio::test]
    async fn percentage_discount_is_computed() {
        let promo = Promotion::percentage("TEN", 10.0, usd(2000), 0, i64::MAX);
        let evaluator = evaluator_with(promo).await;
        let (_, discount) = evaluator.evaluate("TEN", usd(3000), 100).await.unwrap();
        assert_eq!(discount, usd(300));
    }

    #[tokio::test]
    async fn fixed_discount_never_exceeds_subtotal() {
        let promo = Promotion::fixed("FIVER", usd(5000), usd(0), 0, i64::MAX);
        let evaluator = evaluator_with(promo).await;
        let (_, discount) = evaluator.evaluate("FIVER", usd(3000), 100).await.unwrap();
        assert_eq!(discount, usd(3000));
    }
}
