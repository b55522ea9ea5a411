//! Money type for representing monetary values.
//!
//! Amounts are stored in the smallest unit of the currency (cents for most
//! currencies) to keep monetary arithmetic exact.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Currency {
    #[default]
    USD,
    EUR,
    GBP,
    MXN,
}

impl Currency {
    /// The ISO 4217 currency code.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::MXN => "MXN",
        }
    }

    /// Parse a currency code string.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_uppercase().as_str() {
            "USD" => Some(Currency::USD),
            "EUR" => Some(Currency::EUR),
            "GBP" => Some(Currency::GBP),
            "MXN" => Some(Currency::MXN),
            _ => None,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A monetary value with currency, stored in cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Money {
    /// Amount in the smallest currency unit.
    pub amount_cents: i64,
    /// The currency.
    pub currency: Currency,
}

impl Money {
    /// Create a new value from cents.
    pub fn new(amount_cents: i64, currency: Currency) -> Self {
        Self {
            amount_cents,
            currency,
        }
    }

    /// A zero amount in the given currency.
    pub fn zero(currency: Currency) -> Self {
        Self::new(0, currency)
    }

    pub fn is_zero(&self) -> bool {
        self.amount_cents == 0
    }

    pub fn is_positive(&self) -> bool {
        self.amount_cents > 0
    }

    /// Add another value, failing on currency mismatch or overflow.
    pub fn try_add(&self, other: &Money) -> Option<Money> {
        if self.currency != other.currency {
            return None;
        }
        let total = self.amount_cents.checked_add(other.amount_cents)?;
        Some(Money::new(total, self.currency))
    }

    /// Multiply by a quantity, failing on overflow.
    pub fn try_mul(&self, factor: i64) -> Option<Money> {
        let total = self.amount_cents.checked_mul(factor)?;
        Some(Money::new(total, self.currency))
    }

    /// Subtract another value, flooring at zero.
    ///
    /// Cart and order totals are never negative; an oversized discount
    /// yields a zero total rather than a credit. Returns `None` on
    /// currency mismatch.
    pub fn try_sub_to_zero(&self, other: &Money) -> Option<Money> {
        if self.currency != other.currency {
            return None;
        }
        let remaining = self.amount_cents.saturating_sub(other.amount_cents).max(0);
        Some(Money::new(remaining, self.currency))
    }

    /// A percentage of this amount, rounded to the nearest cent.
    pub fn percentage(&self, percent: f64) -> Money {
        let amount = (self.amount_cents as f64 * percent / 100.0).round() as i64;
        Money::new(amount, self.currency)
    }

    /// The smaller of two same-currency amounts.
    pub fn min(&self, other: &Money) -> Money {
        if other.amount_cents < self.amount_cents {
            *other
        } else {
            *self
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:02} {}",
            self.amount_cents / 100,
            (self.amount_cents % 100).abs(),
            self.currency
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adds_same_currency() {
        let a = Money::new(1000, Currency::USD);
        let b = Money::new(500, Currency::USD);
        assert_eq!(a.try_add(&b), Some(Money::new(1500, Currency::USD)));
    }

    #[test]
    fn rejects_mixed_currency() {
        let usd = Money::new(1000, Currency::USD);
        let eur = Money::new(1000, Currency::EUR);
        assert_eq!(usd.try_add(&eur), None);
        assert_eq!(usd.try_sub_to_zero(&eur), None);
    }

    #[test]
    fn multiply_detects_overflow() {
        let m = Money::new(i64::MAX / 2, Currency::USD);
        assert_eq!(m.try_mul(3), None);
        assert_eq!(m.try_mul(1), Some(m));
    }

    #[test]
    fn subtraction_floors_at_zero() {
        let subtotal = Money::new(3000, Currency::USD);
        let discount = Money::new(5000, Currency::USD);
        let total = subtotal.try_sub_to_zero(&discount).unwrap();
        assert!(total.is_zero());
    }

    #[test]
    fn percentage_rounds_to_nearest_cent() {
        let m = Money::new(3000, Currency::USD);
        assert_eq!(m.percentage(10.0).amount_cents, 300);
        // 10% of $0.05 is half a cent, rounds up
        assert_eq!(Money::new(5, Currency::USD).percentage(10.0).amount_cents, 1);
    }

    #[test]
    fn display_formats_cents() {
        let m = Money::new(4999, Currency::USD);
        assert_eq!(m.to_string(), "49.99 USD");
    }

    #[test]
    fn currency_from_code() {
        assert_eq!(Currency::from_code("usd"), Some(Currency::USD));
        assert_eq!(Currency::from_code("XXX"), None);
    }
}
