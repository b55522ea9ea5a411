//! Customer ledger record.

use crate::clock::unix_now;
use crate::error::CommerceError;
use crate::ids::CustomerId;
use crate::money::{Currency, Money};
use serde::{Deserialize, Serialize};

/// A customer as seen by the retail core.
///
/// Checkout increments `total_spent`; nothing else here is mutated by the
/// core. `points_balance` is carried for the membership program but accrual
/// is owned by the customer collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    /// Lifetime spend. Monotonically non-decreasing outside manual
    /// corrections.
    pub total_spent: Money,
    pub points_balance: i64,
    pub created_at: i64,
}

impl Customer {
    pub fn new(name: impl Into<String>, currency: Currency) -> Self {
        Self {
            id: CustomerId::generate(),
            name: name.into(),
            total_spent: Money::zero(currency),
            points_balance: 0,
            created_at: unix_now(),
        }
    }

    /// Add a completed purchase to the lifetime spend.
    pub fn record_spend(&mut self, amount: Money) -> Result<(), CommerceError> {
        if amount.currency != self.total_spent.currency {
            return Err(CommerceError::CurrencyMismatch {
                expected: self.total_spent.currency,
                got: amount.currency,
            });
        }
        self.total_spent = self
            .total_spent
            .try_add(&amount)
            .ok_or(CommerceError::Overflow)?;
        Ok(())
    }
}
