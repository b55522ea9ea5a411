//! Customer ledger seam and in-memory backend.

use async_trait::async_trait;
use shop_commerce::{CommerceError, Customer, CustomerId, Money};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// The customer ledger collaborator. The core reads membership data and
/// pushes total-spent increments; everything else about customers is owned
/// elsewhere.
#[async_trait]
pub trait CustomerLedger: Send + Sync {
    async fn customer(&self, id: &CustomerId) -> Result<Option<Customer>, CommerceError>;

    async fn upsert(&self, customer: Customer) -> Result<(), CommerceError>;

    /// Atomically add a completed purchase to the customer's lifetime spend.
    async fn record_spend(&self, id: &CustomerId, amount: Money)
        -> Result<Customer, CommerceError>;
}

/// In-memory ledger backend.
#[derive(Default)]
pub struct MemoryLedger {
    customers: RwLock<HashMap<CustomerId, Customer>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CustomerLedger for MemoryLedger {
    async fn customer(&self, id: &CustomerId) -> Result<Option<Customer>, CommerceError> {
        Ok(self.customers.read().await.get(id).cloned())
    }

    async fn upsert(&self, customer: Customer) -> Result<(), CommerceError> {
        self.customers
            .write()
            .await
            .insert(customer.id.clone(), customer);
        Ok(())
    }

    async fn record_spend(
        &self,
        id: &CustomerId,
        amount: Money,
    ) -> Result<Customer, CommerceError> {
        let mut customers = self.customers.write().await;
        let customer = customers
            .get_mut(id)
            .ok_or_else(|| CommerceError::CustomerNotFound(id.to_string()))?;
        customer.record_spend(amount)?;
        Ok(customer.clone())
    }
}
