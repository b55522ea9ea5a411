//! Newtype IDs for type-safe identifiers.
//!
//! Newtypes keep the different record identifiers from being mixed up,
//! e.g. passing a `CartId` where an `OrderId` is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing identifier.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Generate a fresh unique identifier.
            pub fn generate() -> Self {
                Self(format!(concat!($prefix, "-{}"), next_token()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(
    /// Identifies a product in the catalog.
    ProductId, "prd");
define_id!(
    /// Identifies a customer.
    CustomerId, "cus");
define_id!(
    /// Identifies a cart.
    CartId, "crt");
define_id!(
    /// Identifies a line item within a cart.
    CartItemId, "itm");
define_id!(
    /// Identifies a promotion.
    PromotionId, "pro");
define_id!(
    /// Identifies an order.
    OrderId, "ord");
define_id!(
    /// Identifies a line item within an order.
    OrderItemId, "oit");

/// Timestamp-plus-counter token; the counter disambiguates same-instant
/// generations within a process.
fn next_token() -> String {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);

    format!("{:x}{:04x}", nanos, seq & 0xffff)
}
