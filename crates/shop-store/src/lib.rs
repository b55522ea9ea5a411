//! Collaborator store seams for shopfloor.
//!
//! The retail core does not own its persistence: the product catalog,
//! customer ledger, promotion registry and the cart/order repositories are
//! external collaborators reached through the async traits in this crate.
//! Each trait ships with an in-memory reference backend suitable for tests
//! and single-process deployments.
//!
//! Atomicity contract: every trait method is atomic on its own; in
//! particular [`ProductCatalog::deduct_stock`] checks and decrements under
//! one critical section. Sequences of calls are *not* atomic; the engine
//! layers its own locking and compensation on top.

pub mod carts;
pub mod catalog;
pub mod customers;
pub mod orders;
pub mod promotions;

pub use carts::{CartRepository, MemoryCarts};
pub use catalog::{MemoryCatalog, ProductCatalog};
pub use customers::{CustomerLedger, MemoryLedger};
pub use orders::{MemoryOrders, OrderRepository};
pub use promotions::{MemoryPromotions, PromotionRegistry};
