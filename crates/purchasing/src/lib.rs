//! Purchasing domain module (supplier orders).
//!
//! This crate contains business rules for supplier orders, implemented purely
//! as deterministic domain logic (no IO, no HTTP, no storage). Supplier order
//! lines are denominated in batches, not saleable units; the unit conversion
//! happens in the fulfillment engine via the product's batch size.

pub mod order;

pub use order::{SupplierId, SupplierOrder, SupplierOrderId, SupplierOrderLine};
