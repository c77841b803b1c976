//! Sales domain module (customer orders).
//!
//! This crate contains business rules for customer orders, implemented purely
//! as deterministic domain logic (no IO, no HTTP, no storage). The shipment
//! state machine lives on the aggregate; reconciling product stock against it
//! is the fulfillment engine's job.

pub mod order;

pub use order::{CustomerId, CustomerOrder, CustomerOrderId, CustomerOrderLine};
