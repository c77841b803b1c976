//! Persistence boundary consumed by the fulfillment engines.

use thiserror::Error;

use orderflow_core::{AggregateId, ExpectedVersion};
use orderflow_products::{Product, ProductId};
use orderflow_purchasing::{SupplierOrder, SupplierOrderId};
use orderflow_sales::{CustomerOrder, CustomerOrderId};

/// Storage-level failure.
///
/// None of these are domain outcomes: they abort the operation and the
/// surrounding storage transaction, leaving all state unchanged. A backend
/// outage is never reported as one of the `DomainError` kinds.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The aggregate changed between load and save (stale version).
    /// Concurrent operations on one order id serialize through this check.
    #[error("concurrent modification: {0}")]
    Conflict(String),

    /// An order line references a product the store does not have.
    #[error("order line references unknown product {0}")]
    MissingProduct(AggregateId),

    /// Opaque backend failure.
    #[error("storage backend: {0}")]
    Backend(#[from] anyhow::Error),
}

/// Order persistence.
///
/// Loads return the current committed record, `None` when no such order
/// exists. Saves carry the version the caller observed at load; a stale
/// expectation fails with [`StoreError::Conflict`] instead of overwriting.
///
/// Every save issued by one fulfillment operation is assumed to participate
/// in the same storage transaction and to be durable once the operation
/// returns; implementations backed by a real database supply that isolation,
/// the in-memory arena documents where it does not.
pub trait OrderStore {
    fn load_customer_order(
        &self,
        id: CustomerOrderId,
    ) -> Result<Option<CustomerOrder>, StoreError>;

    fn save_customer_order(
        &self,
        order: &CustomerOrder,
        expected: ExpectedVersion,
    ) -> Result<(), StoreError>;

    fn load_supplier_order(
        &self,
        id: SupplierOrderId,
    ) -> Result<Option<SupplierOrder>, StoreError>;

    fn save_supplier_order(
        &self,
        order: &SupplierOrder,
        expected: ExpectedVersion,
    ) -> Result<(), StoreError>;
}

/// Product persistence.
///
/// Product saves are unconditional: only the fulfillment engine mutates the
/// stock field, and the order-level version gate already serializes the
/// operation that staged them.
pub trait ProductStore {
    fn load_product(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    fn save_product(&self, product: &Product) -> Result<(), StoreError>;
}
