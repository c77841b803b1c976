//! Shared state-gated batch stock adjustment.
//!
//! Both fulfillment engines run the same sequence and differ only in the
//! strategy they plug in: which gate validates and flips the order's flag,
//! which lines participate, and what signed delta one line contributes
//! (units on the customer side, `quantity * batch_size` on the supplier
//! side). Centralizing the sequence keeps the invariant in one place: no
//! stock write is ever issued before the whole batch has validated.

use thiserror::Error;

use orderflow_core::{DomainError, DomainResult};
use orderflow_inventory::StockLedger;
use orderflow_products::{Product, ProductId};

use crate::store::{ProductStore, StoreError};

/// Error returned by the fulfillment operations.
///
/// Domain failures are expected, recoverable outcomes; store failures are
/// fatal to the operation. The two never collapse into each other.
#[derive(Debug, Error)]
pub enum FulfillmentError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("storage failure: {0}")]
    Store(#[from] StoreError),
}

/// Result type of the fulfillment operations.
pub type FulfillmentResult<T> = Result<T, FulfillmentError>;

/// Run the gate, then stage one stock delta per line.
///
/// `gate` validates preconditions and flips the state flag on the in-memory
/// `order` copy; `lines` extracts the `(product, quantity)` pairs to
/// reconcile; `delta` turns one line's quantity into a signed stock delta
/// given its product. Any failure leaves every product untouched: the
/// ledger is discarded along with the mutated copy, which has not been
/// persisted yet.
pub(crate) fn stage_transition<O, P>(
    products: &P,
    order: &mut O,
    gate: impl FnOnce(&mut O) -> DomainResult<()>,
    lines: impl FnOnce(&O) -> Vec<(ProductId, i64)>,
    delta: impl Fn(i64, &Product) -> i64,
) -> FulfillmentResult<StockLedger>
where
    P: ProductStore,
{
    gate(order)?;

    let mut ledger = StockLedger::new();
    for (product_id, quantity) in lines(order) {
        let product = products
            .load_product(product_id)?
            .ok_or(StoreError::MissingProduct(product_id.0))?;
        ledger.adjust(&product, delta(quantity, &product))?;
    }
    Ok(ledger)
}

/// Persist a validated batch of staged stock writes.
pub(crate) fn persist_stock<P>(products: &P, staged: Vec<Product>) -> Result<(), StoreError>
where
    P: ProductStore,
{
    for product in &staged {
        products.save_product(product)?;
    }
    Ok(())
}
