use serde::{Deserialize, Serialize};

use orderflow_core::{DomainError, DomainResult, ValueObject};
use orderflow_products::{Product, ProductId};

/// A computed stock movement for one product line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjustment {
    pub product_id: ProductId,
    pub delta: i64,
    /// Stock level the product will hold once the batch is persisted.
    pub new_stock: i64,
}

impl ValueObject for StockAdjustment {}

/// Staged batch of stock writes for one fulfillment operation.
///
/// `adjust` applies `new_stock = current + delta` against an in-memory copy
/// of the product and rejects any adjustment that would drive stock
/// negative. Nothing it stages becomes visible to other operations until
/// the caller persists `into_staged()`. Repeated adjustments to the same
/// product compose against the staged copy, so the batch as a whole is
/// validated, not each line against the original record.
///
/// Products whose stock level is not tracked (`stock == None`) do not
/// participate in reconciliation: no write is staged and they can never fail
/// an adjustment.
#[derive(Debug, Default)]
pub struct StockLedger {
    staged: Vec<Product>,
    adjustments: Vec<StockAdjustment>,
}

impl StockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage `delta` (may be negative) against `product`'s stock.
    ///
    /// Fails with `ProductStock` naming the product if the resulting level
    /// would be negative; the ledger is left exactly as it was, so a caller
    /// aborting mid-batch discards every staged write at once.
    pub fn adjust(&mut self, product: &Product, delta: i64) -> DomainResult<()> {
        let idx = self
            .staged
            .iter()
            .position(|p| p.id_typed() == product.id_typed());

        let current = match idx {
            Some(i) => self.staged[i].stock(),
            None => product.stock(),
        };
        let Some(current) = current else {
            return Ok(());
        };

        let new_stock = current + delta;
        if new_stock < 0 {
            return Err(DomainError::stock_violation(
                product.id_typed().0,
                format!("insufficient stock: {current} on hand, adjustment {delta}"),
            ));
        }

        let idx = match idx {
            Some(i) => i,
            None => {
                self.staged.push(product.clone());
                self.staged.len() - 1
            }
        };
        self.staged[idx].set_stock(new_stock)?;

        self.adjustments.push(StockAdjustment {
            product_id: product.id_typed(),
            delta,
            new_stock,
        });
        Ok(())
    }

    /// The movements staged so far, in staging order.
    pub fn adjustments(&self) -> &[StockAdjustment] {
        &self.adjustments
    }

    /// The product copies carrying the staged stock levels.
    pub fn staged(&self) -> &[Product] {
        &self.staged
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Consume the ledger, yielding the products to persist.
    pub fn into_staged(self) -> Vec<Product> {
        self.staged
    }
}
