use serde::{Deserialize, Serialize};

use orderflow_core::{AggregateId, AggregateRoot, DomainError, DomainResult};

/// Product identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub AggregateId);

impl ProductId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Aggregate root: Product.
///
/// `stock` is optional: `None` means the stock level is not tracked for this
/// product and it is never reordered. `batch_size` is the number of saleable
/// units one ordered batch delivers on the supplier side; customer order
/// lines are denominated in units, supplier order lines in batches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    sku: String,
    name: String,
    stock: Option<i64>,
    batch_size: i64,
    min_stock: i64,
    /// Prices in smallest currency unit (e.g., cents). Order lines snapshot
    /// these at line creation time.
    sell_price: u64,
    buy_price: u64,
    version: u64,
}

impl Product {
    pub fn new(
        id: ProductId,
        sku: impl Into<String>,
        name: impl Into<String>,
        batch_size: i64,
    ) -> DomainResult<Self> {
        let sku = sku.into();
        let name = name.into();

        if sku.trim().is_empty() {
            return Err(DomainError::validation("SKU cannot be empty"));
        }
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if batch_size < 2 {
            return Err(DomainError::validation("batch_size must be at least 2"));
        }

        Ok(Self {
            id,
            sku,
            name,
            stock: None,
            batch_size,
            min_stock: 0,
            sell_price: 0,
            buy_price: 0,
            version: 0,
        })
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn sku(&self) -> &str {
        &self.sku
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current tracked stock level, or `None` when stock is not tracked.
    pub fn stock(&self) -> Option<i64> {
        self.stock
    }

    pub fn batch_size(&self) -> i64 {
        self.batch_size
    }

    pub fn min_stock(&self) -> i64 {
        self.min_stock
    }

    pub fn sell_price(&self) -> u64 {
        self.sell_price
    }

    pub fn buy_price(&self) -> u64 {
        self.buy_price
    }

    /// Write a new tracked stock level. Negative levels are rejected at
    /// write time regardless of how the caller computed them.
    pub fn set_stock(&mut self, stock: i64) -> DomainResult<()> {
        if stock < 0 {
            return Err(DomainError::stock_violation(
                self.id.0,
                format!("stock cannot go negative (attempted {stock})"),
            ));
        }
        self.stock = Some(stock);
        self.version += 1;
        Ok(())
    }

    /// Stop tracking stock for this product ("do not reorder").
    pub fn clear_stock(&mut self) {
        self.stock = None;
        self.version += 1;
    }

    pub fn set_min_stock(&mut self, min_stock: i64) -> DomainResult<()> {
        if min_stock < 0 {
            return Err(DomainError::validation("min_stock cannot be negative"));
        }
        self.min_stock = min_stock;
        self.version += 1;
        Ok(())
    }

    pub fn set_prices(&mut self, sell_price: u64, buy_price: u64) {
        self.sell_price = sell_price;
        self.buy_price = buy_price;
        self.version += 1;
    }

    /// Whether the product has fallen below its reorder threshold.
    ///
    /// Untracked products never need reordering.
    pub fn needs_reorder(&self) -> bool {
        matches!(self.stock, Some(level) if level < self.min_stock)
    }
}

impl AggregateRoot for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}
