use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use orderflow_core::{AggregateId, AggregateRoot, DomainError, DomainResult, Entity};
use orderflow_products::ProductId;

/// Supplier order identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SupplierOrderId(pub AggregateId);

impl SupplierOrderId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for SupplierOrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Counterparty identifier for the supplier side.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SupplierId(pub AggregateId);

impl SupplierId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for SupplierId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Order line: product, quantity in **batches**, buy price snapshot.
///
/// Identified by its product id within the owning order (composite key with
/// the order). Reception converts batches to saleable units via the
/// product's batch size; the line itself never carries unit quantities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierOrderLine {
    pub product_id: ProductId,
    pub quantity: i64,
    /// Buy price in smallest currency unit (e.g., cents).
    pub unit_buy_price: u64,
}

impl Entity for SupplierOrderLine {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.product_id
    }
}

/// Aggregate root: SupplierOrder.
///
/// Two independent flags drive the state machine: `order_is_sent` flips
/// false→true exactly once; `is_received` toggles via receive/cancel-receive
/// while the order stays sent:
///
/// ```text
/// {unsent, not-received} --send--> {sent, not-received}
///   --receive--> {sent, received} --cancel-receive--> {sent, not-received}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierOrder {
    id: SupplierOrderId,
    supplier_id: SupplierId,
    order_date: DateTime<Utc>,
    delivery_date: Option<DateTime<Utc>>,
    order_is_sent: bool,
    is_received: bool,
    lines: Vec<SupplierOrderLine>,
    version: u64,
}

impl SupplierOrder {
    pub fn new(id: SupplierOrderId, supplier_id: SupplierId, order_date: DateTime<Utc>) -> Self {
        Self {
            id,
            supplier_id,
            order_date,
            delivery_date: None,
            order_is_sent: false,
            is_received: false,
            lines: Vec::new(),
            version: 0,
        }
    }

    pub fn id_typed(&self) -> SupplierOrderId {
        self.id
    }

    pub fn supplier_id(&self) -> SupplierId {
        self.supplier_id
    }

    pub fn order_date(&self) -> DateTime<Utc> {
        self.order_date
    }

    pub fn delivery_date(&self) -> Option<DateTime<Utc>> {
        self.delivery_date
    }

    pub fn is_sent(&self) -> bool {
        self.order_is_sent
    }

    pub fn is_received(&self) -> bool {
        self.is_received
    }

    pub fn lines(&self) -> &[SupplierOrderLine] {
        &self.lines
    }

    pub fn set_delivery_date(&mut self, delivery_date: DateTime<Utc>) {
        self.delivery_date = Some(delivery_date);
        self.version += 1;
    }

    /// Add a line of `quantity` batches for `product_id`, snapshotting the
    /// given buy price. Lines are frozen once the order is sent.
    pub fn add_line(
        &mut self,
        product_id: ProductId,
        quantity: i64,
        unit_buy_price: u64,
    ) -> DomainResult<()> {
        if self.order_is_sent {
            return Err(DomainError::order_state(
                self.id.0,
                "cannot modify lines of a sent order",
            ));
        }
        if quantity <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if self.lines.iter().any(|l| l.product_id == product_id) {
            return Err(DomainError::validation(format!(
                "order already has a line for product {product_id}"
            )));
        }

        self.lines.push(SupplierOrderLine {
            product_id,
            quantity,
            unit_buy_price,
        });
        self.version += 1;
        Ok(())
    }

    /// Gate + flag flip for sending: fails if already sent or the order has
    /// no lines. Sending never mutates stock and cannot be undone.
    pub fn mark_sent(&mut self) -> DomainResult<()> {
        if self.order_is_sent {
            return Err(DomainError::order_state(self.id.0, "order is already sent"));
        }
        if self.lines.is_empty() {
            return Err(DomainError::order_state(self.id.0, "order has no order lines"));
        }
        self.order_is_sent = true;
        self.version += 1;
        Ok(())
    }

    /// Gate + flag flip for reception: requires sent-and-not-received with at
    /// least one line.
    ///
    /// An empty order fails as a stock-processing precondition rather than an
    /// illegal state, since reception exists to book stock in.
    pub fn mark_received(&mut self) -> DomainResult<()> {
        if self.is_received {
            return Err(DomainError::order_state(
                self.id.0,
                "order is already received",
            ));
        }
        if !self.order_is_sent {
            return Err(DomainError::order_state(self.id.0, "order is not sent"));
        }
        if self.lines.is_empty() {
            return Err(DomainError::stock_precondition(
                "order must have at least one order line to be received",
            ));
        }
        self.is_received = true;
        self.version += 1;
        Ok(())
    }

    /// Gate + flag flip for cancel-receive: fails unless currently received.
    pub fn mark_not_received(&mut self) -> DomainResult<()> {
        if !self.is_received {
            return Err(DomainError::order_state(self.id.0, "order is not received"));
        }
        self.is_received = false;
        self.version += 1;
        Ok(())
    }
}

impl AggregateRoot for SupplierOrder {
    type Id = SupplierOrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}
