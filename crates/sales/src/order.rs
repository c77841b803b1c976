use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use orderflow_core::{AggregateId, AggregateRoot, DomainError, DomainResult, Entity};
use orderflow_products::ProductId;

/// Customer order identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerOrderId(pub AggregateId);

impl CustomerOrderId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for CustomerOrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Counterparty identifier for the customer side.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(pub AggregateId);

impl CustomerId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Order line: product, quantity in saleable units, sell price snapshot.
///
/// A line is identified by its product id within the owning order (composite
/// key with the order); the same product never appears on two lines. The
/// price is fixed when the line is created and is not re-read from the
/// product at fulfillment time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerOrderLine {
    pub product_id: ProductId,
    pub quantity: i64,
    /// Sell price in smallest currency unit (e.g., cents).
    pub unit_sell_price: u64,
}

impl Entity for CustomerOrderLine {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.product_id
    }
}

/// Aggregate root: CustomerOrder.
///
/// The shipment state machine is a single flag: `UNSENT -> SENT` (ship) and
/// `SENT -> UNSENT` (cancel-ship) are the only legal transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerOrder {
    id: CustomerOrderId,
    customer_id: CustomerId,
    order_date: DateTime<Utc>,
    delivery_date: Option<DateTime<Utc>>,
    is_sent: bool,
    lines: Vec<CustomerOrderLine>,
    version: u64,
}

impl CustomerOrder {
    pub fn new(id: CustomerOrderId, customer_id: CustomerId, order_date: DateTime<Utc>) -> Self {
        Self {
            id,
            customer_id,
            order_date,
            delivery_date: None,
            is_sent: false,
            lines: Vec::new(),
            version: 0,
        }
    }

    pub fn id_typed(&self) -> CustomerOrderId {
        self.id
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn order_date(&self) -> DateTime<Utc> {
        self.order_date
    }

    pub fn delivery_date(&self) -> Option<DateTime<Utc>> {
        self.delivery_date
    }

    pub fn is_sent(&self) -> bool {
        self.is_sent
    }

    pub fn lines(&self) -> &[CustomerOrderLine] {
        &self.lines
    }

    pub fn set_delivery_date(&mut self, delivery_date: DateTime<Utc>) {
        self.delivery_date = Some(delivery_date);
        self.version += 1;
    }

    /// Add a line for `product_id`, snapshotting the given sell price.
    ///
    /// Lines are frozen once the order is sent; cancel-ship could not restore
    /// stock exactly otherwise.
    pub fn add_line(
        &mut self,
        product_id: ProductId,
        quantity: i64,
        unit_sell_price: u64,
    ) -> DomainResult<()> {
        if self.is_sent {
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

        self.lines.push(CustomerOrderLine {
            product_id,
            quantity,
            unit_sell_price,
        });
        self.version += 1;
        Ok(())
    }

    /// Gate + flag flip for shipping: fails if the order is already sent or
    /// has no lines; flips `is_sent` on success.
    ///
    /// Callers flip the flag on an in-memory copy and persist only once every
    /// line's stock decrement has been validated.
    pub fn mark_sent(&mut self) -> DomainResult<()> {
        if self.is_sent {
            return Err(DomainError::order_state(self.id.0, "order is already sent"));
        }
        if self.lines.is_empty() {
            return Err(DomainError::empty_order(self.id.0));
        }
        self.is_sent = true;
        self.version += 1;
        Ok(())
    }

    /// Gate + flag flip for cancel-ship: fails unless the order is currently
    /// sent.
    pub fn mark_not_sent(&mut self) -> DomainResult<()> {
        if !self.is_sent {
            return Err(DomainError::order_state(self.id.0, "order is not sent"));
        }
        self.is_sent = false;
        self.version += 1;
        Ok(())
    }
}

impl AggregateRoot for CustomerOrder {
    type Id = CustomerOrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}
