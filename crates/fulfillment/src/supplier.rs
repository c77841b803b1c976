use tracing::{debug, info};

use orderflow_core::{AggregateRoot, DomainError, ExpectedVersion};
use orderflow_purchasing::{SupplierOrder, SupplierOrderId};

use crate::engine::{self, FulfillmentResult};
use crate::store::{OrderStore, ProductStore};

/// Supplier order fulfillment engine.
///
/// Sends, receives and un-receives supplier orders. Supplier order lines are
/// denominated in batches; reception converts a line's quantity into a unit
/// stock delta via the product's batch size. This unit difference is the
/// reason the customer and supplier engines stay separate strategies over
/// the shared adjustment sequence.
#[derive(Debug)]
pub struct SupplierFulfillment<O, P> {
    orders: O,
    products: P,
}

impl<O, P> SupplierFulfillment<O, P> {
    pub fn new(orders: O, products: P) -> Self {
        Self { orders, products }
    }

    pub fn into_parts(self) -> (O, P) {
        (self.orders, self.products)
    }
}

impl<O, P> SupplierFulfillment<O, P>
where
    O: OrderStore,
    P: ProductStore,
{
    /// Send a supplier order to its supplier. Flips `order_is_sent`; never
    /// mutates stock and cannot be undone.
    ///
    /// Fails with `UnknownOrder` for a missing id and `OrderState` when
    /// already sent or without lines.
    pub fn send(&self, order_id: SupplierOrderId) -> FulfillmentResult<SupplierOrder> {
        let mut order = self.load(order_id)?;
        let expected = ExpectedVersion::Exact(order.version());

        order.mark_sent()?;
        self.orders.save_supplier_order(&order, expected)?;

        info!(%order_id, lines = order.lines().len(), "supplier order sent");
        Ok(order)
    }

    /// Receive a sent supplier order: increment every line's product stock
    /// by `quantity * batch_size` and mark the order received, as one unit.
    ///
    /// Fails with `UnknownOrder` for a missing id, `OrderState` when already
    /// received or not yet sent, and `ProductStock` when the order has no
    /// lines. Increments cannot drive stock negative.
    pub fn receive(&self, order_id: SupplierOrderId) -> FulfillmentResult<SupplierOrder> {
        let mut order = self.load(order_id)?;
        let expected = ExpectedVersion::Exact(order.version());

        let ledger = engine::stage_transition(
            &self.products,
            &mut order,
            SupplierOrder::mark_received,
            |o| o.lines().iter().map(|l| (l.product_id, l.quantity)).collect(),
            |quantity, product| quantity * product.batch_size(),
        )?;

        for movement in ledger.adjustments() {
            debug!(
                product_id = %movement.product_id,
                delta = movement.delta,
                new_stock = movement.new_stock,
                "staged stock write"
            );
        }
        let adjusted = ledger.adjustments().len();

        self.orders.save_supplier_order(&order, expected)?;
        engine::persist_stock(&self.products, ledger.into_staged())?;

        info!(%order_id, adjusted, "supplier order received");
        Ok(order)
    }

    /// Cancel a reception: decrement every line's product stock by
    /// `quantity * batch_size` and mark the order not received.
    ///
    /// If any decrement would drive a product's stock negative (stock sold
    /// in the meantime), the whole operation fails with `ProductStock`
    /// naming that product and no stock is written.
    pub fn cancel_receive(&self, order_id: SupplierOrderId) -> FulfillmentResult<SupplierOrder> {
        let mut order = self.load(order_id)?;
        let expected = ExpectedVersion::Exact(order.version());

        let ledger = engine::stage_transition(
            &self.products,
            &mut order,
            SupplierOrder::mark_not_received,
            |o| o.lines().iter().map(|l| (l.product_id, l.quantity)).collect(),
            |quantity, product| -(quantity * product.batch_size()),
        )?;

        let adjusted = ledger.adjustments().len();
        self.orders.save_supplier_order(&order, expected)?;
        engine::persist_stock(&self.products, ledger.into_staged())?;

        info!(%order_id, adjusted, "supplier order reception cancelled");
        Ok(order)
    }

    fn load(&self, order_id: SupplierOrderId) -> FulfillmentResult<SupplierOrder> {
        self.orders
            .load_supplier_order(order_id)?
            .ok_or_else(|| DomainError::unknown_order(order_id.0).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use orderflow_core::{AggregateId, DomainError};
    use orderflow_products::{Product, ProductId};
    use orderflow_purchasing::SupplierId;

    use crate::engine::FulfillmentError;
    use crate::memory::InMemoryStore;
    use crate::store::{OrderStore, ProductStore};

    fn seeded_product(store: &InMemoryStore, stock: i64, batch_size: i64) -> ProductId {
        let mut product = Product::new(
            ProductId::new(AggregateId::new()),
            "SKU-001",
            "Test Product",
            batch_size,
        )
        .unwrap();
        product.set_stock(stock).unwrap();
        let id = product.id_typed();
        store.insert_product(product).unwrap();
        id
    }

    fn seeded_order(store: &InMemoryStore, lines: &[(ProductId, i64)]) -> SupplierOrderId {
        let mut order = SupplierOrder::new(
            SupplierOrderId::new(AggregateId::new()),
            SupplierId::new(AggregateId::new()),
            Utc::now(),
        );
        for (product_id, quantity) in lines {
            order.add_line(*product_id, *quantity, 800).unwrap();
        }
        let id = order.id_typed();
        store.insert_supplier_order(order).unwrap();
        id
    }

    fn engine(store: &InMemoryStore) -> SupplierFulfillment<InMemoryStore, InMemoryStore> {
        SupplierFulfillment::new(store.clone(), store.clone())
    }

    fn stock_of(store: &InMemoryStore, id: ProductId) -> Option<i64> {
        store.load_product(id).unwrap().unwrap().stock()
    }

    #[test]
    fn send_flips_flag_without_stock_writes() {
        let store = InMemoryStore::new();
        let product_id = seeded_product(&store, 5, 10);
        let order_id = seeded_order(&store, &[(product_id, 2)]);

        let sent = engine(&store).send(order_id).unwrap();

        assert!(sent.is_sent());
        assert!(!sent.is_received());
        assert_eq!(stock_of(&store, product_id), Some(5));
    }

    #[test]
    fn send_empty_order_fails_with_order_state() {
        let store = InMemoryStore::new();
        let order_id = seeded_order(&store, &[]);

        let err = engine(&store).send(order_id).unwrap_err();
        match err {
            FulfillmentError::Domain(DomainError::OrderState { message, .. }) => {
                assert!(message.contains("no order lines"));
            }
            _ => panic!("Expected OrderState for sending an empty order"),
        }
    }

    #[test]
    fn send_twice_fails() {
        let store = InMemoryStore::new();
        let product_id = seeded_product(&store, 5, 10);
        let order_id = seeded_order(&store, &[(product_id, 2)]);
        let engine = engine(&store);

        engine.send(order_id).unwrap();
        let err = engine.send(order_id).unwrap_err();
        match err {
            FulfillmentError::Domain(DomainError::OrderState { message, .. }) => {
                assert!(message.contains("already sent"));
            }
            _ => panic!("Expected OrderState for double send"),
        }
    }

    #[test]
    fn receive_increments_by_quantity_times_batch_size() {
        let store = InMemoryStore::new();
        let product_id = seeded_product(&store, 5, 10);
        let order_id = seeded_order(&store, &[(product_id, 2)]);
        let engine = engine(&store);

        engine.send(order_id).unwrap();
        let received = engine.receive(order_id).unwrap();

        assert!(received.is_received());
        // 2 batches of 10 on top of 5 on hand.
        assert_eq!(stock_of(&store, product_id), Some(25));
    }

    #[test]
    fn receive_requires_sent_order() {
        let store = InMemoryStore::new();
        let product_id = seeded_product(&store, 5, 10);
        let order_id = seeded_order(&store, &[(product_id, 2)]);

        let err = engine(&store).receive(order_id).unwrap_err();
        match err {
            FulfillmentError::Domain(DomainError::OrderState { message, .. }) => {
                assert!(message.contains("not sent"));
            }
            _ => panic!("Expected OrderState for receiving an unsent order"),
        }
        assert_eq!(stock_of(&store, product_id), Some(5));
    }

    #[test]
    fn receive_twice_fails_without_touching_stock() {
        let store = InMemoryStore::new();
        let product_id = seeded_product(&store, 5, 10);
        let order_id = seeded_order(&store, &[(product_id, 2)]);
        let engine = engine(&store);

        engine.send(order_id).unwrap();
        engine.receive(order_id).unwrap();

        let err = engine.receive(order_id).unwrap_err();
        match err {
            FulfillmentError::Domain(DomainError::OrderState { message, .. }) => {
                assert!(message.contains("already received"));
            }
            _ => panic!("Expected OrderState for double receive"),
        }
        assert_eq!(stock_of(&store, product_id), Some(25));
    }

    #[test]
    fn cancel_receive_restores_stock_exactly() {
        let store = InMemoryStore::new();
        let a = seeded_product(&store, 5, 10);
        let b = seeded_product(&store, 0, 4);
        let order_id = seeded_order(&store, &[(a, 2), (b, 3)]);
        let engine = engine(&store);

        engine.send(order_id).unwrap();
        engine.receive(order_id).unwrap();
        assert_eq!(stock_of(&store, a), Some(25));
        assert_eq!(stock_of(&store, b), Some(12));

        let cancelled = engine.cancel_receive(order_id).unwrap();
        assert!(!cancelled.is_received());
        assert!(cancelled.is_sent());
        assert_eq!(stock_of(&store, a), Some(5));
        assert_eq!(stock_of(&store, b), Some(0));
    }

    #[test]
    fn cancel_receive_fails_when_stock_was_sold_in_the_meantime() {
        let store = InMemoryStore::new();
        // stock 5, one batch of 10: un-receiving would need 10 units back.
        let product_id = seeded_product(&store, 5, 10);
        let order_id = seeded_order(&store, &[(product_id, 1)]);
        let engine = engine(&store);

        engine.send(order_id).unwrap();
        engine.receive(order_id).unwrap();
        assert_eq!(stock_of(&store, product_id), Some(15));

        // 10 units leave through other channels.
        let mut product = store.load_product(product_id).unwrap().unwrap();
        product.set_stock(5).unwrap();
        store.insert_product(product).unwrap();

        let err = engine.cancel_receive(order_id).unwrap_err();
        match err {
            FulfillmentError::Domain(DomainError::ProductStock { product_id: id, .. }) => {
                assert_eq!(id, Some(product_id.0));
            }
            _ => panic!("Expected ProductStock for cancel-receive"),
        }

        // Still received, stock untouched.
        assert_eq!(stock_of(&store, product_id), Some(5));
        let stored = store.load_supplier_order(order_id).unwrap().unwrap();
        assert!(stored.is_received());
    }

    #[test]
    fn cancel_receive_of_unreceived_order_fails() {
        let store = InMemoryStore::new();
        let product_id = seeded_product(&store, 5, 10);
        let order_id = seeded_order(&store, &[(product_id, 2)]);
        let engine = engine(&store);

        engine.send(order_id).unwrap();
        let err = engine.cancel_receive(order_id).unwrap_err();
        match err {
            FulfillmentError::Domain(DomainError::OrderState { message, .. }) => {
                assert!(message.contains("not received"));
            }
            _ => panic!("Expected OrderState for cancel-receive of unreceived order"),
        }
    }
}
