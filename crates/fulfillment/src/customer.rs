use tracing::{debug, info};

use orderflow_core::{AggregateRoot, DomainError, ExpectedVersion};
use orderflow_sales::{CustomerOrder, CustomerOrderId};

use crate::engine::{self, FulfillmentResult};
use crate::store::{OrderStore, ProductStore};

/// Customer order fulfillment engine.
///
/// Ships and un-ships customer orders while reconciling product stock per
/// line. Customer order lines are denominated in saleable units, so a line's
/// quantity is its stock delta directly.
#[derive(Debug)]
pub struct CustomerFulfillment<O, P> {
    orders: O,
    products: P,
}

impl<O, P> CustomerFulfillment<O, P> {
    pub fn new(orders: O, products: P) -> Self {
        Self { orders, products }
    }

    pub fn into_parts(self) -> (O, P) {
        (self.orders, self.products)
    }
}

impl<O, P> CustomerFulfillment<O, P>
where
    O: OrderStore,
    P: ProductStore,
{
    /// Ship a customer order: decrement every line's product stock by its
    /// quantity and mark the order sent, as one unit.
    ///
    /// Fails with `UnknownOrder` for a missing id, `OrderState` if already
    /// sent, `EmptyOrder` without lines, and `ProductStock` naming the first
    /// product whose stock would go negative, in which case no stock is
    /// written at all.
    pub fn ship(&self, order_id: CustomerOrderId) -> FulfillmentResult<CustomerOrder> {
        let mut order = self.load(order_id)?;
        let expected = ExpectedVersion::Exact(order.version());

        let ledger = engine::stage_transition(
            &self.products,
            &mut order,
            CustomerOrder::mark_sent,
            |o| o.lines().iter().map(|l| (l.product_id, l.quantity)).collect(),
            |quantity, _| -quantity,
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

        self.orders.save_customer_order(&order, expected)?;
        engine::persist_stock(&self.products, ledger.into_staged())?;

        info!(%order_id, lines = order.lines().len(), adjusted, "customer order shipped");
        Ok(order)
    }

    /// Cancel a shipment: increment every line's product stock back and mark
    /// the order not sent.
    ///
    /// Increments cannot violate the non-negativity invariant, so the only
    /// failure modes are `UnknownOrder`, `OrderState` (not sent) and storage
    /// failures.
    pub fn cancel_ship(&self, order_id: CustomerOrderId) -> FulfillmentResult<CustomerOrder> {
        let mut order = self.load(order_id)?;
        let expected = ExpectedVersion::Exact(order.version());

        let ledger = engine::stage_transition(
            &self.products,
            &mut order,
            CustomerOrder::mark_not_sent,
            |o| o.lines().iter().map(|l| (l.product_id, l.quantity)).collect(),
            |quantity, _| quantity,
        )?;

        let adjusted = ledger.adjustments().len();
        self.orders.save_customer_order(&order, expected)?;
        engine::persist_stock(&self.products, ledger.into_staged())?;

        info!(%order_id, adjusted, "customer order shipment cancelled");
        Ok(order)
    }

    fn load(&self, order_id: CustomerOrderId) -> FulfillmentResult<CustomerOrder> {
        self.orders
            .load_customer_order(order_id)?
            .ok_or_else(|| DomainError::unknown_order(order_id.0).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use orderflow_core::{AggregateId, DomainError};
    use orderflow_products::{Product, ProductId};
    use orderflow_sales::CustomerId;

    use crate::engine::FulfillmentError;
    use crate::memory::InMemoryStore;
    use crate::store::{OrderStore, ProductStore};

    fn seeded_product(store: &InMemoryStore, stock: i64) -> ProductId {
        let mut product =
            Product::new(ProductId::new(AggregateId::new()), "SKU-001", "Test Product", 10)
                .unwrap();
        product.set_stock(stock).unwrap();
        let id = product.id_typed();
        store.insert_product(product).unwrap();
        id
    }

    fn seeded_order(store: &InMemoryStore, lines: &[(ProductId, i64)]) -> CustomerOrderId {
        let mut order = CustomerOrder::new(
            CustomerOrderId::new(AggregateId::new()),
            CustomerId::new(AggregateId::new()),
            Utc::now(),
        );
        for (product_id, quantity) in lines {
            order.add_line(*product_id, *quantity, 100).unwrap();
        }
        let id = order.id_typed();
        store.insert_customer_order(order).unwrap();
        id
    }

    fn engine(store: &InMemoryStore) -> CustomerFulfillment<InMemoryStore, InMemoryStore> {
        CustomerFulfillment::new(store.clone(), store.clone())
    }

    fn stock_of(store: &InMemoryStore, id: ProductId) -> Option<i64> {
        store.load_product(id).unwrap().unwrap().stock()
    }

    #[test]
    fn ship_decrements_stock_and_flips_flag() {
        let store = InMemoryStore::new();
        let product_id = seeded_product(&store, 10);
        let order_id = seeded_order(&store, &[(product_id, 3)]);

        let shipped = engine(&store).ship(order_id).unwrap();

        assert!(shipped.is_sent());
        assert_eq!(stock_of(&store, product_id), Some(7));
    }

    #[test]
    fn ship_unknown_order_fails() {
        let store = InMemoryStore::new();
        let order_id = CustomerOrderId::new(AggregateId::new());

        let err = engine(&store).ship(order_id).unwrap_err();
        match err {
            FulfillmentError::Domain(DomainError::UnknownOrder { order_id: id }) => {
                assert_eq!(id, order_id.0);
            }
            _ => panic!("Expected UnknownOrder"),
        }
    }

    #[test]
    fn ship_twice_fails_without_touching_stock() {
        let store = InMemoryStore::new();
        let product_id = seeded_product(&store, 10);
        let order_id = seeded_order(&store, &[(product_id, 3)]);
        let engine = engine(&store);

        engine.ship(order_id).unwrap();
        let err = engine.ship(order_id).unwrap_err();
        match err {
            FulfillmentError::Domain(DomainError::OrderState { .. }) => {}
            _ => panic!("Expected OrderState for double ship"),
        }
        assert_eq!(stock_of(&store, product_id), Some(7));
    }

    #[test]
    fn ship_empty_order_fails_with_empty_order() {
        let store = InMemoryStore::new();
        let order_id = seeded_order(&store, &[]);

        let err = engine(&store).ship(order_id).unwrap_err();
        match err {
            FulfillmentError::Domain(DomainError::EmptyOrder { .. }) => {}
            _ => panic!("Expected EmptyOrder"),
        }
        let stored = store.load_customer_order(order_id).unwrap().unwrap();
        assert!(!stored.is_sent());
    }

    #[test]
    fn insufficient_stock_aborts_whole_shipment() {
        let store = InMemoryStore::new();
        let a = seeded_product(&store, 10);
        let b = seeded_product(&store, 2);
        let order_id = seeded_order(&store, &[(a, 3), (b, 4)]);

        let err = engine(&store).ship(order_id).unwrap_err();
        match err {
            FulfillmentError::Domain(DomainError::ProductStock { product_id, .. }) => {
                assert_eq!(product_id, Some(b.0));
            }
            _ => panic!("Expected ProductStock naming product b"),
        }

        // Neither the earlier line's stock nor the flag moved.
        assert_eq!(stock_of(&store, a), Some(10));
        assert_eq!(stock_of(&store, b), Some(2));
        let stored = store.load_customer_order(order_id).unwrap().unwrap();
        assert!(!stored.is_sent());
    }

    #[test]
    fn cancel_ship_restores_stock_exactly() {
        let store = InMemoryStore::new();
        let a = seeded_product(&store, 10);
        let b = seeded_product(&store, 5);
        let order_id = seeded_order(&store, &[(a, 3), (b, 5)]);
        let engine = engine(&store);

        engine.ship(order_id).unwrap();
        assert_eq!(stock_of(&store, a), Some(7));
        assert_eq!(stock_of(&store, b), Some(0));

        let cancelled = engine.cancel_ship(order_id).unwrap();
        assert!(!cancelled.is_sent());
        assert_eq!(stock_of(&store, a), Some(10));
        assert_eq!(stock_of(&store, b), Some(5));
    }

    #[test]
    fn cancel_ship_of_unsent_order_fails() {
        let store = InMemoryStore::new();
        let product_id = seeded_product(&store, 10);
        let order_id = seeded_order(&store, &[(product_id, 3)]);

        let err = engine(&store).cancel_ship(order_id).unwrap_err();
        match err {
            FulfillmentError::Domain(DomainError::OrderState { .. }) => {}
            _ => panic!("Expected OrderState for cancel-ship of unsent order"),
        }
        assert_eq!(stock_of(&store, product_id), Some(10));
    }

    #[test]
    fn untracked_products_ship_without_stock_writes() {
        let store = InMemoryStore::new();
        let product =
            Product::new(ProductId::new(AggregateId::new()), "SKU-002", "Untracked", 10).unwrap();
        let product_id = product.id_typed();
        store.insert_product(product).unwrap();
        let order_id = seeded_order(&store, &[(product_id, 3)]);

        let shipped = engine(&store).ship(order_id).unwrap();
        assert!(shipped.is_sent());
        assert_eq!(stock_of(&store, product_id), None);
    }
}
