use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::anyhow;

use orderflow_core::{AggregateRoot, ExpectedVersion};
use orderflow_products::{Product, ProductId};
use orderflow_purchasing::{SupplierOrder, SupplierOrderId};
use orderflow_sales::{CustomerOrder, CustomerOrderId};

use crate::store::{OrderStore, ProductStore, StoreError};

#[derive(Debug, Default)]
struct Arena {
    products: HashMap<ProductId, Product>,
    customer_orders: HashMap<CustomerOrderId, CustomerOrder>,
    supplier_orders: HashMap<SupplierOrderId, SupplierOrder>,
}

/// In-memory arena of orders and products keyed by id.
///
/// Intended for tests/dev. Cloning yields another handle onto the same
/// arena. Individual loads and saves are atomic (one lock), but the arena
/// provides no cross-save transaction: callers drive operations
/// sequentially, and a real backend supplies transactional isolation.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Arena>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Arena>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend(anyhow!("lock poisoned")))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Arena>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend(anyhow!("lock poisoned")))
    }

    /// Seed a product, replacing any record with the same id.
    pub fn insert_product(&self, product: Product) -> Result<(), StoreError> {
        let mut arena = self.write()?;
        arena.products.insert(product.id_typed(), product);
        Ok(())
    }

    /// Seed a customer order, replacing any record with the same id.
    pub fn insert_customer_order(&self, order: CustomerOrder) -> Result<(), StoreError> {
        let mut arena = self.write()?;
        arena.customer_orders.insert(order.id_typed(), order);
        Ok(())
    }

    /// Seed a supplier order, replacing any record with the same id.
    pub fn insert_supplier_order(&self, order: SupplierOrder) -> Result<(), StoreError> {
        let mut arena = self.write()?;
        arena.supplier_orders.insert(order.id_typed(), order);
        Ok(())
    }
}

fn check_version(expected: ExpectedVersion, current: u64) -> Result<(), StoreError> {
    if expected.matches(current) {
        Ok(())
    } else {
        Err(StoreError::Conflict(format!(
            "expected {expected:?}, found {current}"
        )))
    }
}

impl OrderStore for InMemoryStore {
    fn load_customer_order(
        &self,
        id: CustomerOrderId,
    ) -> Result<Option<CustomerOrder>, StoreError> {
        Ok(self.read()?.customer_orders.get(&id).cloned())
    }

    fn save_customer_order(
        &self,
        order: &CustomerOrder,
        expected: ExpectedVersion,
    ) -> Result<(), StoreError> {
        let mut arena = self.write()?;
        let current = arena
            .customer_orders
            .get(&order.id_typed())
            .map(|o| o.version())
            .unwrap_or(0);
        check_version(expected, current)?;
        arena.customer_orders.insert(order.id_typed(), order.clone());
        Ok(())
    }

    fn load_supplier_order(
        &self,
        id: SupplierOrderId,
    ) -> Result<Option<SupplierOrder>, StoreError> {
        Ok(self.read()?.supplier_orders.get(&id).cloned())
    }

    fn save_supplier_order(
        &self,
        order: &SupplierOrder,
        expected: ExpectedVersion,
    ) -> Result<(), StoreError> {
        let mut arena = self.write()?;
        let current = arena
            .supplier_orders
            .get(&order.id_typed())
            .map(|o| o.version())
            .unwrap_or(0);
        check_version(expected, current)?;
        arena.supplier_orders.insert(order.id_typed(), order.clone());
        Ok(())
    }
}

impl ProductStore for InMemoryStore {
    fn load_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.read()?.products.get(&id).cloned())
    }

    fn save_product(&self, product: &Product) -> Result<(), StoreError> {
        let mut arena = self.write()?;
        arena.products.insert(product.id_typed(), product.clone());
        Ok(())
    }
}
