use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use stocksmart_core::{CustomerId, DomainError, OrderId, ProductId, VendorId, WarehouseId};
use stocksmart_inventory::{StockMovement, Warehouse, WarehouseStock, WarehouseTransfer};
use stocksmart_parties::{normalize_email, Customer, Vendor};
use stocksmart_products::{LedgerAction, Product, StockChange};
use stocksmart_sales::{Grn, GrnItem, GrnWithItems, Order, OrderItem};

use super::r#trait::{
    CustomerStore, GrnStore, MovementStore, OrderStore, ProductStore, VendorStore, WarehouseStore,
};
use crate::error::StoreError;

#[derive(Debug, Clone)]
struct OrderRow {
    order: Order,
    items: Vec<OrderItem>,
}

/// In-memory storage backend.
///
/// Intended for tests/dev. Each table sits behind its own lock; operations
/// that must be atomic hold the relevant write lock for their whole
/// read-compute-write.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    products: RwLock<HashMap<ProductId, Product>>,
    movements: RwLock<Vec<StockMovement>>,
    warehouses: RwLock<HashMap<WarehouseId, Warehouse>>,
    warehouse_stock: RwLock<HashMap<(ProductId, WarehouseId), WarehouseStock>>,
    customers: RwLock<HashMap<CustomerId, Customer>>,
    vendors: RwLock<HashMap<VendorId, Vendor>>,
    orders: RwLock<HashMap<OrderId, OrderRow>>,
    grns: RwLock<HashMap<OrderId, GrnWithItems>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, StoreError> {
    lock.read()
        .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, StoreError> {
    lock.write()
        .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
}

fn take_limit<T>(iter: impl Iterator<Item = T>, limit: Option<usize>) -> Vec<T> {
    match limit {
        Some(n) => iter.take(n).collect(),
        None => iter.collect(),
    }
}

#[async_trait]
impl ProductStore for InMemoryStore {
    async fn insert_product(&self, product: &Product) -> Result<(), StoreError> {
        let mut products = write(&self.products)?;
        if products.values().any(|p| p.sku == product.sku) {
            return Err(StoreError::UniqueViolation(format!("sku '{}' already exists", product.sku)));
        }
        products.insert(product.id, product.clone());
        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(read(&self.products)?.get(&id).cloned())
    }

    async fn find_product_by_sku(&self, sku: &str) -> Result<Option<Product>, StoreError> {
        Ok(read(&self.products)?.values().find(|p| p.sku == sku).cloned())
    }

    async fn update_product(&self, product: &Product) -> Result<(), StoreError> {
        let mut products = write(&self.products)?;
        if products.values().any(|p| p.id != product.id && p.sku == product.sku) {
            return Err(StoreError::UniqueViolation(format!("sku '{}' already exists", product.sku)));
        }
        let row = products
            .get_mut(&product.id)
            .ok_or(DomainError::not_found("product"))?;
        // Counters stay as stored; only the ledger path moves them.
        let stock = row.stock;
        *row = product.clone();
        row.stock = stock;
        Ok(())
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        Ok(read(&self.products)?.values().cloned().collect())
    }

    async fn apply_stock_change(
        &self,
        id: ProductId,
        action: LedgerAction,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<StockChange>, StoreError> {
        let mut products = write(&self.products)?;
        let Some(product) = products.get_mut(&id) else {
            return Ok(None);
        };
        let change = StockChange::compute(product.stock, action, quantity)?;
        product.record_change(&change, now);
        Ok(Some(change))
    }
}

#[async_trait]
impl MovementStore for InMemoryStore {
    async fn append_movement(&self, movement: &StockMovement) -> Result<(), StoreError> {
        write(&self.movements)?.push(movement.clone());
        Ok(())
    }

    async fn list_movements(&self, limit: Option<usize>) -> Result<Vec<StockMovement>, StoreError> {
        let movements = read(&self.movements)?;
        Ok(take_limit(movements.iter().rev().cloned(), limit))
    }

    async fn list_movements_for_product(
        &self,
        product_id: ProductId,
        limit: Option<usize>,
    ) -> Result<Vec<StockMovement>, StoreError> {
        let movements = read(&self.movements)?;
        let iter = movements
            .iter()
            .rev()
            .filter(|m| m.product_id == product_id)
            .cloned();
        Ok(take_limit(iter, limit))
    }
}

#[async_trait]
impl WarehouseStore for InMemoryStore {
    async fn insert_warehouse(&self, warehouse: &Warehouse) -> Result<(), StoreError> {
        write(&self.warehouses)?.insert(warehouse.id, warehouse.clone());
        Ok(())
    }

    async fn get_warehouse(&self, id: WarehouseId) -> Result<Option<Warehouse>, StoreError> {
        Ok(read(&self.warehouses)?.get(&id).cloned())
    }

    async fn list_warehouses(&self) -> Result<Vec<Warehouse>, StoreError> {
        let mut out: Vec<Warehouse> = read(&self.warehouses)?.values().cloned().collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    async fn get_warehouse_stock(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> Result<Option<WarehouseStock>, StoreError> {
        Ok(read(&self.warehouse_stock)?
            .get(&(product_id, warehouse_id))
            .cloned())
    }

    async fn upsert_warehouse_stock(&self, row: &WarehouseStock) -> Result<(), StoreError> {
        write(&self.warehouse_stock)?.insert((row.product_id, row.warehouse_id), row.clone());
        Ok(())
    }

    async fn stock_for_product(&self, product_id: ProductId) -> Result<Vec<WarehouseStock>, StoreError> {
        let rows = read(&self.warehouse_stock)?;
        let mut out: Vec<WarehouseStock> = rows
            .values()
            .filter(|r| r.product_id == product_id)
            .cloned()
            .collect();
        out.sort_by_key(|r| r.warehouse_id);
        Ok(out)
    }

    async fn stock_for_warehouse(
        &self,
        warehouse_id: WarehouseId,
    ) -> Result<Vec<WarehouseStock>, StoreError> {
        let rows = read(&self.warehouse_stock)?;
        let mut out: Vec<WarehouseStock> = rows
            .values()
            .filter(|r| r.warehouse_id == warehouse_id)
            .cloned()
            .collect();
        out.sort_by_key(|r| r.product_id);
        Ok(out)
    }

    async fn transfer_warehouse_stock(
        &self,
        product_id: ProductId,
        from: WarehouseId,
        to: WarehouseId,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> Result<WarehouseTransfer, StoreError> {
        let mut rows = write(&self.warehouse_stock)?;
        let source = rows.get(&(product_id, from)).cloned();
        let target = rows.get(&(product_id, to)).cloned();
        let plan = WarehouseTransfer::plan(product_id, from, to, source, target, quantity, now)?;
        rows.insert((product_id, from), plan.source.clone());
        rows.insert((product_id, to), plan.target.clone());
        Ok(plan)
    }
}

fn email_taken(customers: &HashMap<CustomerId, Customer>, email: &str) -> Option<Customer> {
    customers.values().find(|c| c.has_email(email)).cloned()
}

#[async_trait]
impl CustomerStore for InMemoryStore {
    async fn insert_customer(&self, customer: &Customer) -> Result<(), StoreError> {
        let mut customers = write(&self.customers)?;
        if let Some(email) = customer.contact.email.as_deref() {
            if email_taken(&customers, email).is_some() {
                return Err(StoreError::UniqueViolation(format!("email '{email}' already registered")));
            }
        }
        customers.insert(customer.id, customer.clone());
        Ok(())
    }

    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>, StoreError> {
        Ok(read(&self.customers)?.get(&id).cloned())
    }

    async fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>, StoreError> {
        Ok(email_taken(&*read(&self.customers)?, &normalize_email(email)))
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, StoreError> {
        let mut out: Vec<Customer> = read(&self.customers)?.values().cloned().collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    async fn find_or_create_customer(&self, candidate: &Customer) -> Result<Customer, StoreError> {
        let mut customers = write(&self.customers)?;
        if let Some(email) = candidate.contact.email.as_deref() {
            if let Some(existing) = email_taken(&customers, email) {
                return Ok(existing);
            }
        }
        customers.insert(candidate.id, candidate.clone());
        Ok(candidate.clone())
    }
}

#[async_trait]
impl VendorStore for InMemoryStore {
    async fn insert_vendor(&self, vendor: &Vendor) -> Result<(), StoreError> {
        write(&self.vendors)?.insert(vendor.id, vendor.clone());
        Ok(())
    }

    async fn get_vendor(&self, id: VendorId) -> Result<Option<Vendor>, StoreError> {
        Ok(read(&self.vendors)?.get(&id).cloned())
    }

    async fn update_vendor(&self, vendor: &Vendor) -> Result<(), StoreError> {
        let mut vendors = write(&self.vendors)?;
        let row = vendors
            .get_mut(&vendor.id)
            .ok_or(DomainError::not_found("vendor"))?;
        *row = vendor.clone();
        Ok(())
    }

    async fn list_vendors(&self) -> Result<Vec<Vendor>, StoreError> {
        let mut out: Vec<Vendor> = read(&self.vendors)?.values().cloned().collect();
        out.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(out)
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn insert_order(&self, order: &Order, items: &[OrderItem]) -> Result<(), StoreError> {
        let mut orders = write(&self.orders)?;
        if orders.values().any(|r| r.order.order_number == order.order_number) {
            return Err(StoreError::UniqueViolation(format!(
                "order number '{}' already exists",
                order.order_number
            )));
        }
        orders.insert(
            order.id,
            OrderRow {
                order: order.clone(),
                items: items.to_vec(),
            },
        );
        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        Ok(read(&self.orders)?.get(&id).map(|r| r.order.clone()))
    }

    async fn update_order(&self, order: &Order) -> Result<(), StoreError> {
        let mut orders = write(&self.orders)?;
        let row = orders
            .get_mut(&order.id)
            .ok_or(DomainError::not_found("order"))?;
        row.order = order.clone();
        Ok(())
    }

    async fn order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, StoreError> {
        Ok(read(&self.orders)?
            .get(&order_id)
            .map(|r| r.items.clone())
            .unwrap_or_default())
    }

    async fn list_orders(&self) -> Result<Vec<(Order, usize)>, StoreError> {
        Ok(read(&self.orders)?
            .values()
            .map(|r| (r.order.clone(), r.items.len()))
            .collect())
    }

    async fn orders_for_product(&self, product_id: ProductId) -> Result<Vec<(Order, i64)>, StoreError> {
        let orders = read(&self.orders)?;
        let mut out: Vec<(Order, i64)> = orders
            .values()
            .filter_map(|r| {
                let quantity = r
                    .items
                    .iter()
                    .filter(|i| i.product_id == product_id)
                    .fold(0i64, |acc, i| acc.saturating_add(i.quantity));
                let holds = r.items.iter().any(|i| i.product_id == product_id);
                holds.then(|| (r.order.clone(), quantity))
            })
            .collect();
        out.sort_by(|a, b| b.0.created_at.cmp(&a.0.created_at).then_with(|| b.0.id.cmp(&a.0.id)));
        Ok(out)
    }
}

#[async_trait]
impl GrnStore for InMemoryStore {
    async fn get_grn(&self, order_id: OrderId) -> Result<Option<GrnWithItems>, StoreError> {
        Ok(read(&self.grns)?.get(&order_id).cloned())
    }

    async fn save_grn(&self, grn: &Grn, items: &[GrnItem]) -> Result<GrnWithItems, StoreError> {
        let mut grns = write(&self.grns)?;
        let mut header = grn.clone();
        if let Some(existing) = grns.get(&grn.order_id) {
            header.id = existing.grn.id;
            header.created_at = existing.grn.created_at;
        }
        let items = items
            .iter()
            .cloned()
            .map(|mut item| {
                item.grn_id = header.id;
                item
            })
            .collect();
        let saved = GrnWithItems { grn: header, items };
        grns.insert(grn.order_id, saved.clone());
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stocksmart_core::GrnId;
    use stocksmart_parties::{ContactInfo, NewCustomer};
    use stocksmart_products::NewProduct;
    use stocksmart_sales::{GrnHeader, GrnItemDetail};

    fn product(sku: &str, initial: i64) -> Product {
        Product::create(
            ProductId::new(),
            NewProduct {
                sku: sku.to_string(),
                name: format!("Product {sku}"),
                initial_stock: initial,
                ..NewProduct::default()
            },
            Utc::now(),
        )
        .unwrap()
    }

    fn customer(name: &str, email: &str) -> Customer {
        Customer::create(
            CustomerId::new(),
            NewCustomer {
                name: name.to_string(),
                contact: ContactInfo {
                    email: Some(email.to_string()),
                    ..ContactInfo::default()
                },
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn duplicate_sku_is_a_unique_violation() {
        let store = InMemoryStore::new();
        store.insert_product(&product("SKU-1", 0)).await.unwrap();
        let err = store.insert_product(&product("SKU-1", 0)).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(_)));
    }

    #[tokio::test]
    async fn stock_change_reports_both_snapshots() {
        let store = InMemoryStore::new();
        let p = product("SKU-1", 10);
        store.insert_product(&p).await.unwrap();

        let change = store
            .apply_stock_change(p.id, LedgerAction::Use, 4, Utc::now())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(change.previous.available(), 10);
        assert_eq!(change.new.available(), 6);

        let stored = store.get_product(p.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, change.new);
    }

    #[tokio::test]
    async fn stock_change_on_missing_product_is_none() {
        let store = InMemoryStore::new();
        let out = store
            .apply_stock_change(ProductId::new(), LedgerAction::Add, 1, Utc::now())
            .await
            .unwrap();
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn update_product_leaves_counters_alone() {
        let store = InMemoryStore::new();
        let mut p = product("SKU-1", 10);
        store.insert_product(&p).await.unwrap();
        store
            .apply_stock_change(p.id, LedgerAction::Add, 5, Utc::now())
            .await
            .unwrap();

        p.name = "Renamed".to_string();
        store.update_product(&p).await.unwrap();

        let stored = store.get_product(p.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Renamed");
        assert_eq!(stored.stock.available(), 15);
    }

    #[tokio::test]
    async fn find_or_create_matches_email_case_insensitively() {
        let store = InMemoryStore::new();
        let first = store
            .find_or_create_customer(&customer("Asha", "asha@example.com"))
            .await
            .unwrap();
        let again = store
            .find_or_create_customer(&customer("Asha Again", "ASHA@example.com"))
            .await
            .unwrap();
        assert_eq!(first.id, again.id);
        assert_eq!(store.list_customers().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn save_grn_keeps_the_first_grn_id() {
        let store = InMemoryStore::new();
        let order_id = OrderId::new();
        let header = GrnHeader {
            vendor_name: "Acme".into(),
            ..GrnHeader::default()
        };
        let first = Grn::upsert(None, order_id, header.clone(), Utc::now()).unwrap();
        let saved = store.save_grn(&first, &[]).await.unwrap();

        // A second, independently built GRN for the same order.
        let mut second = Grn::upsert(None, order_id, header, Utc::now()).unwrap();
        second.id = GrnId::new();
        let items = second.replacement_items(vec![GrnItemDetail {
            description: "bolts".into(),
            quantity_received: 3,
            ..GrnItemDetail::default()
        }]);
        let resaved = store.save_grn(&second, &items).await.unwrap();

        assert_eq!(resaved.grn.id, saved.grn.id);
        assert!(resaved.items.iter().all(|i| i.grn_id == saved.grn.id));
    }

    #[tokio::test]
    async fn movements_list_newest_first() {
        use stocksmart_inventory::NewStockMovement;
        use stocksmart_products::StockCounters;

        let store = InMemoryStore::new();
        let pid = ProductId::new();
        for qty in [1, 2, 3] {
            let change = StockChange::compute(StockCounters::opening(0), LedgerAction::Add, qty).unwrap();
            let m = NewStockMovement::from_change(pid, &change, "test")
                .record(stocksmart_core::MovementId::new(), Utc::now());
            store.append_movement(&m).await.unwrap();
        }
        let listed = store.list_movements_for_product(pid, Some(2)).await.unwrap();
        let quantities: Vec<i64> = listed.iter().map(|m| m.quantity).collect();
        assert_eq!(quantities, vec![3, 2]);
    }
}
