use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use stocksmart_core::{CustomerId, OrderId, ProductId, VendorId, WarehouseId};
use stocksmart_inventory::{StockMovement, Warehouse, WarehouseStock, WarehouseTransfer};
use stocksmart_parties::{Customer, Vendor};
use stocksmart_products::{LedgerAction, Product, StockChange};
use stocksmart_sales::{Grn, GrnItem, GrnWithItems, Order, OrderItem};

use crate::error::StoreError;

/// Product catalog rows and the ledger counters.
///
/// `update_product` writes descriptive fields and status only; counters move
/// exclusively through `apply_stock_change`, which must read, compute and
/// write a product's counters as one atomic step.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Insert a new product. A taken SKU yields `StoreError::UniqueViolation`.
    async fn insert_product(&self, product: &Product) -> Result<(), StoreError>;

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    async fn find_product_by_sku(&self, sku: &str) -> Result<Option<Product>, StoreError>;

    async fn update_product(&self, product: &Product) -> Result<(), StoreError>;

    /// All products, archived included. Callers filter on status.
    async fn list_products(&self) -> Result<Vec<Product>, StoreError>;

    /// Atomic read-compute-write of one product's counters.
    ///
    /// Returns `None` when the product does not exist.
    async fn apply_stock_change(
        &self,
        id: ProductId,
        action: LedgerAction,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<StockChange>, StoreError>;
}

/// Append-only movement log. There is no update or delete.
#[async_trait]
pub trait MovementStore: Send + Sync {
    async fn append_movement(&self, movement: &StockMovement) -> Result<(), StoreError>;

    /// Most recent first; ties resolve to insertion order, newest first.
    async fn list_movements(&self, limit: Option<usize>) -> Result<Vec<StockMovement>, StoreError>;

    async fn list_movements_for_product(
        &self,
        product_id: ProductId,
        limit: Option<usize>,
    ) -> Result<Vec<StockMovement>, StoreError>;
}

#[async_trait]
pub trait WarehouseStore: Send + Sync {
    async fn insert_warehouse(&self, warehouse: &Warehouse) -> Result<(), StoreError>;

    async fn get_warehouse(&self, id: WarehouseId) -> Result<Option<Warehouse>, StoreError>;

    async fn list_warehouses(&self) -> Result<Vec<Warehouse>, StoreError>;

    async fn get_warehouse_stock(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> Result<Option<WarehouseStock>, StoreError>;

    /// Insert or overwrite the row keyed by (product, warehouse).
    async fn upsert_warehouse_stock(&self, row: &WarehouseStock) -> Result<(), StoreError>;

    async fn stock_for_product(&self, product_id: ProductId) -> Result<Vec<WarehouseStock>, StoreError>;

    async fn stock_for_warehouse(
        &self,
        warehouse_id: WarehouseId,
    ) -> Result<Vec<WarehouseStock>, StoreError>;

    /// Move quantity between two rows atomically (`WarehouseTransfer::plan`
    /// against the current rows, then both writes).
    async fn transfer_warehouse_stock(
        &self,
        product_id: ProductId,
        from: WarehouseId,
        to: WarehouseId,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> Result<WarehouseTransfer, StoreError>;
}

#[async_trait]
pub trait CustomerStore: Send + Sync {
    /// Insert a customer. A taken email yields `StoreError::UniqueViolation`.
    async fn insert_customer(&self, customer: &Customer) -> Result<(), StoreError>;

    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>, StoreError>;

    async fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>, StoreError>;

    async fn list_customers(&self) -> Result<Vec<Customer>, StoreError>;

    /// Return the customer already holding `candidate`'s email, or insert
    /// `candidate`. Lookup and insert happen as one step.
    async fn find_or_create_customer(&self, candidate: &Customer) -> Result<Customer, StoreError>;
}

#[async_trait]
pub trait VendorStore: Send + Sync {
    async fn insert_vendor(&self, vendor: &Vendor) -> Result<(), StoreError>;

    async fn get_vendor(&self, id: VendorId) -> Result<Option<Vendor>, StoreError>;

    /// Persist directory fields and status.
    async fn update_vendor(&self, vendor: &Vendor) -> Result<(), StoreError>;

    /// All vendors ordered by name. Callers filter.
    async fn list_vendors(&self) -> Result<Vec<Vendor>, StoreError>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert an order header and its items as a unit.
    async fn insert_order(&self, order: &Order, items: &[OrderItem]) -> Result<(), StoreError>;

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, StoreError>;

    /// Persist header changes (status, approval fields, `updated_at`).
    async fn update_order(&self, order: &Order) -> Result<(), StoreError>;

    async fn order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, StoreError>;

    /// Every order with its item count.
    async fn list_orders(&self) -> Result<Vec<(Order, usize)>, StoreError>;

    /// Orders holding at least one item for the product, with the summed
    /// quantity of that product on each.
    async fn orders_for_product(&self, product_id: ProductId) -> Result<Vec<(Order, i64)>, StoreError>;
}

#[async_trait]
pub trait GrnStore: Send + Sync {
    async fn get_grn(&self, order_id: OrderId) -> Result<Option<GrnWithItems>, StoreError>;

    /// Upsert the order's single GRN and replace its items wholesale, as one
    /// step. If a GRN already exists for the order its id is kept and the
    /// given items are re-parented onto it.
    async fn save_grn(&self, grn: &Grn, items: &[GrnItem]) -> Result<GrnWithItems, StoreError>;
}

/// Everything the service layer needs from storage.
pub trait Storage:
    ProductStore + MovementStore + WarehouseStore + CustomerStore + VendorStore + OrderStore + GrnStore
{
}

impl<T> Storage for T where
    T: ProductStore
        + MovementStore
        + WarehouseStore
        + CustomerStore
        + VendorStore
        + OrderStore
        + GrnStore
{
}

/// Storage handle shared by all services.
pub type SharedStorage = Arc<dyn Storage>;
