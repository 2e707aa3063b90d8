//! Postgres-backed storage.
//!
//! Runtime `sqlx` queries against the schema in `migrations/0001_init.sql`.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `UniqueViolation` |
//! | PoolClosed / PoolTimedOut / Io | N/A | `Unavailable` |
//! | anything else | any | `Database` |
//!
//! Row decoding failures (including a stored product that breaks the ledger
//! invariant) surface as `Decode`.
//!
//! ## Atomic operations
//!
//! Stock changes, warehouse transfers, customer resolution and GRN
//! replacement each run in one transaction that locks the rows it reads
//! (`SELECT ... FOR UPDATE`) or relies on a unique constraint
//! (`ON CONFLICT`), so concurrent callers serialize per row.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use stocksmart_core::{
    CustomerId, GrnId, GrnItemId, MovementId, OrderId, OrderItemId, ProductId, UserId, VendorId,
    WarehouseId,
};
use stocksmart_inventory::{
    BinLocation, MovementAction, StockMovement, Warehouse, WarehouseStock, WarehouseTransfer,
};
use stocksmart_parties::{normalize_email, ContactInfo, Customer, Vendor, VendorStatus};
use stocksmart_products::{LedgerAction, Product, ProductStatus, StockChange, StockCounters};
use stocksmart_sales::{
    ApprovalStatus, Grn, GrnHeader, GrnItem, GrnItemDetail, GrnWithItems, Order, OrderItem,
    OrderStatus,
};

use super::r#trait::{
    CustomerStore, GrnStore, MovementStore, OrderStore, ProductStore, VendorStore, WarehouseStore,
};
use crate::error::StoreError;

const SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

const PRODUCT_COLUMNS: &str = "id, sku, name, description, category, unit, unit_price, image_url, \
     stock_total, stock_used, stock_available, min_stock_level, status, created_at, updated_at";

const MOVEMENT_COLUMNS: &str = "id, product_id, action, quantity, previous_stock, new_stock, reason, \
     warehouse_id, user_id, order_id, created_at";

const STOCK_COLUMNS: &str = "product_id, warehouse_id, quantity, aisle, rack, bin, updated_at";

const CUSTOMER_COLUMNS: &str = "id, name, email, phone, address, created_at";

const VENDOR_COLUMNS: &str = "id, name, main_category, subcategory, product_type, product_code, \
     other_products, contact_number, location, city, state, zone, status, created_at, updated_at";

const ORDER_COLUMNS: &str = "o.id, o.order_number, o.customer_id, o.customer_name, o.customer_email, \
     o.customer_phone, o.status, o.approval_status, o.subtotal, o.tax, o.total, o.notes, \
     o.approval_requested_by, o.approval_requested_at, o.approved_by, o.approved_at, \
     o.approval_notes, o.created_at, o.updated_at";

const GRN_COLUMNS: &str = "id, order_id, vendor_id, vendor_name, vendor_address, bill_number, bill_date, po_number, \
     po_date, received_by, remarks, created_at, updated_at";

/// Postgres storage backend.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Open a connection pool against `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Apply the schema. Every statement is idempotent.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }

    async fn begin(&self, operation: &str) -> Result<Transaction<'static, Postgres>, StoreError> {
        self.pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error(operation, e))
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
            StoreError::UniqueViolation(format!(
                "{operation}: {}",
                db_err.constraint().unwrap_or(db_err.message())
            ))
        }
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("connection pool unavailable in {operation}"))
        }
        sqlx::Error::Io(e) => StoreError::Unavailable(format!("io error in {operation}: {e}")),
        other => StoreError::Database(other),
    }
}

fn col<'r, T>(row: &'r PgRow, name: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(name)
        .map_err(|e| StoreError::Decode(format!("column {name}: {e}")))
}

fn opt_id<T: From<Uuid>>(value: Option<Uuid>) -> Option<T> {
    value.map(T::from)
}

// Row mapping

fn product_from_row(row: &PgRow) -> Result<Product, StoreError> {
    let status: String = col(row, "status")?;
    let stock = StockCounters::from_stored(
        col(row, "stock_total")?,
        col(row, "stock_used")?,
        col(row, "stock_available")?,
    )
    .map_err(|e| StoreError::Decode(e.to_string()))?;
    Ok(Product {
        id: ProductId::from_uuid(col(row, "id")?),
        sku: col(row, "sku")?,
        name: col(row, "name")?,
        description: col(row, "description")?,
        category: col(row, "category")?,
        unit: col(row, "unit")?,
        unit_price: col(row, "unit_price")?,
        image_url: col(row, "image_url")?,
        stock,
        min_stock_level: col(row, "min_stock_level")?,
        status: ProductStatus::parse(&status)
            .ok_or_else(|| StoreError::Decode(format!("unknown product status '{status}'")))?,
        created_at: col(row, "created_at")?,
        updated_at: col(row, "updated_at")?,
    })
}

fn movement_from_row(row: &PgRow) -> Result<StockMovement, StoreError> {
    let action: String = col(row, "action")?;
    Ok(StockMovement {
        id: MovementId::from_uuid(col(row, "id")?),
        product_id: ProductId::from_uuid(col(row, "product_id")?),
        action: MovementAction::parse(&action)
            .ok_or_else(|| StoreError::Decode(format!("unknown movement action '{action}'")))?,
        quantity: col(row, "quantity")?,
        previous_stock: col(row, "previous_stock")?,
        new_stock: col(row, "new_stock")?,
        reason: col(row, "reason")?,
        warehouse_id: opt_id::<WarehouseId>(col(row, "warehouse_id")?),
        user_id: opt_id::<UserId>(col(row, "user_id")?),
        order_id: opt_id::<OrderId>(col(row, "order_id")?),
        created_at: col(row, "created_at")?,
    })
}

fn warehouse_from_row(row: &PgRow) -> Result<Warehouse, StoreError> {
    Ok(Warehouse {
        id: WarehouseId::from_uuid(col(row, "id")?),
        name: col(row, "name")?,
        location: col(row, "location")?,
        created_at: col(row, "created_at")?,
    })
}

fn stock_from_row(row: &PgRow) -> Result<WarehouseStock, StoreError> {
    let location = BinLocation {
        aisle: col(row, "aisle")?,
        rack: col(row, "rack")?,
        bin: col(row, "bin")?,
    };
    Ok(WarehouseStock {
        product_id: ProductId::from_uuid(col(row, "product_id")?),
        warehouse_id: WarehouseId::from_uuid(col(row, "warehouse_id")?),
        quantity: col(row, "quantity")?,
        location: (!location.is_empty()).then_some(location),
        updated_at: col(row, "updated_at")?,
    })
}

fn customer_from_row(row: &PgRow) -> Result<Customer, StoreError> {
    Ok(Customer {
        id: CustomerId::from_uuid(col(row, "id")?),
        name: col(row, "name")?,
        contact: ContactInfo {
            email: col(row, "email")?,
            phone: col(row, "phone")?,
            address: col(row, "address")?,
        },
        created_at: col(row, "created_at")?,
    })
}

fn vendor_from_row(row: &PgRow) -> Result<Vendor, StoreError> {
    let status: String = col(row, "status")?;
    Ok(Vendor {
        id: VendorId::from_uuid(col(row, "id")?),
        name: col(row, "name")?,
        main_category: col(row, "main_category")?,
        subcategory: col(row, "subcategory")?,
        product_type: col(row, "product_type")?,
        product_code: col(row, "product_code")?,
        other_products: col(row, "other_products")?,
        contact_number: col(row, "contact_number")?,
        location: col(row, "location")?,
        city: col(row, "city")?,
        state: col(row, "state")?,
        zone: col(row, "zone")?,
        status: VendorStatus::parse(&status)
            .ok_or_else(|| StoreError::Decode(format!("unknown vendor status '{status}'")))?,
        created_at: col(row, "created_at")?,
        updated_at: col(row, "updated_at")?,
    })
}

fn order_from_row(row: &PgRow) -> Result<Order, StoreError> {
    let status: String = col(row, "status")?;
    let approval: String = col(row, "approval_status")?;
    Ok(Order {
        id: OrderId::from_uuid(col(row, "id")?),
        order_number: col(row, "order_number")?,
        customer_id: opt_id::<CustomerId>(col(row, "customer_id")?),
        customer_name: col(row, "customer_name")?,
        customer_email: col(row, "customer_email")?,
        customer_phone: col(row, "customer_phone")?,
        status: OrderStatus::parse(&status)
            .ok_or_else(|| StoreError::Decode(format!("unknown order status '{status}'")))?,
        approval_status: ApprovalStatus::parse(&approval)
            .ok_or_else(|| StoreError::Decode(format!("unknown approval status '{approval}'")))?,
        subtotal: col(row, "subtotal")?,
        tax: col(row, "tax")?,
        total: col(row, "total")?,
        notes: col(row, "notes")?,
        approval_requested_by: col(row, "approval_requested_by")?,
        approval_requested_at: col(row, "approval_requested_at")?,
        approved_by: col(row, "approved_by")?,
        approved_at: col(row, "approved_at")?,
        approval_notes: col(row, "approval_notes")?,
        created_at: col(row, "created_at")?,
        updated_at: col(row, "updated_at")?,
    })
}

fn order_item_from_row(row: &PgRow) -> Result<OrderItem, StoreError> {
    Ok(OrderItem {
        id: OrderItemId::from_uuid(col(row, "id")?),
        order_id: OrderId::from_uuid(col(row, "order_id")?),
        product_id: ProductId::from_uuid(col(row, "product_id")?),
        quantity: col(row, "quantity")?,
        unit_price: col(row, "unit_price")?,
        total_price: col(row, "total_price")?,
    })
}

fn grn_from_row(row: &PgRow) -> Result<Grn, StoreError> {
    Ok(Grn {
        id: GrnId::from_uuid(col(row, "id")?),
        order_id: OrderId::from_uuid(col(row, "order_id")?),
        header: GrnHeader {
            vendor_id: opt_id::<VendorId>(col(row, "vendor_id")?),
            vendor_name: col(row, "vendor_name")?,
            vendor_address: col(row, "vendor_address")?,
            bill_number: col(row, "bill_number")?,
            bill_date: col(row, "bill_date")?,
            po_number: col(row, "po_number")?,
            po_date: col(row, "po_date")?,
            received_by: col(row, "received_by")?,
            remarks: col(row, "remarks")?,
        },
        created_at: col(row, "created_at")?,
        updated_at: col(row, "updated_at")?,
    })
}

fn grn_item_from_row(row: &PgRow) -> Result<GrnItem, StoreError> {
    Ok(GrnItem {
        id: GrnItemId::from_uuid(col(row, "id")?),
        grn_id: GrnId::from_uuid(col(row, "grn_id")?),
        detail: GrnItemDetail {
            product_id: opt_id::<ProductId>(col(row, "product_id")?),
            description: col(row, "description")?,
            quantity_ordered: col(row, "quantity_ordered")?,
            quantity_received: col(row, "quantity_received")?,
            unit: col(row, "unit")?,
            unit_price: col(row, "unit_price")?,
            remarks: col(row, "remarks")?,
        },
    })
}

fn collect<T>(rows: &[PgRow], map: fn(&PgRow) -> Result<T, StoreError>) -> Result<Vec<T>, StoreError> {
    rows.iter().map(map).collect()
}

fn limit_param(limit: Option<usize>) -> Option<i64> {
    limit.map(|n| i64::try_from(n).unwrap_or(i64::MAX))
}

async fn lock_stock_row(
    tx: &mut Transaction<'static, Postgres>,
    product_id: ProductId,
    warehouse_id: WarehouseId,
) -> Result<Option<WarehouseStock>, StoreError> {
    let row = sqlx::query(&format!(
        "SELECT {STOCK_COLUMNS} FROM warehouse_stock WHERE product_id = $1 AND warehouse_id = $2 FOR UPDATE"
    ))
    .bind(product_id.as_uuid())
    .bind(warehouse_id.as_uuid())
    .fetch_optional(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("lock_stock_row", e))?;
    row.as_ref().map(stock_from_row).transpose()
}

async fn write_stock_row(
    tx: &mut Transaction<'static, Postgres>,
    row: &WarehouseStock,
) -> Result<(), StoreError> {
    let location = row.location.clone().unwrap_or_default();
    sqlx::query(
        r#"
        INSERT INTO warehouse_stock (product_id, warehouse_id, quantity, aisle, rack, bin, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (product_id, warehouse_id) DO UPDATE SET
            quantity = EXCLUDED.quantity,
            aisle = EXCLUDED.aisle,
            rack = EXCLUDED.rack,
            bin = EXCLUDED.bin,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(row.product_id.as_uuid())
    .bind(row.warehouse_id.as_uuid())
    .bind(row.quantity)
    .bind(location.aisle)
    .bind(location.rack)
    .bind(location.bin)
    .bind(row.updated_at)
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("write_stock_row", e))?;
    Ok(())
}

#[async_trait]
impl ProductStore for PostgresStore {
    #[instrument(skip(self, product), fields(product_id = %product.id), err)]
    async fn insert_product(&self, product: &Product) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO products (
                id, sku, name, description, category, unit, unit_price, image_url,
                stock_total, stock_used, stock_available, min_stock_level, status,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(&product.unit)
        .bind(product.unit_price)
        .bind(&product.image_url)
        .bind(product.stock.total())
        .bind(product.stock.used())
        .bind(product.stock.available())
        .bind(product.min_stock_level)
        .bind(product.status.as_str())
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_product", e))?;
        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_product", e))?;
        row.as_ref().map(product_from_row).transpose()
    }

    async fn find_product_by_sku(&self, sku: &str) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = $1"))
            .bind(sku)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_product_by_sku", e))?;
        row.as_ref().map(product_from_row).transpose()
    }

    async fn update_product(&self, product: &Product) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE products SET
                sku = $2, name = $3, description = $4, category = $5, unit = $6,
                unit_price = $7, image_url = $8, min_stock_level = $9, status = $10,
                updated_at = $11
            WHERE id = $1
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(&product.unit)
        .bind(product.unit_price)
        .bind(&product.image_url)
        .bind(product.min_stock_level)
        .bind(product.status.as_str())
        .bind(product.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_product", e))?;
        Ok(())
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name ASC"))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_products", e))?;
        collect(&rows, product_from_row)
    }

    #[instrument(skip(self, now), fields(product_id = %id, action = action.as_str()), err)]
    async fn apply_stock_change(
        &self,
        id: ProductId,
        action: LedgerAction,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<StockChange>, StoreError> {
        let mut tx = self.begin("apply_stock_change").await?;

        let row = sqlx::query(
            "SELECT stock_total, stock_used, stock_available FROM products WHERE id = $1 FOR UPDATE",
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("apply_stock_change", e))?;

        let Some(row) = row else {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Ok(None);
        };

        let previous = StockCounters::from_stored(
            col(&row, "stock_total")?,
            col(&row, "stock_used")?,
            col(&row, "stock_available")?,
        )
        .map_err(|e| StoreError::Decode(e.to_string()))?;
        let change = StockChange::compute(previous, action, quantity)?;

        sqlx::query(
            r#"
            UPDATE products
            SET stock_total = $2, stock_used = $3, stock_available = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(change.new.total())
        .bind(change.new.used())
        .bind(change.new.available())
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("apply_stock_change", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))?;
        Ok(Some(change))
    }
}

#[async_trait]
impl MovementStore for PostgresStore {
    async fn append_movement(&self, m: &StockMovement) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO stock_movements (
                id, product_id, action, quantity, previous_stock, new_stock, reason,
                warehouse_id, user_id, order_id, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(m.id.as_uuid())
        .bind(m.product_id.as_uuid())
        .bind(m.action.as_str())
        .bind(m.quantity)
        .bind(m.previous_stock)
        .bind(m.new_stock)
        .bind(&m.reason)
        .bind(m.warehouse_id.map(Uuid::from))
        .bind(m.user_id.map(Uuid::from))
        .bind(m.order_id.map(Uuid::from))
        .bind(m.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("append_movement", e))?;
        Ok(())
    }

    async fn list_movements(&self, limit: Option<usize>) -> Result<Vec<StockMovement>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements ORDER BY seq DESC LIMIT $1"
        ))
        .bind(limit_param(limit))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_movements", e))?;
        collect(&rows, movement_from_row)
    }

    async fn list_movements_for_product(
        &self,
        product_id: ProductId,
        limit: Option<usize>,
    ) -> Result<Vec<StockMovement>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements WHERE product_id = $1 ORDER BY seq DESC LIMIT $2"
        ))
        .bind(product_id.as_uuid())
        .bind(limit_param(limit))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_movements_for_product", e))?;
        collect(&rows, movement_from_row)
    }
}

#[async_trait]
impl WarehouseStore for PostgresStore {
    async fn insert_warehouse(&self, warehouse: &Warehouse) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO warehouses (id, name, location, created_at) VALUES ($1, $2, $3, $4)")
            .bind(warehouse.id.as_uuid())
            .bind(&warehouse.name)
            .bind(&warehouse.location)
            .bind(warehouse.created_at)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_warehouse", e))?;
        Ok(())
    }

    async fn get_warehouse(&self, id: WarehouseId) -> Result<Option<Warehouse>, StoreError> {
        let row = sqlx::query("SELECT id, name, location, created_at FROM warehouses WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_warehouse", e))?;
        row.as_ref().map(warehouse_from_row).transpose()
    }

    async fn list_warehouses(&self) -> Result<Vec<Warehouse>, StoreError> {
        let rows = sqlx::query("SELECT id, name, location, created_at FROM warehouses ORDER BY name ASC")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_warehouses", e))?;
        collect(&rows, warehouse_from_row)
    }

    async fn get_warehouse_stock(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> Result<Option<WarehouseStock>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {STOCK_COLUMNS} FROM warehouse_stock WHERE product_id = $1 AND warehouse_id = $2"
        ))
        .bind(product_id.as_uuid())
        .bind(warehouse_id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_warehouse_stock", e))?;
        row.as_ref().map(stock_from_row).transpose()
    }

    async fn upsert_warehouse_stock(&self, row: &WarehouseStock) -> Result<(), StoreError> {
        let mut tx = self.begin("upsert_warehouse_stock").await?;
        write_stock_row(&mut tx, row).await?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))
    }

    async fn stock_for_product(&self, product_id: ProductId) -> Result<Vec<WarehouseStock>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {STOCK_COLUMNS} FROM warehouse_stock WHERE product_id = $1 ORDER BY warehouse_id"
        ))
        .bind(product_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("stock_for_product", e))?;
        collect(&rows, stock_from_row)
    }

    async fn stock_for_warehouse(
        &self,
        warehouse_id: WarehouseId,
    ) -> Result<Vec<WarehouseStock>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {STOCK_COLUMNS} FROM warehouse_stock WHERE warehouse_id = $1 ORDER BY product_id"
        ))
        .bind(warehouse_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("stock_for_warehouse", e))?;
        collect(&rows, stock_from_row)
    }

    #[instrument(skip(self, now), fields(product_id = %product_id, from = %from, to = %to), err)]
    async fn transfer_warehouse_stock(
        &self,
        product_id: ProductId,
        from: WarehouseId,
        to: WarehouseId,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> Result<WarehouseTransfer, StoreError> {
        let mut tx = self.begin("transfer_warehouse_stock").await?;
        // Lock in a fixed order so two opposite transfers cannot deadlock.
        let (first, second) = if from <= to { (from, to) } else { (to, from) };
        let a = lock_stock_row(&mut tx, product_id, first).await?;
        let b = lock_stock_row(&mut tx, product_id, second).await?;
        let (source, target) = if first == from { (a, b) } else { (b, a) };

        let plan = WarehouseTransfer::plan(product_id, from, to, source, target, quantity, now)?;
        write_stock_row(&mut tx, &plan.source).await?;
        write_stock_row(&mut tx, &plan.target).await?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))?;
        Ok(plan)
    }
}

#[async_trait]
impl CustomerStore for PostgresStore {
    async fn insert_customer(&self, c: &Customer) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO customers (id, name, email, phone, address, created_at) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(c.id.as_uuid())
        .bind(&c.name)
        .bind(&c.contact.email)
        .bind(&c.contact.phone)
        .bind(&c.contact.address)
        .bind(c.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_customer", e))?;
        Ok(())
    }

    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>, StoreError> {
        let row = sqlx::query(&format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_customer", e))?;
        row.as_ref().map(customer_from_row).transpose()
    }

    async fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>, StoreError> {
        let row = sqlx::query(&format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE email = $1"))
            .bind(normalize_email(email))
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_customer_by_email", e))?;
        row.as_ref().map(customer_from_row).transpose()
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, StoreError> {
        let rows = sqlx::query(&format!("SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY name ASC"))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_customers", e))?;
        collect(&rows, customer_from_row)
    }

    async fn find_or_create_customer(&self, c: &Customer) -> Result<Customer, StoreError> {
        // Emails are stored normalized, so the unique constraint on `email`
        // decides the race between two first orders from the same address.
        let inserted = sqlx::query(&format!(
            r#"
            INSERT INTO customers (id, name, email, phone, address, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (email) DO NOTHING
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
        .bind(c.id.as_uuid())
        .bind(&c.name)
        .bind(&c.contact.email)
        .bind(&c.contact.phone)
        .bind(&c.contact.address)
        .bind(c.created_at)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_or_create_customer", e))?;

        if let Some(row) = inserted {
            return customer_from_row(&row);
        }
        let email = c.contact.email.as_deref().unwrap_or_default();
        self.find_customer_by_email(email)
            .await?
            .ok_or_else(|| StoreError::Decode(format!("customer with email '{email}' vanished")))
    }
}

#[async_trait]
impl VendorStore for PostgresStore {
    async fn insert_vendor(&self, v: &Vendor) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO vendors (
                id, name, main_category, subcategory, product_type, product_code, other_products,
                contact_number, location, city, state, zone, status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(v.id.as_uuid())
        .bind(&v.name)
        .bind(&v.main_category)
        .bind(&v.subcategory)
        .bind(&v.product_type)
        .bind(&v.product_code)
        .bind(&v.other_products)
        .bind(&v.contact_number)
        .bind(&v.location)
        .bind(&v.city)
        .bind(&v.state)
        .bind(&v.zone)
        .bind(v.status.as_str())
        .bind(v.created_at)
        .bind(v.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_vendor", e))?;
        Ok(())
    }

    async fn get_vendor(&self, id: VendorId) -> Result<Option<Vendor>, StoreError> {
        let row = sqlx::query(&format!("SELECT {VENDOR_COLUMNS} FROM vendors WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_vendor", e))?;
        row.as_ref().map(vendor_from_row).transpose()
    }

    async fn update_vendor(&self, v: &Vendor) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE vendors SET
                name = $2, main_category = $3, subcategory = $4, product_type = $5,
                product_code = $6, other_products = $7, contact_number = $8, location = $9,
                city = $10, state = $11, zone = $12, status = $13, updated_at = $14
            WHERE id = $1
            "#,
        )
        .bind(v.id.as_uuid())
        .bind(&v.name)
        .bind(&v.main_category)
        .bind(&v.subcategory)
        .bind(&v.product_type)
        .bind(&v.product_code)
        .bind(&v.other_products)
        .bind(&v.contact_number)
        .bind(&v.location)
        .bind(&v.city)
        .bind(&v.state)
        .bind(&v.zone)
        .bind(v.status.as_str())
        .bind(v.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_vendor", e))?;
        Ok(())
    }

    async fn list_vendors(&self) -> Result<Vec<Vendor>, StoreError> {
        let rows = sqlx::query(&format!("SELECT {VENDOR_COLUMNS} FROM vendors ORDER BY name ASC, id ASC"))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_vendors", e))?;
        collect(&rows, vendor_from_row)
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    #[instrument(skip(self, order, items), fields(order_id = %order.id, item_count = items.len()), err)]
    async fn insert_order(&self, order: &Order, items: &[OrderItem]) -> Result<(), StoreError> {
        let mut tx = self.begin("insert_order").await?;
        sqlx::query(
            r#"
            INSERT INTO orders (
                id, order_number, customer_id, customer_name, customer_email, customer_phone,
                status, approval_status, subtotal, tax, total, notes,
                approval_requested_by, approval_requested_at, approved_by, approved_at,
                approval_notes, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(&order.order_number)
        .bind(order.customer_id.map(Uuid::from))
        .bind(&order.customer_name)
        .bind(&order.customer_email)
        .bind(&order.customer_phone)
        .bind(order.status.as_str())
        .bind(order.approval_status.as_str())
        .bind(order.subtotal)
        .bind(order.tax)
        .bind(order.total)
        .bind(&order.notes)
        .bind(&order.approval_requested_by)
        .bind(order.approval_requested_at)
        .bind(&order.approved_by)
        .bind(order.approved_at)
        .bind(&order.approval_notes)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_order", e))?;

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, product_id, quantity, unit_price, total_price)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(item.id.as_uuid())
            .bind(item.order_id.as_uuid())
            .bind(item.product_id.as_uuid())
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.total_price)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_order_item", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders o WHERE o.id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_order", e))?;
        row.as_ref().map(order_from_row).transpose()
    }

    async fn update_order(&self, order: &Order) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE orders SET
                status = $2, approval_status = $3, approval_requested_by = $4,
                approval_requested_at = $5, approved_by = $6, approved_at = $7,
                approval_notes = $8, updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.status.as_str())
        .bind(order.approval_status.as_str())
        .bind(&order.approval_requested_by)
        .bind(order.approval_requested_at)
        .bind(&order.approved_by)
        .bind(order.approved_at)
        .bind(&order.approval_notes)
        .bind(order.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_order", e))?;
        Ok(())
    }

    async fn order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, order_id, product_id, quantity, unit_price, total_price FROM order_items WHERE order_id = $1 ORDER BY id",
        )
        .bind(order_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("order_items", e))?;
        collect(&rows, order_item_from_row)
    }

    async fn list_orders(&self) -> Result<Vec<(Order, usize)>, StoreError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {ORDER_COLUMNS}, COUNT(i.id) AS item_count
            FROM orders o
            LEFT JOIN order_items i ON i.order_id = o.id
            GROUP BY o.id
            "#
        ))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_orders", e))?;

        rows.iter()
            .map(|row| -> Result<(Order, usize), StoreError> {
                let count: i64 = col(row, "item_count")?;
                Ok((order_from_row(row)?, usize::try_from(count).unwrap_or_default()))
            })
            .collect()
    }

    async fn orders_for_product(&self, product_id: ProductId) -> Result<Vec<(Order, i64)>, StoreError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {ORDER_COLUMNS}, SUM(i.quantity)::BIGINT AS product_quantity
            FROM orders o
            JOIN order_items i ON i.order_id = o.id
            WHERE i.product_id = $1
            GROUP BY o.id
            ORDER BY o.created_at DESC, o.id DESC
            "#
        ))
        .bind(product_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("orders_for_product", e))?;

        rows.iter()
            .map(|row| -> Result<(Order, i64), StoreError> {
                Ok((order_from_row(row)?, col(row, "product_quantity")?))
            })
            .collect()
    }
}

#[async_trait]
impl GrnStore for PostgresStore {
    async fn get_grn(&self, order_id: OrderId) -> Result<Option<GrnWithItems>, StoreError> {
        let row = sqlx::query(&format!("SELECT {GRN_COLUMNS} FROM grns WHERE order_id = $1"))
            .bind(order_id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_grn", e))?;
        let Some(row) = row else {
            return Ok(None);
        };
        let grn = grn_from_row(&row)?;

        let item_rows = sqlx::query(
            r#"
            SELECT id, grn_id, product_id, description, quantity_ordered, quantity_received,
                   unit, unit_price, remarks
            FROM grn_items WHERE grn_id = $1 ORDER BY position
            "#,
        )
        .bind(grn.id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_grn_items", e))?;

        Ok(Some(GrnWithItems {
            grn,
            items: collect(&item_rows, grn_item_from_row)?,
        }))
    }

    #[instrument(skip(self, grn, items), fields(order_id = %grn.order_id, item_count = items.len()), err)]
    async fn save_grn(&self, grn: &Grn, items: &[GrnItem]) -> Result<GrnWithItems, StoreError> {
        let mut tx = self.begin("save_grn").await?;
        let h = &grn.header;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO grns (
                id, order_id, vendor_id, vendor_name, vendor_address, bill_number, bill_date,
                po_number, po_date, received_by, remarks, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (order_id) DO UPDATE SET
                vendor_id = EXCLUDED.vendor_id,
                vendor_name = EXCLUDED.vendor_name,
                vendor_address = EXCLUDED.vendor_address,
                bill_number = EXCLUDED.bill_number,
                bill_date = EXCLUDED.bill_date,
                po_number = EXCLUDED.po_number,
                po_date = EXCLUDED.po_date,
                received_by = EXCLUDED.received_by,
                remarks = EXCLUDED.remarks,
                updated_at = EXCLUDED.updated_at
            RETURNING {GRN_COLUMNS}
            "#
        ))
        .bind(grn.id.as_uuid())
        .bind(grn.order_id.as_uuid())
        .bind(h.vendor_id.map(Uuid::from))
        .bind(&h.vendor_name)
        .bind(&h.vendor_address)
        .bind(&h.bill_number)
        .bind(h.bill_date)
        .bind(&h.po_number)
        .bind(h.po_date)
        .bind(&h.received_by)
        .bind(&h.remarks)
        .bind(grn.created_at)
        .bind(grn.updated_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("save_grn", e))?;
        let saved = grn_from_row(&row)?;

        sqlx::query("DELETE FROM grn_items WHERE grn_id = $1")
            .bind(saved.id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("clear_grn_items", e))?;

        let mut saved_items = Vec::with_capacity(items.len());
        for (position, item) in items.iter().enumerate() {
            let d = &item.detail;
            sqlx::query(
                r#"
                INSERT INTO grn_items (
                    id, grn_id, position, product_id, description, quantity_ordered,
                    quantity_received, unit, unit_price, remarks
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                "#,
            )
            .bind(item.id.as_uuid())
            .bind(saved.id.as_uuid())
            .bind(i32::try_from(position).unwrap_or(i32::MAX))
            .bind(d.product_id.map(Uuid::from))
            .bind(&d.description)
            .bind(d.quantity_ordered)
            .bind(d.quantity_received)
            .bind(&d.unit)
            .bind(d.unit_price)
            .bind(&d.remarks)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_grn_item", e))?;
            saved_items.push(GrnItem {
                id: item.id,
                grn_id: saved.id,
                detail: d.clone(),
            });
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))?;
        Ok(GrnWithItems {
            grn: saved,
            items: saved_items,
        })
    }
}
