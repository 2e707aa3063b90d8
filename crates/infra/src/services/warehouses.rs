use chrono::Utc;

use stocksmart_core::{ProductId, WarehouseId};
use stocksmart_inventory::{BinLocation, NewWarehouse, Warehouse, WarehouseStock};

use crate::error::{ServiceError, ServiceResult};
use crate::storage::SharedStorage;

/// Physical stock per (product, warehouse).
///
/// Never feeds into the product counters, and nothing reconciles the two.
#[derive(Clone)]
pub struct WarehouseStockMap {
    storage: SharedStorage,
}

impl WarehouseStockMap {
    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }

    pub async fn create_warehouse(&self, input: NewWarehouse) -> ServiceResult<Warehouse> {
        let warehouse = Warehouse::create(WarehouseId::new(), input, Utc::now())?;
        self.storage.insert_warehouse(&warehouse).await?;
        tracing::info!(warehouse_id = %warehouse.id, name = %warehouse.name, "warehouse created");
        Ok(warehouse)
    }

    pub async fn list_warehouses(&self) -> ServiceResult<Vec<Warehouse>> {
        Ok(self.storage.list_warehouses().await?)
    }

    pub async fn get_warehouse(&self, id: WarehouseId) -> ServiceResult<Warehouse> {
        self.storage
            .get_warehouse(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("warehouse"))
    }

    /// Upsert the quantity (and bin location) held for a product in a warehouse.
    pub async fn set_quantity(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
        quantity: i64,
        location: Option<BinLocation>,
    ) -> ServiceResult<WarehouseStock> {
        if self.storage.get_product(product_id).await?.is_none() {
            return Err(ServiceError::not_found("product"));
        }
        self.get_warehouse(warehouse_id).await?;

        let existing = self
            .storage
            .get_warehouse_stock(product_id, warehouse_id)
            .await?;
        let row = WarehouseStock::upsert(
            existing,
            product_id,
            warehouse_id,
            quantity,
            location,
            Utc::now(),
        )?;
        self.storage.upsert_warehouse_stock(&row).await?;
        tracing::info!(%product_id, %warehouse_id, quantity, "warehouse stock set");
        Ok(row)
    }

    pub async fn stock_for_product(&self, product_id: ProductId) -> ServiceResult<Vec<WarehouseStock>> {
        Ok(self.storage.stock_for_product(product_id).await?)
    }

    pub async fn stock_for_warehouse(
        &self,
        warehouse_id: WarehouseId,
    ) -> ServiceResult<Vec<WarehouseStock>> {
        self.get_warehouse(warehouse_id).await?;
        Ok(self.storage.stock_for_warehouse(warehouse_id).await?)
    }
}
