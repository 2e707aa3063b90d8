use serde::Serialize;

use stocksmart_core::ProductId;
use stocksmart_inventory::{StockMovement, WarehouseStock};
use stocksmart_products::Product;
use stocksmart_sales::Order;

use crate::error::{ServiceError, ServiceResult};
use crate::storage::SharedStorage;

/// An order that includes the product, with how much of it was ordered.
#[derive(Debug, Clone, Serialize)]
pub struct ProductOrderUsage {
    #[serde(flatten)]
    pub order: Order,
    pub quantity: i64,
}

/// Everything known about where a product is and where it went.
#[derive(Debug, Clone, Serialize)]
pub struct ProductUsage {
    pub product: Product,
    pub warehouse_stock: Vec<WarehouseStock>,
    pub movements: Vec<StockMovement>,
    pub orders: Vec<ProductOrderUsage>,
}

#[derive(Clone)]
pub struct UsageReport {
    storage: SharedStorage,
}

impl UsageReport {
    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }

    pub async fn product_usage(&self, product_id: ProductId) -> ServiceResult<ProductUsage> {
        let product = self
            .storage
            .get_product(product_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("product"))?;
        let warehouse_stock = self.storage.stock_for_product(product_id).await?;
        let movements = self
            .storage
            .list_movements_for_product(product_id, None)
            .await?;
        let orders = self
            .storage
            .orders_for_product(product_id)
            .await?
            .into_iter()
            .map(|(order, quantity)| ProductOrderUsage { order, quantity })
            .collect();
        Ok(ProductUsage {
            product,
            warehouse_stock,
            movements,
            orders,
        })
    }
}
