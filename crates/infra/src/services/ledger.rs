//! Product Ledger service: catalog CRUD plus every write to the stock counters.

use chrono::Utc;
use serde::Serialize;

use stocksmart_core::{DomainError, FieldError, ProductId, UserId, WarehouseId};
use stocksmart_inventory::{MovementAction, NewStockMovement, StockMovement};
use stocksmart_products::{
    LedgerAction, NewProduct, Product, ProductPatch, StockChange, StockCounters,
};

use super::movements::StockMovementLog;
use crate::error::{ServiceError, ServiceResult};
use crate::storage::SharedStorage;

/// Filters for listing products.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub include_archived: bool,
    pub search: Option<String>,
    pub low_stock_only: bool,
}

/// A stock update request as received at the boundary.
#[derive(Debug, Clone)]
pub struct StockRequest {
    pub action: MovementAction,
    pub quantity: i64,
    pub warehouse_id: Option<WarehouseId>,
    pub to_warehouse_id: Option<WarehouseId>,
    pub reason: Option<String>,
    pub user_id: Option<UserId>,
}

/// Outcome of `set_stock`: the product as it now stands and the movement logged for it.
#[derive(Debug, Clone, Serialize)]
pub struct StockUpdate {
    pub product: Product,
    pub movement: StockMovement,
}

#[derive(Clone)]
pub struct ProductLedger {
    storage: SharedStorage,
    movements: StockMovementLog,
}

impl ProductLedger {
    pub fn new(storage: SharedStorage) -> Self {
        Self {
            movements: StockMovementLog::new(storage.clone()),
            storage,
        }
    }

    pub async fn create_product(&self, input: NewProduct) -> ServiceResult<Product> {
        let product = Product::create(ProductId::new(), input, Utc::now())?;
        if self.storage.find_product_by_sku(&product.sku).await?.is_some() {
            return Err(DomainError::conflict(format!("sku '{}' already exists", product.sku)).into());
        }
        self.storage.insert_product(&product).await?;

        let opening = product.stock.total();
        if opening > 0 {
            let change = StockChange::compute(StockCounters::opening(0), LedgerAction::Add, opening)?;
            self.movements
                .record(NewStockMovement::from_change(product.id, &change, "Initial stock"))
                .await?;
        }

        tracing::info!(product_id = %product.id, sku = %product.sku, opening, "product created");
        Ok(product)
    }

    pub async fn update_product(&self, id: ProductId, patch: ProductPatch) -> ServiceResult<Product> {
        let mut product = self.require(id).await?;
        if let Some(sku) = patch.sku.as_deref().map(str::trim) {
            if sku != product.sku {
                if let Some(other) = self.storage.find_product_by_sku(sku).await? {
                    if other.id != id {
                        return Err(DomainError::conflict(format!("sku '{sku}' already exists")).into());
                    }
                }
            }
        }
        product.apply_patch(patch, Utc::now())?;
        self.storage.update_product(&product).await?;
        // Counters may have moved since the read; return what storage holds.
        self.require(id).await
    }

    /// Soft delete.
    pub async fn archive_product(&self, id: ProductId) -> ServiceResult<Product> {
        let mut product = self.require(id).await?;
        product.archive(Utc::now());
        self.storage.update_product(&product).await?;
        tracing::info!(product_id = %id, "product archived");
        self.require(id).await
    }

    pub async fn get_product(&self, id: ProductId) -> ServiceResult<Product> {
        self.require(id).await
    }

    /// Ordered by name.
    pub async fn list_products(&self, filter: &ProductFilter) -> ServiceResult<Vec<Product>> {
        let needle = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let mut products: Vec<Product> = self
            .storage
            .list_products()
            .await?
            .into_iter()
            .filter(|p| filter.include_archived || p.is_active())
            .filter(|p| !filter.low_stock_only || p.is_low_stock())
            .filter(|p| needle.is_none_or(|n| p.matches_search(n)))
            .collect();
        products.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(products)
    }

    /// Active products at or below their minimum level.
    pub async fn low_stock(&self) -> ServiceResult<Vec<Product>> {
        self.list_products(&ProductFilter {
            low_stock_only: true,
            ..ProductFilter::default()
        })
        .await
    }

    /// Atomic counter change. Archived products still accept changes.
    pub async fn apply_stock_change(
        &self,
        id: ProductId,
        action: LedgerAction,
        quantity: i64,
    ) -> ServiceResult<StockChange> {
        if quantity < 0 {
            return Err(ServiceError::field("quantity", "cannot be negative"));
        }
        let change = self
            .storage
            .apply_stock_change(id, action, quantity, Utc::now())
            .await?
            .ok_or_else(|| ServiceError::not_found("product"))?;
        tracing::info!(
            product_id = %id,
            action = action.as_str(),
            quantity,
            previous_available = change.previous.available(),
            new_available = change.new.available(),
            "stock changed"
        );
        Ok(change)
    }

    /// Add, use, adjust or transfer stock and log the movement.
    pub async fn set_stock(&self, id: ProductId, request: StockRequest) -> ServiceResult<StockUpdate> {
        let movement = match request.action {
            MovementAction::Transfer => self.transfer(id, &request).await?,
            MovementAction::Add => self.ledger_write(id, LedgerAction::Add, &request).await?,
            MovementAction::Use => self.ledger_write(id, LedgerAction::Use, &request).await?,
            MovementAction::Adjust => self.ledger_write(id, LedgerAction::Adjust, &request).await?,
        };
        let product = self.require(id).await?;
        Ok(StockUpdate { product, movement })
    }

    async fn ledger_write(
        &self,
        id: ProductId,
        action: LedgerAction,
        request: &StockRequest,
    ) -> ServiceResult<StockMovement> {
        if let Some(wid) = request.warehouse_id {
            self.require_warehouse(wid).await?;
        }
        let change = self.apply_stock_change(id, action, request.quantity).await?;
        let reason = request
            .reason
            .clone()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| format!("Stock {}", action.as_str()));
        self.movements
            .record(
                NewStockMovement::from_change(id, &change, reason)
                    .with_warehouse(request.warehouse_id)
                    .with_user(request.user_id),
            )
            .await
    }

    /// Warehouse-to-warehouse move; the product counters do not change.
    async fn transfer(&self, id: ProductId, request: &StockRequest) -> ServiceResult<StockMovement> {
        let mut missing = Vec::new();
        if request.warehouse_id.is_none() {
            missing.push(FieldError::new("warehouse_id", "required for transfer"));
        }
        if request.to_warehouse_id.is_none() {
            missing.push(FieldError::new("to_warehouse_id", "required for transfer"));
        }
        DomainError::check_fields(missing)?;
        let (Some(from), Some(to)) = (request.warehouse_id, request.to_warehouse_id) else {
            return Err(ServiceError::field("warehouse_id", "required for transfer"));
        };

        let product = self.require(id).await?;
        self.require_warehouse(from).await?;
        self.require_warehouse(to).await?;

        self.storage
            .transfer_warehouse_stock(id, from, to, request.quantity, Utc::now())
            .await?;
        tracing::info!(product_id = %id, %from, %to, quantity = request.quantity, "stock transferred");

        let reason = request
            .reason
            .clone()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| "Stock transfer".to_string());
        self.movements
            .record(
                NewStockMovement::transfer(id, request.quantity, product.stock.available(), from, reason)
                    .with_user(request.user_id),
            )
            .await
    }

    async fn require(&self, id: ProductId) -> ServiceResult<Product> {
        self.storage
            .get_product(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("product"))
    }

    async fn require_warehouse(&self, id: WarehouseId) -> ServiceResult<()> {
        match self.storage.get_warehouse(id).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::not_found(format!("warehouse {id}"))),
        }
    }
}
