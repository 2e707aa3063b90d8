use chrono::Utc;

use stocksmart_core::{MovementId, ProductId};
use stocksmart_inventory::{NewStockMovement, StockMovement};

use crate::error::{ServiceError, ServiceResult};
use crate::storage::SharedStorage;

/// Append-only audit trail of ledger changes.
#[derive(Clone)]
pub struct StockMovementLog {
    storage: SharedStorage,
}

impl StockMovementLog {
    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }

    pub async fn record(&self, movement: NewStockMovement) -> ServiceResult<StockMovement> {
        let movement = movement.record(MovementId::new(), Utc::now());
        self.storage.append_movement(&movement).await?;
        tracing::debug!(
            movement_id = %movement.id,
            product_id = %movement.product_id,
            action = movement.action.as_str(),
            quantity = movement.quantity,
            "stock movement recorded"
        );
        Ok(movement)
    }

    /// Global log, most recent first.
    pub async fn list(&self, limit: Option<usize>) -> ServiceResult<Vec<StockMovement>> {
        Ok(self.storage.list_movements(limit).await?)
    }

    pub async fn list_for_product(
        &self,
        product_id: ProductId,
        limit: Option<usize>,
    ) -> ServiceResult<Vec<StockMovement>> {
        if self.storage.get_product(product_id).await?.is_none() {
            return Err(ServiceError::not_found("product"));
        }
        Ok(self
            .storage
            .list_movements_for_product(product_id, limit)
            .await?)
    }
}
