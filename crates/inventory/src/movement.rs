use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stocksmart_core::{Entity, MovementId, OrderId, ProductId, UserId, WarehouseId};
use stocksmart_products::{LedgerAction, StockChange};

/// What kind of action a movement records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementAction {
    Add,
    Use,
    Transfer,
    Adjust,
}

impl MovementAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementAction::Add => "add",
            MovementAction::Use => "use",
            MovementAction::Transfer => "transfer",
            MovementAction::Adjust => "adjust",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "add" => Some(MovementAction::Add),
            "use" => Some(MovementAction::Use),
            "transfer" => Some(MovementAction::Transfer),
            "adjust" => Some(MovementAction::Adjust),
            _ => None,
        }
    }
}

impl From<LedgerAction> for MovementAction {
    fn from(value: LedgerAction) -> Self {
        match value {
            LedgerAction::Add => MovementAction::Add,
            LedgerAction::Use => MovementAction::Use,
            LedgerAction::Adjust => MovementAction::Adjust,
        }
    }
}

/// Immutable audit record of one stock-affecting action.
///
/// `previous_stock` / `new_stock` are snapshots of `stock_available`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockMovement {
    pub id: MovementId,
    pub product_id: ProductId,
    pub action: MovementAction,
    pub quantity: i64,
    pub previous_stock: i64,
    pub new_stock: i64,
    pub reason: String,
    pub warehouse_id: Option<WarehouseId>,
    pub user_id: Option<UserId>,
    pub order_id: Option<OrderId>,
    pub created_at: DateTime<Utc>,
}

impl Entity for StockMovement {
    type Id = MovementId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// A movement about to be appended to the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStockMovement {
    pub product_id: ProductId,
    pub action: MovementAction,
    pub quantity: i64,
    pub previous_stock: i64,
    pub new_stock: i64,
    pub reason: String,
    pub warehouse_id: Option<WarehouseId>,
    pub user_id: Option<UserId>,
    pub order_id: Option<OrderId>,
}

impl NewStockMovement {
    /// Attribute a ledger write: signed delta of `stock_available` plus both snapshots.
    pub fn from_change(product_id: ProductId, change: &StockChange, reason: impl Into<String>) -> Self {
        Self {
            product_id,
            action: change.action.into(),
            quantity: change.available_delta(),
            previous_stock: change.previous.available(),
            new_stock: change.new.available(),
            reason: reason.into(),
            warehouse_id: None,
            user_id: None,
            order_id: None,
        }
    }

    /// A warehouse-to-warehouse move. Ledger counters are untouched, so the
    /// snapshots are equal.
    pub fn transfer(
        product_id: ProductId,
        quantity: i64,
        stock_available: i64,
        from: WarehouseId,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            product_id,
            action: MovementAction::Transfer,
            quantity,
            previous_stock: stock_available,
            new_stock: stock_available,
            reason: reason.into(),
            warehouse_id: Some(from),
            user_id: None,
            order_id: None,
        }
    }

    pub fn with_warehouse(mut self, warehouse_id: Option<WarehouseId>) -> Self {
        self.warehouse_id = warehouse_id;
        self
    }

    pub fn with_user(mut self, user_id: Option<UserId>) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn with_order(mut self, order_id: OrderId) -> Self {
        self.order_id = Some(order_id);
        self
    }

    /// Stamp identity and time; after this the record never changes.
    pub fn record(self, id: MovementId, now: DateTime<Utc>) -> StockMovement {
        StockMovement {
            id,
            product_id: self.product_id,
            action: self.action,
            quantity: self.quantity,
            previous_stock: self.previous_stock,
            new_stock: self.new_stock,
            reason: self.reason,
            warehouse_id: self.warehouse_id,
            user_id: self.user_id,
            order_id: self.order_id,
            created_at: now,
        }
    }
}
