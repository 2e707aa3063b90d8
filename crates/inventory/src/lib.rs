//! Inventory domain module.
//!
//! Two independent records of stock live here:
//! - the **stock movement log**, an append-only audit trail of every change to
//!   the product ledger counters;
//! - the **warehouse stock map**, physical quantity and bin placement per
//!   (product, warehouse). It is not reconciled against the ledger.

pub mod movement;
pub mod warehouse;

pub use movement::{MovementAction, NewStockMovement, StockMovement};
pub use warehouse::{BinLocation, NewWarehouse, Warehouse, WarehouseStock, WarehouseTransfer};
