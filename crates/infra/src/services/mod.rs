//! Service layer.
//!
//! Each service composes the storage traits and the pure domain crates; none
//! of them holds state of its own beyond the shared storage handle.

pub mod approval;
pub mod customers;
pub mod ledger;
pub mod movements;
pub mod orders;
pub mod usage;
pub mod vendors;
pub mod warehouses;

pub use approval::{ApprovalRequest, ApprovalWorkflow, GrnSubmission};
pub use customers::CustomerDirectory;
pub use ledger::{ProductFilter, ProductLedger, StockRequest, StockUpdate};
pub use movements::StockMovementLog;
pub use orders::OrderEngine;
pub use usage::{ProductOrderUsage, ProductUsage, UsageReport};
pub use vendors::{VendorDirectory, VendorFilter};
pub use warehouses::WarehouseStockMap;

use crate::storage::SharedStorage;

/// All services wired against one storage handle.
#[derive(Clone)]
pub struct Services {
    pub ledger: ProductLedger,
    pub movements: StockMovementLog,
    pub warehouses: WarehouseStockMap,
    pub customers: CustomerDirectory,
    pub vendors: VendorDirectory,
    pub orders: OrderEngine,
    pub approvals: ApprovalWorkflow,
    pub usage: UsageReport,
}

impl Services {
    pub fn new(storage: SharedStorage) -> Self {
        Self {
            ledger: ProductLedger::new(storage.clone()),
            movements: StockMovementLog::new(storage.clone()),
            warehouses: WarehouseStockMap::new(storage.clone()),
            customers: CustomerDirectory::new(storage.clone()),
            vendors: VendorDirectory::new(storage.clone()),
            orders: OrderEngine::new(storage.clone()),
            approvals: ApprovalWorkflow::new(storage.clone()),
            usage: UsageReport::new(storage),
        }
    }
}
