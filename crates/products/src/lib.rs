//! Products domain module.
//!
//! Catalog entries plus the Product Ledger: the three stock counters and the
//! arithmetic every stock-affecting writer must go through. Pure domain logic
//! (no IO, no HTTP, no storage).

pub mod ledger;
pub mod product;

pub use ledger::{LedgerAction, StockChange, StockCounters};
pub use product::{NewProduct, Product, ProductPatch, ProductStatus};
pub use stocksmart_core::ProductId;
