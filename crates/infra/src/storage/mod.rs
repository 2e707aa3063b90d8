//! Storage boundary.
//!
//! Services talk to storage only through the traits in this module, via an
//! injected `SharedStorage` handle. Two backends exist: `InMemoryStore` for
//! tests/dev and `PostgresStore` for persistent deployments.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use r#trait::{
    CustomerStore, GrnStore, MovementStore, OrderStore, ProductStore, SharedStorage, Storage,
    VendorStore, WarehouseStore,
};
