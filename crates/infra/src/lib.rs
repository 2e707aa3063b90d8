//! Infrastructure layer: storage adapters (in-memory and Postgres) and the
//! services that compose them with the domain crates.

pub mod error;
pub mod services;
pub mod storage;


pub use error::{ServiceError, ServiceResult, StoreError};
pub use services::Services;
pub use storage::{InMemoryStore, PostgresStore, SharedStorage, Storage};
