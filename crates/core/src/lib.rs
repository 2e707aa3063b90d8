//! `stocksmart-core` - domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! strongly-typed identifiers, the shared domain error model, and the marker
//! traits used by the entity crates.

pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult, FieldError};
pub use id::{
    CustomerId, GrnId, GrnItemId, MovementId, OrderId, OrderItemId, ProductId, UserId, VendorId,
    WarehouseId,
};
pub use value_object::ValueObject;
