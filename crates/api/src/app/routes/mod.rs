use axum::{routing::get, Router};

pub mod common;
pub mod customers;
pub mod movements;
pub mod orders;
pub mod products;
pub mod system;
pub mod vendors;
pub mod warehouses;

/// Router for every resource endpoint.
pub fn router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .nest("/products", products::router())
        .nest("/movements", movements::router())
        .nest("/warehouses", warehouses::router())
        .nest("/customers", customers::router())
        .nest("/vendors", vendors::router())
        .nest("/orders", orders::router())
}
