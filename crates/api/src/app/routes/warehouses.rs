use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    routing::{get, post, put},
    Json, Router,
};

use stocksmart_core::{ProductId, WarehouseId};

use crate::app::routes::common::{created, ok};
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_warehouse).get(list_warehouses))
        .route("/:id/stock", get(warehouse_stock))
        .route("/:id/stock/:product_id", put(set_quantity))
}

pub async fn create_warehouse(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateWarehouseRequest>,
) -> axum::response::Response {
    let input = match body.into_domain() {
        Ok(v) => v,
        Err(fields) => return errors::field_errors(fields),
    };
    created(services.warehouses.create_warehouse(input).await)
}

pub async fn list_warehouses(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    ok(services.warehouses.list_warehouses().await)
}

pub async fn warehouse_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: WarehouseId = match errors::parse_id(&id, "warehouse") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    ok(services.warehouses.stock_for_warehouse(id).await)
}

pub async fn set_quantity(
    Extension(services): Extension<Arc<AppServices>>,
    Path((id, product_id)): Path<(String, String)>,
    Json(body): Json<dto::SetWarehouseQuantityRequest>,
) -> axum::response::Response {
    let warehouse_id: WarehouseId = match errors::parse_id(&id, "warehouse") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let product_id: ProductId = match errors::parse_id(&product_id, "product") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let (quantity, location) = match body.into_domain() {
        Ok(v) => v,
        Err(fields) => return errors::field_errors(fields),
    };
    ok(services
        .warehouses
        .set_quantity(product_id, warehouse_id, quantity, location)
        .await)
}
